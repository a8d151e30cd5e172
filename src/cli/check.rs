//! `quickdeploy check` - Validate a deployment configuration
//!
//! Loading already validates the file; this command reports what it found,
//! lists the deploy plans and warns about command types the executor will
//! reject when it reaches them.
//!
//! ## Usage
//!
//! ```bash
//! quickdeploy check -c deploy.yaml
//! # Exit code 0: configuration is valid
//! # Exit code 1: configuration could not be loaded
//! ```

use anyhow::Result;
use quickdeploy::config::DeployConfig;
use std::io::Write;

/// Writes a report of `config` to `out` and returns the number of warnings
pub fn check_config<W: Write>(config: &DeployConfig, out: &mut W) -> Result<usize> {
    writeln!(
        out,
        "Configuration OK: {} servers, {} deployments, {} plans",
        config.servers.len(),
        config.deployments.len(),
        config.deploy_plans.len()
    )?;

    for plan in &config.deploy_plans {
        let steps = config
            .deployment(&plan.deployment)
            .map_or(0, |d| d.pipeline.len());
        writeln!(
            out,
            "  {} -> {} ({steps} commands)",
            plan.deployment, plan.server
        )?;
    }

    let mut warnings = 0;
    for deployment in &config.deployments {
        for (step, kind) in deployment.pipeline.unrecognized() {
            tracing::warn!(deployment = %deployment.name, step, kind, "Unknown command type");
            writeln!(
                out,
                "warning: deployment '{}' step {step}: unknown command type: {kind}",
                deployment.name
            )?;
            warnings += 1;
        }
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_check_report() {
        let config = DeployConfig::from_yaml(
            r#"
servers:
  - { name: web-1, host: 10.0.0.5, username: deploy }
deployments:
  - name: app
    pipeline:
      commands:
        - { type: local, command: "make" }
        - { type: rsync, command: "rsync -a . web:/srv" }
deploy_plans:
  - { server: web-1, deployment: app }
"#,
        )
        .unwrap();
        let mut out = Vec::new();

        let warnings = check_config(&config, &mut out).unwrap();

        assert_eq!(warnings, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Configuration OK: 1 servers, 1 deployments, 1 plans\n  \
             app -> web-1 (2 commands)\n\
             warning: deployment 'app' step 2: unknown command type: rsync\n"
        );
    }
}
