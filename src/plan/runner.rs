use super::Connector;
use super::summary::{PlanRecord, PlanSummary};
use crate::config::{DeployConfig, DeploymentPlan, Server};
use crate::executor::{Executor, ShellRunner, Target, emit};
use crate::pipeline::Pipeline;
use std::io::Write;
use std::time::{Duration, Instant};

/// Restricts a run to plans matching a server and/or deployment name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanFilter {
    /// Only run plans targeting this server
    pub server: Option<String>,
    /// Only run plans deploying this deployment
    pub deployment: Option<String>,
}

impl PlanFilter {
    /// Returns true if `plan` is selected
    pub fn matches(&self, plan: &DeploymentPlan) -> bool {
        self.server.as_ref().is_none_or(|s| *s == plan.server)
            && self.deployment.as_ref().is_none_or(|d| *d == plan.deployment)
    }
}

/// Executes the deploy plans of a configuration one after another
///
/// A plan that fails to connect or whose pipeline fails is recorded and the
/// runner moves on to the next plan.
#[derive(Debug, Clone)]
pub struct PlanRunner {
    filter: PlanFilter,
    dry_run: bool,
    shell: String,
}

impl Default for PlanRunner {
    fn default() -> Self {
        Self {
            filter: PlanFilter::default(),
            dry_run: false,
            shell: "sh".to_string(),
        }
    }
}

impl PlanRunner {
    /// Creates a runner executing every plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the plans that run
    #[must_use]
    pub fn with_filter(mut self, filter: PlanFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Lists the steps of each plan instead of executing them
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the shell running local commands
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Runs every selected plan of `config`, writing the deployment trace to
    /// `out`
    pub fn run<K: Connector, W: Write>(
        &self,
        config: &DeployConfig,
        connector: &K,
        out: &mut W,
    ) -> PlanSummary {
        let plans: Vec<_> = config
            .deploy_plans
            .iter()
            .filter(|plan| self.filter.matches(plan))
            .collect();

        tracing::info!(plans = plans.len(), dry_run = self.dry_run, "Starting deploy plans");
        emit(
            out,
            format_args!("Starting deployment with {} plans\n", plans.len()),
        );

        let plans = plans
            .into_iter()
            .map(|plan| self.run_plan(config, plan, connector, out))
            .collect();

        PlanSummary {
            dry_run: self.dry_run,
            plans,
        }
    }

    fn run_plan<K: Connector, W: Write>(
        &self,
        config: &DeployConfig,
        plan: &DeploymentPlan,
        connector: &K,
        out: &mut W,
    ) -> PlanRecord {
        let started = Instant::now();
        let mut record = PlanRecord {
            server: plan.server.clone(),
            deployment: plan.deployment.clone(),
            succeeded: false,
            steps: 0,
            ignored: 0,
            duration: Duration::ZERO,
            error: None,
        };

        let (Some(server), Some(deployment)) = (
            config.server(&plan.server),
            config.deployment(&plan.deployment),
        ) else {
            record.error = Some(format!(
                "plan references unknown server '{}' or deployment '{}'",
                plan.server, plan.deployment
            ));
            return record;
        };

        emit(
            out,
            format_args!(
                "\n==> Executing deployment '{}' on server: {} ({})\n",
                deployment.name, server.name, server.host
            ),
        );

        if self.dry_run {
            describe(&deployment.pipeline, out);
            record.succeeded = true;
            record.steps = deployment.pipeline.len();
        } else {
            self.execute(server, &deployment.pipeline, connector, out, &mut record);
        }

        record.duration = started.elapsed();
        if let Some(error) = &record.error {
            tracing::error!(
                server = %record.server,
                deployment = %record.deployment,
                error = %error,
                "Deploy plan failed"
            );
        }
        record
    }

    fn execute<K: Connector, W: Write>(
        &self,
        server: &Server,
        pipeline: &Pipeline,
        connector: &K,
        out: &mut W,
        record: &mut PlanRecord,
    ) {
        let channel = match connector.connect(server) {
            Ok(channel) => channel,
            Err(e) => {
                record.error = Some(format!("failed to create executor: {e}"));
                return;
            }
        };

        let mut executor = Executor::new(Target::from(server), channel, &mut *out)
            .with_runner(ShellRunner::new().with_shell(self.shell.clone()));
        let report = executor.run(pipeline);
        if let Err(e) = executor.close() {
            tracing::warn!(server = %server.name, error = %e, "Failed to close connection");
        }

        record.succeeded = report.succeeded;
        record.steps = report.steps();
        record.ignored = report.ignored_count();
        record.error = report
            .failure
            .map(|failure| format!("pipeline execution failed: {failure}"));
    }
}

fn describe<W: Write>(pipeline: &Pipeline, out: &mut W) {
    for (i, command) in pipeline.commands.iter().enumerate() {
        emit(
            out,
            format_args!("  {}. [{}] {command}\n", i + 1, command.kind_label()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{CommandStatus, RawSession, RemoteChannel};
    use crate::pipeline::TransportError;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    const CONFIG: &str = r#"
servers:
  - { name: web-1, host: 10.0.0.5, username: deploy }
  - { name: web-2, host: 10.0.0.6, username: deploy }
deployments:
  - name: app
    pipeline:
      commands:
        - { type: remote, command: "systemctl stop app" }
        - { type: remote, command: "systemctl start app" }
  - name: broken
    pipeline:
      commands:
        - { type: remote, command: "fail here" }
        - { type: remote, command: "never runs" }
deploy_plans:
  - { server: web-1, deployment: app }
  - { server: web-2, deployment: broken }
  - { server: web-2, deployment: app }
"#;

    struct FakeChannel {
        server: String,
        log: Log,
    }

    impl RemoteChannel for FakeChannel {
        fn run_command(
            &mut self,
            command: &str,
            _output: &mut dyn Write,
        ) -> Result<CommandStatus, TransportError> {
            self.log.borrow_mut().push(format!("{}:{command}", self.server));
            let code = if command.starts_with("fail") || command.contains("stop") {
                1
            } else {
                0
            };
            Ok(CommandStatus::from_code(code))
        }

        fn open_raw_session(
            &mut self,
            _command_line: &str,
        ) -> Result<Box<dyn RawSession + '_>, TransportError> {
            Err(TransportError::Closed)
        }

        fn close(&mut self) -> Result<(), TransportError> {
            self.log.borrow_mut().push(format!("{}:close", self.server));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeConnector {
        unreachable: Option<&'static str>,
        log: Log,
    }

    impl Connector for FakeConnector {
        type Channel = FakeChannel;

        fn connect(&self, server: &Server) -> Result<FakeChannel, TransportError> {
            self.log.borrow_mut().push(format!("{}:connect", server.name));
            if self.unreachable == Some(server.name.as_str()) {
                return Err(TransportError::Connection {
                    destination: format!("{}@{}", server.username, server.host),
                    message: "Connection refused".to_string(),
                });
            }
            Ok(FakeChannel {
                server: server.name.clone(),
                log: Rc::clone(&self.log),
            })
        }
    }

    fn config() -> DeployConfig {
        DeployConfig::from_yaml(CONFIG).unwrap()
    }

    #[test]
    fn test_runs_every_plan_in_order() {
        let connector = FakeConnector::default();
        let mut out = Vec::new();

        let summary = PlanRunner::new().run(&config(), &connector, &mut out);

        assert_eq!(
            *connector.log.borrow(),
            vec![
                "web-1:connect",
                "web-1:systemctl stop app",
                "web-1:systemctl start app",
                "web-1:close",
                "web-2:connect",
                "web-2:fail here",
                "web-2:close",
                "web-2:connect",
                "web-2:systemctl stop app",
                "web-2:systemctl start app",
                "web-2:close",
            ]
        );
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.completed(), 2);
        assert_eq!(summary.failed(), 1);

        let first = &summary.plans[0];
        assert!(first.succeeded);
        assert_eq!(first.steps, 2);
        assert_eq!(first.ignored, 1);

        let broken = &summary.plans[1];
        assert_eq!(broken.steps, 1);
        assert!(
            broken
                .error
                .as_deref()
                .unwrap()
                .starts_with("pipeline execution failed: step 1: remote command failed")
        );
    }

    #[test]
    fn test_announces_each_plan() {
        let connector = FakeConnector::default();
        let mut out = Vec::new();

        PlanRunner::new().run(&config(), &connector, &mut out);
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Starting deployment with 3 plans\n"));
        assert!(text.contains("\n==> Executing deployment 'app' on server: web-1 (10.0.0.5)\n"));
        assert!(text.contains("\n==> Executing deployment 'broken' on server: web-2 (10.0.0.6)\n"));
        assert!(text.contains("==> [web-2] Executing remote command: fail here\n"));
    }

    #[test]
    fn test_connection_failure_is_isolated() {
        let connector = FakeConnector {
            unreachable: Some("web-1"),
            ..FakeConnector::default()
        };
        let mut out = Vec::new();

        let summary = PlanRunner::new().run(&config(), &connector, &mut out);

        let first = &summary.plans[0];
        assert!(!first.succeeded);
        assert_eq!(first.steps, 0);
        assert_eq!(
            first.error.as_deref(),
            Some("failed to create executor: connection to deploy@10.0.0.5 failed: Connection refused")
        );
        assert!(summary.plans[2].succeeded);
    }

    #[test]
    fn test_filter_selects_plans() {
        let connector = FakeConnector::default();
        let mut out = Vec::new();
        let filter = PlanFilter {
            server: Some("web-2".to_string()),
            deployment: Some("app".to_string()),
        };

        let summary = PlanRunner::new()
            .with_filter(filter)
            .run(&config(), &connector, &mut out);

        assert_eq!(summary.total(), 1);
        assert_eq!(summary.plans[0].server, "web-2");
        assert_eq!(summary.plans[0].deployment, "app");
    }

    #[test]
    fn test_dry_run_never_connects() {
        let connector = FakeConnector::default();
        let mut out = Vec::new();

        let summary = PlanRunner::new()
            .dry_run(true)
            .run(&config(), &connector, &mut out);

        assert!(connector.log.borrow().is_empty());
        assert!(summary.dry_run);
        assert!(summary.all_succeeded());
        assert_eq!(summary.plans[1].steps, 2);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  1. [remote] fail here\n  2. [remote] never runs\n"));
    }

    #[test]
    fn test_filter_matches() {
        let plan = DeploymentPlan {
            server: "web-1".to_string(),
            deployment: "app".to_string(),
        };

        assert!(PlanFilter::default().matches(&plan));
        assert!(
            PlanFilter {
                server: Some("web-1".to_string()),
                deployment: None,
            }
            .matches(&plan)
        );
        assert!(
            !PlanFilter {
                server: None,
                deployment: Some("db".to_string()),
            }
            .matches(&plan)
        );
    }
}
