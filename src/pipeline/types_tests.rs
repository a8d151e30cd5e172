//! Tests for pipeline result types

#[cfg(test)]
mod types_tests {
    use super::super::*;
    use std::time::Duration;
    use uuid::Uuid;

    fn report(outcomes: Vec<ExecutionOutcome>, failure: Option<StepFailure>) -> PipelineReport {
        PipelineReport {
            run_id: Uuid::new_v4(),
            succeeded: failure.is_none(),
            outcomes,
            total_duration: Duration::from_millis(30),
            failure,
        }
    }

    #[test]
    fn test_outcome_constructors() {
        let command = Command::local("pkill app");
        let ok = ExecutionOutcome::success(&command, Duration::from_millis(5));
        let ignored =
            ExecutionOutcome::ignored(&command, Duration::from_millis(5), "exit status 1".into());

        assert!(ok.succeeded && !ok.ignored_error && ok.error.is_none());
        assert!(ignored.succeeded && ignored.ignored_error);
        assert_eq!(ignored.error.as_deref(), Some("exit status 1"));
    }

    #[test]
    fn test_failure_outcome_records_error_text() {
        let command = Command::remote("deploy.sh");
        let error = ExecutionError::RemoteExecution {
            command: "deploy.sh".to_string(),
            reason: "exit status 2".to_string(),
        };
        let outcome = ExecutionOutcome::failure(&command, Duration::ZERO, &error);

        assert!(!outcome.succeeded);
        assert_eq!(
            outcome.error.as_deref(),
            Some("remote command failed: deploy.sh: exit status 2")
        );
    }

    #[test]
    fn test_report_counts() {
        let command = Command::local("rm -f /tmp/x");
        let report = report(
            vec![
                ExecutionOutcome::ignored(&command, Duration::ZERO, "exit status 1".into()),
                ExecutionOutcome::success(&Command::local("echo ok"), Duration::ZERO),
            ],
            None,
        );

        assert_eq!(report.steps(), 2);
        assert_eq!(report.ignored_count(), 1);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_report_into_result_keeps_failure() {
        let failure = StepFailure {
            step: 3,
            error: ExecutionError::UnknownCommandKind {
                kind: "ftp".to_string(),
            },
        };
        let err = report(Vec::new(), Some(failure.clone()))
            .into_result()
            .unwrap_err();

        assert_eq!(err, failure);
        assert_eq!(err.to_string(), "step 3: unknown command type: ftp");
    }

    #[test]
    fn test_error_messages() {
        let path = ExecutionError::PathResolution {
            path: "rel/dir".into(),
            reason: "no current directory".to_string(),
        };
        let transfer = ExecutionError::Transfer {
            local_path: "/tmp/missing".into(),
            remote_path: "/srv/app/bin".to_string(),
            reason: "No such file or directory".to_string(),
        };

        assert_eq!(
            path.to_string(),
            "failed to resolve working directory 'rel/dir': no current directory"
        );
        assert_eq!(
            transfer.to_string(),
            "transfer of /tmp/missing to /srv/app/bin failed: No such file or directory"
        );
    }
}
