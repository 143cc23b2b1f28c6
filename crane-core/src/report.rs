//! Per-invocation outcomes and overall result aggregation.

/// Captured result of one executed invocation.
///
/// A non-zero exit is data here, never an error of the run as a whole:
/// independent per-entity invocations are isolated failures.
#[derive(Debug, Clone)]
pub struct InvocationOutcome {
    /// Entity the invocation is attributed to.
    pub target: String,
    /// Rendered command line that ran (without the program name).
    pub argv: Vec<String>,
    /// Exit status; `None` when the process could not be spawned.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl InvocationOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Overall status of a multi-invocation command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverallStatus {
    AllSucceeded,
    /// Failed targets, in resolver order.
    PartialFailure(Vec<String>),
    AllFailed,
}

/// Final aggregated result, built once after execution completes.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub status: OverallStatus,
    pub outcomes: Vec<InvocationOutcome>,
}

impl CommandResult {
    /// Process exit code: 0 all succeeded, 1 partial failure, 2 all failed.
    ///
    /// Validation and environment failures exit with 3, mapped at the CLI
    /// boundary rather than here.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            OverallStatus::AllSucceeded => 0,
            OverallStatus::PartialFailure(_) => 1,
            OverallStatus::AllFailed => 2,
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.succeeded_count()
    }
}

/// Combine per-invocation outcomes into one command result.
pub fn aggregate(outcomes: Vec<InvocationOutcome>) -> CommandResult {
    aggregate_with(outcomes, InvocationOutcome::succeeded)
}

/// Like [`aggregate`], with a caller-supplied success predicate.
///
/// `service rollback` needs this: docker reports "does not have a previous
/// spec" on stderr with an exit status that still reads as success.
pub fn aggregate_with<F>(outcomes: Vec<InvocationOutcome>, is_success: F) -> CommandResult
where
    F: Fn(&InvocationOutcome) -> bool,
{
    let failed: Vec<String> = outcomes
        .iter()
        .filter(|outcome| !is_success(outcome))
        .map(|outcome| outcome.target.clone())
        .collect();

    let status = if failed.is_empty() {
        OverallStatus::AllSucceeded
    } else if failed.len() == outcomes.len() {
        OverallStatus::AllFailed
    } else {
        OverallStatus::PartialFailure(failed)
    };

    CommandResult { status, outcomes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(target: &str, exit_code: Option<i32>) -> InvocationOutcome {
        InvocationOutcome {
            target: target.to_string(),
            argv: vec![],
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_all_succeeded() {
        let result = aggregate(vec![outcome("a", Some(0)), outcome("b", Some(0))]);
        assert_eq!(result.status, OverallStatus::AllSucceeded);
        assert_eq!(result.exit_code(), 0);
    }

    #[test]
    fn test_partial_failure_names_failed_targets_in_order() {
        let result = aggregate(vec![
            outcome("a", Some(0)),
            outcome("b", Some(1)),
            outcome("c", Some(1)),
        ]);
        assert_eq!(
            result.status,
            OverallStatus::PartialFailure(vec!["b".to_string(), "c".to_string()])
        );
        assert_eq!(result.exit_code(), 1);
        assert_eq!(result.succeeded_count(), 1);
        assert_eq!(result.failed_count(), 2);
    }

    #[test]
    fn test_all_failed() {
        let result = aggregate(vec![outcome("a", Some(1)), outcome("b", Some(127))]);
        assert_eq!(result.status, OverallStatus::AllFailed);
        assert_eq!(result.exit_code(), 2);
    }

    #[test]
    fn test_unspawned_counts_as_failure() {
        let result = aggregate(vec![outcome("a", None)]);
        assert_eq!(result.status, OverallStatus::AllFailed);
    }

    #[test]
    fn test_aggregate_with_custom_predicate() {
        let mut no_previous = outcome("a", Some(0));
        no_previous.stderr = "service a does not have a previous spec".to_string();
        let result = aggregate_with(vec![no_previous, outcome("b", Some(0))], |o| {
            o.succeeded() && !o.stderr.contains("does not have a previous spec")
        });
        assert_eq!(result.status, OverallStatus::PartialFailure(vec!["a".to_string()]));
    }
}
