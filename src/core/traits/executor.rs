use std::time::Duration;

use crate::core::domain::TestOutcome;

/// Runs `executable script` once under a wall-clock limit.
///
/// Launch failures, abnormal exits and timeouts are reported through
/// [`TestOutcome`] rather than as errors: they are verdicts, not crashes.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Executor: std::fmt::Debug + Send + Sync {
    async fn run(&self, executable: &str, script: &str, time_limit: Duration) -> TestOutcome;
}
