use tokio::time::Instant;

use crate::core::{
    deadline::{self, DeadlineError},
    domain::{LineSeparator, ProjectDescriptor, TestOutcome},
    report::{Report, ReportLine, format_millis},
    traits::executor::Executor,
    verdict::{self, Evaluation},
};

/// Checks the deadline, runs the test script once and compares its output.
///
/// The deadline only contributes a report line; a malformed due date is the
/// one condition that aborts the run with an error.
#[tracing::instrument(skip_all, fields(project = %descriptor.project_name))]
pub async fn test_project(
    descriptor: &ProjectDescriptor,
    executor: &dyn Executor,
    separator: LineSeparator,
    report: &mut Report,
) -> Result<bool, DeadlineError> {
    let on_time = deadline::is_on_time(&descriptor.due_date)?;
    report.record(ReportLine::new("On time", on_time, "0", ""));

    tracing::debug!(
        "Start execution: executable={:?}, script={:?}, limit={:?}",
        descriptor.executable,
        descriptor.test_script,
        descriptor.time_limit()
    );
    let start = Instant::now();
    let outcome = executor
        .run(
            &descriptor.executable,
            &descriptor.test_script,
            descriptor.time_limit(),
        )
        .await;

    report.record(execution_line(descriptor, &outcome, &format_millis(start.elapsed())));

    let evaluation = verdict::evaluate(&outcome, descriptor, separator);
    record_checks(descriptor, &evaluation, report);

    tracing::info!(
        passes = evaluation.passes,
        required = descriptor.required_passes,
        passed = evaluation.passed,
        "Test run evaluated"
    );
    Ok(evaluation.passed)
}

fn execution_line(descriptor: &ProjectDescriptor, outcome: &TestOutcome, waited: &str) -> ReportLine {
    let label = &descriptor.test_script;
    match outcome {
        TestOutcome::TimedOut => ReportLine::new(
            label,
            false,
            &format!("{}s", descriptor.timeout_seconds),
            "Timed out",
        ),
        TestOutcome::ExecutionError { message } => {
            ReportLine::new(label, false, waited, &format!("Program errored: {message}"))
        }
        TestOutcome::Completed { elapsed, .. } => {
            ReportLine::new(label, true, &format_millis(*elapsed), "Finished Execution")
        }
    }
}

fn record_checks(descriptor: &ProjectDescriptor, evaluation: &Evaluation, report: &mut Report) {
    for check in &evaluation.checks {
        let message = if check.matched {
            format!("Got the expected result '{}'!", check.actual)
        } else {
            format!("Got '{}' expected '{}' as a result", check.actual, check.expected)
        };
        report.record(ReportLine::new(&descriptor.test_script, check.matched, "", &message));
    }
}
