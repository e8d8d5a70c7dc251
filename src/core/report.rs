use std::fmt;
use std::time::Duration;

/// One checked item of a test run, rendered as
/// `<label>: <Passed|Failed> <elapsed> <message>`.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportLine {
    pub label: String,
    pub passed: bool,
    pub elapsed: String,
    pub message: String,
}

impl ReportLine {
    pub fn new(label: &str, passed: bool, elapsed: &str, message: &str) -> Self {
        ReportLine {
            label: label.to_string(),
            passed,
            elapsed: elapsed.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "Passed" } else { "Failed" };
        write!(f, "{}: {} {} {}", self.label, status, self.elapsed, self.message)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Report {
    lines: Vec<ReportLine>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, line: ReportLine) {
        tracing::debug!(label = %line.label, passed = line.passed, "{}", line.message);
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportLine> {
        self.lines.iter().filter(|line| !line.passed)
    }
}

pub fn format_millis(elapsed: Duration) -> String {
    format!("{}ms", elapsed.as_millis())
}
