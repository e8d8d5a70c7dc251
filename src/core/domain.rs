use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-project record driving testing and packaging.
///
/// On disk this is the `project.toml` file; field names keep the
/// historical capitalisation of that format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectDescriptor {
    pub project_name: String,
    pub author: String,
    #[serde(default)]
    pub project_path: String,
    pub due_date: String,
    pub main_file: String,
    pub test_script: String,
    pub executable: String,
    #[serde(rename = "ProjFiles")]
    pub project_files: Vec<String>,
    #[serde(rename = "ExpectedOutPuts")]
    pub expected_outputs: Vec<String>,
    pub required_passes: u32,
    #[serde(rename = "TimeOutAfterSeconds")]
    pub timeout_seconds: u64,
    pub count_execution_as_pass: bool,
}

impl ProjectDescriptor {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Result of one bounded execution of the test command.
#[derive(Clone, Debug, PartialEq)]
pub enum TestOutcome {
    TimedOut,
    ExecutionError { message: String },
    Completed { output: Vec<u8>, elapsed: Duration },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineSeparator {
    Lf,
    CrLf,
}

impl LineSeparator {
    pub fn native() -> Self {
        if cfg!(windows) {
            LineSeparator::CrLf
        } else {
            LineSeparator::Lf
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineSeparator::Lf => "\n",
            LineSeparator::CrLf => "\r\n",
        }
    }
}
