use crate::core::domain::{LineSeparator, ProjectDescriptor, TestOutcome};

#[derive(Clone, Debug, PartialEq)]
pub struct LineCheck {
    pub actual: String,
    pub expected: String,
    pub matched: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub passes: u32,
    pub checks: Vec<LineCheck>,
    pub passed: bool,
}

impl Evaluation {
    fn failed() -> Self {
        Evaluation {
            passes: 0,
            checks: Vec::new(),
            passed: false,
        }
    }
}

/// Walks output and expected lines in lockstep. Comparison stops at the
/// first empty output line or when either side runs out.
pub fn compare_lines(output: &str, expected: &[String], separator: LineSeparator) -> Vec<LineCheck> {
    output
        .split(separator.as_str())
        .zip(expected)
        .take_while(|(actual, _)| !actual.is_empty())
        .map(|(actual, expected)| LineCheck {
            actual: actual.to_string(),
            expected: expected.clone(),
            matched: actual.to_lowercase() == expected.to_lowercase(),
        })
        .collect()
}

/// Turns an outcome into a pass count and a final verdict. Timeouts and
/// execution errors fail regardless of `required_passes`.
pub fn evaluate(
    outcome: &TestOutcome,
    descriptor: &ProjectDescriptor,
    separator: LineSeparator,
) -> Evaluation {
    let TestOutcome::Completed { output, .. } = outcome else {
        return Evaluation::failed();
    };

    let mut passes = 0u32;
    if descriptor.count_execution_as_pass {
        passes += 1;
    }

    let output = String::from_utf8_lossy(output);
    let checks = compare_lines(&output, &descriptor.expected_outputs, separator);
    passes += checks.iter().filter(|check| check.matched).count() as u32;

    Evaluation {
        passes,
        checks,
        passed: descriptor.required_passes <= passes,
    }
}
