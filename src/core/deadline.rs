use chrono::{Local, NaiveDateTime};

use crate::constants::{DUE_DATE_FORMAT, DUE_DATE_NOT_SET, NO_DUE_DATE};

#[derive(Debug, thiserror::Error)]
#[error("malformed due date {due_date:?}, expected YYYY-MM-DD HH:MM:SS")]
pub struct DeadlineError {
    pub due_date: String,
    #[source]
    pub source: chrono::ParseError,
}

/// Due dates are stored as wall-clock local time.
pub fn is_on_time(due_date: &str) -> Result<bool, DeadlineError> {
    is_on_time_at(due_date, Local::now().naive_local())
}

pub fn is_on_time_at(due_date: &str, now: NaiveDateTime) -> Result<bool, DeadlineError> {
    if is_unbounded(due_date) {
        return Ok(true);
    }

    let deadline = parse_due_date(due_date)?;
    Ok(now < deadline)
}

pub fn is_unbounded(due_date: &str) -> bool {
    due_date == DUE_DATE_NOT_SET || due_date == NO_DUE_DATE
}

pub fn parse_due_date(due_date: &str) -> Result<NaiveDateTime, DeadlineError> {
    NaiveDateTime::parse_from_str(due_date, DUE_DATE_FORMAT).map_err(|source| DeadlineError {
        due_date: due_date.to_string(),
        source,
    })
}
