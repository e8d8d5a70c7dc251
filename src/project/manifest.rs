use std::fs::{self, File};
use std::path::Path;

use chrono::{DateTime, Days, Local, Utc};

use crate::constants::{DUE_DATE_FORMAT, DUE_DATE_NOT_SET, NO_DUE_DATE};
use crate::core::domain::ProjectDescriptor;
use crate::project::ProjectError;

pub fn track(descriptor: &mut ProjectDescriptor, file: &str) -> Result<(), ProjectError> {
    if descriptor.project_files.iter().any(|tracked| tracked == file) {
        return Err(ProjectError::AlreadyTracked(file.to_string()));
    }

    descriptor.project_files.push(file.to_string());
    Ok(())
}

/// Stops tracking the first entry equal to `file` or whose file name is
/// `file`, and returns it. The last entry takes the removed slot.
pub fn untrack(
    descriptor: &mut ProjectDescriptor,
    base_dir: &Path,
    file: &str,
    delete: bool,
) -> Result<String, ProjectError> {
    let index = descriptor
        .project_files
        .iter()
        .position(|tracked| {
            tracked == file || Path::new(tracked).file_name().is_some_and(|name| name == file)
        })
        .ok_or_else(|| ProjectError::NotTracked(file.to_string()))?;

    let removed = descriptor.project_files.swap_remove(index);
    if delete {
        let path = base_dir.join(&removed);
        fs::remove_file(&path).map_err(ProjectError::io(path))?;
    }

    Ok(removed)
}

/// Creates an empty file (and its parent directories) and tracks it.
pub fn create_file(
    descriptor: &mut ProjectDescriptor,
    base_dir: &Path,
    file: &str,
) -> Result<(), ProjectError> {
    if descriptor.project_files.iter().any(|tracked| tracked == file) {
        return Err(ProjectError::AlreadyTracked(file.to_string()));
    }

    let path = base_dir.join(file);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(ProjectError::io(parent))?;
    }
    File::create(&path).map_err(ProjectError::io(&path))?;

    track(descriptor, file)
}

/// `days == -1` marks the project as having no deadline; otherwise the
/// project is due at 03:59:59 UTC, `days + 1` days after `now`.
pub fn set_due_date(
    descriptor: &mut ProjectDescriptor,
    days: i64,
    now: DateTime<Utc>,
) -> Result<(), ProjectError> {
    if descriptor.due_date != DUE_DATE_NOT_SET {
        return Err(ProjectError::DueDateLocked(descriptor.due_date.clone()));
    }

    if days == -1 {
        descriptor.due_date = NO_DUE_DATE.to_string();
        return Ok(());
    }

    let offset = u64::try_from(days).map_err(|_| ProjectError::InvalidDueOffset(days))?;
    let due = now
        .date_naive()
        .checked_add_days(Days::new(offset + 1))
        .and_then(|date| date.and_hms_opt(3, 59, 59))
        .ok_or(ProjectError::InvalidDueOffset(days))?
        .and_utc();

    descriptor.due_date = due.with_timezone(&Local).format(DUE_DATE_FORMAT).to_string();
    tracing::info!("Project {:?} is due {}", descriptor.project_name, descriptor.due_date);
    Ok(())
}

/// Copies `template` into `base_dir` under its own file name and tracks the
/// copy. Returns the tracked name.
pub fn create_from_template(
    descriptor: &mut ProjectDescriptor,
    base_dir: &Path,
    template: &Path,
) -> Result<String, ProjectError> {
    let file = template
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ProjectError::NotAFile(template.to_path_buf()))?;
    if descriptor.project_files.iter().any(|tracked| *tracked == file) {
        return Err(ProjectError::AlreadyTracked(file));
    }

    let target = base_dir.join(&file);
    fs::copy(template, &target).map_err(ProjectError::io(template))?;
    tracing::debug!("Copied template {} to {}", template.display(), target.display());

    track(descriptor, &file)?;
    Ok(file)
}

pub fn listing(descriptor: &ProjectDescriptor) -> String {
    let files: String = descriptor
        .project_files
        .iter()
        .enumerate()
        .map(|(i, file)| format!("\t{i} - {file}\n"))
        .collect();

    format!(
        "Project Name: {}\nAuthor: {}\nProject Path: {}\nProject Due: {}\nEntry Point: {}\nTest Script: {} {}\nAll files in package:\n{}",
        descriptor.project_name,
        descriptor.author,
        descriptor.project_path,
        descriptor.due_date,
        descriptor.main_file,
        descriptor.executable,
        descriptor.test_script,
        files
    )
}
