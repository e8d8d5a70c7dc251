use std::fs;
use std::path::Path;

use crate::constants::{DEFAULT_EXECUTABLE, DEFAULT_PROJECT_FILE, DEFAULT_TEST_SCRIPT, DUE_DATE_NOT_SET};
use crate::core::domain::ProjectDescriptor;
use crate::project::ProjectError;

#[derive(Clone, Debug)]
pub struct NewProject {
    pub name: String,
    pub author: String,
    pub main_file: String,
    pub required_passes: u32,
    pub timeout_seconds: u64,
    pub count_execution_as_pass: bool,
}

pub fn new_descriptor(project: NewProject) -> ProjectDescriptor {
    ProjectDescriptor {
        project_name: project.name,
        author: project.author,
        project_path: String::new(),
        due_date: DUE_DATE_NOT_SET.to_string(),
        main_file: project.main_file,
        test_script: DEFAULT_TEST_SCRIPT.to_string(),
        executable: DEFAULT_EXECUTABLE.to_string(),
        project_files: vec![DEFAULT_PROJECT_FILE.to_string()],
        expected_outputs: vec!["hello".to_string(), "world".to_string()],
        required_passes: project.required_passes,
        timeout_seconds: project.timeout_seconds,
        count_execution_as_pass: project.count_execution_as_pass,
    }
}

/// Reads the descriptor and points `ProjectPath` at `working_dir`.
pub fn load(path: &Path, working_dir: &Path) -> Result<ProjectDescriptor, ProjectError> {
    let text = fs::read_to_string(path).map_err(ProjectError::io(path))?;
    let mut descriptor: ProjectDescriptor =
        toml::from_str(&text).map_err(|source| ProjectError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    descriptor.project_path = working_dir.to_string_lossy().replace('\\', "/");
    tracing::debug!("Loaded project {:?} from {}", descriptor.project_name, path.display());
    Ok(descriptor)
}

pub fn save(path: &Path, descriptor: &ProjectDescriptor) -> Result<(), ProjectError> {
    let text = toml::to_string(descriptor)?;
    fs::write(path, text).map_err(ProjectError::io(path))?;
    tracing::debug!("Saved project {:?} to {}", descriptor.project_name, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const DESCRIPTOR: &str = r#"
ProjectName = "dummy_project"
Author = "A. Student"
DueDate = "not_set"
MainFile = "main.py"
TestScript = "test.py"
Executable = "python"
ProjFiles = ["project.toml"]
ExpectedOutPuts = ["hello", "world"]
RequiredPasses = 3
TimeOutAfterSeconds = 2
CountExecutionAsPass = true
"#;

    #[test]
    fn test_load_descriptor_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("project.toml");
        fs::write(&path, DESCRIPTOR).unwrap();

        let descriptor = load(&path, Path::new("/home/student/cs101")).unwrap();

        assert_eq!(descriptor.project_name, "dummy_project");
        assert_eq!(descriptor.project_path, "/home/student/cs101");
        assert_eq!(descriptor.project_files, vec!["project.toml".to_string()]);
        assert_eq!(descriptor.expected_outputs, vec!["hello".to_string(), "world".to_string()]);
        assert_eq!(descriptor.required_passes, 3);
        assert_eq!(descriptor.timeout_seconds, 2);
        assert!(descriptor.count_execution_as_pass);
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("project.toml");
        fs::write(&path, DESCRIPTOR.replace("RequiredPasses = 3\n", "")).unwrap();

        let err = load(&path, dir.path()).unwrap_err();

        assert!(matches!(err, ProjectError::Parse { .. }));
        assert!(err.to_string().contains("RequiredPasses"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("project.toml"), dir.path()).unwrap_err();

        assert!(matches!(err, ProjectError::Io { .. }));
    }

    #[test]
    fn test_save_then_load_keeps_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("project.toml");

        let mut descriptor = new_descriptor(NewProject {
            name: "lab3".to_string(),
            author: "A. Student".to_string(),
            main_file: "lab3.py".to_string(),
            required_passes: 2,
            timeout_seconds: 5,
            count_execution_as_pass: false,
        });
        descriptor.project_files.push("lab3.py".to_string());
        save(&path, &descriptor).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("TimeOutAfterSeconds = 5"));
        assert!(text.contains("ExpectedOutPuts"));

        let loaded = load(&path, dir.path()).unwrap();
        assert_eq!(loaded.project_files, descriptor.project_files);
        assert_eq!(loaded.due_date, DUE_DATE_NOT_SET);
    }
}
