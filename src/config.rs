//! User-level configuration: the registry of known projects and the code
//! templates that `create template:<name>` copies from.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILE, TEMPLATES_DIR};
use crate::core::domain::ProjectDescriptor;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize app config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("the template {0} already exists")]
    TemplateExists(String),

    #[error("the template {0} does not exist")]
    UnknownTemplate(String),

    #[error("{0} is not a file")]
    NotAFile(PathBuf),
}

impl ConfigError {
    fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| ConfigError::Io { path, source }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppConfig {
    #[serde(default)]
    pub projects: BTreeMap<String, RegisteredProject>,
    #[serde(default)]
    pub templates: BTreeMap<String, Template>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisteredProject {
    pub name: String,
    pub owner: String,
    pub toml_path: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    pub name: String,
    pub language: String,
    pub path: String,
}

/// `$XDG_CONFIG_HOME`, then `~/.config`, then `%APPDATA%`.
pub fn default_dir() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .or_else(|| std::env::var_os("APPDATA").map(PathBuf::from))?;
    Some(base.join(CONFIG_DIR_NAME))
}

/// A missing config file yields an empty config.
pub fn load(dir: &Path) -> Result<AppConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("No app config at {}, starting empty", path.display());
            return Ok(AppConfig::default());
        }
        Err(e) => return Err(ConfigError::Io { path, source: e }),
    };

    toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
}

pub fn save(dir: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    fs::create_dir_all(dir).map_err(ConfigError::io(dir))?;
    let path = dir.join(CONFIG_FILE);
    fs::write(&path, toml::to_string(config)?).map_err(ConfigError::io(&path))
}

/// Records the project under its name. Returns `false` when a project with
/// that name is already registered; the existing entry is left as is.
pub fn register_project(
    config: &mut AppConfig,
    descriptor: &ProjectDescriptor,
    descriptor_path: &Path,
) -> bool {
    if config.projects.contains_key(&descriptor.project_name) {
        return false;
    }

    config.projects.insert(
        descriptor.project_name.clone(),
        RegisteredProject {
            name: descriptor.project_name.clone(),
            owner: descriptor.author.clone(),
            toml_path: descriptor_path.to_string_lossy().replace('\\', "/"),
        },
    );
    tracing::info!("Registered project {:?}", descriptor.project_name);
    true
}

/// Copies `source` into `<dir>/templates/<name>/` and registers it.
pub fn add_template<'a>(
    config: &'a mut AppConfig,
    dir: &Path,
    name: &str,
    language: &str,
    source: &Path,
) -> Result<&'a Template, ConfigError> {
    if config.templates.contains_key(name) {
        return Err(ConfigError::TemplateExists(name.to_string()));
    }
    let file_name = match source.file_name() {
        Some(file_name) if source.is_file() => file_name,
        _ => return Err(ConfigError::NotAFile(source.to_path_buf())),
    };

    let store = dir.join(TEMPLATES_DIR).join(name);
    fs::create_dir_all(&store).map_err(ConfigError::io(&store))?;
    let stored = store.join(file_name);
    let bytes = fs::copy(source, &stored).map_err(ConfigError::io(source))?;
    tracing::info!("Copied {} bytes from {} to {}", bytes, source.display(), stored.display());

    let template = Template {
        name: name.to_string(),
        language: language.to_string(),
        path: stored.to_string_lossy().replace('\\', "/"),
    };
    Ok(config.templates.entry(name.to_string()).or_insert(template))
}

pub fn template<'a>(config: &'a AppConfig, name: &str) -> Result<&'a Template, ConfigError> {
    config
        .templates
        .get(name)
        .ok_or_else(|| ConfigError::UnknownTemplate(name.to_string()))
}

pub fn list_projects(config: &AppConfig) -> String {
    config
        .projects
        .iter()
        .map(|(name, project)| format!("{name} - {}\n", project.toml_path))
        .collect()
}

pub fn list_templates(config: &AppConfig) -> String {
    config
        .templates
        .iter()
        .map(|(name, template)| format!("[{}] {name} - {}\n", template.language, template.path))
        .collect()
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::project::store::{NewProject, new_descriptor};

    fn create_descriptor(name: &str) -> ProjectDescriptor {
        new_descriptor(NewProject {
            name: name.to_string(),
            author: "A. Student".to_string(),
            main_file: "main.py".to_string(),
            required_passes: 1,
            timeout_seconds: 2,
            count_execution_as_pass: true,
        })
    }

    #[test]
    fn test_missing_config_is_empty() {
        let dir = TempDir::new().unwrap();

        let config = load(&dir.path().join("nowhere")).unwrap();

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_config_with_extra_fields() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
AppVersion = "v1.0"
AutoUpdate = false
UserName = ""
[Projects]
[Projects.lab1]
Name = "lab1"
Owner = "A. Student"
TomlPath = "/home/student/lab1/project.toml"
[Modules]
[Templates]
"#,
        )
        .unwrap();

        let config = load(dir.path()).unwrap();

        assert_eq!(config.projects["lab1"].owner, "A. Student");
        assert!(config.templates.is_empty());
    }

    #[test]
    fn test_malformed_config_is_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "Projects = 3\n").unwrap();

        let err = load(dir.path()).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_register_project_once() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        let descriptor = create_descriptor("lab1");

        assert!(register_project(&mut config, &descriptor, Path::new("/work/lab1/project.toml")));
        assert!(!register_project(&mut config, &descriptor, Path::new("/elsewhere/project.toml")));
        save(dir.path(), &config).unwrap();

        let loaded = load(dir.path()).unwrap();
        assert_eq!(loaded.projects.len(), 1);
        assert_eq!(loaded.projects["lab1"].toml_path, "/work/lab1/project.toml");
        assert_eq!(list_projects(&loaded), "lab1 - /work/lab1/project.toml\n");
    }

    #[test]
    fn test_add_template_copies_source() {
        let dir = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        let source = src.path().join("skeleton.py");
        fs::write(&source, "print('hello')\n").unwrap();
        let mut config = AppConfig::default();

        let added = add_template(&mut config, dir.path(), "py", "python", &source)
            .unwrap()
            .clone();

        let stored = dir.path().join("templates/py/skeleton.py");
        assert_eq!(Path::new(&added.path), stored);
        assert_eq!(fs::read_to_string(&stored).unwrap(), "print('hello')\n");
        assert_eq!(added.language, "python");
        assert_eq!(
            list_templates(&config),
            format!("[python] py - {}\n", stored.display())
        );

        // The copy survives changes to the source.
        fs::remove_file(&source).unwrap();
        assert_eq!(template(&config, "py").unwrap(), &added);
    }

    #[test]
    fn test_add_template_refuses_duplicates_and_directories() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("skeleton.py");
        fs::write(&source, "").unwrap();
        let mut config = AppConfig::default();

        add_template(&mut config, dir.path(), "py", "python", &source).unwrap();
        let err = add_template(&mut config, dir.path(), "py", "python", &source).unwrap_err();
        assert!(matches!(err, ConfigError::TemplateExists(ref n) if n == "py"));

        let err = add_template(&mut config, dir.path(), "dir", "python", dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NotAFile(_)));
        assert_eq!(config.templates.len(), 1);
    }

    #[test]
    fn test_unknown_template() {
        let err = template(&AppConfig::default(), "rust").unwrap_err();

        assert!(matches!(err, ConfigError::UnknownTemplate(ref n) if n == "rust"));
    }
}
