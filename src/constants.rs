pub const DEFAULT_PROJECT_FILE: &str = "project.toml";
pub const DEFAULT_TEST_SCRIPT: &str = "test.py";
pub const DEFAULT_EXECUTABLE: &str = "python";

/// `DueDate` value of a project that never had a deadline assigned.
pub const DUE_DATE_NOT_SET: &str = "not_set";
/// `DueDate` value of a project explicitly marked as having no deadline.
pub const NO_DUE_DATE: &str = "no due date";

pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const ARCHIVE_EXTENSION: &str = "zip";

/// Directory under the user config dir holding the registry and templates.
pub const CONFIG_DIR_NAME: &str = ".project_packer";
pub const CONFIG_FILE: &str = "config.toml";
pub const TEMPLATES_DIR: &str = "templates";
/// `create` argument prefix selecting a registered template.
pub const TEMPLATE_PREFIX: &str = "template:";
