//! Loading, saving and editing the `project.toml` descriptor.

pub mod manifest;
pub mod store;

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
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

    #[error("failed to serialize project descriptor: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("the file {0} is already being tracked")]
    AlreadyTracked(String),

    #[error("{0} is not a file")]
    NotAFile(PathBuf),

    #[error("you do not have a file called {0}")]
    NotTracked(String),

    #[error("cannot change the due date of a project, it is already {0:?}")]
    DueDateLocked(String),

    #[error("invalid number of days until due: {0} (use -1 for no due date)")]
    InvalidDueOffset(i64),
}

impl ProjectError {
    fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| ProjectError::Io { path, source }
    }
}
