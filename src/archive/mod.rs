//! Zip packing and path-checked unpacking of tracked project files.

pub mod pack;
pub mod unpack;

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not a readable regular file")]
    NotAFile { path: PathBuf },

    #[error("archive {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("invalid file path {entry:?}: escapes {destination}")]
    InvalidPath { entry: String, destination: PathBuf },
}

impl ArchiveError {
    fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| ArchiveError::Io { path, source }
    }

    fn zip(path: impl Into<PathBuf>) -> impl FnOnce(zip::result::ZipError) -> Self {
        let path = path.into();
        move |source| ArchiveError::Zip { path, source }
    }
}
