use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use zip::ZipArchive;

use crate::archive::ArchiveError;

/// Extracts `archive` into `<base_dir>/<archive stem>` and returns that
/// directory.
///
/// Any entry resolving outside the destination aborts the extraction.
/// Entries written before the offending one stay on disk.
#[tracing::instrument]
pub fn unpack(archive: &Path, base_dir: &Path) -> Result<PathBuf, ArchiveError> {
    let Some(stem) = archive.file_stem() else {
        return Err(ArchiveError::NotAFile {
            path: archive.to_path_buf(),
        });
    };

    let file = File::open(archive).map_err(ArchiveError::io(archive))?;
    let mut zip = ZipArchive::new(file).map_err(ArchiveError::zip(archive))?;

    let destination = normalize(&base_dir.join(stem));
    fs::create_dir_all(&destination).map_err(ArchiveError::io(&destination))?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(ArchiveError::zip(archive))?;
        let name = entry.name().to_string();
        let target = normalize(&destination.join(&name));
        tracing::info!("Unzipping {}", target.display());

        if target == destination || !target.starts_with(&destination) {
            tracing::error!("Invalid file path in archive: {:?}", name);
            return Err(ArchiveError::InvalidPath {
                entry: name,
                destination,
            });
        }

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(ArchiveError::io(&target))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(ArchiveError::io(parent))?;
        }

        let mut out = File::create(&target).map_err(ArchiveError::io(&target))?;
        io::copy(&mut entry, &mut out).map_err(ArchiveError::io(&target))?;

        if let Some(mode) = entry.unix_mode() {
            apply_mode(&target, mode).map_err(ArchiveError::io(&target))?;
        }
    }

    Ok(destination)
}

/// Resolves `.` and `..` lexically, without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
