use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::archive::ArchiveError;

/// Writes one archive entry per tracked file, in order. Each path is read
/// relative to `base_dir` and stored under the same relative name.
///
/// Every source is checked before the archive is created, so a missing
/// file leaves no archive behind.
#[tracing::instrument(skip(files), fields(files = files.len()))]
pub fn pack(archive: &Path, base_dir: &Path, files: &[String]) -> Result<(), ArchiveError> {
    let sources = files
        .iter()
        .map(|file| resolve_source(base_dir, file))
        .collect::<Result<Vec<_>, _>>()?;

    let out = File::create(archive).map_err(ArchiveError::io(archive))?;
    let mut writer = ZipWriter::new(out);

    for (file, (source, mode)) in files.iter().zip(&sources) {
        tracing::info!("Compressing {}", source.display());

        let mut input = File::open(source).map_err(ArchiveError::io(source))?;
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(*mode);

        writer
            .start_file(entry_name(file), options)
            .map_err(ArchiveError::zip(archive))?;
        io::copy(&mut input, &mut writer).map_err(ArchiveError::io(source))?;
    }

    writer.finish().map_err(ArchiveError::zip(archive))?;
    Ok(())
}

fn resolve_source(base_dir: &Path, file: &str) -> Result<(PathBuf, u32), ArchiveError> {
    let path = base_dir.join(file);
    let metadata = fs::metadata(&path).map_err(ArchiveError::io(&path))?;
    if !metadata.is_file() {
        return Err(ArchiveError::NotAFile { path });
    }

    Ok((path, permission_bits(&metadata)))
}

/// Entry names always use forward slashes.
fn entry_name(file: &str) -> String {
    file.replace('\\', "/")
}

#[cfg(unix)]
fn permission_bits(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn permission_bits(_metadata: &fs::Metadata) -> u32 {
    0o644
}
