use std::{
    fs::{
        self,
        File,
    },
    io::BufReader,
    path::{
        Path,
        PathBuf,
    },
};

use tar::{
    Archive,
    Builder,
};

use crate::{
    core::KikuError,
    kanji::{
        DbBundleManifest,
        FileRange,
    },
    persistence::save_json_at,
};

/// Packs `files` into a tar archive at `archive_path` and records where each
/// file's bytes landed, so a reader can fetch one of them with a single
/// ranged request. Entries are named by file name.
pub fn pack_bundle(
    files: &[PathBuf],
    archive_path: &Path,
    manifest_path: &Path,
) -> Result<DbBundleManifest, KikuError> {
    let mut builder = Builder::new(File::create(archive_path)?);
    for path in files {
        let name = path
            .file_name()
            .ok_or_else(|| KikuError::Custom(format!("not a file: {}", path.display())))?;
        if fs::metadata(path)?.len() == 0 {
            return Err(KikuError::Custom(format!("cannot pack empty file {}", path.display())));
        }
        builder.append_path_with_name(path, name)?;
    }
    builder.into_inner()?.sync_all()?;

    let manifest = read_ranges(archive_path)?;
    save_json_at(&manifest, manifest_path).map_err(|e| KikuError::Custom(e.to_string()))?;
    tracing::info!(
        archive = %archive_path.display(),
        files = manifest.files.len(),
        "bundle packed"
    );
    Ok(manifest)
}

/// Byte span of every entry's data in an existing archive.
pub fn read_ranges(archive_path: &Path) -> Result<DbBundleManifest, KikuError> {
    let mut archive = Archive::new(BufReader::new(File::open(archive_path)?));
    let mut manifest = DbBundleManifest::default();
    for entry in archive.entries()? {
        let entry = entry?;
        let name = entry.path()?.to_string_lossy().into_owned();
        let start = entry.raw_file_position();
        let size = entry.size();
        if size == 0 {
            continue;
        }
        manifest.files.insert(name, FileRange { start, end: start + size - 1, size });
    }
    Ok(manifest)
}
