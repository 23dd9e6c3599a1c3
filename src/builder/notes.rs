use std::{
    collections::BTreeMap,
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use crate::{
    anki::AnkiConnect,
    assets::encode_json_gz,
    core::KikuError,
    notes::{
        Note,
        NotesChunk,
        NotesManifest,
    },
    persistence::save_json_at,
};

pub const DEFAULT_CHUNK_COUNT: usize = 10;
pub const MANIFEST_FILE: &str = "_kiku_notes_manifest.json";

pub fn chunk_file_name(index: usize) -> String {
    format!("_kiku_notes_{}.json.gz", index)
}

/// Notes split into chunks, ready to be written out.
#[derive(Debug, Clone, PartialEq)]
pub struct NotesExport {
    pub manifest: NotesManifest,
    pub chunks: Vec<(String, Vec<Note>)>,
}

/// Buckets notes by `noteId % chunk_count`. Empty buckets produce no file and
/// no manifest entry.
pub fn partition_notes(
    notes: Vec<Note>,
    profile: &str,
    chunk_count: usize,
    generated_at: f64,
) -> Result<NotesExport, KikuError> {
    if chunk_count == 0 {
        return Err(KikuError::Custom("chunk count must be at least 1".to_string()));
    }
    if notes.is_empty() {
        return Err(KikuError::Custom("No notes found.".to_string()));
    }

    let mut buckets: BTreeMap<usize, Vec<Note>> = BTreeMap::new();
    for mut note in notes {
        note.profile = profile.to_string();
        buckets.entry((note.note_id % chunk_count as u64) as usize).or_default().push(note);
    }

    let mut manifest_chunks = Vec::new();
    let mut chunks = Vec::new();
    for (index, notes) in buckets {
        let ids = notes.iter().map(|n| n.note_id);
        let range = [ids.clone().min().unwrap_or_default(), ids.max().unwrap_or_default()];
        let file = chunk_file_name(index);
        manifest_chunks.push(NotesChunk { file: file.clone(), count: notes.len(), range });
        chunks.push((file, notes));
    }

    let manifest = NotesManifest {
        profile: profile.to_string(),
        total_notes: manifest_chunks.iter().map(|c| c.count).sum(),
        chunk_count: Some(chunk_count),
        chunks: manifest_chunks,
        generated_at,
    };
    Ok(NotesExport { manifest, chunks })
}

/// Writes every chunk gzip-compressed, then the manifest. Returns the
/// manifest path.
pub fn write_export(export: &NotesExport, dir: &Path) -> Result<PathBuf, KikuError> {
    fs::create_dir_all(dir)?;
    for (file, notes) in &export.chunks {
        fs::write(dir.join(file), encode_json_gz(notes)?)?;
    }

    let manifest_path = dir.join(MANIFEST_FILE);
    save_json_at(&export.manifest, &manifest_path).map_err(|e| KikuError::Custom(e.to_string()))?;
    Ok(manifest_path)
}

/// Pulls every note from the collection over AnkiConnect and writes the
/// chunked export into `dir`.
pub async fn export_notes(
    anki: &AnkiConnect,
    dir: &Path,
    chunk_count: usize,
    profile: Option<String>,
) -> Result<NotesManifest, KikuError> {
    let profile = match profile {
        Some(profile) => profile,
        None => anki.get_active_profile().await?,
    };
    let notes = anki.find_notes_info("deck:*").await?;
    tracing::info!(notes = notes.len(), chunk_count, "exporting notes");

    let generated_at = chrono::Utc::now().timestamp_millis() as f64;
    let export = partition_notes(notes, &profile, chunk_count, generated_at)?;
    let manifest_path = write_export(&export, dir)?;
    tracing::info!(
        path = %manifest_path.display(),
        "Exported {} notes in {} chunks",
        export.manifest.total_notes,
        export.chunks.len()
    );
    Ok(export.manifest)
}
