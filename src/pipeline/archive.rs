//! In-memory archive assembly: a gzip-compressed tar of generated files.

use std::io::Read;
use std::path::{Component, Path};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Archive, Builder, Header};

use crate::error::ArchiveError;
use crate::pipeline::{EndpointRecord, GeneratedFile};

/// Synthetic archive entry holding the serialized endpoint map.
pub const API_MAP_PATH: &str = "api_map.json";

/// Bundles files (plus `api_map.json` when endpoints exist) into a `.tar.gz`.
///
/// Entries are written in input order. Entries whose path is absolute or
/// contains a parent-directory component are skipped with a warning rather
/// than written as-is. Duplicate paths are all written; extraction gives the
/// last one.
///
/// # Errors
///
/// Returns [`ArchiveError`] when writing the compressed container or
/// serializing the endpoint map fails; there is no partial-archive recovery.
pub fn build_archive(
    files: &[GeneratedFile],
    endpoints: &[EndpointRecord],
) -> Result<Vec<u8>, ArchiveError> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = Builder::new(encoder);

    for file in files {
        let Some(path) = safe_entry_path(&file.path) else {
            log::warn!("skipping archive entry with unsafe path: {}", file.path);
            continue;
        };
        append_entry(&mut builder, path, file.content.as_bytes())?;
    }

    if !endpoints.is_empty() {
        let json = serde_json::to_vec_pretty(endpoints)?;
        append_entry(&mut builder, API_MAP_PATH, &json)?;
    }

    let encoder = builder.into_inner()?;
    Ok(encoder.finish()?)
}

/// Reads an archive produced by [`build_archive`] back into file records.
///
/// For duplicate paths the last entry wins, matching what an unpacker would
/// leave on disk.
///
/// # Errors
///
/// Returns [`ArchiveError`] when the bytes are not a readable gzip tar.
pub fn read_archive(bytes: &[u8]) -> Result<Vec<GeneratedFile>, ArchiveError> {
    let mut archive = Archive::new(GzDecoder::new(bytes));
    let mut files: Vec<GeneratedFile> = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.to_string_lossy().into_owned();
        let mut content = String::new();
        entry.read_to_string(&mut content)?;

        if let Some(existing) = files.iter_mut().find(|file| file.path == path) {
            existing.content = content;
        } else {
            files.push(GeneratedFile { path, content });
        }
    }

    Ok(files)
}

/// Appends one regular-file entry with conventional permissions.
fn append_entry(
    builder: &mut Builder<GzEncoder<Vec<u8>>>,
    path: &str,
    bytes: &[u8],
) -> Result<(), ArchiveError> {
    let mut header = Header::new_gnu();
    header.set_size(bytes.len() as u64);
    header.set_mode(0o644);
    builder.append_data(&mut header, path, bytes)?;
    Ok(())
}

/// Validates an entry path: relative, no parent-directory components.
///
/// Returns the path with a redundant leading `./` removed, or `None` when
/// the entry must be skipped.
fn safe_entry_path(path: &str) -> Option<&str> {
    let trimmed = path.strip_prefix("./").unwrap_or(path);
    if trimmed.is_empty() {
        return None;
    }
    let has_unsafe = Path::new(trimmed)
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
    if has_unsafe {
        None
    } else {
        Some(trimmed)
    }
}
