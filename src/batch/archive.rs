//! ZIP packaging of a batch's outputs

use crate::error::{Error, Result};
use crate::utils::sanitize_filename;
use lofty::prelude::*;
use lofty::probe::Probe;
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write `files` into a deflated archive at `zip_path` and return its bytes
///
/// Entries keep the order of `files`. Each entry is named after the file's
/// title tag (sanitized, `_N`-suffixed on duplicates), or the on-disk name
/// if the tag can't be read. The archive file is deleted before returning,
/// whether or not packaging succeeded.
///
/// Blocking; run it on the blocking pool.
pub fn build_archive(zip_path: &Path, files: &[PathBuf], extension: &str) -> Result<Vec<u8>> {
    let written = write_archive(zip_path, files, extension)
        .and_then(|()| std::fs::read(zip_path).map_err(|e| archive_error(zip_path, e)));

    if let Err(e) = std::fs::remove_file(zip_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = ?zip_path, error = %e, "failed to remove archive file");
        }
    }

    let bytes = written?;
    debug!(path = ?zip_path, entries = files.len(), size = bytes.len(), "archive built");
    Ok(bytes)
}

fn write_archive(zip_path: &Path, files: &[PathBuf], extension: &str) -> Result<()> {
    let out = File::create(zip_path).map_err(|e| archive_error(zip_path, e))?;
    let mut writer = ZipWriter::new(out);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut used = HashSet::new();
    for path in files {
        let name = unique_entry_name(&entry_stem(path), extension, &mut used);
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| archive_error(zip_path, e))?;
        let mut input = File::open(path).map_err(|e| archive_error(path, e))?;
        std::io::copy(&mut input, &mut writer).map_err(|e| archive_error(path, e))?;
        debug!(entry = %name, source = ?path, "added archive entry");
    }

    let mut out = writer.finish().map_err(|e| archive_error(zip_path, e))?;
    out.flush().map_err(|e| archive_error(zip_path, e))?;
    Ok(())
}

/// Stem for an entry: sanitized title tag, else the file's own stem
fn entry_stem(path: &Path) -> String {
    let from_tag = tag_title(path)
        .map(|title| sanitize_filename(&title))
        .filter(|s| !s.is_empty());

    from_tag.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "track".to_string())
    })
}

fn tag_title(path: &Path) -> Option<String> {
    let tagged = Probe::open(path).ok()?.read().ok()?;
    let tag = tagged.primary_tag().or_else(|| tagged.first_tag())?;
    tag.title().map(|t| t.to_string())
}

fn unique_entry_name(stem: &str, extension: &str, used: &mut HashSet<String>) -> String {
    let mut name = format!("{}.{}", stem, extension);
    let mut n = 1;
    while !used.insert(name.clone()) {
        name = format!("{}_{}.{}", stem, n, extension);
        n += 1;
    }
    name
}

fn archive_error(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Archive(format!("{}: {}", path.display(), e))
}
