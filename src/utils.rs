//! Utility functions for filename handling

use std::path::{Path, PathBuf};

/// Maximum number of suffixes tried when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Reduce a string to a safe filename stem
///
/// Keeps ASCII letters, digits, space, `-` and `_`, then trims surrounding
/// whitespace. The function is idempotent.
///
/// # Examples
///
/// ```
/// use tubeaudio::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("AC/DC: Back in Black (Live)"), "ACDC Back in Black Live");
/// assert_eq!(sanitize_filename(&sanitize_filename("a/b")), sanitize_filename("a/b"));
/// ```
#[must_use]
pub fn sanitize_filename(s: &str) -> String {
    let kept: String = s
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim().to_string()
}

/// Find a path `<dir>/<stem>.<ext>` that doesn't exist yet
///
/// If the plain name is taken, `_1`, `_2`, ... are appended to the stem.
/// Suffixes use only characters that survive [`sanitize_filename`].
/// Returns `None` if every candidate up to the attempt limit exists.
pub fn get_unique_path(dir: &Path, stem: &str, ext: &str) -> Option<PathBuf> {
    let path = dir.join(format!("{}.{}", stem, ext));
    if !path.exists() {
        return Some(path);
    }

    (1..=MAX_RENAME_ATTEMPTS)
        .map(|i| dir.join(format!("{}_{}.{}", stem, i, ext)))
        .find(|candidate| !candidate.exists())
}

/// Parse the four-digit year out of a `YYYYMMDD` (or `YYYY-MM-DD`) date
pub fn year_from_upload_date(date: &str) -> Option<u32> {
    let year = date.get(..4)?;
    if year.chars().all(|c| c.is_ascii_digit()) {
        year.parse().ok()
    } else {
        None
    }
}
