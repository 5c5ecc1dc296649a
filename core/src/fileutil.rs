//! File Utility Functions

use std::path::{Path, PathBuf};

/// Returns the file name of a path without its extension. Falls back to `"level"` when the path has no usable
/// file name.
///
/// * `path` - The path.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(String::from)
        .unwrap_or_else(|| String::from("level"))
}

/// Returns a path in the same directory as `path` whose file name is the stem of `path` followed by `suffix`.
///
/// * `path`   - The input path.
/// * `suffix` - Text appended to the stem (including any extension).
pub fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let name = format!("{}{}", file_stem(path), suffix);
    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Returns true if the path has the given extension (case-insensitive).
///
/// * `path`      - The path.
/// * `extension` - Extension without the leading dot.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(extension))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
