//! Recursive discovery of feature and step-definition files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::EditorError;

/// Extension of feature files.
pub const FEATURE_EXTENSION: &str = "feature";
/// Extension of automation source files holding step definitions.
pub const DEFINITION_EXTENSION: &str = "rb";

/// Collect files below `root` whose extension is `extension`.
///
/// A file path is returned as-is regardless of its extension, so callers can
/// name individual files explicitly. Directories are walked recursively,
/// skipping hidden entries, and results are sorted so imports are
/// deterministic.
///
/// # Errors
///
/// Returns `EditorError::Io` when `root` or a directory below it cannot be
/// read.
///
/// # Examples
///
/// ```ignore
/// use std::path::Path;
/// use qcumber_editor::discovery::{FEATURE_EXTENSION, discover_files};
///
/// for path in discover_files(Path::new("features"), FEATURE_EXTENSION)? {
///     println!("{}", path.display());
/// }
/// ```
pub fn discover_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>, EditorError> {
    if fs::metadata(root)?.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
    for next in walker {
        let Some(entry) = next.map_or_else(convert_walkdir_error, |entry| Ok(Some(entry)))? else {
            continue;
        };
        if !entry.file_type().is_dir() && has_extension(entry.path(), extension) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    debug!(root = %root.display(), files = found.len(), extension, "discovered files");
    Ok(found)
}

/// Symlink loops are skipped; every other walk error is fatal.
fn convert_walkdir_error(err: walkdir::Error) -> Result<Option<DirEntry>, EditorError> {
    if err.loop_ancestor().is_some() {
        return Ok(None);
    }
    let message = err.to_string();
    Err(EditorError::Io(
        err.into_io_error()
            .unwrap_or_else(|| io::Error::other(message)),
    ))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
