//! Snapshot extraction for `svn2git-extract`.
//!
//! [`extract`] walks a working copy depth-first, skips legacy metadata
//! directories, and returns a [`Snapshot`] together with its [`Manifest`].
//! Directory entries are visited in file-name order so repeated runs over the
//! same tree produce identical snapshots.
//!
//! Entries named `.git` (nested checkouts, submodule gitlink files) are always
//! skipped: a Git tree cannot hold them, whatever the metadata filter says.

pub mod filter;

use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Component, Path, PathBuf};

use svn2git_core::{ErrorKind, Manifest, Snapshot, SnapshotFile};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

pub use filter::{AdminDirFilter, MetadataFilter};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from snapshot extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("source not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("source must be a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Traversal failure (permission denied, vanished entry, link loop, ...).
    #[error("walk source failed at {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path { path: PathBuf },
}

impl ExtractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::SourceNotFound { .. } | ExtractError::NotADirectory { .. } => {
                ErrorKind::InvalidInput
            }
            ExtractError::Walk { .. } | ExtractError::Io { .. } | ExtractError::NonUtf8Path { .. } => {
                ErrorKind::Extraction
            }
        }
    }
}

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ExtractError {
    ExtractError::Io {
        path: path.into(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Extract a snapshot of the Subversion working copy at `source_root`.
///
/// Equivalent to [`extract_with`] using [`AdminDirFilter::svn`].
pub fn extract(source_root: &Path) -> Result<(Snapshot, Manifest), ExtractError> {
    extract_with(source_root, &AdminDirFilter::svn())
}

/// Extract a snapshot of `source_root`, skipping every directory `filter`
/// classifies as legacy metadata.
///
/// The walk runs over the canonical root, but the manifest records
/// `source_root` exactly as supplied.
///
/// Fails without returning a partial snapshot if any entry cannot be read.
pub fn extract_with(
    source_root: &Path,
    filter: &dyn MetadataFilter,
) -> Result<(Snapshot, Manifest), ExtractError> {
    let root = resolve_root(source_root)?;

    let mut files = Vec::new();
    let mut total: u64 = 0;

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped(entry, filter));

    for entry in walker {
        let entry = entry.map_err(|e| walk_err(&root, e))?;
        if entry.file_type().is_dir() {
            continue;
        }

        let size = match entry_size(&entry)? {
            Some(size) => size,
            None => {
                tracing::warn!("skipping non-regular entry: {}", entry.path().display());
                continue;
            }
        };
        let rel_path = to_slash_rel_path(&root, entry.path())?;
        tracing::debug!("snapshot: {rel_path} ({size} bytes)");

        total += size;
        files.push(SnapshotFile {
            rel_path,
            src_path: entry.into_path(),
            size,
        });
    }

    let manifest = Manifest::new(source_root.to_path_buf(), files.len(), total);
    let snapshot = Snapshot { root, files };

    tracing::info!(
        "extracted {} file(s), {} byte(s) from {}",
        manifest.file_count,
        manifest.total_bytes,
        source_root.display()
    );
    Ok((snapshot, manifest))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve_root(source_root: &Path) -> Result<PathBuf, ExtractError> {
    let root = match fs::canonicalize(source_root) {
        Ok(root) => root,
        Err(err) if err.kind() == IoErrorKind::NotFound => {
            return Err(ExtractError::SourceNotFound {
                path: source_root.to_path_buf(),
            })
        }
        Err(err) => return Err(io_err(source_root, err)),
    };
    let meta = fs::metadata(&root).map_err(|e| io_err(&root, e))?;
    if !meta.is_dir() {
        return Err(ExtractError::NotADirectory {
            path: source_root.to_path_buf(),
        });
    }
    Ok(root)
}

/// Name Git reserves for its own administrative data.
const GIT_DIR_NAME: &str = ".git";

/// The root itself is never skipped, even if it happens to be named `.svn`.
fn is_skipped(entry: &DirEntry, filter: &dyn MetadataFilter) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    if is_git_admin(entry.file_name()) {
        tracing::warn!("skipping nested Git metadata: {}", entry.path().display());
        return true;
    }
    entry.file_type().is_dir() && filter.is_metadata_dir(entry.file_name())
}

fn is_git_admin(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|name| name.eq_ignore_ascii_case(GIT_DIR_NAME))
}

/// Size of the bytes that will be copied for `entry`, or `None` for entries
/// that have no byte content to copy (symlinks to directories, sockets, ...).
///
/// Symlinks are resolved; a dangling link is an error.
fn entry_size(entry: &DirEntry) -> Result<Option<u64>, ExtractError> {
    let meta = if entry.path_is_symlink() {
        fs::metadata(entry.path()).map_err(|e| io_err(entry.path(), e))?
    } else {
        entry.metadata().map_err(|e| walk_err(entry.path(), e))?
    };
    Ok(meta.is_file().then(|| meta.len()))
}

fn to_slash_rel_path(root: &Path, path: &Path) -> Result<String, ExtractError> {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let mut parts = Vec::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            let part = part.to_str().ok_or_else(|| ExtractError::NonUtf8Path {
                path: path.to_path_buf(),
            })?;
            parts.push(part);
        }
    }
    Ok(parts.join("/"))
}

fn walk_err(fallback: &Path, source: walkdir::Error) -> ExtractError {
    let path = source
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| fallback.to_path_buf());
    ExtractError::Walk { path, source }
}
