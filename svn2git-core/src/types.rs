//! Domain types for a snapshot import.
//!
//! Filesystem locations use `PathBuf`. Repository-relative paths are plain
//! `String`s with `/` separators regardless of host platform, since that is
//! the form they take inside a Git tree.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A single file captured from the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Path relative to the snapshot root, `/`-separated.
    pub rel_path: String,
    /// Absolute path the bytes are copied from.
    pub src_path: PathBuf,
    /// Size at extraction time. Advisory only; used for reporting.
    pub size: u64,
}

/// In-memory inventory of a source tree, minus legacy metadata.
///
/// Built once by the extractor and never mutated afterwards. Entries are in
/// traversal order, which is lexicographic within each directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub root: PathBuf,
    pub files: Vec<SnapshotFile>,
}

impl Snapshot {
    /// Number of files in the snapshot.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sum of all recorded file sizes.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Summary statistics for an import run, committed as an audit artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub created_at: DateTime<Utc>,
    pub source_root: PathBuf,
    pub file_count: usize,
    pub total_bytes: u64,
}
