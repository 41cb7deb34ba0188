//! Audit manifest: the plain-text form committed at the root of the staged
//! repository.
//!
//! ```text
//! SVN -> GIT IMPORT MANIFEST
//! Created: 2024-05-01T09:30:00Z
//! SourceRoot: /srv/checkout/trunk
//! FileCount: 42
//! TotalBytes: 133742
//! ```

use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};

use crate::types::Manifest;

/// File name of the audit manifest inside the staged repository.
pub const MANIFEST_FILE_NAME: &str = "SVN_IMPORT_MANIFEST.txt";

const MANIFEST_TITLE: &str = "SVN -> GIT IMPORT MANIFEST";

impl Manifest {
    /// Build a manifest from totals already accumulated by the caller,
    /// stamped with the current time.
    pub fn new(source_root: PathBuf, file_count: usize, total_bytes: u64) -> Self {
        Self {
            created_at: Utc::now(),
            source_root,
            file_count,
            total_bytes,
        }
    }

    /// Render the human-readable audit text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{MANIFEST_TITLE}");
        let _ = writeln!(
            out,
            "Created: {}",
            self.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        let _ = writeln!(out, "SourceRoot: {}", self.source_root.display());
        let _ = writeln!(out, "FileCount: {}", self.file_count);
        let _ = writeln!(out, "TotalBytes: {}", self.total_bytes);
        out
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn render_matches_fixed_layout() {
        let manifest = Manifest {
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            source_root: PathBuf::from("/srv/checkout/trunk"),
            file_count: 42,
            total_bytes: 133_742,
        };
        assert_eq!(
            manifest.render(),
            "SVN -> GIT IMPORT MANIFEST\n\
             Created: 2024-05-01T09:30:00Z\n\
             SourceRoot: /srv/checkout/trunk\n\
             FileCount: 42\n\
             TotalBytes: 133742\n"
        );
    }

    #[test]
    fn new_is_stamped_with_current_time() {
        let before = Utc::now();
        let manifest = Manifest::new(PathBuf::from("/wc"), 2, 100);
        assert_eq!(manifest.file_count, 2);
        assert_eq!(manifest.total_bytes, 100);
        assert_eq!(manifest.source_root, PathBuf::from("/wc"));
        assert!(manifest.created_at >= before);
        assert!(manifest.created_at <= Utc::now());
    }
}
