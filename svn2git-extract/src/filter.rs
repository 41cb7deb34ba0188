//! Legacy metadata directory predicates.
//!
//! The extractor consults a [`MetadataFilter`] for every directory it meets.
//! Swapping the filter is all it takes to point the same pipeline at a
//! different legacy system's working copy layout.

use std::ffi::OsStr;

/// Decides whether a directory holds legacy VCS administrative data.
pub trait MetadataFilter {
    /// Returns `true` if a directory named `name` must be skipped entirely.
    fn is_metadata_dir(&self, name: &OsStr) -> bool;
}

/// Skips directories whose name matches one of a fixed set, ignoring ASCII
/// case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminDirFilter {
    names: Vec<String>,
}

impl AdminDirFilter {
    /// Name of the Subversion administrative directory.
    pub const SVN: &'static str = ".svn";

    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Filter for Subversion working copies (`.svn`).
    pub fn svn() -> Self {
        Self::new([Self::SVN])
    }
}

impl Default for AdminDirFilter {
    fn default() -> Self {
        Self::svn()
    }
}

impl MetadataFilter for AdminDirFilter {
    fn is_metadata_dir(&self, name: &OsStr) -> bool {
        // Non-UTF-8 names can never equal one of our ASCII names.
        let Some(name) = name.to_str() else {
            return false;
        };
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

impl<F> MetadataFilter for F
where
    F: Fn(&OsStr) -> bool,
{
    fn is_metadata_dir(&self, name: &OsStr) -> bool {
        self(name)
    }
}
