//! Failure classification shared by all svn2git crates.

use std::fmt;

use serde::Serialize;

/// Coarse category of a pipeline failure.
///
/// Every crate-level error type maps onto one of these via a `kind()`
/// accessor, so callers can branch on the category without matching on each
/// crate's variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or non-directory source, empty remote URL, and similar.
    InvalidInput,
    /// I/O error while walking the source tree.
    Extraction,
    /// Work-area, repository init, file copy or commit failure.
    Staging,
    /// Remote registration, authentication or transport failure.
    Publish,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Extraction => "extraction failure",
            ErrorKind::Staging => "staging failure",
            ErrorKind::Publish => "publish failure",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_human_readable() {
        assert_eq!(ErrorKind::InvalidInput.to_string(), "invalid input");
        assert_eq!(ErrorKind::Publish.to_string(), "publish failure");
    }
}
