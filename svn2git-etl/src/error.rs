//! Error types for svn2git-etl.

use std::path::PathBuf;

use thiserror::Error;

use svn2git_core::ErrorKind;
use svn2git_extract::ExtractError;

/// Errors from building the staged repository.
#[derive(Debug, Error)]
pub enum StageError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copying a snapshot file into the working tree failed.
    #[error("copy {rel_path} from {src}: {source}")]
    Copy {
        rel_path: String,
        src: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A libgit2 call failed.
    #[error("git {op} failed: {source}")]
    Git {
        op: &'static str,
        #[source]
        source: git2::Error,
    },

    /// The work area already hosts a repository from an earlier run.
    #[error("work area already contains a repository at {path}")]
    RepositoryExists { path: PathBuf },

    /// A snapshot path that would escape the working tree or land in `.git`.
    #[error("refusing to stage {rel_path:?}: {reason}")]
    UnsafePath { rel_path: String, reason: &'static str },
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Staging
    }
}

/// Errors from publishing the staged repository.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("remote URL is empty")]
    EmptyUrl,

    /// `origin` exists but points somewhere else.
    #[error("remote '{name}' already points at {existing}; refusing to retarget it to {requested}")]
    RemoteConflict {
        name: String,
        existing: String,
        requested: String,
    },

    /// The server asked for credentials again after they were supplied.
    #[error("authentication rejected by {url}: {source}")]
    AuthRejected {
        url: String,
        #[source]
        source: git2::Error,
    },

    /// The server refused to update a reference.
    #[error("push rejected for {refname}: {message}")]
    Rejected { refname: String, message: String },

    /// A libgit2 call failed (transport, TLS, protocol, ...).
    #[error("git {op} failed: {source}")]
    Git {
        op: &'static str,
        #[source]
        source: git2::Error,
    },
}

impl PublishError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PublishError::EmptyUrl => ErrorKind::InvalidInput,
            _ => ErrorKind::Publish,
        }
    }
}

/// Any failure of the extract → stage → publish pipeline.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("extract: {0}")]
    Extract(#[from] ExtractError),

    #[error("transform: {0}")]
    Stage(#[from] StageError),

    #[error("load: {0}")]
    Publish(#[from] PublishError),
}

impl EtlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EtlError::Extract(e) => e.kind(),
            EtlError::Stage(e) => e.kind(),
            EtlError::Publish(e) => e.kind(),
        }
    }
}

/// Convenience constructor for [`StageError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StageError {
    StageError::Io {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_url_is_invalid_input_not_publish_failure() {
        assert_eq!(PublishError::EmptyUrl.kind(), ErrorKind::InvalidInput);
        let rejected = PublishError::Rejected {
            refname: "refs/heads/master".into(),
            message: "non-fast-forward".into(),
        };
        assert_eq!(rejected.kind(), ErrorKind::Publish);
    }

    #[test]
    fn etl_error_forwards_kind_and_context() {
        let err = EtlError::from(io_err("/work/repo", std::io::Error::other("disk full")));
        assert_eq!(err.kind(), ErrorKind::Staging);
        let msg = err.to_string();
        assert!(msg.starts_with("transform: "), "got: {msg}");
        assert!(msg.contains("/work/repo"), "got: {msg}");
    }
}
