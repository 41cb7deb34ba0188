//! svn2git core library: domain types shared by every pipeline stage.
//!
//! - [`types`]: [`Snapshot`], [`SnapshotFile`], [`Manifest`]
//! - [`manifest`]: audit manifest derivation and text rendering
//! - [`error`]: [`ErrorKind`], the stage-independent failure classification

pub mod error;
pub mod manifest;
pub mod types;

pub use error::ErrorKind;
pub use manifest::MANIFEST_FILE_NAME;
pub use types::{Manifest, Snapshot, SnapshotFile};
