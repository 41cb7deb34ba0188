//! # svn2git-etl
//!
//! Repository staging, remote publication, and the end-to-end pipeline.
//!
//! Call [`pipeline::run`] to extract a working copy, stage it as a single
//! commit, and push it; or drive the stages yourself with
//! [`svn2git_extract::extract`], [`stage`] and [`publish`].

pub mod copy;
pub mod error;
pub mod pipeline;
pub mod publish;
pub mod stage;

pub use error::{EtlError, PublishError, StageError};
pub use pipeline::{run, PipelineReport, PipelineRequest};
pub use publish::{publish, PushOutcome, RemoteTarget, TlsVerification};
pub use stage::{stage, StagedRepository, TransformOptions};
