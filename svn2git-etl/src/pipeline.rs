//! End-to-end import pipeline shared by the CLI and tests.
//!
//! Stages run strictly in sequence:
//!
//! ```text
//! Idle -> Extracting -> Transforming -> (Done | Pushing) -> (Done | Failed)
//! ```
//!
//! A failure in any stage halts the run. Nothing is rolled back: the staged
//! repository stays on disk for inspection or a later retry.

use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;

use svn2git_core::Manifest;
use svn2git_extract::{extract_with, AdminDirFilter, MetadataFilter};

use crate::error::EtlError;
use crate::publish::{publish, PushOutcome, RemoteTarget};
use crate::stage::{stage, TransformOptions};

/// Pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Extracting,
    Transforming,
    Pushing,
    Done,
    Failed,
}

/// Fully resolved parameters for one import run.
#[derive(Debug, Clone, Default)]
pub struct PipelineRequest {
    pub source: PathBuf,
    /// `manifest` is overwritten with the one derived during extraction.
    pub transform: TransformOptions,
    pub remote: RemoteTarget,
    /// Stop after Transform; the remote is never contacted.
    pub dry_run: bool,
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub manifest: Manifest,
    pub repo_path: PathBuf,
    pub commit: String,
    pub branch: String,
    /// `None` for dry runs.
    pub push: Option<PushOutcome>,
    pub dry_run: bool,
    pub elapsed_ms: u64,
}

/// Run the pipeline against a Subversion working copy.
pub fn run(request: &PipelineRequest) -> Result<PipelineReport, EtlError> {
    run_with(request, &AdminDirFilter::svn())
}

/// Run the pipeline with a custom legacy metadata filter.
pub fn run_with(
    request: &PipelineRequest,
    filter: &dyn MetadataFilter,
) -> Result<PipelineReport, EtlError> {
    let started = Instant::now();
    let mut state = Tracker::default();

    state.advance(Stage::Extracting);
    let (snapshot, manifest) = state.check(extract_with(&request.source, filter))?;

    state.advance(Stage::Transforming);
    let options = TransformOptions {
        manifest: Some(manifest.clone()),
        ..request.transform.clone()
    };
    let staged = state.check(stage(&snapshot, &options))?;

    let push = if request.dry_run {
        tracing::warn!("dry-run enabled; skipping push to remote");
        None
    } else {
        state.advance(Stage::Pushing);
        Some(state.check(publish(&staged, &request.remote))?)
    };

    state.advance(Stage::Done);
    Ok(PipelineReport {
        manifest,
        repo_path: staged.path().to_path_buf(),
        commit: staged.commit_id().to_string(),
        branch: staged.branch().to_string(),
        push,
        dry_run: request.dry_run,
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    })
}

#[derive(Debug)]
struct Tracker {
    current: Stage,
}

impl Default for Tracker {
    fn default() -> Self {
        Self {
            current: Stage::Idle,
        }
    }
}

impl Tracker {
    fn advance(&mut self, next: Stage) {
        tracing::debug!("pipeline: {:?} -> {:?}", self.current, next);
        self.current = next;
    }

    fn check<T, E: Into<EtlError>>(&mut self, result: Result<T, E>) -> Result<T, EtlError> {
        result.map_err(|err| {
            let err = err.into();
            tracing::error!("{:?} stage failed ({}): {err}", self.current, err.kind());
            self.advance(Stage::Failed);
            err
        })
    }
}
