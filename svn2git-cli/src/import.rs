//! `svn2git`: flags, environment defaults, and the import run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use svn2git_core::MANIFEST_FILE_NAME;
use svn2git_etl::{
    pipeline, stage::DEFAULT_BRANCH, EtlError, PipelineReport, PipelineRequest, PushOutcome,
    RemoteTarget, TlsVerification, TransformOptions,
};

use crate::logging;

/// Arguments for an import run.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Path to the SVN working copy to export. `.svn` directories are ignored.
    #[arg(long, value_name = "PATH")]
    pub source: PathBuf,

    /// Target Git remote URL (https://...).
    #[arg(long, value_name = "URL")]
    pub target: String,

    /// Git username.
    #[arg(long, env = "GIT_USER")]
    pub user: Option<String>,

    /// Git password or access token.
    #[arg(long, env = "GIT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Commit author name (default: same as --user).
    #[arg(long, env = "GIT_AUTHOR_NAME")]
    pub author_name: Option<String>,

    /// Commit author email.
    #[arg(long, env = "GIT_AUTHOR_EMAIL")]
    pub author_email: Option<String>,

    /// Commit message for the import commit.
    #[arg(long, default_value = "Import from SVN snapshot")]
    pub message: String,

    /// Branch the import commit is created on and pushed to.
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Work area for the staged repository (default: a new temp dir).
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,

    /// Extract and stage only; do not push.
    #[arg(long)]
    pub dry_run: bool,

    /// Do not verify TLS certificates when pushing over HTTPS (use with caution).
    #[arg(long)]
    pub insecure: bool,

    /// Print the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ImportArgs {
    pub fn run(self) -> Result<()> {
        logging::init(self.debug);

        let request = self.to_request();
        tracing::info!(
            source = %request.source.display(),
            target = %request.remote.url,
            user = %request.remote.username,
            dry_run = request.dry_run,
            "starting SVN -> Git snapshot import"
        );
        if request.remote.tls.accepts_any_certificate() {
            tracing::warn!("--insecure given: TLS certificates will not be verified");
        }

        let report = pipeline::run(&request).map_err(|err| {
            let step = step_failed(&err);
            anyhow::Error::new(err).context(step)
        })?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report JSON")?
            );
        } else {
            print_report(&report);
        }

        let done = if report.dry_run {
            "completed (dry-run)"
        } else {
            "completed SVN -> Git import"
        };
        tracing::info!(elapsed_ms = report.elapsed_ms, "{done}");
        Ok(())
    }

    fn to_request(&self) -> PipelineRequest {
        let username = self.user.clone().unwrap_or_default();
        let password = self.password.clone().unwrap_or_default();
        let tls = if self.insecure {
            TlsVerification::SkipVerify
        } else {
            TlsVerification::Verify
        };

        PipelineRequest {
            source: self.source.clone(),
            transform: TransformOptions {
                work_dir: self.workdir.clone(),
                author_name: self.author_name.clone().unwrap_or_default(),
                author_email: self.author_email.clone().unwrap_or_default(),
                username: username.clone(),
                message: self.message.clone(),
                branch: self.branch.clone(),
                manifest: None,
            },
            remote: RemoteTarget::new(self.target.clone())
                .with_credentials(username, password)
                .with_tls(tls),
            dry_run: self.dry_run,
        }
    }
}

fn step_failed(err: &EtlError) -> &'static str {
    match err {
        EtlError::Extract(_) => "extract step failed",
        EtlError::Stage(_) => "transform step failed",
        EtlError::Publish(_) => "load step failed (push)",
    }
}

fn print_report(report: &PipelineReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    println!(
        "{prefix}{} imported {} file(s), {} byte(s) from {}",
        "✓".green().bold(),
        report.manifest.file_count,
        report.manifest.total_bytes,
        report.manifest.source_root.display()
    );
    println!("  repo:     {}", report.repo_path.display());
    println!("  commit:   {} ({})", report.commit, report.branch);
    println!("  manifest: {MANIFEST_FILE_NAME}");

    let push = match &report.push {
        None => "skipped (dry-run)".yellow().to_string(),
        Some(PushOutcome::UpToDate) => "remote already up-to-date".to_string(),
        Some(PushOutcome::Pushed { refs }) => format!("pushed {}", refs.join(", ")),
    };
    println!("  push:     {push}");
}
