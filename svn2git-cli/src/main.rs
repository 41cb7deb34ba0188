//! svn2git: import a Subversion working copy snapshot into a new Git
//! repository and push it.
//!
//! # Usage
//!
//! ```text
//! svn2git --source <svn working copy> --target <git remote url>
//!         [--user <name>] [--password <password|token>]
//!         [--author-name <name>] [--author-email <email>] [--message <msg>]
//!         [--branch <name>] [--workdir <dir>]
//!         [--dry-run] [--insecure] [--debug] [--json]
//! ```
//!
//! `--user`, `--password`, `--author-name` and `--author-email` default to
//! `GIT_USER`, `GIT_PASSWORD`, `GIT_AUTHOR_NAME` and `GIT_AUTHOR_EMAIL`.

mod import;
mod logging;

use anyhow::Result;
use clap::Parser;

use import::ImportArgs;

#[derive(Parser, Debug)]
#[command(
    name = "svn2git",
    version,
    about = "Import an SVN working copy snapshot into a fresh Git repository and push it",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    import: ImportArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.import.run()
}
