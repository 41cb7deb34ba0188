//! Repository staging: the Transform step.
//!
//! [`stage`] turns a [`Snapshot`] into a freshly initialised, non-bare Git
//! repository holding exactly one commit:
//!
//! 1. Resolve the work area (fresh temp dir, or the caller's directory).
//! 2. Validate every snapshot path before touching the disk.
//! 3. `git init` into `<work area>/repo` with the requested initial branch.
//! 4. Copy each file verbatim and add its bytes to the index.
//! 5. Write and add the audit manifest, if one was supplied.
//! 6. Commit the index tree with no parents, updating `HEAD`.
//!
//! Any failure aborts before step 6, so a partial commit is never recorded.
//!
//! Blobs are hashed from the raw bytes rather than through the working tree,
//! so `.gitattributes` shipped inside the snapshot (`text`, `eol`, `ident`,
//! filter drivers) cannot rewrite the committed content.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use git2::{Index, IndexEntry, IndexTime, Oid, Repository, RepositoryInitOptions, Signature};

use svn2git_core::{Manifest, Snapshot, MANIFEST_FILE_NAME};

use crate::copy::copy_file;
use crate::error::{io_err, StageError};

/// Subdirectory of the work area that holds the repository.
pub const REPO_DIR_NAME: &str = "repo";

/// Commit message used when the caller supplies a blank one.
pub const DEFAULT_COMMIT_MESSAGE: &str = "SVN import";

/// Initial branch used when the caller supplies a blank one.
pub const DEFAULT_BRANCH: &str = "master";

/// Author name used when neither an author nor a username is known.
pub const FALLBACK_AUTHOR_NAME: &str = "svn2git";

/// Author email used when none is supplied; libgit2 rejects empty emails.
pub const FALLBACK_AUTHOR_EMAIL: &str = "svn2git@localhost";

const TEMP_DIR_PREFIX: &str = "svn2git-";

/// Index modes for regular and executable files.
const MODE_BLOB: u32 = 0o100_644;
const MODE_BLOB_EXECUTABLE: u32 = 0o100_755;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Controls how the staged repository is built.
///
/// Blank strings mean "use the default"; see the `DEFAULT_*` and
/// `FALLBACK_*` constants.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Work area. `None` creates a uniquely named temp dir that is kept.
    pub work_dir: Option<PathBuf>,
    pub author_name: String,
    pub author_email: String,
    /// Remote username; the author name falls back to it.
    pub username: String,
    pub message: String,
    pub branch: String,
    /// Written as [`MANIFEST_FILE_NAME`] at the repository root when set.
    pub manifest: Option<Manifest>,
}

impl TransformOptions {
    /// Author/committer name and email after fallbacks.
    pub fn identity(&self) -> (&str, &str) {
        let name = [self.author_name.as_str(), self.username.as_str()]
            .into_iter()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(FALLBACK_AUTHOR_NAME);
        let email = match self.author_email.trim() {
            "" => FALLBACK_AUTHOR_EMAIL,
            email => email,
        };
        (name, email)
    }

    pub fn commit_message(&self) -> &str {
        if self.message.trim().is_empty() {
            DEFAULT_COMMIT_MESSAGE
        } else {
            &self.message
        }
    }

    pub fn branch_name(&self) -> &str {
        match self.branch.trim() {
            "" => DEFAULT_BRANCH,
            branch => branch,
        }
    }
}

// ---------------------------------------------------------------------------
// Staged repository
// ---------------------------------------------------------------------------

/// A freshly initialised repository holding the single import commit.
///
/// Owned by one pipeline run. Dropping it leaves the repository on disk.
pub struct StagedRepository {
    path: PathBuf,
    repo: Repository,
    commit: Oid,
    branch: String,
}

impl StagedRepository {
    /// Absolute path to the repository's working tree.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Id of the import commit.
    pub fn commit_id(&self) -> Oid {
        self.commit
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }
}

impl fmt::Debug for StagedRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedRepository")
            .field("path", &self.path)
            .field("commit", &self.commit)
            .field("branch", &self.branch)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// stage
// ---------------------------------------------------------------------------

/// Build a new repository containing every file of `snapshot` in one commit.
pub fn stage(snapshot: &Snapshot, options: &TransformOptions) -> Result<StagedRepository, StageError> {
    for file in &snapshot.files {
        check_rel_path(&file.rel_path)?;
    }

    let work_dir = resolve_work_dir(options.work_dir.as_deref())?;
    let repo_path = work_dir.join(REPO_DIR_NAME);
    if repo_path.join(".git").exists() {
        return Err(StageError::RepositoryExists { path: repo_path });
    }
    fs::create_dir_all(&repo_path).map_err(|e| io_err(&repo_path, e))?;
    let repo_path = fs::canonicalize(&repo_path).map_err(|e| io_err(&repo_path, e))?;

    let branch = options.branch_name().to_string();
    let mut init = RepositoryInitOptions::new();
    init.initial_head(&branch);
    let repo = Repository::init_opts(&repo_path, &init).map_err(git_err("init"))?;
    // A global core.autocrlf would rewrite line endings on add.
    repo.config()
        .and_then(|mut config| config.set_bool("core.autocrlf", false))
        .map_err(git_err("configure"))?;
    tracing::debug!("initialised repository at {}", repo_path.display());

    if snapshot.is_empty() {
        tracing::warn!("snapshot holds no files; committing the manifest only");
    }

    let mut index = repo.index().map_err(git_err("open index"))?;
    for file in &snapshot.files {
        let dest = dest_path(&repo_path, &file.rel_path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        copy_file(&file.src_path, &dest).map_err(|source| StageError::Copy {
            rel_path: file.rel_path.clone(),
            src: file.src_path.clone(),
            source,
        })?;
        let bytes = fs::read(&dest).map_err(|e| io_err(&dest, e))?;
        let meta = fs::metadata(&dest).map_err(|e| io_err(&dest, e))?;
        add_blob(&mut index, &file.rel_path, file_mode(&meta), &bytes)?;
        tracing::debug!("staged: {}", file.rel_path);
    }

    if let Some(manifest) = &options.manifest {
        let path = repo_path.join(MANIFEST_FILE_NAME);
        let text = manifest.render();
        fs::write(&path, &text).map_err(|e| io_err(&path, e))?;
        add_blob(&mut index, MANIFEST_FILE_NAME, MODE_BLOB, text.as_bytes())?;
        tracing::debug!("staged: {MANIFEST_FILE_NAME}");
    }
    index.write().map_err(git_err("write index"))?;

    let commit = commit_index(&repo, &mut index, options)?;
    tracing::info!(
        "committed {} file(s), {} byte(s) as {} on '{}' in {}",
        snapshot.len(),
        snapshot.total_bytes(),
        commit,
        branch,
        repo_path.display()
    );

    Ok(StagedRepository {
        path: repo_path,
        repo,
        commit,
        branch,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve_work_dir(work_dir: Option<&Path>) -> Result<PathBuf, StageError> {
    match work_dir {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
            Ok(dir.to_path_buf())
        }
        None => {
            let tmp = tempfile::Builder::new()
                .prefix(TEMP_DIR_PREFIX)
                .tempdir()
                .map_err(|e| io_err(std::env::temp_dir(), e))?;
            // The staged repository outlives this run for inspection or retry.
            Ok(tmp.into_path())
        }
    }
}

fn check_rel_path(rel_path: &str) -> Result<(), StageError> {
    let unsafe_path = |reason| StageError::UnsafePath {
        rel_path: rel_path.to_string(),
        reason,
    };
    if rel_path.is_empty() {
        return Err(unsafe_path("empty path"));
    }
    if rel_path.starts_with('/') {
        return Err(unsafe_path("not a relative path"));
    }
    // Elsewhere a backslash is an ordinary file-name byte.
    if cfg!(windows) && rel_path.contains('\\') {
        return Err(unsafe_path("not a slash-separated path"));
    }
    let parts = rel_path.split('/');
    if parts
        .clone()
        .any(|p| p.is_empty() || p == "." || p == "..")
    {
        return Err(unsafe_path("contains empty, '.' or '..' components"));
    }
    if parts.into_iter().any(|p| p.eq_ignore_ascii_case(".git")) {
        return Err(unsafe_path("contains a .git component"));
    }
    Ok(())
}

/// Add `bytes` to the index as the blob for `rel_path`, bypassing the
/// working-tree filters `git add` would apply.
fn add_blob(index: &mut Index, rel_path: &str, mode: u32, bytes: &[u8]) -> Result<(), StageError> {
    let entry = IndexEntry {
        ctime: IndexTime::new(0, 0),
        mtime: IndexTime::new(0, 0),
        dev: 0,
        ino: 0,
        mode,
        uid: 0,
        gid: 0,
        file_size: u32::try_from(bytes.len()).unwrap_or(u32::MAX),
        id: Oid::zero(),
        flags: 0,
        flags_extended: 0,
        path: rel_path.as_bytes().to_vec(),
    };
    index
        .add_frombuffer(&entry, bytes)
        .map_err(git_err("add"))
}

#[cfg(unix)]
fn file_mode(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    if meta.permissions().mode() & 0o111 != 0 {
        MODE_BLOB_EXECUTABLE
    } else {
        MODE_BLOB
    }
}

#[cfg(not(unix))]
fn file_mode(_meta: &fs::Metadata) -> u32 {
    MODE_BLOB
}

fn dest_path(repo_path: &Path, rel_path: &str) -> PathBuf {
    rel_path
        .split('/')
        .fold(repo_path.to_path_buf(), |acc, part| acc.join(part))
}

fn commit_index(
    repo: &Repository,
    index: &mut git2::Index,
    options: &TransformOptions,
) -> Result<Oid, StageError> {
    let tree_id = index.write_tree().map_err(git_err("write tree"))?;
    let tree = repo.find_tree(tree_id).map_err(git_err("find tree"))?;
    let (name, email) = options.identity();
    let signature = Signature::now(name, email).map_err(git_err("signature"))?;
    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        options.commit_message(),
        &tree,
        &[],
    )
    .map_err(git_err("commit"))
}

fn git_err(op: &'static str) -> impl FnOnce(git2::Error) -> StageError {
    move |source| StageError::Git { op, source }
}
