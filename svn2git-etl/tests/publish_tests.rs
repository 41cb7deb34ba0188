//! Publishing (Load) tests against local bare repositories.
//!
//! libgit2 pushes to filesystem paths through its local transport, so these
//! tests exercise the full attach → list → push flow without a network.

mod common;

use git2::Repository;
use svn2git_core::ErrorKind;
use svn2git_etl::publish::REMOTE_NAME;
use svn2git_etl::{
    publish, stage, PublishError, PushOutcome, RemoteTarget, StagedRepository, TlsVerification,
    TransformOptions,
};
use svn2git_extract::extract;
use tempfile::TempDir;

use common::{bare_remote, commit_count, populate_working_copy, write};

struct Fixture {
    _source: TempDir,
    _work: TempDir,
    remote_dir: TempDir,
    staged: StagedRepository,
}

fn staged_fixture() -> Fixture {
    let source = TempDir::new().expect("source");
    let work = TempDir::new().expect("work");
    let remote_dir = TempDir::new().expect("remote");
    populate_working_copy(source.path());
    bare_remote(remote_dir.path());

    let (snapshot, manifest) = extract(source.path()).expect("extract");
    let staged = stage(
        &snapshot,
        &TransformOptions {
            work_dir: Some(work.path().to_path_buf()),
            manifest: Some(manifest),
            ..Default::default()
        },
    )
    .expect("stage");

    Fixture {
        _source: source,
        _work: work,
        remote_dir,
        staged,
    }
}

fn target_for(fixture: &Fixture) -> RemoteTarget {
    RemoteTarget::new(fixture.remote_dir.path().to_string_lossy())
}

// ---------------------------------------------------------------------------
// Success paths
// ---------------------------------------------------------------------------

#[test]
fn push_lands_commit_on_remote_branch() {
    let fixture = staged_fixture();
    let outcome = publish(&fixture.staged, &target_for(&fixture)).expect("publish");
    assert_eq!(
        outcome,
        PushOutcome::Pushed {
            refs: vec!["refs/heads/master".to_string()]
        }
    );

    let remote = Repository::open_bare(fixture.remote_dir.path()).expect("open remote");
    let remote_head = remote
        .find_reference("refs/heads/master")
        .expect("remote branch")
        .target()
        .expect("direct ref");
    assert_eq!(remote_head, fixture.staged.commit_id());
}

#[test]
fn second_push_is_up_to_date_success() {
    let fixture = staged_fixture();
    let target = target_for(&fixture);
    publish(&fixture.staged, &target).expect("first publish");

    let outcome = publish(&fixture.staged, &target).expect("second publish");
    assert_eq!(outcome, PushOutcome::UpToDate);
}

#[test]
fn origin_is_attached_once() {
    let fixture = staged_fixture();
    let target = target_for(&fixture);
    publish(&fixture.staged, &target).expect("publish");
    publish(&fixture.staged, &target).expect("republish");

    let repo = fixture.staged.repository();
    let remotes = repo.remotes().expect("remotes");
    assert_eq!(remotes.len(), 1);
    assert_eq!(remotes.get(0), Some(REMOTE_NAME));
    let origin = repo.find_remote(REMOTE_NAME).expect("origin");
    assert_eq!(origin.url(), Some(target.url.as_str()));
}

#[test]
fn credentials_and_tls_override_do_not_break_local_push() {
    let fixture = staged_fixture();
    let target = target_for(&fixture)
        .with_credentials("alice", "token")
        .with_tls(TlsVerification::SkipVerify);
    let outcome = publish(&fixture.staged, &target).expect("publish");
    assert!(matches!(outcome, PushOutcome::Pushed { .. }));
}

// ---------------------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------------------

#[test]
fn empty_url_is_invalid_input() {
    let fixture = staged_fixture();
    let err = publish(&fixture.staged, &RemoteTarget::new("  ")).unwrap_err();
    assert!(matches!(err, PublishError::EmptyUrl), "got: {err}");
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn unreachable_remote_fails_and_leaves_local_repo_intact() {
    let fixture = staged_fixture();
    let missing = fixture.remote_dir.path().join("no-such-repo.git");
    let err = publish(&fixture.staged, &RemoteTarget::new(missing.to_string_lossy())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Publish, "got: {err}");

    let repo = fixture.staged.repository();
    assert_eq!(commit_count(repo), 1);
    assert_eq!(
        repo.head().expect("head").target(),
        Some(fixture.staged.commit_id())
    );
}

#[test]
fn different_url_on_existing_origin_is_a_conflict() {
    let fixture = staged_fixture();
    publish(&fixture.staged, &target_for(&fixture)).expect("publish");

    let other = TempDir::new().expect("other remote");
    bare_remote(other.path());
    let err = publish(&fixture.staged, &RemoteTarget::new(other.path().to_string_lossy()))
        .unwrap_err();
    assert!(matches!(err, PublishError::RemoteConflict { .. }), "got: {err}");
    assert_eq!(err.kind(), ErrorKind::Publish);
}

#[test]
fn diverged_remote_history_is_a_publish_failure() {
    let fixture = staged_fixture();
    let target = target_for(&fixture);
    publish(&fixture.staged, &target).expect("publish first import");

    // A second, unrelated import aimed at the same remote cannot fast-forward.
    let source = TempDir::new().expect("source");
    let work = TempDir::new().expect("work");
    write(source.path(), "other.txt", b"different history\n");
    let (snapshot, _) = extract(source.path()).expect("extract");
    let unrelated = stage(
        &snapshot,
        &TransformOptions {
            work_dir: Some(work.path().to_path_buf()),
            ..Default::default()
        },
    )
    .expect("stage");

    let err = publish(&unrelated, &target).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Publish, "got: {err}");

    let remote = Repository::open_bare(fixture.remote_dir.path()).expect("open remote");
    let remote_head = remote
        .find_reference("refs/heads/master")
        .expect("remote branch")
        .target();
    assert_eq!(remote_head, Some(fixture.staged.commit_id()));
}
