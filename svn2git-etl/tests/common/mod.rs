//! Shared fixtures for svn2git-etl integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use git2::{ObjectType, Repository, TreeWalkMode, TreeWalkResult};

/// Write `content` to `root/rel`, creating parent directories.
pub fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, content).expect("write fixture");
}

/// A small Subversion-style working copy with admin data at two levels.
pub fn populate_working_copy(root: &Path) {
    write(root, "README", b"legacy project\n");
    write(root, "src/main.c", b"int main(void)\r\n{\r\n  return 0;\r\n}\r\n");
    write(root, "src/util/strings.c", b"/* helpers */\n");
    write(root, "assets/logo.bin", &[0u8, 159, 146, 150, 255, 10, 13]);
    write(root, ".svn/wc.db", b"SQLite format 3\0");
    write(root, ".svn/pristine/aa/aabbcc.svn-base", b"old bytes");
    write(root, "src/.SVN/entries", b"10\n");
}

/// Every blob in HEAD's tree, keyed by slash-separated path.
pub fn head_tree_blobs(repo: &Repository) -> BTreeMap<String, Vec<u8>> {
    let tree = repo
        .head()
        .expect("head")
        .peel_to_tree()
        .expect("head tree");
    let mut blobs = BTreeMap::new();
    tree.walk(TreeWalkMode::PreOrder, |root, entry| {
        if entry.kind() == Some(ObjectType::Blob) {
            let blob = repo.find_blob(entry.id()).expect("blob");
            let name = entry.name().expect("utf-8 name");
            blobs.insert(format!("{root}{name}"), blob.content().to_vec());
        }
        TreeWalkResult::Ok
    })
    .expect("walk tree");
    blobs
}

/// Number of commits reachable from HEAD.
pub fn commit_count(repo: &Repository) -> usize {
    let mut walk = repo.revwalk().expect("revwalk");
    walk.push_head().expect("push head");
    walk.count()
}

/// Create an empty bare repository to push into.
pub fn bare_remote(dir: &Path) -> Repository {
    Repository::init_bare(dir).expect("init bare remote")
}
