//! Shared git fixtures for integration tests.
//!
//! Each fixture builds a bare "remote" repository plus one or more working
//! clones by shelling out to the real `git` binary, so the process wrapper
//! is exercised against the tool it actually drives.

// Each test binary uses a different subset of the helpers.
#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

pub const AUTHOR_DEFAULT: &str = "stash <stash@local>";

/// Run `git` in `dir`, panicking on failure — fixtures must not half-build.
pub fn git(dir: &Path, args: &[&str]) {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("run git");
    assert!(
        out.status.success(),
        "git {:?} failed in {:?}: {}",
        args,
        dir,
        String::from_utf8_lossy(&out.stderr)
    );
}

pub fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    std::fs::write(path, content).expect("write fixture file");
}

pub fn commit_all(dir: &Path, message: &str) {
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-m", message]);
}

pub fn head(dir: &Path) -> String {
    let out = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(dir)
        .output()
        .expect("rev-parse HEAD");
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

pub fn commit_count(dir: &Path) -> usize {
    let out = Command::new("git")
        .args(["rev-list", "--count", "HEAD"])
        .current_dir(dir)
        .output()
        .expect("rev-list --count");
    String::from_utf8_lossy(&out.stdout)
        .trim()
        .parse()
        .expect("parse commit count")
}

fn init_repo(dir: &Path) {
    git(dir, &["init", "-b", "main"]);
    git(dir, &["config", "user.name", "Fixture"]);
    git(dir, &["config", "user.email", "fixture@test"]);
}

/// A standalone repository with one initial commit.
pub struct RepoFixture {
    pub dir: TempDir,
}

impl RepoFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create repo dir");
        init_repo(dir.path());
        write(dir.path(), "README.md", "# fixture\n");
        commit_all(dir.path(), "initial commit");
        RepoFixture { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// A bare remote plus two working clones: `work` (the store under test) and
/// `editor` (a second writer used to advance the remote).
pub struct SyncFixture {
    pub remote: TempDir,
    pub work: TempDir,
    pub editor: TempDir,
}

impl SyncFixture {
    pub fn new() -> Self {
        let remote = TempDir::new().expect("create remote dir");
        git(remote.path(), &["init", "--bare", "-b", "main"]);

        let seed = TempDir::new().expect("create seed dir");
        init_repo(seed.path());
        write(seed.path(), "README.md", "# shared\n");
        commit_all(seed.path(), "initial commit");
        git(
            seed.path(),
            &["remote", "add", "origin", &remote.path().display().to_string()],
        );
        git(seed.path(), &["push", "origin", "main"]);

        let work = TempDir::new().expect("create work dir");
        let editor = TempDir::new().expect("create editor dir");
        for clone in [&work, &editor] {
            git(
                clone.path(),
                &[
                    "clone",
                    &remote.path().display().to_string(),
                    &clone.path().display().to_string(),
                ],
            );
            git(clone.path(), &["config", "user.name", "Fixture"]);
            git(clone.path(), &["config", "user.email", "fixture@test"]);
        }

        SyncFixture {
            remote,
            work,
            editor,
        }
    }

    /// Commit a change in the editor clone and push it to the remote.
    pub fn publish(&self, rel: &str, content: &str, message: &str) {
        write(self.editor.path(), rel, content);
        commit_all(self.editor.path(), message);
        git(self.editor.path(), &["push", "origin", "main"]);
    }
}
