//! Git process wrapper error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::{Effect, Transience};

/// Errors raised by write-side and setup-side git operations.
///
/// Read-side operations (history, blame, diff) and pull deliberately never
/// produce these: they degrade to empty results and a logged warning instead.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GitError {
    #[error(
        "content root {0:?} is not a git repository; \
         run `git init` there or disable STASH_GIT_TRACKING"
    )]
    NotARepository(PathBuf),

    #[error("git commit failed: {0}")]
    CommitFailed(String),

    #[error("git reset --hard failed: {0}")]
    ResetFailed(String),

    #[error("git push failed: {0}")]
    PushFailed(String),

    #[error("{}", clone_failed_message(.message, .auth))]
    CloneFailed { message: String, auth: bool },

    #[error("credential helper setup failed: {0}")]
    CredentialSetup(String),

    #[error("io error running git: {0}")]
    Io(#[from] io::Error),
}

fn clone_failed_message(message: &str, auth: &bool) -> String {
    if *auth {
        format!(
            "git clone authentication failure: {message}; \
             check STASH_GIT_CLONE_TOKEN"
        )
    } else {
        format!("git clone failed: {message}")
    }
}

impl GitError {
    pub fn transience(&self) -> Transience {
        match self {
            // A held index lock or a racing writer may clear up on retry.
            GitError::CommitFailed(_) | GitError::PushFailed(_) => Transience::Retryable,

            GitError::CloneFailed { auth, .. } => {
                if *auth {
                    Transience::Permanent
                } else {
                    Transience::Retryable
                }
            }

            GitError::NotARepository(_) | GitError::CredentialSetup(_) => Transience::Permanent,

            GitError::ResetFailed(_) | GitError::Io(_) => Transience::Unknown,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            GitError::NotARepository(_) | GitError::PushFailed(_) => Effect::None,

            // `git add -A` ran before the commit refused, so the index moved.
            GitError::CommitFailed(_) => Effect::Some,

            // A failed reset or clone leaves the tree in a state we cannot
            // describe; callers must treat it as unknown.
            GitError::ResetFailed(_)
            | GitError::CloneFailed { .. }
            | GitError::CredentialSetup(_)
            | GitError::Io(_) => Effect::Unknown,
        }
    }
}
