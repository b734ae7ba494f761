//! Git integration module.
//!
//! Provides:
//! - `GitBackend`, the process wrapper around the `git` CLI
//! - Parsers for porcelain blame output, name-status diffs, author strings
//! - `GitError` with transience/effect classification

pub mod backend;
pub mod error;
pub mod porcelain;

pub use backend::{AuthorshipLine, CommitRecord, GitBackend, PullOutcome};
pub use error::GitError;
pub use porcelain::parse_author_string;
