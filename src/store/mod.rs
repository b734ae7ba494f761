//! Content store.
//!
//! Provides:
//! - `FileSystem`, plain path-validated I/O under the content root
//! - `GatedStore`, the transaction-gated facade callers program against

pub mod fs;
pub mod gated;

pub use fs::{DirEntry, FileSystem, FsError};
pub use gated::{content_hash, GateError, GatedStore};
