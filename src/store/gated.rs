//! Transaction-gated store facade.
//!
//! Reads pass straight through to the filesystem. Every write first asks the
//! transaction coordinator whether the session this handle was opened for
//! currently owns the active transaction, and fails fast otherwise — code
//! written against the plain store gains gating just by going through here.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;

use super::fs::{DirEntry, FileSystem, FsError};
use crate::session::SessionId;
use crate::txn::TransactionCoordinator;
use crate::{Effect, Transience};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GateError {
    #[error("no active transaction for this session; call start_transaction first")]
    NoActiveTransaction,

    #[error("content hash mismatch for '{path}': the file changed since it was read")]
    StaleHash { path: String },

    #[error(transparent)]
    Fs(#[from] FsError),
}

impl GateError {
    pub fn transience(&self) -> Transience {
        match self {
            // Starting a transaction clears this; the same call can succeed.
            GateError::NoActiveTransaction => Transience::Retryable,
            // The caller must re-read before retrying.
            GateError::StaleHash { .. } => Transience::Permanent,
            GateError::Fs(e) => e.transience(),
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            GateError::NoActiveTransaction | GateError::StaleHash { .. } => Effect::None,
            GateError::Fs(e) => e.effect(),
        }
    }
}

/// Store handle bound to one session.
///
/// The session identity is ambient: it is fixed when the handle is opened
/// (one handle per logical connection), not passed into every call.
#[derive(Clone)]
pub struct GatedStore {
    fs: Arc<FileSystem>,
    coordinator: Arc<TransactionCoordinator>,
    session: SessionId,
}

/// Hex SHA-256 of file content, used as an optimistic-concurrency tag.
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

impl GatedStore {
    pub fn for_session(
        fs: Arc<FileSystem>,
        coordinator: Arc<TransactionCoordinator>,
        session: SessionId,
    ) -> Self {
        GatedStore {
            fs,
            coordinator,
            session,
        }
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    fn require_transaction(&self) -> Result<(), GateError> {
        if self.coordinator.owns(&self.session) {
            Ok(())
        } else {
            Err(GateError::NoActiveTransaction)
        }
    }

    // --- Reads: unconditional ---

    pub fn read_file(&self, path: &str) -> Result<String, FsError> {
        self.fs.read_file(path)
    }

    /// Read a file together with its content hash, for use as a precondition
    /// in a later `write_if_match`.
    pub fn read_with_hash(&self, path: &str) -> Result<(String, String), FsError> {
        let content = self.fs.read_file(path)?;
        let hash = content_hash(&content);
        Ok((content, hash))
    }

    pub fn list_files(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        self.fs.list_files(path)
    }

    pub fn list_all_files(&self, path: &str) -> Result<Vec<String>, FsError> {
        self.fs.list_all_files(path)
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.fs.file_exists(path)
    }

    // --- Writes: require the active transaction ---

    pub fn write_file(&self, path: &str, content: &str) -> Result<(), GateError> {
        self.require_transaction()?;
        Ok(self.fs.write_file(path, content)?)
    }

    /// Write only if the file's current content still hashes to
    /// `expected_hash`. Any intervening write invalidates the hash.
    pub fn write_if_match(
        &self,
        path: &str,
        expected_hash: &str,
        content: &str,
    ) -> Result<(), GateError> {
        self.require_transaction()?;
        let current = self.fs.read_file(path)?;
        if content_hash(&current) != expected_hash {
            return Err(GateError::StaleHash {
                path: path.to_string(),
            });
        }
        Ok(self.fs.write_file(path, content)?)
    }

    pub fn delete_file(&self, path: &str) -> Result<(), GateError> {
        self.require_transaction()?;
        Ok(self.fs.delete_file(path)?)
    }

    pub fn move_file(&self, source: &str, dest: &str) -> Result<(), GateError> {
        self.require_transaction()?;
        Ok(self.fs.move_file(source, dest)?)
    }

    pub fn create_directory(&self, path: &str) -> Result<(), GateError> {
        self.require_transaction()?;
        Ok(self.fs.create_directory(path)?)
    }
}
