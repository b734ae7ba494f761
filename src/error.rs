use thiserror::Error;

use crate::config::ConfigError;
use crate::git::GitError;
use crate::store::{FsError, GateError};
use crate::txn::TxnError;

/// How a failed operation responds to being retried.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transience {
    /// Retrying is pointless until the caller changes something first.
    Permanent,
    /// A later attempt can go through on its own (contention, flaky remote).
    Retryable,
    /// No basis to predict either way.
    Unknown,
}

impl Transience {
    pub fn is_retryable(self) -> bool {
        matches!(self, Transience::Retryable)
    }
}

/// How far an operation got before it failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Effect {
    /// Nothing observable changed.
    None,
    /// Something observable happened (the index moved, a partial clone
    /// landed on disk).
    Some,
    /// The operation may or may not have left traces behind.
    Unknown,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::None => "none",
            Effect::Some => "some",
            Effect::Unknown => "unknown",
        }
    }
}

/// Crate-level convenience error.
///
/// Not a "god error": it is a thin wrapper over the capability errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Txn(#[from] TxnError),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub fn transience(&self) -> Transience {
        match self {
            Error::Git(e) => e.transience(),
            Error::Txn(e) => e.transience(),
            Error::Fs(e) => e.transience(),
            Error::Gate(e) => e.transience(),
            Error::Config(e) => e.transience(),
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            Error::Git(e) => e.effect(),
            Error::Txn(e) => e.effect(),
            Error::Fs(e) => e.effect(),
            Error::Gate(e) => e.effect(),
            Error::Config(e) => e.effect(),
        }
    }
}
