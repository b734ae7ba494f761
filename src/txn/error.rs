//! Transaction error types.

use thiserror::Error;

use crate::git::GitError;
use crate::{Effect, Transience};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TxnError {
    #[error("a transaction is already active for this session")]
    AlreadyOwnsTransaction,

    #[error("transaction lock unavailable, try again later")]
    LockUnavailable,

    #[error("no active transaction for this session")]
    NotOwner,

    #[error(transparent)]
    Git(#[from] GitError),
}

impl TxnError {
    pub fn transience(&self) -> Transience {
        match self {
            // The holder will commit, abort, or time out; waiting helps.
            TxnError::LockUnavailable => Transience::Retryable,
            // Retrying the same call with the same session cannot succeed.
            TxnError::AlreadyOwnsTransaction | TxnError::NotOwner => Transience::Permanent,
            TxnError::Git(e) => e.transience(),
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            TxnError::AlreadyOwnsTransaction
            | TxnError::LockUnavailable
            | TxnError::NotOwner => Effect::None,
            TxnError::Git(e) => e.effect(),
        }
    }
}
