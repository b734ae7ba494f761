//! Tool-call surface for transactions.
//!
//! These are the operations a transport layer (MCP tools, HTTP handlers)
//! exposes per session. The shapes are fixed; the transport only decides how
//! the session identity and the strings travel.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::Config;
use crate::session::SessionId;
use crate::txn::{PushTarget, TransactionCoordinator, TxnError, TxnStatus};

/// Begin a write transaction for the calling session.
pub fn start_transaction(
    coordinator: &Arc<TransactionCoordinator>,
    config: &Config,
    session: &SessionId,
) -> Result<Uuid, TxnError> {
    coordinator.start(session, config.txn_timeout, config.txn_lock_wait)
}

/// Commit the active transaction. Pushes to the configured remote when
/// periodic sync is enabled, and releases the permit either way.
pub fn commit_transaction(
    coordinator: &Arc<TransactionCoordinator>,
    config: &Config,
    session: &SessionId,
    message: &str,
    author: Option<&str>,
) -> Result<String, TxnError> {
    let push = config.sync_enabled.then(|| PushTarget {
        remote: config.sync_remote.clone(),
        branch: config.sync_branch.clone(),
    });
    coordinator.end(session, message, author, push.as_ref())?;
    Ok(format!("Transaction committed: {message}"))
}

/// Abort the active transaction, discarding all uncommitted changes.
pub fn abort_transaction(
    coordinator: &Arc<TransactionCoordinator>,
    session: &SessionId,
) -> Result<String, TxnError> {
    coordinator.abort(session)?;
    Ok("Transaction aborted.".to_string())
}

/// Current transaction state, relative to the calling session. Read-only;
/// lets a reconnecting caller recover without guessing.
pub fn transaction_status(
    coordinator: &Arc<TransactionCoordinator>,
    session: &SessionId,
) -> TxnStatus {
    coordinator.status(session)
}
