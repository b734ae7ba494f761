#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod git;
pub mod session;
pub mod store;
pub mod sync;
pub mod telemetry;
pub mod txn;

pub use error::{Effect, Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export the types most callers need at the crate root.
pub use crate::config::Config;
pub use crate::events::ContentEvent;
pub use crate::git::{AuthorshipLine, CommitRecord, GitBackend, GitError, PullOutcome};
pub use crate::session::SessionId;
pub use crate::store::{FileSystem, FsError, GateError, GatedStore};
pub use crate::sync::{SyncPoller, SyncSettings};
pub use crate::txn::{TransactionCoordinator, TxnError, TxnStatus};
