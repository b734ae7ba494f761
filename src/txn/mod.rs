//! Transaction coordination.
//!
//! Provides:
//! - `TransactionCoordinator`, owner of the single global write permit
//! - `TxnStatus`, the read-only view callers use to recover after reconnects
//! - `TxnError` with transience/effect classification

pub mod coordinator;
pub mod error;

pub use coordinator::{PushTarget, TransactionCoordinator, TxnStatus};
pub use error::TxnError;
