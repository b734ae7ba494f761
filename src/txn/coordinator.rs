//! The transaction coordinator.
//!
//! Owns the single global write permit. A session acquires it to start a
//! transaction, performs gated writes, and releases it by committing or
//! aborting; a deadline thread auto-aborts abandoned transactions so the
//! permit can never be held longer than the configured timeout. The sync
//! poller is paused through registered hooks for as long as the permit is
//! held.
//!
//! State machine: Idle -> Active -> {Committed | Aborted | TimedOut} -> Idle,
//! with at most one Active transaction process-wide. The state lives behind
//! one mutex and is transitioned only through the guarded entry points below;
//! write-side git work (commit, push, reset) runs while the mutex is held, so
//! a deadline firing mid-commit blocks until the commit path has released the
//! permit and then finds its generation stale.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::TxnError;
use crate::git::GitBackend;
use crate::session::SessionId;

/// Remote/branch to push to after a successful commit.
#[derive(Clone, Debug)]
pub struct PushTarget {
    pub remote: String,
    pub branch: String,
}

/// Read-only view of the coordinator, relative to one session.
#[derive(Clone, Debug, Serialize)]
pub struct TxnStatus {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<SessionId>,
    pub is_owner: bool,
}

#[derive(Clone, Debug)]
struct ActiveTxn {
    id: Uuid,
    owner: SessionId,
    /// Monotonic ticket for the deadline race: a deadline thread only acts
    /// if the generation it captured is still the live one.
    generation: u64,
}

#[derive(Default)]
struct TxnSlot {
    active: Option<ActiveTxn>,
    generation: u64,
}

type Hook = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct SyncHooks {
    pause: Option<Hook>,
    resume: Option<Hook>,
}

/// Cheaply cloneable handle; all clones share the one permit.
#[derive(Clone)]
pub struct TransactionCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    git: GitBackend,
    slot: Mutex<TxnSlot>,
    freed: Condvar,
    hooks: Mutex<SyncHooks>,
}

impl TransactionCoordinator {
    pub fn new(git: GitBackend) -> Self {
        TransactionCoordinator {
            inner: Arc::new(Inner {
                git,
                slot: Mutex::new(TxnSlot::default()),
                freed: Condvar::new(),
                hooks: Mutex::new(SyncHooks::default()),
            }),
        }
    }

    /// Register the poller pause/resume hooks. The hooks must not call back
    /// into the coordinator; they run with the permit lock held.
    pub fn set_sync_hooks(
        &self,
        pause: impl Fn() + Send + Sync + 'static,
        resume: impl Fn() + Send + Sync + 'static,
    ) {
        let mut hooks = lock_recovering(&self.inner.hooks);
        hooks.pause = Some(Box::new(pause));
        hooks.resume = Some(Box::new(resume));
    }

    /// Acquire the global permit and open a transaction for `session`.
    ///
    /// Waits up to `lock_wait` for the permit, then fails with
    /// `LockUnavailable` — a retryable condition, never an indefinite block.
    /// On success the pause hook has run before this returns, and a deadline
    /// thread is armed to auto-abort after `timeout`.
    pub fn start(
        &self,
        session: &SessionId,
        timeout: Duration,
        lock_wait: Duration,
    ) -> Result<Uuid, TxnError> {
        let slot = lock_recovering(&self.inner.slot);
        if let Some(active) = &slot.active {
            if active.owner == *session {
                return Err(TxnError::AlreadyOwnsTransaction);
            }
        }

        let (mut slot, wait) = self
            .inner
            .freed
            .wait_timeout_while(slot, lock_wait, |s| s.active.is_some())
            .unwrap_or_else(PoisonError::into_inner);
        if wait.timed_out() && slot.active.is_some() {
            return Err(TxnError::LockUnavailable);
        }

        slot.generation += 1;
        let generation = slot.generation;
        let id = Uuid::new_v4();
        slot.active = Some(ActiveTxn {
            id,
            owner: session.clone(),
            generation,
        });

        // Pause before the caller learns it holds the permit.
        self.inner.invoke_hook(|hooks| hooks.pause.as_deref());
        drop(slot);

        self.arm_deadline(id, generation, timeout);
        info!("transaction started: {id} (session={session})");
        Ok(id)
    }

    /// Commit the active transaction: stage + commit, then push if a target
    /// was supplied. The permit is released and the resume hook runs whether
    /// or not commit/push succeed, so a failed commit never leaves the
    /// system locked.
    pub fn end(
        &self,
        session: &SessionId,
        message: &str,
        author: Option<&str>,
        push: Option<&PushTarget>,
    ) -> Result<(), TxnError> {
        let mut slot = lock_recovering(&self.inner.slot);
        let txn = match &slot.active {
            Some(active) if active.owner == *session => active.clone(),
            _ => return Err(TxnError::NotOwner),
        };
        // Invalidate the armed deadline before doing anything else.
        slot.generation += 1;

        let result = (|| {
            self.inner.git.commit(message, author)?;
            if let Some(target) = push {
                self.inner.git.push(&target.remote, &target.branch)?;
            }
            Ok(())
        })();

        self.inner.release_locked(&mut slot);
        match &result {
            Ok(()) => info!("transaction committed: {} ({message})", txn.id),
            Err(err) => warn!("transaction {} commit failed: {err}", txn.id),
        }
        result.map_err(TxnError::Git)
    }

    /// Abort the active transaction, discarding all uncommitted changes.
    /// The permit is released even if the reset itself fails.
    pub fn abort(&self, session: &SessionId) -> Result<(), TxnError> {
        let mut slot = lock_recovering(&self.inner.slot);
        let txn = match &slot.active {
            Some(active) if active.owner == *session => active.clone(),
            _ => return Err(TxnError::NotOwner),
        };
        slot.generation += 1;

        let result = self.inner.git.reset_hard();

        self.inner.release_locked(&mut slot);
        match &result {
            Ok(()) => info!("transaction aborted: {}", txn.id),
            Err(err) => error!("transaction {} abort reset failed: {err}", txn.id),
        }
        result.map_err(TxnError::Git)
    }

    /// Whether `session` owns the currently active transaction.
    pub fn owns(&self, session: &SessionId) -> bool {
        let slot = lock_recovering(&self.inner.slot);
        matches!(&slot.active, Some(active) if active.owner == *session)
    }

    pub fn status(&self, session: &SessionId) -> TxnStatus {
        let slot = lock_recovering(&self.inner.slot);
        match &slot.active {
            Some(active) => TxnStatus {
                active: true,
                id: Some(active.id),
                owner: Some(active.owner.clone()),
                is_owner: active.owner == *session,
            },
            None => TxnStatus {
                active: false,
                id: None,
                owner: None,
                is_owner: false,
            },
        }
    }

    fn arm_deadline(&self, id: Uuid, generation: u64, timeout: Duration) {
        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name(format!("txn-deadline-{}", &id.to_string()[..8]))
            .spawn(move || {
                thread::sleep(timeout);
                inner.expire(generation);
            });
        if let Err(err) = spawned {
            error!("failed to arm deadline for transaction {id}: {err}");
        }
    }
}

impl Inner {
    /// Deadline body. A no-op unless the transaction it was armed for is
    /// still the active one — a normal end/abort bumps the generation first,
    /// so the race between both paths is settled by whoever takes the lock
    /// with a matching generation.
    fn expire(&self, generation: u64) {
        let mut slot = lock_recovering(&self.slot);
        let txn = match &slot.active {
            Some(active) if active.generation == generation => active.clone(),
            _ => return,
        };
        slot.generation += 1;

        warn!(
            "transaction {} timed out (session={}); discarding uncommitted changes",
            txn.id, txn.owner
        );
        if let Err(err) = self.git.reset_hard() {
            // Nobody is waiting on this path; log and release regardless.
            error!("hard reset on timeout failed: {err}");
        }
        self.release_locked(&mut slot);
    }

    /// Guaranteed cleanup step: clears the slot, resumes the poller and wakes
    /// permit waiters. Runs on every termination path.
    fn release_locked(&self, slot: &mut TxnSlot) {
        slot.active = None;
        self.invoke_hook(|hooks| hooks.resume.as_deref());
        self.freed.notify_all();
    }

    fn invoke_hook(&self, select: impl Fn(&SyncHooks) -> Option<&(dyn Fn() + Send + Sync)>) {
        let hooks = lock_recovering(&self.hooks);
        if let Some(hook) = select(&hooks) {
            hook();
        }
    }
}

/// A poisoned mutex only means some thread panicked while holding it; the
/// slot data itself stays consistent, so recover the guard.
fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
