//! Periodic pull loop.
//!
//! A dedicated thread wakes every `interval`, and — unless paused — runs one
//! pull to completion against the configured remote/branch. There is never
//! more than one in-flight pull: the loop is single-threaded and a tick that
//! arrives while a pull is running simply waits its turn. The transaction
//! coordinator pauses the loop for the lifetime of every transaction through
//! the hooks below.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{bounded, RecvTimeoutError, Sender};
use tracing::{debug, error, info, warn};

use crate::events::{ContentEvent, EventSink};
use crate::git::GitBackend;

/// What to pull, and how often.
#[derive(Clone, Debug)]
pub struct SyncSettings {
    pub remote: String,
    pub branch: String,
    pub interval: Duration,
    pub recursive: bool,
}

struct PollerShared {
    paused: AtomicBool,
    /// Number of pulls actually issued (not skipped ticks).
    pulls: AtomicU64,
}

pub struct SyncPoller {
    shared: Arc<PollerShared>,
    shutdown_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl SyncPoller {
    /// Spawn the poll thread. Pulled change sets flow into `events` as one
    /// notification per path.
    pub fn spawn(git: GitBackend, settings: SyncSettings, events: EventSink) -> Self {
        let shared = Arc::new(PollerShared {
            paused: AtomicBool::new(false),
            pulls: AtomicU64::new(0),
        });
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::spawn(move || {
            info!(
                "sync poller started: {}/{} every {:?}",
                settings.remote, settings.branch, settings.interval
            );
            loop {
                match shutdown_rx.recv_timeout(settings.interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
                if thread_shared.paused.load(Ordering::Acquire) {
                    debug!("sync paused; skipping pull");
                    continue;
                }

                thread_shared.pulls.fetch_add(1, Ordering::Relaxed);
                let outcome = git.pull(&settings.remote, &settings.branch, settings.recursive);
                if !outcome.success {
                    // Already logged by the backend; keep ticking.
                    continue;
                }
                if outcome.is_empty() {
                    debug!("sync pull: nothing new");
                    continue;
                }

                info!(
                    "sync pull applied {} added, {} modified, {} deleted",
                    outcome.added.len(),
                    outcome.modified.len(),
                    outcome.deleted.len()
                );
                publish(&events, &outcome.added, |path| ContentEvent::Created { path });
                publish(&events, &outcome.modified, |path| ContentEvent::Updated { path });
                publish(&events, &outcome.deleted, |path| ContentEvent::Deleted { path });
            }
            info!("sync poller stopped");
        });

        SyncPoller {
            shared,
            shutdown_tx,
            handle: Some(handle),
        }
    }

    /// Hook for the transaction coordinator: stop pulling until resumed.
    pub fn pause_hook(&self) -> impl Fn() + Send + Sync + 'static {
        let shared = Arc::clone(&self.shared);
        move || {
            shared.paused.store(true, Ordering::Release);
            debug!("sync paused for transaction");
        }
    }

    pub fn resume_hook(&self) -> impl Fn() + Send + Sync + 'static {
        let shared = Arc::clone(&self.shared);
        move || {
            shared.paused.store(false, Ordering::Release);
            debug!("sync resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    /// Pulls issued so far (skipped ticks not counted).
    pub fn pull_count(&self) -> u64 {
        self.shared.pulls.load(Ordering::Relaxed)
    }

    /// Stop the loop and join the thread. An in-flight pull finishes first.
    pub fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("sync poller thread panicked");
            }
        }
    }
}

impl Drop for SyncPoller {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("sync poller thread panicked during drop");
            }
        }
    }
}

fn publish(events: &EventSink, paths: &[String], make: impl Fn(String) -> ContentEvent) {
    for path in paths {
        // Fire-and-forget: a dropped receiver just means nobody listens.
        let _ = events.send(make(path.clone()));
    }
}
