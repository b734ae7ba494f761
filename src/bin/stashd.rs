//! stashd — the content-store daemon.
//!
//! Startup order matters: clone-on-first-run happens before the filesystem
//! or git layers are constructed, and the poller only spawns once the
//! repository has been validated and the transaction hooks are wired.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use stash::config::Config;
use stash::events;
use stash::git::GitBackend;
use stash::store::FileSystem;
use stash::sync::{SyncPoller, SyncSettings};
use stash::telemetry;
use stash::txn::TransactionCoordinator;

#[derive(Parser, Debug)]
#[command(name = "stashd", about = "Git-backed content store daemon")]
struct Cli {
    /// Override the content root (otherwise STASH_CONTENT_ROOT).
    #[arg(long)]
    content_root: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    };
    if let Some(root) = cli.content_root {
        config.content_root = root;
    }

    telemetry::init(&config.log_level);

    if let Err(err) = run(config) {
        error!("startup failed: {err}");
        std::process::exit(1);
    }
}

fn run(mut config: Config) -> stash::Result<()> {
    info!("starting stashd (content root {})", config.content_root.display());

    maybe_clone(&mut config)?;

    let fs = Arc::new(FileSystem::new(&config.content_root)?);
    info!("{} content files under management", fs.list_all_files("")?.len());

    let git = if config.git_tracking {
        let git = GitBackend::new(&config.content_root, &config.author_default);
        git.validate()?;
        if let Some(token) = &config.sync_token {
            git.configure_credentials(token)?;
        }
        if config.sync_enabled && !git.validate_remote(&config.sync_remote) {
            tracing::warn!(
                "sync remote '{}' is not configured; pulls will fail until it is added",
                config.sync_remote
            );
        }
        info!("git tracking active");
        Some(git)
    } else {
        None
    };

    let coordinator = git
        .as_ref()
        .map(|git| Arc::new(TransactionCoordinator::new(git.clone())));

    // The receiving end is where a search indexer or resource registry would
    // attach; the daemon itself only logs the stream.
    let (event_tx, event_rx) = events::channel();
    let event_logger = std::thread::spawn(move || {
        for event in event_rx {
            info!("content event: {event:?}");
        }
    });

    let poller = match (&git, &coordinator) {
        (Some(git), Some(coordinator)) if config.sync_enabled => {
            let poller = SyncPoller::spawn(
                git.clone(),
                SyncSettings {
                    remote: config.sync_remote.clone(),
                    branch: config.sync_branch.clone(),
                    interval: config.sync_interval,
                    recursive: config.sync_recursive,
                },
                event_tx.clone(),
            );
            coordinator.set_sync_hooks(poller.pause_hook(), poller.resume_hook());
            Some(poller)
        }
        _ => None,
    };

    wait_for_shutdown_signal();
    info!("shutting down");

    if let Some(poller) = poller {
        poller.shutdown();
    }
    drop(event_tx);
    let _ = event_logger.join();
    Ok(())
}

/// Clone the configured source repository into the content root on first
/// run. A root that already holds a repository is left alone; a non-empty
/// root that is not a repository is a fatal misconfiguration.
fn maybe_clone(config: &mut Config) -> stash::Result<()> {
    let Some(url) = config.clone_url.clone() else {
        return Ok(());
    };

    let root = &config.content_root;
    let non_empty = root.exists()
        && std::fs::read_dir(root)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false);
    if non_empty {
        if root.join(".git").exists() {
            info!("content root already contains a repository, skipping clone");
            return Ok(());
        }
        return Err(stash::git::GitError::CloneFailed {
            auth: false,
            message: format!(
                "content root {} is non-empty but not a git repository; \
                 clear it or unset STASH_GIT_CLONE_URL",
                root.display()
            ),
        }
        .into());
    }

    info!("cloning {url} (branch={}) into {}", config.clone_branch, root.display());
    GitBackend::clone(
        &url,
        root,
        &config.clone_branch,
        config.clone_token.as_deref(),
        config.sync_recursive,
        &config.author_default,
    )?;

    // A fresh clone is by definition a tracked repository.
    config.git_tracking = true;
    info!("clone complete; git tracking auto-enabled");
    Ok(())
}

fn wait_for_shutdown_signal() {
    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGTERM, signal_hook::consts::SIGINT] {
        let _ = signal_hook::flag::register(signal, Arc::clone(&shutdown));
    }
    while !shutdown.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(250));
    }
}
