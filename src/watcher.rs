//! Watch dispatcher: turns file-creation notifications into organize calls.
//!
//! # Architecture
//!
//! The [`notify`] callback is kept lightweight: it only classifies the raw
//! event and sends the path through a bounded channel. A single worker thread
//! owns the pending list and calls [`Organizer::organize`] for one file at a
//! time, in arrival order.
//!
//! A path is held pending until it has gone `settle` without a modification
//! event, then checked for existence and non-zero size and organized. With a
//! zero settle period every file is handled as soon as its event arrives.
//!
//! Only the watched root's direct children are observed; category folders
//! are never watched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, trace, warn};

use crate::config::CompiledFilters;
use crate::error::StartupError;
use crate::file_organizer::{Organizer, Outcome, Skip};

/// How often the worker wakes up to check for a stop request.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Capacity of the channel between the notify callback and the worker.
const CHANNEL_CAPACITY: usize = 2048;

/// Raw events forwarded from the notify callback.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RawEvent {
    /// A new entry appeared in the root (created or renamed into it).
    Created(PathBuf),
    /// An entry's content changed.
    Modified(PathBuf),
}

/// Counters reported when watching stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Files moved into a category folder.
    pub moved: usize,
    /// Files left in place (filtered, empty, vanished, already sorted).
    pub skipped: usize,
    /// Files whose move failed.
    pub failed: usize,
}

/// Dispatcher lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Not subscribed to anything.
    Idle,
    /// Subscribed and processing events on the worker thread.
    Watching,
}

/// A live subscription and its worker.
struct Session {
    /// Kept alive to maintain the watch subscription. Dropping it unsubscribes.
    watcher: RecommendedWatcher,
    cancel: Arc<AtomicBool>,
    worker: JoinHandle<DispatchStats>,
}

/// Subscribes to creations in the watched root and organizes each new file.
pub struct Dispatcher {
    organizer: Arc<Organizer>,
    filters: Arc<CompiledFilters>,
    settle: Duration,
    session: Option<Session>,
}

impl Dispatcher {
    /// Creates an idle dispatcher.
    ///
    /// # Arguments
    ///
    /// * `organizer` - Organizer for the watched root
    /// * `filters` - Files the filters reject are never organized
    /// * `settle` - Quiet period before a new file is organized
    pub fn new(organizer: Organizer, filters: CompiledFilters, settle: Duration) -> Self {
        Self {
            organizer: Arc::new(organizer),
            filters: Arc::new(filters),
            settle,
            session: None,
        }
    }

    /// The directory being watched.
    pub fn root(&self) -> &Path {
        self.organizer.root()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DispatcherState {
        if self.session.is_some() {
            DispatcherState::Watching
        } else {
            DispatcherState::Idle
        }
    }

    /// Subscribes to the watched root (non-recursively) and starts the worker.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::AlreadyWatching`] if already started, and
    /// [`StartupError::Watch`] if the platform watcher cannot be created or
    /// cannot subscribe to the root.
    pub fn start(&mut self) -> Result<(), StartupError> {
        if self.session.is_some() {
            return Err(StartupError::AlreadyWatching);
        }

        let root = self.organizer.root().to_path_buf();
        let (tx, rx) = bounded::<RawEvent>(CHANNEL_CAPACITY);
        let watcher = create_watcher(&root, tx)?;

        let cancel = Arc::new(AtomicBool::new(false));
        let worker = {
            let cancel = Arc::clone(&cancel);
            let organizer = Arc::clone(&self.organizer);
            let filters = Arc::clone(&self.filters);
            let settle = self.settle;
            std::thread::Builder::new()
                .name("tidywatch-dispatch".to_owned())
                .spawn(move || run_worker(rx, cancel, organizer, filters, settle))
                .map_err(|source| StartupError::Watch {
                    path: root.clone(),
                    source: notify::Error::io(source),
                })?
        };

        info!(root = %root.display(), "Monitoring folder");
        self.session = Some(Session {
            watcher,
            cancel,
            worker,
        });
        Ok(())
    }

    /// Unsubscribes and waits for the worker to finish its current file.
    ///
    /// Returns `None` if the dispatcher was idle.
    pub fn stop(&mut self) -> Option<DispatchStats> {
        let session = self.session.take()?;
        drop(session.watcher);
        session.cancel.store(true, Ordering::Relaxed);

        let stats = match session.worker.join() {
            Ok(stats) => stats,
            Err(_) => {
                error!("Dispatch worker panicked");
                DispatchStats::default()
            }
        };

        info!(
            moved = stats.moved,
            skipped = stats.skipped,
            failed = stats.failed,
            "Stopped monitoring"
        );
        Some(stats)
    }

    /// Applies the dispatch policy to one path, as the worker does for each
    /// settled creation event.
    pub fn handle_path(&self, path: &Path) -> DispatchStats {
        let mut stats = DispatchStats::default();
        dispatch(path, &self.organizer, &self.filters, &mut stats);
        stats
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Creates the notify watcher with a lightweight callback.
fn create_watcher(root: &Path, tx: Sender<RawEvent>) -> Result<RecommendedWatcher, StartupError> {
    let watch_error = |source: notify::Error| StartupError::Watch {
        path: root.to_path_buf(),
        source,
    };

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| handle_notify_event(res, &tx),
        Config::default(),
    )
    .map_err(watch_error)?;

    watcher
        .watch(root, RecursiveMode::NonRecursive)
        .map_err(watch_error)?;

    debug!(root = %root.display(), "Started non-recursive watch");
    Ok(watcher)
}

/// Filters raw notify events and forwards the interesting ones.
fn handle_notify_event(res: notify::Result<Event>, tx: &Sender<RawEvent>) {
    let event = match res {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "File watcher error");
            return;
        }
    };

    trace!(kind = ?event.kind, paths = ?event.paths, "Received notify event");

    for raw in classify_event(&event) {
        // Never block the notify thread.
        if let Err(e) = tx.try_send(raw) {
            warn!(error = %e, "Failed to queue event, channel may be full");
        }
    }
}

/// Maps a notify event to the raw events the worker cares about.
fn classify_event(event: &Event) -> Vec<RawEvent> {
    match event.kind {
        EventKind::Create(CreateKind::Folder) => Vec::new(),
        EventKind::Create(_) => event.paths.iter().cloned().map(RawEvent::Created).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.iter().cloned().map(RawEvent::Created).collect()
        }
        // Paths are [from, to]; only the destination is new.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event
            .paths
            .get(1)
            .cloned()
            .map(RawEvent::Created)
            .into_iter()
            .collect(),
        EventKind::Modify(ModifyKind::Name(_)) => Vec::new(),
        EventKind::Modify(_) => event.paths.iter().cloned().map(RawEvent::Modified).collect(),
        _ => Vec::new(),
    }
}

/// A creation waiting for its settle period to elapse.
#[derive(Debug)]
struct Pending {
    path: PathBuf,
    ready_at: Instant,
}

/// Ordered set of pending creations.
#[derive(Debug, Default)]
struct PendingQueue {
    items: Vec<Pending>,
}

impl PendingQueue {
    fn apply(&mut self, event: RawEvent, settle: Duration, now: Instant) {
        match event {
            RawEvent::Created(path) => {
                if let Some(item) = self.items.iter_mut().find(|p| p.path == path) {
                    item.ready_at = now + settle;
                } else {
                    self.items.push(Pending {
                        path,
                        ready_at: now + settle,
                    });
                }
            }
            RawEvent::Modified(path) => {
                if let Some(item) = self.items.iter_mut().find(|p| p.path == path) {
                    item.ready_at = now + settle;
                }
            }
        }
    }

    /// Removes and returns, in arrival order, every path that has settled.
    fn take_ready(&mut self, now: Instant) -> Vec<PathBuf> {
        let (ready, waiting): (Vec<_>, Vec<_>) =
            self.items.drain(..).partition(|p| p.ready_at <= now);
        self.items = waiting;
        ready.into_iter().map(|p| p.path).collect()
    }

    /// Time until the next pending path settles.
    fn next_wait(&self, now: Instant) -> Option<Duration> {
        self.items
            .iter()
            .map(|p| p.ready_at.saturating_duration_since(now))
            .min()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Worker loop: runs until cancelled or the channel disconnects.
fn run_worker(
    rx: Receiver<RawEvent>,
    cancel: Arc<AtomicBool>,
    organizer: Arc<Organizer>,
    filters: Arc<CompiledFilters>,
    settle: Duration,
) -> DispatchStats {
    let mut stats = DispatchStats::default();
    let mut pending = PendingQueue::default();

    while !cancel.load(Ordering::Relaxed) {
        let timeout = pending
            .next_wait(Instant::now())
            .map_or(POLL_INTERVAL, |wait| wait.min(POLL_INTERVAL));

        match rx.recv_timeout(timeout) {
            Ok(event) => {
                pending.apply(event, settle, Instant::now());
                // Pick up whatever else has already arrived.
                while let Ok(event) = rx.try_recv() {
                    pending.apply(event, settle, Instant::now());
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                if pending.is_empty() {
                    break;
                }
                std::thread::sleep(timeout);
            }
        }

        for path in pending.take_ready(Instant::now()) {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            dispatch(&path, &organizer, &filters, &mut stats);
        }
    }

    debug!("Dispatch worker shutting down");
    stats
}

/// Checks one settled path and forwards it to the organizer.
fn dispatch(
    path: &Path,
    organizer: &Organizer,
    filters: &CompiledFilters,
    stats: &mut DispatchStats,
) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let meta = match fs::metadata(path) {
        Ok(meta) => Some(meta),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "File {} appears to be empty or was deleted", name);
            stats.skipped += 1;
            return;
        }
        // Let the organizer report it.
        Err(_) => None,
    };

    if meta.as_ref().is_some_and(|m| m.is_dir()) {
        trace!(path = %path.display(), "Ignoring directory");
        return;
    }

    if meta.as_ref().is_some_and(|m| m.len() == 0) {
        warn!(path = %path.display(), "File {} appears to be empty or was deleted", name);
        stats.skipped += 1;
        return;
    }

    if !filters.should_include(path) {
        debug!(path = %path.display(), "Excluded by filters");
        stats.skipped += 1;
        return;
    }

    match organizer.organize(path) {
        Ok(Outcome::Moved(_)) => stats.moved += 1,
        Ok(Outcome::Skipped(Skip::NotAFile | Skip::AlreadySorted | Skip::Empty)) => {
            stats.skipped += 1
        }
        // Already logged by the organizer.
        Err(_) => stats.failed += 1,
    }
}
