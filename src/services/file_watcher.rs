use crate::error::{AppError, Result};
use async_trait::async_trait;
use notify::event::{AccessKind, AccessMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Something that can block until the watched trees may have changed.
///
/// Notifications carry no payload: every pass rescans from scratch, so a
/// coalesced or spurious wakeup costs at most one idle pass.
#[async_trait]
pub trait ChangeNotifier: Send {
    /// Waits for the next change. An error ends continuous mode.
    async fn wait_for_change(&mut self) -> Result<()>;
}

/// Hosts with a native recursive watch backend.
pub fn ensure_supported_platform() -> Result<()> {
    if cfg!(any(target_os = "linux", target_os = "macos", target_os = "windows")) {
        Ok(())
    } else {
        Err(AppError::UnsupportedPlatform {
            platform: std::env::consts::OS.to_string(),
        })
    }
}

/// Change notifier backed by the platform's file system events.
pub struct FileWatcher {
    // Dropping the watcher stops event delivery.
    _watcher: RecommendedWatcher,
    events: mpsc::Receiver<notify::Result<Event>>,
    debounce: Duration,
}

impl FileWatcher {
    /// Starts watching every path in `paths` recursively.
    pub fn start(paths: &[&Path], debounce: Duration) -> Result<Self> {
        ensure_supported_platform()?;

        let (tx, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Ok(event) = &res {
                if !is_relevant(&event.kind) {
                    return;
                }
            }

            // A full channel already holds a pending wakeup.
            if let Err(mpsc::error::TrySendError::Closed(_)) = tx.try_send(res) {
                debug!("File watcher event dropped after shutdown");
            }
        })?;

        for path in paths {
            watcher.watch(path, RecursiveMode::Recursive)?;
            info!("Watching path: {}", path.display());
        }

        Ok(Self {
            _watcher: watcher,
            events,
            debounce,
        })
    }

    async fn next_event(&mut self) -> Result<Event> {
        match self.events.recv().await {
            Some(Ok(event)) => Ok(event),
            Some(Err(e)) => Err(e.into()),
            None => Err(AppError::WatcherError {
                message: "event channel closed".to_string(),
            }),
        }
    }
}

#[async_trait]
impl ChangeNotifier for FileWatcher {
    async fn wait_for_change(&mut self) -> Result<()> {
        let first = self.next_event().await?;
        debug!("Change detected: {:?} {:?}", first.kind, first.paths);

        // Let bursts such as a multi-file copy settle into one wakeup.
        let mut coalesced = 0usize;
        loop {
            match tokio::time::timeout(self.debounce, self.next_event()).await {
                Ok(Ok(_)) => coalesced += 1,
                Ok(Err(e)) => {
                    warn!("File watcher failed: {}", e);
                    return Err(e);
                }
                Err(_) => break,
            }
        }

        if coalesced > 0 {
            debug!("Coalesced {} further events", coalesced);
        }

        Ok(())
    }
}

/// Reads and metadata-only touches are ignored, matching what can change the
/// outcome of a pass: creation, writes, moves and deletion.
fn is_relevant(kind: &EventKind) -> bool {
    match kind {
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => true,
        EventKind::Access(_) => false,
        _ => true,
    }
}
