use crate::domain::events::ChangeEvent;
use crate::error::ScanError;
use crate::ports::notifier::ChangeNotifier;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Last observed modification time of every regular file under the root.
pub type TrackedFiles = HashMap<PathBuf, SystemTime>;

/// Polls a directory tree and reports what changed since the previous scan.
///
/// The scanner is the only owner of its `TrackedFiles`; nothing else reads
/// or writes them, so they live outside any lock.
pub struct Scanner<N> {
    root: PathBuf,
    tracked: TrackedFiles,
    notifier: Arc<N>,
}

impl<N> Scanner<N>
where
    N: ChangeNotifier + 'static,
{
    pub fn new(root: impl Into<PathBuf>, notifier: Arc<N>) -> Self {
        Self {
            root: root.into(),
            tracked: TrackedFiles::new(),
            notifier,
        }
    }

    pub fn tracked(&self) -> &TrackedFiles {
        &self.tracked
    }

    /// Scan every `period` until `shutdown` fires. The first scan starts
    /// immediately and two scans never overlap.
    pub async fn run(mut self, period: Duration, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(root = %self.root.display(), ?period, "Scanner started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.scan_once().await {
                Ok(0) => {}
                Ok(emitted) => debug!(emitted, tracked = self.tracked.len(), "Scan complete"),
                Err(e) => warn!(
                    path = %e.path().display(),
                    error = ?e,
                    "Error checking for changes, retrying next tick"
                ),
            }
        }

        info!("Scanner stopped");
    }

    /// Walk the tree once, notify every change and return how many were sent.
    ///
    /// A traversal error stops the walk, but deletions of already tracked
    /// files are still reported before the error is returned.
    pub async fn scan_once(&mut self) -> Result<usize, ScanError> {
        let mut seen = HashSet::new();
        let mut emitted = 0;

        let walked = self.walk(&mut seen, &mut emitted).await;
        emitted += self.sweep_deleted(&seen, walked.is_ok()).await;

        walked.map(|()| emitted)
    }

    async fn walk(
        &mut self,
        seen: &mut HashSet<PathBuf>,
        emitted: &mut usize,
    ) -> Result<(), ScanError> {
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let Some(mut entries) = self.open_dir(&dir).await? else {
                continue;
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| ScanError::traversal(&dir, e))?
            {
                let path = entry.path();
                // Symlinks are not followed
                let metadata = match entry.metadata().await {
                    Ok(metadata) => metadata,
                    // Removed between listing and stat
                    Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                    Err(e) => return Err(ScanError::traversal(&path, e)),
                };

                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }
                if !metadata.is_file() {
                    continue;
                }

                let modified = metadata
                    .modified()
                    .map_err(|e| ScanError::traversal(&path, e))?;
                if let Some(event) = self.observe(path.clone(), modified) {
                    self.notifier.notify(&event);
                    *emitted += 1;
                }
                seen.insert(path);
            }
        }

        Ok(())
    }

    /// List `dir`. A subdirectory removed since it was queued yields `None`;
    /// a missing root is still an error.
    async fn open_dir(&self, dir: &Path) -> Result<Option<fs::ReadDir>, ScanError> {
        match fs::read_dir(dir).await {
            Ok(entries) => Ok(Some(entries)),
            Err(e) if e.kind() == io::ErrorKind::NotFound && dir != self.root => Ok(None),
            Err(e) => Err(ScanError::traversal(dir, e)),
        }
    }

    fn observe(&mut self, path: PathBuf, modified: SystemTime) -> Option<ChangeEvent> {
        match self.tracked.insert(path.clone(), modified) {
            None => Some(ChangeEvent::created(path)),
            Some(previous) if modified > previous => Some(ChangeEvent::modified(path)),
            Some(_) => None,
        }
    }

    /// Forget tracked files that are gone. After an interrupted walk, files
    /// that were simply not reached must not count as deleted, so each one is
    /// checked on disk instead.
    async fn sweep_deleted(&mut self, seen: &HashSet<PathBuf>, walk_complete: bool) -> usize {
        let mut stale = Vec::new();
        for path in self.tracked.keys() {
            if seen.contains(path) {
                continue;
            }
            if walk_complete || matches!(fs::try_exists(path).await, Ok(false)) {
                stale.push(path.clone());
            }
        }

        let removed = stale.len();
        for path in stale {
            self.tracked.remove(&path);
            self.notifier.notify(&ChangeEvent::deleted(path));
        }
        removed
    }
}
