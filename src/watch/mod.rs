//! File watching for dev mode.
//!
//! Watches the source tree, debounces change bursts, maps settled
//! changes to asset categories and reruns only the affected tasks.
//! A successful rebuild pushes a reload message to connected browsers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashMap;

use crate::core::AssetCategory;
use crate::reload::{ReloadHub, ReloadMessage};
use crate::task::TaskSet;
use crate::utils::path::normalize_path;

/// Debounce configuration
const DEBOUNCE_MS: u64 = 300;
const REBUILD_COOLDOWN_MS: u64 = 800;

/// Check if path is a temp/backup file (editor artifacts)
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Spawn the watch loop on its own thread with a single-threaded runtime.
///
/// A fatal watch error (destination I/O, watcher death) requests process
/// shutdown so the request loop unwinds too.
pub fn spawn(tasks: TaskSet, hub: ReloadHub) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                crate::log!("watch"; "failed to start runtime: {}", e);
                crate::core::request_shutdown();
                return;
            }
        };

        if let Err(e) = rt.block_on(run_watch(tasks, hub)) {
            crate::log!("error"; "watch stopped: {:#}", e);
            crate::core::request_shutdown();
        }
    })
}

/// Watch loop body. Runs until shutdown is requested.
async fn run_watch(tasks: TaskSet, hub: ReloadHub) -> Result<()> {
    let watch_root = tasks.registry().root().join("src");
    if !watch_root.is_dir() {
        anyhow::bail!("watch root {} does not exist", watch_root.display());
    }

    // notify is callback-based and sync; bridge into the async loop
    // through a std channel and a forwarding thread.
    let (notify_tx, notify_rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = notify_tx.send(res);
    })?;
    watcher.watch(&watch_root, RecursiveMode::Recursive)?;
    crate::log!("watch"; "watching {}", watch_root.display());

    let (async_tx, mut async_rx) = tokio::sync::mpsc::channel::<notify::Event>(64);
    std::thread::spawn(move || {
        while let Ok(result) = notify_rx.recv() {
            match result {
                Ok(event) => {
                    if async_tx.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(e) => crate::log!("watch"; "notify error: {}", e),
            }
        }
    });

    let mut debouncer = Debouncer::new();

    loop {
        // Cap the idle sleep so shutdown is noticed promptly.
        let sleep = debouncer.sleep_duration().min(Duration::from_millis(500));

        tokio::select! {
            biased;
            Some(event) = async_rx.recv() => debouncer.add_event(&event),
            _ = tokio::time::sleep(sleep) => {
                if crate::core::is_shutdown() {
                    break;
                }
                if let Some(changes) = debouncer.take_if_ready() {
                    rebuild(&tasks, &hub, changes).await?;
                }
            }
        }
    }

    Ok(())
}

/// Rerun the tasks whose categories match the settled change set.
async fn rebuild(
    tasks: &TaskSet,
    hub: &ReloadHub,
    changes: FxHashMap<PathBuf, ChangeKind>,
) -> Result<()> {
    for (path, kind) in &changes {
        crate::debug!("watch"; "{}: {}", kind.label(), path.display());
    }

    let paths: Vec<PathBuf> = changes.into_keys().collect();
    let categories = affected_categories(tasks, &paths);
    if categories.is_empty() {
        return Ok(());
    }

    let mut failed = 0;
    let mut written = 0;
    for category in &categories {
        let outcome = tasks.task(*category).run().await?;
        failed += outcome.failed;
        written += outcome.written;
    }

    let names: Vec<_> = categories.iter().map(|c| c.name()).collect();
    if failed > 0 {
        crate::logger::status_error(
            &format!("rebuild of {} had errors", names.join(", ")),
            "see log above",
        );
        return Ok(());
    }

    crate::logger::status_success(&format!(
        "rebuilt {} ({} written)",
        names.join(", "),
        written
    ));

    // A removal rebuild writes nothing but still changes what the
    // destination tree serves, so clients are notified regardless of
    // the written count.
    if tasks.mode().emit_reload {
        hub.broadcast(&ReloadMessage::Reload);
    }
    Ok(())
}

/// Map changed paths to the categories to rerun, one entry per
/// category, in build order.
fn affected_categories(tasks: &TaskSet, paths: &[PathBuf]) -> Vec<AssetCategory> {
    AssetCategory::ORCHESTRATED
        .into_iter()
        .filter(|category| {
            paths
                .iter()
                .any(|p| tasks.registry().category_for_change(p) == Some(*category))
        })
        .collect()
}

// =============================================================================
// Debouncer - Pure timing and event deduplication
// =============================================================================

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Pure debouncer: only handles timing and event deduplication.
struct Debouncer {
    /// Path → ChangeKind (dedup is free via HashMap key uniqueness)
    changes: FxHashMap<PathBuf, ChangeKind>,
    last_event: Option<std::time::Instant>,
    last_rebuild: Option<std::time::Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            last_rebuild: None,
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Remove + Create/Modify → Create/Modify (file was restored)
    /// - Create/Modify + Remove → Remove (file was deleted)
    /// - Same type events: first event wins
    fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(modify) => {
                // Metadata-only changes (mtime/atime/chmod noise) can
                // trigger endless rebuild loops
                if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                    return;
                }
                ChangeKind::Modified
            }
            _ => return,
        };

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }

            let path = normalize_path(path);

            if let Some(&existing) = self.changes.get(&path) {
                // State transitions:
                // - Removed -> Created/Modified: restored, use new event
                // - Modified -> Removed: deleted, upgrade to Removed
                // - Created -> Removed: appeared then vanished, discard
                // - otherwise: first event wins
                match (existing, kind) {
                    (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                        self.changes.insert(path, kind);
                    }
                    (ChangeKind::Modified, ChangeKind::Removed) => {
                        self.changes.insert(path, ChangeKind::Removed);
                    }
                    (ChangeKind::Created, ChangeKind::Removed) => {
                        self.changes.remove(&path);
                    }
                    _ => continue,
                }
                self.last_event = Some(std::time::Instant::now());
                continue;
            }

            crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
            self.changes.insert(path, kind);
            self.last_event = Some(std::time::Instant::now());
        }
    }

    /// Take raw events if debounce + cooldown elapsed.
    fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        if !self.is_ready() {
            return None;
        }

        let changes = std::mem::take(&mut self.changes);
        self.last_event = None;

        if changes.is_empty() {
            return None;
        }

        self.last_rebuild = Some(std::time::Instant::now());
        Some(changes)
    }

    fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };

        if last_event.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
            return false;
        }

        if let Some(last_rebuild) = self.last_rebuild
            && last_rebuild.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS)
        {
            return false;
        }

        !self.changes.is_empty()
    }

    /// Precise sleep duration until next possible ready time.
    fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        let debounce_remaining =
            Duration::from_millis(DEBOUNCE_MS).saturating_sub(last_event.elapsed());

        let cooldown_remaining = self
            .last_rebuild
            .map(|t| Duration::from_millis(REBUILD_COOLDOWN_MS).saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);

        debounce_remaining
            .max(cooldown_remaining)
            .max(Duration::from_millis(1))
    }
}
