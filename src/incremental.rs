//! Mtime-based incremental skip for the image category.
//!
//! Image optimization is the most expensive stage and its inputs rarely
//! change, so each candidate is compared against its would-be destination:
//! a destination that exists and is at least as new as the source is
//! skipped. The decision is recomputed on every invocation - there is no
//! persisted cache; the file system's own timestamps are the source of
//! truth.

use std::path::Path;
use std::time::SystemTime;

use crate::chain::Stage;

/// Per-candidate outcome of the freshness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementalDecision {
    /// Source is newer than the destination, or no destination exists.
    Process,
    /// Destination is current; do not re-run the optimizer.
    Skip,
}

/// Get the modification time of a file.
///
/// Returns `None` if the file doesn't exist or mtime cannot be read.
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// Compare one source file against its computed destination path.
///
/// A missing destination (including a missing destination directory)
/// always yields `Process`.
pub fn decide(source: &Path, dest: &Path) -> IncrementalDecision {
    let (Some(source_time), Some(dest_time)) = (get_mtime(source), get_mtime(dest)) else {
        return IncrementalDecision::Process;
    };

    if dest_time >= source_time {
        IncrementalDecision::Skip
    } else {
        IncrementalDecision::Process
    }
}

/// Chain stage dropping items whose destination is already current.
///
/// Placed before the read stage so skipped files are never loaded.
pub fn newer_stage() -> Stage {
    Stage::new("newer", |item, ctx| {
        let dest = ctx.dest_dir.join(&item.rel);
        match decide(&item.source, &dest) {
            IncrementalDecision::Process => Ok(vec![item]),
            IncrementalDecision::Skip => Ok(vec![]),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_missing_destination_is_processed() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("x.png");
        fs::write(&source, b"src").unwrap();

        let dest = tmp.path().join("dist/x.png");
        assert_eq!(decide(&source, &dest), IncrementalDecision::Process);
    }

    #[test]
    fn test_current_destination_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("x.png");
        let dest = tmp.path().join("out.png");
        fs::write(&source, b"src").unwrap();
        fs::write(&dest, b"out").unwrap();

        // Destination written after the source: skip.
        let later = SystemTime::now() + Duration::from_secs(60);
        let file = fs::OpenOptions::new().write(true).open(&dest).unwrap();
        file.set_modified(later).unwrap();

        assert_eq!(decide(&source, &dest), IncrementalDecision::Skip);
    }

    #[test]
    fn test_stale_destination_is_processed() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("x.png");
        let dest = tmp.path().join("out.png");
        fs::write(&dest, b"out").unwrap();
        fs::write(&source, b"src").unwrap();

        let earlier = SystemTime::now() - Duration::from_secs(60);
        let file = fs::OpenOptions::new().write(true).open(&dest).unwrap();
        file.set_modified(earlier).unwrap();

        assert_eq!(decide(&source, &dest), IncrementalDecision::Process);
    }

    #[test]
    fn test_newer_stage_skips_without_invoking_later_stages() {
        use crate::chain::{AssetItem, StageCtx, TransformChain};
        use crate::core::BuildMode;
        use std::path::PathBuf;
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let tmp = TempDir::new().unwrap();
        let dest_dir = tmp.path().join("dist");
        fs::create_dir_all(&dest_dir).unwrap();

        // "current.png" has an up-to-date destination; "stale.png" has none.
        for name in ["current.png", "stale.png"] {
            fs::write(tmp.path().join(name), b"img").unwrap();
        }
        fs::write(dest_dir.join("current.png"), b"img").unwrap();
        let later = SystemTime::now() + Duration::from_secs(60);
        let file = fs::OpenOptions::new()
            .write(true)
            .open(dest_dir.join("current.png"))
            .unwrap();
        file.set_modified(later).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_stage = Arc::clone(&calls);
        let chain = TransformChain::new(vec![
            newer_stage(),
            Stage::new("spy", move |mut it, _| {
                calls_in_stage.fetch_add(1, Ordering::SeqCst);
                it.content = b"optimized".to_vec();
                Ok(vec![it])
            }),
        ]);

        let items = ["current.png", "stale.png"]
            .map(|name| AssetItem::new(tmp.path().join(name), PathBuf::from(name)))
            .into_iter()
            .collect();
        let ctx = StageCtx {
            mode: BuildMode::PRODUCTION,
            dest_dir: &dest_dir,
            label: "images",
        };

        let report = chain.run(items, &ctx).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.written, 1);
        // The optimizer ran for the stale file only.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_source_is_processed() {
        // Vanished source still flows into the chain, where the read
        // stage reports a contained error.
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("gone.png");
        let dest = tmp.path().join("out.png");
        fs::write(&dest, b"out").unwrap();

        assert_eq!(decide(&source, &dest), IncrementalDecision::Process);
    }
}
