//! Transform chain: an explicit ordered list of named stages.
//!
//! Each stage consumes one `(path, content)` item and produces zero or
//! more: it may rewrite content, rename, expand, or filter (empty output
//! = the item is skipped). Stage order is fixed per category at chain
//! construction; renaming always happens after the content stages, and
//! the terminal write step always targets the category's destination
//! directory.
//!
//! # Error containment
//!
//! A stage error for one item is logged and counted, then processing
//! continues with the remaining items - the chain never aborts the whole
//! pipeline. This is what keeps a long-running watch session alive when
//! a single malformed source file shows up. Destination I/O errors are
//! the exception: they are fatal and propagate to the caller.

mod error;

pub use error::TransformError;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::BuildMode;

/// One unit of work flowing through a chain.
#[derive(Debug, Clone)]
pub struct AssetItem {
    /// Absolute path of the originating source file.
    pub source: PathBuf,
    /// Output path relative to the destination directory.
    pub rel: PathBuf,
    /// Current content. Empty until a read stage loads it.
    pub content: Vec<u8>,
}

impl AssetItem {
    pub fn new(source: PathBuf, rel: PathBuf) -> Self {
        Self {
            source,
            rel,
            content: Vec::new(),
        }
    }
}

/// Context shared by all stages of one chain run.
pub struct StageCtx<'a> {
    pub mode: BuildMode,
    /// Absolute destination directory of the category.
    pub dest_dir: &'a Path,
    /// Log prefix (the category name).
    pub label: &'static str,
}

type StageFn = Box<dyn Fn(AssetItem, &StageCtx) -> Result<Vec<AssetItem>, TransformError> + Send + Sync>;

/// A named transform stage.
pub struct Stage {
    name: &'static str,
    apply: StageFn,
}

impl Stage {
    pub fn new(
        name: &'static str,
        apply: impl Fn(AssetItem, &StageCtx) -> Result<Vec<AssetItem>, TransformError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            name,
            apply: Box::new(apply),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(
        &self,
        item: AssetItem,
        ctx: &StageCtx,
    ) -> Result<Vec<AssetItem>, TransformError> {
        (self.apply)(item, ctx)
    }
}

type MergeFn = Box<dyn Fn(Vec<AssetItem>) -> Result<AssetItem, TransformError> + Send + Sync>;

/// Terminal many-to-one step (script bundling).
pub struct Collector {
    name: &'static str,
    merge: MergeFn,
}

impl Collector {
    pub fn new(
        name: &'static str,
        merge: impl Fn(Vec<AssetItem>) -> Result<AssetItem, TransformError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            merge: Box::new(merge),
        }
    }
}

/// Counters reported by one chain run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainReport {
    /// Files written to the destination directory.
    pub written: usize,
    /// Items dropped by a filter stage (e.g. up-to-date images).
    pub skipped: usize,
    /// Items lost to a contained transform error.
    pub failed: usize,
}

/// Ordered stages plus optional collector and rename, composed once per
/// (category, mode) pair at startup.
pub struct TransformChain {
    stages: Vec<Stage>,
    collect: Option<Collector>,
    rename: Option<&'static str>,
}

impl TransformChain {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            stages,
            collect: None,
            rename: None,
        }
    }

    /// Merge all surviving items into one before writing.
    pub fn with_collector(mut self, collector: Collector) -> Self {
        self.collect = Some(collector);
        self
    }

    /// Fixed output filename, applied after all content stages.
    pub fn with_rename(mut self, rename: Option<&'static str>) -> Self {
        self.rename = rename;
        self
    }

    /// Run every item through the stage list, then write survivors.
    ///
    /// Transform errors are contained per item; destination I/O errors
    /// propagate.
    pub fn run(&self, items: Vec<AssetItem>, ctx: &StageCtx) -> Result<ChainReport> {
        let mut report = ChainReport::default();
        let mut survivors = Vec::new();

        'items: for item in items {
            let mut current = vec![item];

            for stage in &self.stages {
                let mut next = Vec::new();
                for it in current {
                    let source = it.source.clone();
                    match stage.apply(it, ctx) {
                        Ok(out) => next.extend(out),
                        Err(e) => {
                            report.failed += 1;
                            crate::log!(ctx.label; "{} failed: {}", stage.name(), e);
                            crate::debug!(ctx.label; "source: {}", source.display());
                            continue 'items;
                        }
                    }
                }
                if next.is_empty() {
                    report.skipped += 1;
                    continue 'items;
                }
                current = next;
            }

            survivors.extend(current);
        }

        let outputs = match &self.collect {
            Some(collector) if !survivors.is_empty() => {
                match (collector.merge)(survivors) {
                    Ok(merged) => vec![merged],
                    Err(e) => {
                        report.failed += 1;
                        crate::log!(ctx.label; "{} failed: {}", collector.name, e);
                        return Ok(report);
                    }
                }
            }
            Some(_) => Vec::new(),
            None => survivors,
        };

        for mut item in outputs {
            if let Some(name) = self.rename {
                item.rel = PathBuf::from(name);
            }
            let dest = ctx.dest_dir.join(&item.rel);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(&dest, &item.content)
                .with_context(|| format!("failed to write {}", dest.display()))?;
            report.written += 1;
        }

        Ok(report)
    }
}

/// Stage that loads file content from disk.
///
/// Placed after any pre-read filters so skipped files are never read.
pub fn read_stage() -> Stage {
    Stage::new("read", |mut item, _ctx| {
        item.content = fs::read(&item.source).map_err(|source| TransformError::Read {
            path: item.source.clone(),
            source,
        })?;
        Ok(vec![item])
    })
}
