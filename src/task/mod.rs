//! Task set: one runnable unit of work per (category, mode) pair.
//!
//! Tasks are created once at startup from the path registry and the
//! build mode, never mutated, and invoked repeatedly - once per full
//! build, or once per relevant file-change event in watch mode.

mod chains;
pub mod dispatch;

use std::path::Path;

use anyhow::Result;

use crate::chain::{AssetItem, StageCtx, TransformChain};
use crate::config::ConfigError;
use crate::core::{AssetCategory, BuildMode};
use crate::registry::PathRegistry;

/// Completion signal of one task invocation.
///
/// A contained transform error shows up in `failed` but still counts as
/// a completed, non-fatal outcome.
#[derive(Debug, Clone, Copy)]
pub struct TaskOutcome {
    pub category: AssetCategory,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl TaskOutcome {
    /// True when no contained errors occurred.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    /// One-line summary for log output.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("{} written", self.written)];
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        parts.join(", ")
    }
}

/// A named, idempotent unit of work.
pub struct Task {
    category: AssetCategory,
    mode: BuildMode,
    registry: PathRegistry,
    chain: TransformChain,
}

impl Task {
    fn new(category: AssetCategory, mode: BuildMode, registry: PathRegistry) -> Self {
        Self {
            category,
            mode,
            registry,
            chain: chains::chain_for(category),
        }
    }

    pub fn category(&self) -> AssetCategory {
        self.category
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Run the task once: collect current sources, run the chain, report.
    ///
    /// Returns `Err` only for fatal destination I/O failures; transform
    /// errors are contained inside the chain and reported in the outcome.
    pub async fn run(&self) -> Result<TaskOutcome> {
        let mut sources = self.registry.sources(self.category)?;
        if self.category == AssetCategory::Script {
            sources = dispatch::dedupe_by_stem(sources);
        }

        let base = self.registry.base_dir(self.category);
        let items = sources
            .into_iter()
            .map(|source| {
                let rel = source
                    .strip_prefix(&base)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| source.file_name().unwrap_or_default().into());
                AssetItem::new(source, rel)
            })
            .collect();

        let dest_dir = self.registry.dest_dir(self.category);
        let ctx = StageCtx {
            mode: self.mode,
            dest_dir: &dest_dir,
            label: self.category.name(),
        };

        let report = self.chain.run(items, &ctx)?;
        let outcome = TaskOutcome {
            category: self.category,
            written: report.written,
            skipped: report.skipped,
            failed: report.failed,
        };

        crate::debug!(self.category.name(); "{}", outcome.summary());
        Ok(outcome)
    }
}

/// All tasks for one build mode, validated at construction.
pub struct TaskSet {
    mode: BuildMode,
    registry: PathRegistry,
    tasks: Vec<Task>,
}

impl TaskSet {
    /// Build the task set, refusing to start on any configuration error
    /// (malformed pattern, unhandled script extension).
    pub fn new(mode: BuildMode, registry: PathRegistry) -> Result<Self, ConfigError> {
        registry.validate()?;
        dispatch::validate(PathRegistry::spec(AssetCategory::Script))?;

        let tasks = AssetCategory::ALL
            .iter()
            .map(|&category| Task::new(category, mode, registry.clone()))
            .collect();

        Ok(Self {
            mode,
            registry,
            tasks,
        })
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn registry(&self) -> &PathRegistry {
        &self.registry
    }

    /// The task for one category. O(1) over the fixed category order.
    pub fn task(&self, category: AssetCategory) -> &Task {
        let index = AssetCategory::ALL
            .iter()
            .position(|&c| c == category)
            .expect("every category has a task");
        &self.tasks[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project(tree: &[(&str, &[u8])]) -> (TempDir, PathRegistry) {
        let tmp = TempDir::new().unwrap();
        for (rel, content) in tree {
            let path = tmp.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
        }
        let registry = PathRegistry::new(tmp.path().to_path_buf());
        (tmp, registry)
    }

    fn run(task: &Task) -> TaskOutcome {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(task.run())
            .unwrap()
    }

    #[test]
    fn test_markup_task_writes_index_html() {
        let (tmp, registry) = project(&[("src/index/index.md", b"# Hello\n")]);
        let tasks = TaskSet::new(BuildMode::PRODUCTION, registry).unwrap();

        let outcome = run(tasks.task(AssetCategory::Markup));
        assert_eq!(outcome.written, 1);

        let html = fs::read_to_string(tmp.path().join("dist/index.html")).unwrap();
        assert!(html.contains("<h1>Hello</h1>"));
    }

    #[test]
    fn test_style_task_mode_sensitivity() {
        let source: &[u8] = b"body {\n  color: red;\n  user-select: none;\n}\n";

        let (tmp, registry) = project(&[("src/style/main.scss", source)]);
        let tasks = TaskSet::new(BuildMode::PRODUCTION, registry.clone()).unwrap();
        run(tasks.task(AssetCategory::Style));
        let minified = fs::read_to_string(tmp.path().join("dist/css/style.min.css")).unwrap();
        assert!(!minified.trim_end().contains('\n'));
        assert!(minified.contains("-webkit-user-select"));

        let tasks = TaskSet::new(BuildMode::DEVELOPMENT, registry).unwrap();
        run(tasks.task(AssetCategory::Style));
        let pretty = fs::read_to_string(tmp.path().join("dist/css/style.min.css")).unwrap();
        assert!(pretty.contains('\n'));
        assert!(pretty.contains("-webkit-user-select"));
    }

    #[test]
    fn test_script_task_bundles_with_ts_priority() {
        let (tmp, registry) = project(&[
            ("src/scripts/app.ts", b"export const version: number = 2;\n".as_slice()),
            ("src/scripts/app.js", b"export const version = 1;\n".as_slice()),
            ("src/scripts/util.js", b"export function noop() {}\n".as_slice()),
        ]);
        let tasks = TaskSet::new(BuildMode::PRODUCTION, registry).unwrap();

        let outcome = run(tasks.task(AssetCategory::Script));
        assert_eq!(outcome.written, 1);

        let bundle = fs::read_to_string(tmp.path().join("dist/javascript/main.min.js")).unwrap();
        // The TypeScript module wins; its JavaScript twin is dropped.
        assert!(!bundle.contains("version = 1"), "got: {bundle}");
    }

    #[test]
    fn test_image_task_incremental_skip() {
        let img = image::DynamicImage::new_rgba8(2, 2);
        let mut png = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let (tmp, registry) = project(&[("src/images/x.png", png.as_slice())]);
        let tasks = TaskSet::new(BuildMode::PRODUCTION, registry).unwrap();

        let first = run(tasks.task(AssetCategory::Image));
        assert_eq!(first.written, 1);
        assert!(tmp.path().join("dist/images/x.png").is_file());

        // Second invocation: destination is current, so the optimizer
        // must not run again.
        let second = run(tasks.task(AssetCategory::Image));
        assert_eq!(second.written, 0);
        assert_eq!(second.skipped, 1);
    }

    #[test]
    fn test_image_task_nested_structure_preserved() {
        let img = image::DynamicImage::new_rgba8(2, 2);
        let mut png = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let (tmp, registry) = project(&[("src/images/icons/a.png", png.as_slice())]);
        let tasks = TaskSet::new(BuildMode::PRODUCTION, registry).unwrap();

        run(tasks.task(AssetCategory::Image));
        assert!(tmp.path().join("dist/images/icons/a.png").is_file());
    }

    #[test]
    fn test_font_task_copies() {
        let (tmp, registry) = project(&[("src/fonts/sans.woff2", b"\x77\x4f\x46\x32".as_slice())]);
        let tasks = TaskSet::new(BuildMode::PRODUCTION, registry).unwrap();

        let outcome = run(tasks.task(AssetCategory::Font));
        assert_eq!(outcome.written, 1);
        assert_eq!(
            fs::read(tmp.path().join("dist/fonts/sans.woff2")).unwrap(),
            b"\x77\x4f\x46\x32"
        );
    }

    #[test]
    fn test_contained_error_reported_not_fatal() {
        let (tmp, registry) = project(&[
            ("src/scripts/bad.js", b"const = broken;".as_slice()),
            ("src/scripts/good.js", b"export const ok = true;\n".as_slice()),
        ]);
        let tasks = TaskSet::new(BuildMode::PRODUCTION, registry).unwrap();

        let outcome = run(tasks.task(AssetCategory::Script));
        assert_eq!(outcome.failed, 1);
        // The good module still reaches the bundle.
        assert_eq!(outcome.written, 1);
        let bundle = fs::read_to_string(tmp.path().join("dist/javascript/main.min.js")).unwrap();
        assert!(bundle.contains("ok"));
    }

    #[test]
    fn test_empty_source_tree_yields_zero_work() {
        let tmp = TempDir::new().unwrap();
        let registry = PathRegistry::new(tmp.path().to_path_buf());
        let tasks = TaskSet::new(BuildMode::PRODUCTION, registry).unwrap();

        let outcome = run(tasks.task(AssetCategory::Style));
        assert_eq!(outcome.written, 0);
        assert_eq!(outcome.failed, 0);
        assert!(!tmp.path().join("dist").exists());
    }
}
