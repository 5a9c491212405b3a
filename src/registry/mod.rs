//! Path registry: the immutable source/watch/destination table.
//!
//! One [`PathSpec`] per [`AssetCategory`], fixed at compile time and rooted
//! at the project directory when the registry is constructed. Nothing here
//! touches the filesystem at registration time; a pattern matching zero
//! files simply yields zero work.
//!
//! | Category | Source | Watch | Destination |
//! |---|---|---|---|
//! | markup  | `src/index/index.md`         | `src/index/*.md`           | `dist/` |
//! | style   | `src/style/main.{scss,css}`  | `src/style/*.{scss,css}`   | `dist/css/style.min.css` |
//! | scripts | `src/scripts/*.{ts,js}`      | same                       | `dist/javascript/main.min.js` |
//! | images  | `src/images/**/*`            | `src/images/*`             | `dist/images/` |
//! | fonts   | `src/fonts/*.{woff,woff2}`   | not watched                | `dist/fonts/` |
//!
//! Brace alternation is stored pre-expanded since the glob syntax used
//! here has no brace support.

use std::path::{Path, PathBuf};

use crate::config::ConfigError;
use crate::core::AssetCategory;

/// Immutable path record for one asset category.
#[derive(Debug, Clone, Copy)]
pub struct PathSpec {
    /// Directory the source patterns are anchored under; destination
    /// paths preserve structure relative to this.
    pub base: &'static str,
    /// Source glob patterns, relative to the project root.
    pub sources: &'static [&'static str],
    /// Watch glob patterns (development mode only). Empty = not watched.
    pub watch: &'static [&'static str],
    /// Destination directory, relative to the project root.
    pub dest: &'static str,
    /// Fixed output filename, applied after all transforms.
    pub rename: Option<&'static str>,
}

const MARKUP: PathSpec = PathSpec {
    base: "src/index",
    sources: &["src/index/index.md"],
    watch: &["src/index/*.md"],
    dest: "dist",
    rename: None,
};

const STYLE: PathSpec = PathSpec {
    base: "src/style",
    sources: &["src/style/main.scss", "src/style/main.css"],
    watch: &["src/style/*.scss", "src/style/*.css"],
    dest: "dist/css",
    rename: Some("style.min.css"),
};

const SCRIPT: PathSpec = PathSpec {
    base: "src/scripts",
    sources: &["src/scripts/*.ts", "src/scripts/*.js"],
    watch: &["src/scripts/*.ts", "src/scripts/*.js"],
    dest: "dist/javascript",
    rename: Some("main.min.js"),
};

const IMAGE: PathSpec = PathSpec {
    base: "src/images",
    sources: &["src/images/**/*"],
    watch: &["src/images/*"],
    dest: "dist/images",
    rename: None,
};

const FONT: PathSpec = PathSpec {
    base: "src/fonts",
    sources: &["src/fonts/*.woff", "src/fonts/*.woff2"],
    watch: &[],
    dest: "dist/fonts",
    rename: None,
};

/// Registry mapping each category to its paths, rooted at the project dir.
///
/// Constructed once at process start and passed explicitly to every
/// component that needs it.
#[derive(Debug, Clone)]
pub struct PathRegistry {
    root: PathBuf,
}

impl PathRegistry {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The path record for a category. O(1), pure lookup.
    pub const fn spec(category: AssetCategory) -> &'static PathSpec {
        match category {
            AssetCategory::Markup => &MARKUP,
            AssetCategory::Style => &STYLE,
            AssetCategory::Script => &SCRIPT,
            AssetCategory::Image => &IMAGE,
            AssetCategory::Font => &FONT,
        }
    }

    /// Compile every pattern in the table, failing on the first malformed one.
    ///
    /// Called at startup so a bad pattern refuses the whole run instead of
    /// surfacing mid-build.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for category in AssetCategory::ALL {
            let spec = Self::spec(category);
            for pattern in spec.sources.iter().chain(spec.watch.iter()) {
                glob::Pattern::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: (*pattern).to_string(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    /// Collect the source files currently matching a category's patterns.
    ///
    /// Returns absolute paths, sorted for deterministic processing order.
    /// Directories matched by recursive patterns are filtered out.
    pub fn sources(&self, category: AssetCategory) -> anyhow::Result<Vec<PathBuf>> {
        let spec = Self::spec(category);
        let mut files = Vec::new();

        for pattern in spec.sources {
            let absolute = self.root.join(pattern);
            let absolute = absolute
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("non-unicode project root"))?;

            for entry in glob::glob(absolute)? {
                let path = entry?;
                if path.is_file() {
                    files.push(path);
                }
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }

    /// Absolute destination directory for a category.
    pub fn dest_dir(&self, category: AssetCategory) -> PathBuf {
        self.root.join(Self::spec(category).dest)
    }

    /// Absolute base directory for a category's sources.
    pub fn base_dir(&self, category: AssetCategory) -> PathBuf {
        self.root.join(Self::spec(category).base)
    }

    /// Destination path for one source file, preserving structure below
    /// the category base and applying the fixed rename when configured.
    pub fn dest_for(&self, category: AssetCategory, source: &Path) -> PathBuf {
        let spec = Self::spec(category);
        let dest = self.dest_dir(category);

        if let Some(name) = spec.rename {
            return dest.join(name);
        }

        let rel = source
            .strip_prefix(self.base_dir(category))
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(source.file_name().unwrap_or_default()));
        dest.join(rel)
    }

    /// Find the watched category whose watch pattern matches a changed path.
    ///
    /// Returns `None` for paths outside every watch pattern (including all
    /// font files - fonts are a build-only category).
    pub fn category_for_change(&self, path: &Path) -> Option<AssetCategory> {
        let rel = path.strip_prefix(&self.root).ok()?;

        for category in AssetCategory::ALL {
            for pattern in Self::spec(category).watch {
                // Patterns were validated at startup.
                let Ok(pattern) = glob::Pattern::new(pattern) else {
                    continue;
                };
                if pattern.matches_path(rel) {
                    return Some(category);
                }
            }
        }
        None
    }
}
