//! Script extension dispatch and priority.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::config::ConfigError;
use crate::registry::PathSpec;
use crate::transform::script::ScriptLang;

/// Check that every extension the script patterns can match has a
/// registered compiler. Called at startup; an unmatched extension is a
/// configuration error, never a runtime failure.
pub fn validate(spec: &PathSpec) -> Result<(), ConfigError> {
    for pattern in spec.sources {
        let ext = Path::new(pattern)
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::ExtensionlessScriptPattern((*pattern).to_string()))?;

        if ScriptLang::from_extension(ext).is_none() {
            return Err(ConfigError::UnhandledScriptExtension(ext.to_string()));
        }
    }
    Ok(())
}

/// Resolve the fixed extension priority: when both `x.ts` and `x.js`
/// exist, the TypeScript module wins and the JavaScript one is dropped.
///
/// Output is sorted for deterministic bundle order.
pub fn dedupe_by_stem(files: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut by_stem: FxHashMap<PathBuf, PathBuf> = FxHashMap::default();

    for file in files {
        let stem = file.with_extension("");
        match by_stem.get(&stem) {
            Some(existing) if priority(existing) <= priority(&file) => {}
            _ => {
                by_stem.insert(stem, file);
            }
        }
    }

    let mut out: Vec<_> = by_stem.into_values().collect();
    out.sort();
    out
}

fn priority(path: &Path) -> usize {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ts") => 0,
        _ => 1,
    }
}
