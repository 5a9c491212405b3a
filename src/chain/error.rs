//! Transform error type.

use std::path::{Path, PathBuf};

/// Per-item transform failure.
///
/// Always contained by the chain: logged, the output for the offending
/// file is not produced, and processing continues with the remaining
/// items. Never terminates the process.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {message}")]
    Stage { path: PathBuf, message: String },
}

impl TransformError {
    /// A stage-level failure for one source file.
    pub fn stage(path: &Path, message: impl Into<String>) -> Self {
        Self::Stage {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}
