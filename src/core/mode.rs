//! Build mode configuration for production/development builds.

/// Build mode configuration.
///
/// Fixed for the lifetime of one invocation; a process is either always
/// in production or always in development mode, never a mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMode {
    /// Whether transforms emit compressed/minified output.
    /// When `false`, output is pretty-printed where the transform supports it.
    pub minify: bool,

    /// Whether a reload notification is broadcast after a task completes.
    pub emit_reload: bool,
}

impl BuildMode {
    /// Production mode: maximal compression, no live clients to notify.
    pub const PRODUCTION: Self = Self {
        minify: true,
        emit_reload: false,
    };

    /// Development mode: readable output, reload broadcast after every task.
    pub const DEVELOPMENT: Self = Self {
        minify: false,
        emit_reload: true,
    };

    /// Check if this is development mode.
    #[inline]
    pub const fn is_dev(&self) -> bool {
        self.emit_reload
    }

    /// Display name for log output.
    pub const fn name(&self) -> &'static str {
        if self.is_dev() { "development" } else { "production" }
    }
}
