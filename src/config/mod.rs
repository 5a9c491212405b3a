//! Project configuration for `gantry.toml`.
//!
//! The path table itself is fixed code (see [`crate::registry`]); the
//! config file only carries the knobs that vary per machine: the dev
//! server interface/port, the reload port, and the watch toggle.
//!
//! | Section   | Purpose                                        |
//! |-----------|------------------------------------------------|
//! | `[serve]` | Development server (interface, port, watch)    |
//!
//! CLI flags override file values; absent file means defaults.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::{Cli, Commands};

/// Startup-fatal configuration errors.
///
/// The process refuses to begin either build or watch mode on any of
/// these; they are never contained.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no compiler registered for script extension `.{0}`")]
    UnhandledScriptExtension(String),

    #[error("script pattern `{0}` names no file extension")]
    ExtensionlessScriptPattern(String),

    #[error("malformed glob pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("malformed {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Development server settings (`[serve]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Interface to bind. Defaults to 0.0.0.0 so other devices on the
    /// network can reach the dev server.
    #[serde(default = "default_interface")]
    pub interface: IpAddr,

    /// HTTP port for the static server.
    #[serde(default = "default_port")]
    pub port: u16,

    /// WebSocket port for reload notifications.
    #[serde(default = "default_reload_port")]
    pub reload_port: u16,

    /// Whether file watching is enabled in serve mode.
    #[serde(default = "default_watch")]
    pub watch: bool,
}

fn default_interface() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

const fn default_port() -> u16 {
    3000
}

const fn default_reload_port() -> u16 {
    35729
}

const fn default_watch() -> bool {
    true
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            port: default_port(),
            reload_port: default_reload_port(),
            watch: default_watch(),
        }
    }
}

/// Root configuration, parsed from `gantry.toml` when present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GantryConfig {
    /// Project root - parent of the config file (internal use only).
    #[serde(skip)]
    root: PathBuf,

    /// Development server settings.
    #[serde(default)]
    pub serve: ServeConfig,
}

impl GantryConfig {
    /// Load configuration: file first (if present), then CLI overrides.
    ///
    /// The project root is the parent directory of the config file, or
    /// the current directory when no file exists.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = Self::from_file(&cli.config)?;
        config.apply_cli(cli);
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            let mut config = Self::default();
            config.root = std::env::current_dir().context("cannot determine current directory")?;
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: Self =
            toml::from_str(&raw).map_err(|source| ConfigError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        config.root = crate::utils::path::normalize_path(path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(Commands::Serve {
            interface,
            port,
            watch,
        }) = &cli.command
        {
            if let Some(interface) = interface {
                self.serve.interface = *interface;
            }
            if let Some(port) = port {
                self.serve.port = *port;
            }
            if let Some(watch) = watch {
                self.serve.watch = *watch;
            }
        }
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let serve = ServeConfig::default();
        assert_eq!(serve.port, 3000);
        assert_eq!(serve.reload_port, 35729);
        assert_eq!(serve.interface, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert!(serve.watch);
    }

    #[test]
    fn test_parse_serve_section() {
        let config: GantryConfig = toml::from_str(
            r#"
            [serve]
            interface = "127.0.0.1"
            port = 8080
            watch = false
            "#,
        )
        .unwrap();
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.interface, "127.0.0.1".parse::<IpAddr>().unwrap());
        assert!(!config.serve.watch);
        // Unspecified fields keep their defaults.
        assert_eq!(config.serve.reload_port, 35729);
    }

    #[test]
    fn test_unknown_serve_key_rejected() {
        let parsed: Result<GantryConfig, _> = toml::from_str(
            r#"
            [serve]
            prot = 8080
            "#,
        );
        assert!(parsed.is_err());
    }
}
