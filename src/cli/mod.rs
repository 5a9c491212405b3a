//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::AssetCategory;

/// Gantry asset pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: gantry.toml)
    #[arg(short = 'C', long, default_value = "gantry.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands (default: serve)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build all assets for production
    #[command(visible_alias = "b")]
    Build,

    /// Start development server with file watching and live reload
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable file watching for auto-rebuild
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },

    /// Run a single category's task in production mode
    #[command(visible_alias = "t")]
    Task {
        /// Asset category (markup, style, scripts, images, fonts)
        #[arg(value_parser = AssetCategory::parse)]
        category: AssetCategory,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::parse_from(["gantry"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("gantry.toml"));
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::parse_from(["gantry", "serve", "-p", "8080", "--watch", "false"]);
        match cli.command {
            Some(Commands::Serve { port, watch, .. }) => {
                assert_eq!(port, Some(8080));
                assert_eq!(watch, Some(false));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_task_category_parsing() {
        let cli = Cli::parse_from(["gantry", "task", "images"]);
        match cli.command {
            Some(Commands::Task { category }) => assert_eq!(category, AssetCategory::Image),
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["gantry", "task", "pdf"]).is_err());
    }
}
