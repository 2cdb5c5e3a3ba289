//! Glimpse - image and video browser with quick edits
//!
//! Main entry point.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod player;

use anyhow::{Context, Result};
use app_core::{AppConfig, ThumbnailService};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "glimpse", version, about = "Browse, view and touch up images and videos")]
struct Cli {
    /// File or folder to open
    path: Option<PathBuf>,

    /// Configuration file to use instead of the per-user one
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging and panic hook first
    let _log_guard = app_log::init()?;

    // Clean up old logs (7 days)
    if let Err(e) = app_log::cleanup_old_logs(7) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    tracing::info!("Glimpse {} starting...", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load configuration, using defaults: {}", e);
            AppConfig::default()
        }),
    };

    let thumbnails = ThumbnailService::new(config.thumbnails.workers, config.thumbnails.decode_size)?;

    app::run(config, thumbnails, cli.path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::parse_from(["glimpse", "--config", "alt.toml", "photo.png"]);
        assert_eq!(cli.path, Some(PathBuf::from("photo.png")));
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));

        let bare = Cli::parse_from(["glimpse"]);
        assert!(bare.path.is_none() && bare.config.is_none());
    }
}
