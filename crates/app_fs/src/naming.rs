//! Output naming and well-known folders

use chrono::{DateTime, TimeZone};
use std::path::{Path, PathBuf};

/// Timestamp format embedded in saved file names
pub const SAVE_TIMESTAMP_FORMAT: &str = "%y-%m-%d %H.%M.%S";

/// Path a modified image is saved to: `<stem> - Modified <timestamp>.png`
/// next to the source file. The original is never overwritten.
pub fn modified_save_path<Tz>(source: &Path, at: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());
    let name = format!("{} - Modified {}.png", stem, at.format(SAVE_TIMESTAMP_FORMAT));

    match source.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Default folder shown at startup: `~/Pictures`, else home, else cwd
pub fn default_folder() -> PathBuf {
    match dirs_next::home_dir() {
        Some(home) => {
            let pictures = home.join("Pictures");
            if pictures.is_dir() {
                pictures
            } else {
                home
            }
        }
        None => PathBuf::from("."),
    }
}
