//! Glimpse file system layer
//!
//! Provides:
//! - Media classification by extension allow-list
//! - Directory listing for the thumbnail browser
//! - Naming of saved (modified) images
//! - Default folder resolution

mod media;
mod browser;
mod naming;

pub use media::{MediaFilter, MediaKind};
pub use browser::{DirectoryEntry, EntryKind, ListOptions, list_directory, get_parent, is_root};
pub use naming::{modified_save_path, default_folder, SAVE_TIMESTAMP_FORMAT};

use thiserror::Error;

/// File system errors
#[derive(Error, Debug)]
pub enum FsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, FsError>;
