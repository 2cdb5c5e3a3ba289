//! Application error types

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Recoverable Errors (notify user, continue) =====
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not a folder: {0}")]
    NotAFolder(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Image encode error: {0}")]
    ImageEncode(String),

    #[error("Media playback error: {0}")]
    Playback(String),

    // ===== Recoverable (internal recovery attempt) =====
    #[error("GPU device lost")]
    GpuLost,

    // ===== Fatal Errors (application termination) =====
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Init(String),
}

impl AppError {
    /// Is this error recoverable?
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Io(_)
                | AppError::FileNotFound(_)
                | AppError::AccessDenied(_)
                | AppError::NotAFolder(_)
                | AppError::UnsupportedFormat(_)
                | AppError::ImageDecode(_)
                | AppError::ImageEncode(_)
                | AppError::Playback(_)
                | AppError::GpuLost
        )
    }

    /// Is this a fatal error?
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::FileNotFound(path) => format!("File not found: {}", path),
            AppError::AccessDenied(path) => format!("Access denied: {}", path),
            AppError::NotAFolder(path) => format!("Not a folder: {}", path),
            AppError::UnsupportedFormat(ext) => format!("Unsupported format: {}", ext),
            AppError::ImageDecode(msg) => format!("Cannot load image: {}", msg),
            AppError::ImageEncode(msg) => format!("Cannot save image: {}", msg),
            AppError::Playback(msg) => format!("Cannot play video: {}", msg),
            AppError::GpuLost => "Display device reset. Reloading...".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<app_fs::FsError> for AppError {
    fn from(e: app_fs::FsError) -> Self {
        match e {
            app_fs::FsError::NotFound(p) => AppError::FileNotFound(p),
            app_fs::FsError::AccessDenied(p) => AppError::AccessDenied(p),
            app_fs::FsError::InvalidPath(p) => AppError::NotAFolder(p),
            app_fs::FsError::Io(e) => AppError::Io(e),
        }
    }
}

impl From<image::ImageError> for AppError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::Unsupported(u) => AppError::UnsupportedFormat(u.to_string()),
            image::ImageError::Encoding(e) => AppError::ImageEncode(e.to_string()),
            image::ImageError::IoError(e) => AppError::Io(e),
            other => AppError::ImageDecode(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
