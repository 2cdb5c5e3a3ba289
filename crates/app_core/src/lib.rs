//! Glimpse Core Domain Logic
//!
//! This crate contains:
//! - Browser window model and folder visit memory
//! - Thumbnail cells and the background decode service
//! - Viewer sessions: filters, crop, adjust, undo and save
//! - Canvas viewport and selection / zoom interaction
//! - Video transport
//! - Command system and configuration
//! - Error types

pub mod browser;
pub mod command;
pub mod config;
pub mod error;
pub mod filters;
pub mod interaction;
pub mod startup;
pub mod thumbnail;
pub mod undo;
pub mod video;
pub mod viewer;
pub mod viewport;

pub use browser::{BrowserWindow, FolderVisitState, GridMove, WindowMode};
pub use command::{Command, CommandId, CommandParams, CommandScope};
pub use config::{
    AppConfig, BrowserConfig, GeneralConfig, StartupConfig, Theme, ThumbnailConfig, VideoConfig,
    ViewerConfig,
};
pub use error::{AppError, Result};
pub use filters::Filter;
pub use interaction::{CanvasInteraction, InteractionState, ResizableViewport, SelectionState, ZoomState};
pub use startup::{StartupAction, StartupGate};
pub use thumbnail::{
    CancellationToken, CellId, LoadState, TaskStatus, ThumbnailCell, ThumbnailDecoder,
    ThumbnailOutcome, ThumbnailService, ThumbnailTask, ThumbnailUpdate,
};
pub use undo::UndoStack;
pub use video::{MediaBackend, MediaBackendProvider, PlaybackState, VideoTransport};
pub use viewer::{AdjustSettings, ViewerSession, ADJUST_MAX, ADJUST_NEUTRAL};
pub use viewport::{CanvasViewport, Point, Rect, Size, Transform, Viewport};
