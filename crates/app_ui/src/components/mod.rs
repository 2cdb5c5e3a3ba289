//! UI Components

pub mod dialogs;
pub mod menu_bar;
pub mod status_bar;
pub mod thumbnail_grid;
pub mod viewer;

pub use dialogs::{AdjustDialog, Dialog, DialogResult, InfoDialog};
pub use menu_bar::{MenuBar, MenuState};
pub use status_bar::StatusInfo;
pub use thumbnail_grid::{GridAction, ThumbnailGrid};
pub use viewer::{CanvasResponse, ViewerCanvas};
