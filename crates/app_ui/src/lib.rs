//! Glimpse UI Layer
//!
//! Provides:
//! - egui components: thumbnail grid, viewer canvas, dialogs, menu and status bars
//! - wgpu rendering pipeline
//! - Key to command mapping

pub mod components;
pub mod input;
pub mod renderer;
pub mod theme;

pub use input::InputHandler;
pub use renderer::Renderer;
pub use theme::Theme;
