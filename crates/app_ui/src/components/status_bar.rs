//! Status bar component

use app_core::{BrowserWindow, PlaybackState, ViewerSession, WindowMode, ZoomState};
use egui::Ui;

/// Status bar information
#[derive(Debug, Clone, Default)]
pub struct StatusInfo {
    /// Folder or file being shown
    pub location: String,

    /// Current index / total
    pub position: String,

    /// Image dimensions or playback time
    pub detail: String,

    /// Zoom level
    pub zoom: String,

    /// Additional status message
    pub message: String,
}

impl StatusInfo {
    /// Collect what the bar shows for the current window state
    pub fn from_window(window: &BrowserWindow, message: &str) -> Self {
        let total = window.cells().len();
        let position = if total > 0 {
            format!("{} / {}", window.highlighted() + 1, total)
        } else {
            String::new()
        };
        let mut info = Self {
            position,
            message: message.to_string(),
            ..Default::default()
        };

        match (window.mode(), window.viewer()) {
            (WindowMode::Viewer, Some(viewer)) => {
                info.location = viewer.path().display().to_string();
                info.detail = viewer_detail(viewer);
                info.zoom = match viewer.interaction().zoom() {
                    ZoomState::FitToWindow => "Fit".to_string(),
                    ZoomState::Zoomed { scale, .. } => format!("{:.0}%", scale * 100.0),
                };
            }
            _ => {
                info.location = window
                    .current_dir()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
            }
        }
        info
    }

    /// Render the status bar
    pub fn ui(&self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label(&self.location);
            ui.separator();

            for part in [&self.position, &self.detail] {
                if !part.is_empty() {
                    ui.label(part);
                    ui.separator();
                }
            }

            if !self.zoom.is_empty() {
                ui.label(format!("Zoom: {}", self.zoom));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if !self.message.is_empty() {
                    ui.label(&self.message);
                }
            });
        });
    }
}

fn viewer_detail(viewer: &ViewerSession) -> String {
    if let Some(image) = viewer.displayed_image() {
        let modified = if viewer.is_modified() { " (modified)" } else { "" };
        return format!("{} x {}{}", image.width(), image.height(), modified);
    }
    match viewer.video() {
        Some(video) => {
            let state = match video.state() {
                PlaybackState::Playing => "Playing",
                PlaybackState::Paused => "Paused",
                PlaybackState::Stopped => "Stopped",
            };
            let duration = video
                .duration_ms()
                .map(format_time)
                .unwrap_or_else(|| "--:--".to_string());
            format!("{} {} / {}", state, format_time(video.position_ms()), duration)
        }
        None => String::new(),
    }
}

/// `m:ss`
pub fn format_time(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(65_999), "1:05");
        assert_eq!(format_time(600_000), "10:00");
    }
}
