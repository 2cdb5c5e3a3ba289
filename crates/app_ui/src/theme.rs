//! Application theming

use egui::{Color32, Visuals};

/// Selection rectangle fill: dodger blue at 50% alpha
pub const SELECTION_FILL: Color32 = Color32::from_rgba_premultiplied(15, 72, 128, 128);
pub const SELECTION_STROKE: Color32 = Color32::from_rgb(30, 144, 255);

/// Application palette
#[derive(Debug, Clone)]
pub struct Theme {
    pub kind: app_core::Theme,
    pub background: Color32,
    pub surface: Color32,
    pub primary: Color32,
    pub text: Color32,
    pub text_secondary: Color32,
    pub accent: Color32,
    /// Fill behind the viewer canvas
    pub canvas: Color32,
}

impl Theme {
    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            kind: app_core::Theme::Dark,
            background: Color32::from_rgb(32, 32, 32),
            surface: Color32::from_rgb(48, 48, 48),
            primary: Color32::from_rgb(64, 64, 64),
            text: Color32::from_rgb(240, 240, 240),
            text_secondary: Color32::from_rgb(160, 160, 160),
            accent: Color32::from_rgb(100, 149, 237),
            canvas: Color32::from_rgb(32, 32, 32),
        }
    }

    /// Light theme
    pub fn light() -> Self {
        Self {
            kind: app_core::Theme::Light,
            background: Color32::from_rgb(250, 250, 250),
            surface: Color32::from_rgb(255, 255, 255),
            primary: Color32::from_rgb(230, 230, 230),
            text: Color32::from_rgb(32, 32, 32),
            text_secondary: Color32::from_rgb(100, 100, 100),
            accent: Color32::from_rgb(59, 130, 246),
            canvas: Color32::from_rgb(224, 224, 224),
        }
    }

    /// Palette for the configured theme, with the viewer background override
    pub fn from_config(config: &app_core::AppConfig) -> Self {
        let mut theme = match config.general.theme {
            app_core::Theme::Dark => Self::dark(),
            app_core::Theme::Light => Self::light(),
        };
        match Self::parse_color(&config.viewer.background_color) {
            Some(color) => theme.canvas = color,
            None => tracing::warn!(
                "Ignoring invalid viewer background colour {:?}",
                config.viewer.background_color
            ),
        }
        theme
    }

    /// Apply theme to egui
    pub fn apply(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();
        let mut visuals = match self.kind {
            app_core::Theme::Dark => Visuals::dark(),
            app_core::Theme::Light => Visuals::light(),
        };

        visuals.panel_fill = self.surface;
        visuals.window_fill = self.surface;
        visuals.extreme_bg_color = self.background;
        visuals.faint_bg_color = self.primary;

        visuals.widgets.noninteractive.bg_fill = self.surface;
        visuals.widgets.noninteractive.fg_stroke.color = self.text;

        visuals.widgets.inactive.bg_fill = self.primary;
        visuals.widgets.inactive.fg_stroke.color = self.text;

        visuals.widgets.hovered.bg_fill = self.accent.linear_multiply(0.3);
        visuals.widgets.hovered.fg_stroke.color = self.text;

        visuals.widgets.active.bg_fill = self.accent.linear_multiply(0.5);
        visuals.widgets.active.fg_stroke.color = self.text;

        visuals.selection.bg_fill = self.accent.linear_multiply(0.3);
        visuals.selection.stroke.color = self.accent;

        style.visuals = visuals;
        ctx.set_style(style);
    }

    /// Parse a `#rrggbb` or `#aarrggbb` colour
    pub fn parse_color(hex: &str) -> Option<Color32> {
        let hex = hex.trim_start_matches('#');
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

        match hex.len() {
            6 => Some(Color32::from_rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Color32::from_rgba_unmultiplied(byte(2)?, byte(4)?, byte(6)?, byte(0)?)),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
