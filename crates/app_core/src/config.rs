//! Application configuration

use app_fs::{ListOptions, MediaFilter};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub browser: BrowserConfig,
    pub thumbnails: ThumbnailConfig,
    pub viewer: ViewerConfig,
    pub video: VideoConfig,
    pub startup: StartupConfig,
    pub keybindings: HashMap<String, Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            browser: BrowserConfig::default(),
            thumbnails: ThumbnailConfig::default(),
            viewer: ViewerConfig::default(),
            video: VideoConfig::default(),
            startup: StartupConfig::default(),
            keybindings: default_keybindings(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub theme: Theme,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            window_width: 1280,
            window_height: 800,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    #[serde(rename = "dark")]
    Dark,
    #[serde(rename = "light")]
    Light,
}

/// Thumbnail browser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub thumbnails_per_row: usize,
    /// Margin around each grid cell in logical pixels
    pub grid_margin: f32,
    pub show_hidden: bool,
    /// Folder shown when nothing is opened at startup; `None` = `~/Pictures`
    pub default_folder: Option<PathBuf>,
    pub image_extensions: Vec<String>,
    pub video_extensions: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            thumbnails_per_row: 8,
            grid_margin: 4.0,
            show_hidden: false,
            default_folder: None,
            image_extensions: ["gif", "jpg", "jpeg", "png", "webp"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            video_extensions: ["mp4", "mkv"].iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl BrowserConfig {
    pub fn media_filter(&self) -> MediaFilter {
        MediaFilter::new(&self.image_extensions[..], &self.video_extensions[..])
    }

    pub fn list_options(&self) -> ListOptions {
        ListOptions {
            show_hidden: self.show_hidden,
            include_parent: true,
            filter: self.media_filter(),
        }
    }

    /// Edge length of a square thumbnail for the given window width
    pub fn thumbnail_edge(&self, window_width: f32) -> f32 {
        let per_row = self.thumbnails_per_row.max(1) as f32;
        (window_width / per_row - 2.0 * self.grid_margin).max(16.0)
    }

    pub fn resolved_default_folder(&self) -> PathBuf {
        self.default_folder
            .clone()
            .filter(|p| p.is_dir())
            .unwrap_or_else(app_fs::default_folder)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Worker threads; 0 = one per logical CPU
    pub workers: usize,
    /// Decoded thumbnail edge in pixels
    pub decode_size: u32,
    /// Opacity of the placeholder shown while loading
    pub placeholder_opacity: f32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            decode_size: 256,
            placeholder_opacity: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub background_color: String,
    /// Scale multiplier per mouse wheel notch
    pub zoom_step: f32,
    pub undo_limit: usize,
    pub super_resolution_factor: u32,
    /// Factor delta used by the increase/decrease shortcuts
    pub enhance_step: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            background_color: "#202020".to_string(),
            zoom_step: 1.05,
            undo_limit: 32,
            super_resolution_factor: 4,
            enhance_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub skip_ms: u64,
    pub volume_step: f32,
    pub overlay_timeout_ms: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            skip_ms: 5000,
            volume_step: 0.1,
            overlay_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Window after launch in which an OS file-open event is honoured
    pub open_grace_ms: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self { open_grace_ms: 500 }
    }
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit file; a missing file yields defaults
    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::info!("Configuration loaded from {:?}", config_path);
            Ok(config)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        tracing::info!("Configuration saved to {:?}", config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "Glimpse", "Glimpse")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }
}

fn default_keybindings() -> HashMap<String, Vec<String>> {
    let mut kb = HashMap::new();

    // ========================================
    // Navigation (nav.*)
    // ========================================

    // Grid cursor (browser)
    kb.insert("nav.move_up".into(), vec!["Up".into()]);
    kb.insert("nav.move_down".into(), vec!["Down".into()]);
    kb.insert("nav.move_left".into(), vec!["Left".into()]);
    kb.insert("nav.move_right".into(), vec!["Right".into()]);
    kb.insert("nav.enter".into(), vec!["Return".into()]);
    kb.insert("nav.parent".into(), vec!["Backspace".into()]);

    // Media stepping (viewer)
    kb.insert("nav.next_item".into(), vec!["Right".into()]);
    kb.insert("nav.prev_item".into(), vec!["Left".into()]);

    // Leave viewer / exit browser
    kb.insert("nav.back".into(), vec!["Escape".into()]);

    // ========================================
    // View (view.*)
    // ========================================

    kb.insert("view.zoom_to_rect".into(), vec!["z".into()]);
    kb.insert("view.reset_zoom".into(), vec!["0".into(), "Shift+Z".into()]);
    kb.insert("view.image_info".into(), vec!["i".into()]);
    kb.insert("view.adjust".into(), vec!["a".into()]);
    kb.insert("view.toggle_fullscreen".into(), vec!["F11".into()]);

    // ========================================
    // Edit (edit.*) / File (file.*)
    // ========================================

    kb.insert("edit.undo".into(), vec!["Ctrl+z".into(), "Super+z".into()]);
    kb.insert("edit.crop".into(), vec!["c".into()]);
    kb.insert("file.save".into(), vec!["Ctrl+s".into(), "Super+s".into()]);

    // ========================================
    // Filters (filter.*)
    // ========================================

    kb.insert("filter.sharpen".into(), vec!["1".into()]);
    kb.insert("filter.blur".into(), vec!["2".into()]);
    kb.insert("filter.contour".into(), vec!["3".into()]);
    kb.insert("filter.detail".into(), vec!["4".into()]);
    kb.insert("filter.edge_enhance".into(), vec!["5".into()]);
    kb.insert("filter.emboss".into(), vec!["6".into()]);
    kb.insert("filter.find_edges".into(), vec!["7".into()]);
    kb.insert("filter.smooth".into(), vec!["8".into()]);
    kb.insert("filter.unsharp_mask".into(), vec!["9".into()]);
    kb.insert("filter.auto_contrast".into(), vec!["Shift+A".into()]);
    kb.insert("filter.colour_up".into(), vec!["]".into()]);
    kb.insert("filter.colour_down".into(), vec!["[".into()]);
    kb.insert("filter.contrast_up".into(), vec!["'".into()]);
    kb.insert("filter.contrast_down".into(), vec![";".into()]);
    kb.insert("filter.brightness_up".into(), vec![".".into()]);
    kb.insert("filter.brightness_down".into(), vec![",".into()]);
    kb.insert("filter.black_and_white".into(), vec!["b".into()]);
    kb.insert("filter.denoise".into(), vec!["n".into()]);
    kb.insert("filter.super_resolution".into(), vec!["u".into()]);

    // ========================================
    // Video (video.*)
    // ========================================

    kb.insert("video.play_pause".into(), vec!["Space".into()]);
    kb.insert("video.skip_forward".into(), vec!["Ctrl+Right".into()]);
    kb.insert("video.skip_backward".into(), vec!["Ctrl+Left".into()]);
    kb.insert("video.volume_up".into(), vec!["Ctrl+Up".into()]);
    kb.insert("video.volume_down".into(), vec!["Ctrl+Down".into()]);
    kb.insert("video.toggle_mute".into(), vec!["m".into()]);

    // ========================================
    // App (app.*)
    // ========================================

    kb.insert("app.exit".into(), vec!["Alt+F4".into(), "Ctrl+q".into()]);

    kb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.browser.thumbnails_per_row, 8);
        assert_eq!(config.viewer.undo_limit, 32);
        assert_eq!(config.viewer.super_resolution_factor, 4);
        assert_eq!(config.video.skip_ms, 5000);
        assert_eq!(config.startup.open_grace_ms, 500);
        assert!(config.keybindings.contains_key("nav.back"));
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[browser]\nthumbnails_per_row = 5\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.browser.thumbnails_per_row, 5);
        assert_eq!(config.browser.video_extensions, vec!["mp4", "mkv"]);
        assert_eq!(config.viewer.zoom_step, 1.05);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.general.theme = Theme::Light;
        config.viewer.undo_limit = 4;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.general.theme, Theme::Light);
        assert_eq!(loaded.viewer.undo_limit, 4);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.thumbnails.placeholder_opacity, 0.5);
    }

    #[test]
    fn test_thumbnail_edge() {
        let browser = BrowserConfig::default();
        assert_eq!(browser.thumbnail_edge(800.0), 92.0);
    }
}
