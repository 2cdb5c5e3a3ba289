//! Command system for user actions

use serde::{Deserialize, Serialize};

/// Command identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(pub String);

impl CommandId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // Navigation commands
    pub const NAV_MOVE_UP: &'static str = "nav.move_up";
    pub const NAV_MOVE_DOWN: &'static str = "nav.move_down";
    pub const NAV_MOVE_LEFT: &'static str = "nav.move_left";
    pub const NAV_MOVE_RIGHT: &'static str = "nav.move_right";
    pub const NAV_ENTER: &'static str = "nav.enter";
    pub const NAV_PARENT: &'static str = "nav.parent";
    pub const NAV_NEXT_ITEM: &'static str = "nav.next_item";
    pub const NAV_PREV_ITEM: &'static str = "nav.prev_item";
    pub const NAV_BACK: &'static str = "nav.back";

    // View commands
    pub const VIEW_ZOOM_TO_RECT: &'static str = "view.zoom_to_rect";
    pub const VIEW_RESET_ZOOM: &'static str = "view.reset_zoom";
    pub const VIEW_IMAGE_INFO: &'static str = "view.image_info";
    pub const VIEW_ADJUST: &'static str = "view.adjust";
    pub const VIEW_TOGGLE_FULLSCREEN: &'static str = "view.toggle_fullscreen";

    // Edit commands
    pub const EDIT_UNDO: &'static str = "edit.undo";
    pub const EDIT_CROP: &'static str = "edit.crop";

    // Filter commands
    pub const FILTER_SHARPEN: &'static str = "filter.sharpen";
    pub const FILTER_BLUR: &'static str = "filter.blur";
    pub const FILTER_CONTOUR: &'static str = "filter.contour";
    pub const FILTER_DETAIL: &'static str = "filter.detail";
    pub const FILTER_EDGE_ENHANCE: &'static str = "filter.edge_enhance";
    pub const FILTER_EMBOSS: &'static str = "filter.emboss";
    pub const FILTER_FIND_EDGES: &'static str = "filter.find_edges";
    pub const FILTER_SMOOTH: &'static str = "filter.smooth";
    pub const FILTER_UNSHARP_MASK: &'static str = "filter.unsharp_mask";
    pub const FILTER_AUTO_CONTRAST: &'static str = "filter.auto_contrast";
    pub const FILTER_COLOUR_UP: &'static str = "filter.colour_up";
    pub const FILTER_COLOUR_DOWN: &'static str = "filter.colour_down";
    pub const FILTER_CONTRAST_UP: &'static str = "filter.contrast_up";
    pub const FILTER_CONTRAST_DOWN: &'static str = "filter.contrast_down";
    pub const FILTER_BRIGHTNESS_UP: &'static str = "filter.brightness_up";
    pub const FILTER_BRIGHTNESS_DOWN: &'static str = "filter.brightness_down";
    pub const FILTER_BLACK_AND_WHITE: &'static str = "filter.black_and_white";
    pub const FILTER_DENOISE: &'static str = "filter.denoise";
    pub const FILTER_SUPER_RESOLUTION: &'static str = "filter.super_resolution";

    // File commands
    pub const FILE_SAVE: &'static str = "file.save";

    // Video commands
    pub const VIDEO_PLAY_PAUSE: &'static str = "video.play_pause";
    pub const VIDEO_SKIP_FORWARD: &'static str = "video.skip_forward";
    pub const VIDEO_SKIP_BACKWARD: &'static str = "video.skip_backward";
    pub const VIDEO_VOLUME_UP: &'static str = "video.volume_up";
    pub const VIDEO_VOLUME_DOWN: &'static str = "video.volume_down";
    pub const VIDEO_TOGGLE_MUTE: &'static str = "video.toggle_mute";
    /// Seek; int parameter is the target position in permille of the clip
    pub const VIDEO_JUMP: &'static str = "video.jump";

    // App commands
    pub const APP_EXIT: &'static str = "app.exit";

    /// Where a command applies
    pub fn scope(&self) -> CommandScope {
        CommandScope::of(self.as_str())
    }
}

/// Window mode a command is meaningful in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandScope {
    Browser,
    Viewer,
    Global,
}

impl CommandScope {
    pub fn of(id: &str) -> Self {
        match id {
            CommandId::NAV_MOVE_UP
            | CommandId::NAV_MOVE_DOWN
            | CommandId::NAV_MOVE_LEFT
            | CommandId::NAV_MOVE_RIGHT
            | CommandId::NAV_ENTER
            | CommandId::NAV_PARENT => CommandScope::Browser,
            CommandId::NAV_BACK | CommandId::APP_EXIT | CommandId::VIEW_TOGGLE_FULLSCREEN => {
                CommandScope::Global
            }
            _ => CommandScope::Viewer,
        }
    }

    /// Whether a command of this scope is live in the given context
    pub fn applies_to(self, context: CommandScope) -> bool {
        self == CommandScope::Global || self == context
    }
}

/// Command with optional parameters
#[derive(Debug, Clone)]
pub struct Command {
    pub id: CommandId,
    pub params: CommandParams,
}

/// Command parameters
#[derive(Debug, Clone, Default)]
pub struct CommandParams {
    pub int_value: Option<i64>,
}

impl Command {
    pub fn new(id: &str) -> Self {
        Self {
            id: CommandId::new(id),
            params: CommandParams::default(),
        }
    }

    pub fn with_int(mut self, value: i64) -> Self {
        self.params.int_value = Some(value);
        self
    }
}
