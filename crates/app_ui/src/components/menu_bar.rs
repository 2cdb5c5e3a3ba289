//! Menu bar issuing the same commands as the keyboard shortcuts

use app_core::{BrowserWindow, Command, CommandId, WindowMode};
use egui::Ui;

/// Which menu entries are enabled
#[derive(Debug, Clone, Copy, Default)]
pub struct MenuState {
    pub in_viewer: bool,
    pub is_image: bool,
    pub is_video: bool,
    pub can_undo: bool,
    pub can_save: bool,
    pub can_zoom_to_rect: bool,
    pub can_crop: bool,
    pub can_reset_zoom: bool,
}

impl MenuState {
    pub fn from_window(window: &BrowserWindow) -> Self {
        let viewer = window.viewer().filter(|_| window.mode() == WindowMode::Viewer);
        match viewer {
            Some(v) => {
                let interaction = v.interaction();
                Self {
                    in_viewer: true,
                    is_image: v.is_image(),
                    is_video: v.video().is_some(),
                    can_undo: v.can_undo(),
                    can_save: v.is_modified(),
                    can_zoom_to_rect: interaction.can_zoom_to_rect(),
                    can_crop: interaction.can_crop(),
                    can_reset_zoom: interaction.can_reset_zoom(),
                }
            }
            None => Self::default(),
        }
    }
}

const FILTER_ENTRIES: &[(&str, &str)] = &[
    ("Sharpen", CommandId::FILTER_SHARPEN),
    ("Blur", CommandId::FILTER_BLUR),
    ("Contour", CommandId::FILTER_CONTOUR),
    ("Detail", CommandId::FILTER_DETAIL),
    ("Edge Enhance", CommandId::FILTER_EDGE_ENHANCE),
    ("Emboss", CommandId::FILTER_EMBOSS),
    ("Find Edges", CommandId::FILTER_FIND_EDGES),
    ("Smooth", CommandId::FILTER_SMOOTH),
    ("Unsharp Mask", CommandId::FILTER_UNSHARP_MASK),
];

const ENHANCE_ENTRIES: &[(&str, &str)] = &[
    ("Auto Contrast", CommandId::FILTER_AUTO_CONTRAST),
    ("Increase Colour", CommandId::FILTER_COLOUR_UP),
    ("Decrease Colour", CommandId::FILTER_COLOUR_DOWN),
    ("Increase Contrast", CommandId::FILTER_CONTRAST_UP),
    ("Decrease Contrast", CommandId::FILTER_CONTRAST_DOWN),
    ("Increase Brightness", CommandId::FILTER_BRIGHTNESS_UP),
    ("Decrease Brightness", CommandId::FILTER_BRIGHTNESS_DOWN),
    ("Black & White", CommandId::FILTER_BLACK_AND_WHITE),
    ("Denoise", CommandId::FILTER_DENOISE),
    ("Super Resolution", CommandId::FILTER_SUPER_RESOLUTION),
];

const VIDEO_ENTRIES: &[(&str, &str)] = &[
    ("Play / Pause", CommandId::VIDEO_PLAY_PAUSE),
    ("Skip Forward", CommandId::VIDEO_SKIP_FORWARD),
    ("Skip Backward", CommandId::VIDEO_SKIP_BACKWARD),
    ("Volume Up", CommandId::VIDEO_VOLUME_UP),
    ("Volume Down", CommandId::VIDEO_VOLUME_DOWN),
    ("Mute", CommandId::VIDEO_TOGGLE_MUTE),
];

/// Menu bar component
pub struct MenuBar;

impl MenuBar {
    pub fn ui(ui: &mut Ui, state: MenuState) -> Option<Command> {
        let mut command = None;

        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                item(ui, &mut command, "Save", CommandId::FILE_SAVE, state.can_save);
                ui.separator();
                item(ui, &mut command, "Exit", CommandId::APP_EXIT, true);
            });

            ui.menu_button("Edit", |ui| {
                item(ui, &mut command, "Undo", CommandId::EDIT_UNDO, state.can_undo);
                item(ui, &mut command, "Crop", CommandId::EDIT_CROP, state.can_crop);
            });

            ui.menu_button("View", |ui| {
                let zoom_rect = state.can_zoom_to_rect;
                item(ui, &mut command, "Zoom to Selection", CommandId::VIEW_ZOOM_TO_RECT, zoom_rect);
                item(ui, &mut command, "Reset Zoom", CommandId::VIEW_RESET_ZOOM, state.can_reset_zoom);
                ui.separator();
                item(ui, &mut command, "Image Info", CommandId::VIEW_IMAGE_INFO, state.is_image);
                item(ui, &mut command, "Adjust...", CommandId::VIEW_ADJUST, state.is_image);
                ui.separator();
                item(ui, &mut command, "Fullscreen", CommandId::VIEW_TOGGLE_FULLSCREEN, true);
                item(ui, &mut command, "Back", CommandId::NAV_BACK, state.in_viewer);
            });

            ui.menu_button("Filter", |ui| {
                for (label, id) in FILTER_ENTRIES {
                    item(ui, &mut command, label, id, state.is_image);
                }
                ui.separator();
                for (label, id) in ENHANCE_ENTRIES {
                    item(ui, &mut command, label, id, state.is_image);
                }
            });

            ui.menu_button("Video", |ui| {
                for (label, id) in VIDEO_ENTRIES {
                    item(ui, &mut command, label, id, state.is_video);
                }
            });
        });

        command
    }
}

fn item(ui: &mut Ui, command: &mut Option<Command>, label: &str, id: &str, enabled: bool) {
    if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
        *command = Some(Command::new(id));
        ui.close_menu();
    }
}
