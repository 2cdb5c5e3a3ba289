//! Viewer dialogs: image information and colour/contrast/brightness adjust

use app_core::{AdjustSettings, ADJUST_MAX};
use egui::{Align2, Context, Window};

/// Result of dialog interaction
pub enum DialogResult<T> {
    /// Still open, nothing decided
    None,
    Ok(T),
    Cancel,
}

/// Common dialog trait
pub trait Dialog {
    type Output;
    fn ui(&mut self, ctx: &Context) -> DialogResult<Self::Output>;
    fn is_open(&self) -> bool;
    fn close(&mut self);
}

/// Read-only table of image properties
pub struct InfoDialog {
    pub open: bool,
    pub title: String,
    pub rows: Vec<(String, String)>,
}

impl InfoDialog {
    pub fn new(file_name: &str, rows: Vec<(String, String)>) -> Self {
        Self {
            open: true,
            title: format!("Image info: {}", file_name),
            rows,
        }
    }
}

impl Dialog for InfoDialog {
    type Output = ();

    fn ui(&mut self, ctx: &Context) -> DialogResult<()> {
        if !self.open {
            return DialogResult::None;
        }

        let mut result = DialogResult::None;

        Window::new(&self.title)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                egui::Grid::new("image_info_grid")
                    .num_columns(2)
                    .spacing([16.0, 4.0])
                    .striped(true)
                    .show(ui, |ui| {
                        for (key, value) in &self.rows {
                            ui.strong(key);
                            ui.label(value);
                            ui.end_row();
                        }
                    });

                ui.add_space(8.0);
                if ui.button("Close").clicked() {
                    result = DialogResult::Ok(());
                    self.open = false;
                }
            });

        result
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }
}

/// Slider dialog for colour, contrast and brightness.
///
/// Slider moves are reported through [`AdjustDialog::take_changed`] so the
/// viewer can refresh its preview; `Ok` means accept, `Cancel` discards.
pub struct AdjustDialog {
    pub open: bool,
    settings: AdjustSettings,
    changed: bool,
}

impl AdjustDialog {
    pub fn new() -> Self {
        Self {
            open: true,
            settings: AdjustSettings::default(),
            changed: false,
        }
    }

    pub fn settings(&self) -> AdjustSettings {
        self.settings
    }

    /// Settings after a slider move since the last call
    pub fn take_changed(&mut self) -> Option<AdjustSettings> {
        std::mem::take(&mut self.changed).then_some(self.settings)
    }
}

impl Default for AdjustDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialog for AdjustDialog {
    type Output = AdjustSettings;

    fn ui(&mut self, ctx: &Context) -> DialogResult<AdjustSettings> {
        if !self.open {
            return DialogResult::None;
        }

        let mut result = DialogResult::None;
        let mut changed = false;

        Window::new("Adjust")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::RIGHT_TOP, [-16.0, 48.0])
            .show(ctx, |ui| {
                egui::Grid::new("adjust_grid").num_columns(2).show(ui, |ui| {
                    for (label, value) in [
                        ("Colour", &mut self.settings.colour),
                        ("Contrast", &mut self.settings.contrast),
                        ("Brightness", &mut self.settings.brightness),
                    ] {
                        ui.label(label);
                        changed |= ui.add(egui::Slider::new(value, 0..=ADJUST_MAX)).changed();
                        ui.end_row();
                    }
                });

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Reset").clicked() {
                        self.settings = AdjustSettings::default();
                        changed = true;
                    }
                    if ui.button("OK").clicked() {
                        result = DialogResult::Ok(self.settings);
                        self.open = false;
                    }
                    if ui.button("Cancel").clicked() {
                        result = DialogResult::Cancel;
                        self.open = false;
                    }
                });
            });

        self.changed |= changed;
        result
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjust_change_is_taken_once() {
        let mut dialog = AdjustDialog::new();
        assert_eq!(dialog.take_changed(), None);

        dialog.settings.brightness = 14;
        dialog.changed = true;
        let taken = dialog.take_changed().unwrap();
        assert_eq!(taken.brightness, 14);
        assert_eq!(taken.colour, 10);
        assert_eq!(dialog.take_changed(), None);
    }

    #[test]
    fn test_closed_dialog_yields_nothing() {
        let ctx = Context::default();
        let mut info = InfoDialog::new("a.png", vec![("Width".into(), "8".into())]);
        info.close();
        assert!(!info.is_open());
        assert!(matches!(info.ui(&ctx), DialogResult::None));
    }
}
