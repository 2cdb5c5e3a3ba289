//! Thumbnail grid for the browser window

use crate::theme::Theme;
use app_core::{BrowserWindow, CellId, ThumbnailCell};
use egui::{Color32, Pos2, Rect, Sense, TextureHandle, TextureOptions, Ui, Vec2};
use std::collections::{HashMap, HashSet};

const LABEL_HEIGHT: f32 = 18.0;

/// Action returned from grid interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridAction {
    /// Single click
    Highlight(usize),
    /// Double click
    Activate(usize),
}

/// Thumbnail grid component
#[derive(Default)]
pub struct ThumbnailGrid {
    /// Uploaded thumbnails by cell
    textures: HashMap<CellId, TextureHandle>,
}

impl ThumbnailGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload newly loaded thumbnails and free those of vanished cells
    pub fn sync_textures(&mut self, ctx: &egui::Context, cells: &[ThumbnailCell]) {
        let live: HashSet<CellId> = cells.iter().map(|c| c.id).collect();
        self.textures.retain(|id, _| live.contains(id));

        for cell in cells {
            let Some(image) = cell.image() else { continue };
            if self.textures.contains_key(&cell.id) {
                continue;
            }
            let color = egui::ColorImage::from_rgba_unmultiplied(
                [image.width() as usize, image.height() as usize],
                image.as_raw(),
            );
            let handle = ctx.load_texture(format!("thumb-{}", cell.id), color, TextureOptions::LINEAR);
            self.textures.insert(cell.id, handle);
        }
    }

    /// Render the grid. Restores a pending scroll offset, keeps the
    /// highlighted cell visible when asked to, and reports the offset back.
    pub fn ui(&mut self, ui: &mut Ui, window: &mut BrowserWindow, theme: &Theme) -> Option<GridAction> {
        let mut action = None;

        let per_row = window.thumbnails_per_row();
        let margin = window.config().browser.grid_margin;
        let opacity = window.config().thumbnails.placeholder_opacity.clamp(0.0, 1.0);
        let available = ui.available_size();
        let edge = window.config().browser.thumbnail_edge(available.x);
        let cell_size = Vec2::new(available.x / per_row as f32, edge + 2.0 * margin + LABEL_HEIGHT);
        let total_rows = window.cells().len().div_ceil(per_row);

        let mut offset = window.take_pending_scroll();
        if window.take_reveal_highlight() {
            let current = offset.unwrap_or(window.scroll_offset());
            let top = (window.highlighted() / per_row) as f32 * cell_size.y;
            let bottom = top + cell_size.y;
            if top < current {
                offset = Some(top);
            } else if bottom > current + available.y {
                offset = Some(bottom - available.y);
            }
        }

        let mut area = egui::ScrollArea::vertical()
            .id_salt("thumbnail_grid")
            .auto_shrink([false, false]);
        if let Some(y) = offset {
            area = area.vertical_scroll_offset(y.max(0.0));
        }

        let highlighted = window.highlighted();
        let cells = window.cells();
        let output = area.show_rows(ui, cell_size.y, total_rows, |ui, rows| {
            ui.spacing_mut().item_spacing = Vec2::ZERO;
            for row in rows {
                ui.horizontal(|ui| {
                    let start = row * per_row;
                    let end = (start + per_row).min(cells.len());
                    for (index, cell) in cells.iter().enumerate().take(end).skip(start) {
                        let (rect, response) = ui.allocate_exact_size(cell_size, Sense::click());
                        if ui.is_rect_visible(rect) {
                            self.paint_cell(ui, rect, cell, index == highlighted, margin, edge, opacity, theme);
                        }
                        if response.double_clicked() {
                            action = Some(GridAction::Activate(index));
                        } else if response.clicked() {
                            action = Some(GridAction::Highlight(index));
                        }
                    }
                });
            }
        });

        window.record_scroll(output.state.offset.y);
        action
    }

    #[allow(clippy::too_many_arguments)]
    fn paint_cell(
        &self,
        ui: &Ui,
        rect: Rect,
        cell: &ThumbnailCell,
        highlighted: bool,
        margin: f32,
        edge: f32,
        opacity: f32,
        theme: &Theme,
    ) {
        let painter = ui.painter_at(rect);
        let thumb_rect = Rect::from_center_size(
            Pos2::new(rect.center().x, rect.min.y + margin + edge / 2.0),
            Vec2::splat(edge),
        );

        match self.textures.get(&cell.id) {
            Some(texture) => {
                let fitted = fit_into(texture.size_vec2(), thumb_rect);
                let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                painter.image(texture.id(), fitted, uv, Color32::WHITE);
            }
            None => {
                let (glyph, alpha) = if cell.entry.is_folder() {
                    ("📁", 1.0)
                } else if cell.entry.is_video() {
                    ("🎬", 1.0)
                } else {
                    ("🖼", opacity)
                };
                painter.rect_filled(thumb_rect, 2.0, theme.primary.gamma_multiply(alpha));
                painter.text(
                    thumb_rect.center(),
                    egui::Align2::CENTER_CENTER,
                    glyph,
                    egui::FontId::proportional(edge * 0.4),
                    theme.text_secondary.gamma_multiply(alpha),
                );
            }
        }

        if highlighted {
            painter.rect_filled(rect.shrink(1.0), 4.0, theme.accent.gamma_multiply(0.3));
            painter.rect_stroke(rect.shrink(1.0), 4.0, egui::Stroke::new(2.0, theme.accent));
        }

        painter.text(
            Pos2::new(rect.center().x, thumb_rect.max.y + margin + LABEL_HEIGHT / 2.0),
            egui::Align2::CENTER_CENTER,
            cell.label(),
            egui::FontId::proportional(11.0),
            if highlighted { theme.text } else { theme.text_secondary },
        );
    }
}

/// Largest rect with `size`'s aspect ratio centred in `bounds`
fn fit_into(size: Vec2, bounds: Rect) -> Rect {
    if size.x <= 0.0 || size.y <= 0.0 {
        return bounds;
    }
    let scale = (bounds.width() / size.x).min(bounds.height() / size.y);
    Rect::from_center_size(bounds.center(), size * scale)
}
