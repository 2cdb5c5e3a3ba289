//! Viewer canvas: draws the session's image or video placeholder and feeds
//! pointer input into its canvas interaction

use crate::components::status_bar::format_time;
use crate::theme::{SELECTION_FILL, SELECTION_STROKE};
use app_core::{Command, CommandId, Point, Rect, Size, VideoTransport, Viewport, ViewerSession};
use egui::{Color32, Pos2, Sense, TextureHandle, TextureOptions, Ui, Vec2};
use std::path::PathBuf;

const OVERLAY_HEIGHT: f32 = 40.0;
const OVERLAY_MARGIN: f32 = 12.0;

/// What the canvas reports back after a frame
#[derive(Debug, Default)]
pub struct CanvasResponse {
    /// New canvas size, when it changed since the last frame
    pub resized: Option<Size>,
    /// Command raised by an on-canvas control
    pub command: Option<Command>,
}

/// Image viewer component
pub struct ViewerCanvas {
    /// Uploaded image, keyed by source path and session revision
    texture: Option<(PathBuf, u64, TextureHandle)>,
    last_size: Option<Size>,
}

impl ViewerCanvas {
    pub fn new() -> Self {
        Self {
            texture: None,
            last_size: None,
        }
    }

    /// Drop the uploaded texture, e.g. when returning to the browser
    pub fn clear(&mut self) {
        self.texture = None;
    }

    /// Render the viewer
    pub fn ui(
        &mut self,
        ui: &mut Ui,
        session: &mut ViewerSession,
        selection_modifier: bool,
        background: Color32,
    ) -> CanvasResponse {
        let mut out = CanvasResponse::default();

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let size = Size::new(rect.width(), rect.height());
        if self.last_size != Some(size) {
            self.last_size = Some(size);
            out.resized = Some(size);
        }

        let to_view = |pos: Pos2| Point::new(pos.x - rect.min.x, pos.y - rect.min.y);
        let overlay = overlay_rect(rect);

        // Overlay controls take the click before the canvas does
        let overlay_click = session.video().is_some_and(|v| v.overlay_visible())
            && response.clicked()
            && response
                .interact_pointer_pos()
                .is_some_and(|p| overlay.contains(p));

        if overlay_click {
            if let Some(pos) = response.interact_pointer_pos() {
                let fraction = ((pos.x - overlay.min.x) / overlay.width()).clamp(0.0, 1.0);
                out.command = Some(
                    Command::new(CommandId::VIDEO_JUMP).with_int((fraction * 1000.0).round() as i64),
                );
            }
        } else {
            self.handle_input(ui, &response, session, selection_modifier, to_view);
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, background);

        let scene = session.interaction().viewport().projected_scene();
        let scene_rect = to_egui(scene, rect.min);

        if session.is_image() {
            if let Some(texture) = self.texture_for(ui.ctx(), session) {
                let uv = egui::Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                painter.image(texture.id(), scene_rect, uv, Color32::WHITE);
            }
        } else if let Some(video) = session.video() {
            draw_video_frame(&painter, scene_rect, session, video);
            if video.overlay_visible() {
                draw_overlay(&painter, overlay, video);
            }
        }

        if let Some(selection) = session.interaction().selection_rect() {
            let viewport = session.interaction().viewport();
            let projected = Rect::from_corners(
                viewport.project(selection.min),
                viewport.project(selection.max),
            );
            let sel = to_egui(projected, rect.min);
            painter.rect_filled(sel, 0.0, SELECTION_FILL);
            painter.rect_stroke(sel, 0.0, egui::Stroke::new(1.0, SELECTION_STROKE));
        }

        out
    }

    fn handle_input(
        &mut self,
        ui: &Ui,
        response: &egui::Response,
        session: &mut ViewerSession,
        selection_modifier: bool,
        to_view: impl Fn(Pos2) -> Point,
    ) {
        if response.hovered() {
            let moved = ui.input(|i| i.pointer.delta() != Vec2::ZERO);
            if moved {
                if let Some(video) = session.video_mut() {
                    video.pointer_moved();
                }
            }

            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                if let Some(pos) = response.hover_pos() {
                    session.interaction_mut().wheel(scroll.signum(), to_view(pos));
                }
            }
        }

        let interaction = session.interaction_mut();

        if response.drag_started_by(egui::PointerButton::Primary) {
            let origin = ui
                .input(|i| i.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos());
            if let Some(origin) = origin {
                interaction.pointer_pressed(to_view(origin), selection_modifier);
            }
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                interaction.pointer_moved(to_view(pos));
            }
        }

        if response.drag_stopped() {
            interaction.pointer_released();
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                interaction.pointer_pressed(to_view(pos), selection_modifier);
                interaction.pointer_released();
            }
        }
    }

    /// Upload the displayed image when it changed
    fn texture_for(&mut self, ctx: &egui::Context, session: &ViewerSession) -> Option<&TextureHandle> {
        let stale = match &self.texture {
            Some((path, revision, _)) => path != session.path() || *revision != session.revision(),
            None => true,
        };

        if stale {
            let image = session.displayed_image()?;
            let max_side = ctx.input(|i| i.max_texture_side) as u32;
            let rgba = if image.width() > max_side || image.height() > max_side {
                tracing::debug!(
                    "Downscaling {}x{} for display (max texture side {})",
                    image.width(),
                    image.height(),
                    max_side
                );
                image
                    .resize(max_side, max_side, image::imageops::FilterType::Triangle)
                    .to_rgba8()
            } else {
                image.to_rgba8()
            };

            let color = egui::ColorImage::from_rgba_unmultiplied(
                [rgba.width() as usize, rgba.height() as usize],
                rgba.as_raw(),
            );
            let handle = ctx.load_texture("viewer-image", color, TextureOptions::LINEAR);
            self.texture = Some((session.path().to_path_buf(), session.revision(), handle));
        }

        self.texture.as_ref().map(|(_, _, handle)| handle)
    }
}

impl Default for ViewerCanvas {
    fn default() -> Self {
        Self::new()
    }
}

fn to_egui(r: Rect, origin: Pos2) -> egui::Rect {
    egui::Rect::from_min_max(
        Pos2::new(r.min.x + origin.x, r.min.y + origin.y),
        Pos2::new(r.max.x + origin.x, r.max.y + origin.y),
    )
}

/// Progress bar strip along the bottom of the canvas
fn overlay_rect(canvas: egui::Rect) -> egui::Rect {
    egui::Rect::from_min_max(
        Pos2::new(canvas.min.x + OVERLAY_MARGIN, canvas.max.y - OVERLAY_HEIGHT - OVERLAY_MARGIN),
        Pos2::new(canvas.max.x - OVERLAY_MARGIN, canvas.max.y - OVERLAY_MARGIN),
    )
}

fn draw_video_frame(painter: &egui::Painter, frame: egui::Rect, session: &ViewerSession, video: &VideoTransport) {
    painter.rect_filled(frame, 0.0, Color32::BLACK);
    let name = session
        .path()
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let glyph = match video.state() {
        app_core::PlaybackState::Playing => "▶",
        _ => "⏸",
    };
    painter.text(
        frame.center(),
        egui::Align2::CENTER_CENTER,
        format!("{} {}", glyph, name),
        egui::FontId::proportional(24.0),
        Color32::LIGHT_GRAY,
    );
}

fn draw_overlay(painter: &egui::Painter, bar: egui::Rect, video: &VideoTransport) {
    painter.rect_filled(bar, 4.0, Color32::from_black_alpha(160));

    let track = bar.shrink2(Vec2::new(8.0, bar.height() / 2.0 - 3.0));
    painter.rect_filled(track, 3.0, Color32::from_gray(90));
    if let Some(progress) = video.progress() {
        let mut done = track;
        done.set_width(track.width() * progress.clamp(0.0, 1.0));
        painter.rect_filled(done, 3.0, SELECTION_STROKE);
    }

    let volume = if video.is_muted() {
        "muted".to_string()
    } else {
        format!("vol {:.0}%", video.volume() * 100.0)
    };
    let time = match video.duration_ms() {
        Some(d) => format!("{} / {}", format_time(video.position_ms()), format_time(d)),
        None => format_time(video.position_ms()),
    };
    painter.text(
        Pos2::new(bar.min.x + 8.0, bar.min.y + 2.0),
        egui::Align2::LEFT_TOP,
        time,
        egui::FontId::proportional(11.0),
        Color32::WHITE,
    );
    painter.text(
        Pos2::new(bar.max.x - 8.0, bar.min.y + 2.0),
        egui::Align2::RIGHT_TOP,
        volume,
        egui::FontId::proportional(11.0),
        Color32::WHITE,
    );
}
