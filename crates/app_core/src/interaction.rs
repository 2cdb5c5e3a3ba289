//! Selection rectangle and zoom interaction over a viewport
//!
//! Selection and zoom are tracked separately so a rectangle can be drawn on
//! a zoomed view; [`InteractionState`] is derived from the pair.

use crate::viewport::{CanvasViewport, Point, Rect, Size, Viewport};

/// Selection rectangle lifecycle (scene coordinates)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionState {
    None,
    Dragging { origin: Point, rect: Rect },
    Present(Rect),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomState {
    FitToWindow,
    /// `center` is the last recorded scene point at the view centre
    Zoomed { scale: f32, center: Point },
}

/// Combined interaction state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Dragging,
    RectPresent,
    Zoomed,
}

/// Pointer-driven zoom/pan/select controller for one piece of content
#[derive(Debug, Clone)]
pub struct CanvasInteraction<V: Viewport = CanvasViewport> {
    viewport: V,
    selection: SelectionState,
    zoom: ZoomState,
    zoom_step: f32,
    /// Last pointer position of an active pan drag (view coordinates)
    pan_from: Option<Point>,
    /// Crop is only offered for still images
    is_image: bool,
}

impl<V: Viewport> CanvasInteraction<V> {
    pub fn new(viewport: V, zoom_step: f32, is_image: bool) -> Self {
        let mut interaction = Self {
            viewport,
            selection: SelectionState::None,
            zoom: ZoomState::FitToWindow,
            zoom_step,
            pan_from: None,
            is_image,
        };
        interaction.fit();
        interaction
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn selection(&self) -> SelectionState {
        self.selection
    }

    pub fn zoom(&self) -> ZoomState {
        self.zoom
    }

    pub fn state(&self) -> InteractionState {
        match (self.selection, self.zoom) {
            (SelectionState::Dragging { .. }, _) => InteractionState::Dragging,
            (SelectionState::Present(_), _) => InteractionState::RectPresent,
            (SelectionState::None, ZoomState::Zoomed { .. }) => InteractionState::Zoomed,
            (SelectionState::None, ZoomState::FitToWindow) => InteractionState::Idle,
        }
    }

    /// Rectangle to draw, during and after a drag
    pub fn selection_rect(&self) -> Option<Rect> {
        match self.selection {
            SelectionState::None => None,
            SelectionState::Dragging { rect, .. } | SelectionState::Present(rect) => Some(rect),
        }
    }

    pub fn can_zoom_to_rect(&self) -> bool {
        matches!(self.selection, SelectionState::Present(_))
    }

    pub fn can_crop(&self) -> bool {
        self.is_image && self.can_zoom_to_rect()
    }

    pub fn can_reset_zoom(&self) -> bool {
        matches!(self.zoom, ZoomState::Zoomed { .. })
    }

    /// Rectangle a crop should use, if cropping is currently possible
    pub fn crop_rect(&self) -> Option<Rect> {
        match self.selection {
            SelectionState::Present(rect) if self.is_image => Some(rect),
            _ => None,
        }
    }

    /// Pointer button pressed. With the selection modifier held a new
    /// rectangle drag starts; a plain click discards any rectangle and,
    /// when zoomed, starts a pan.
    pub fn pointer_pressed(&mut self, view_pos: Point, modifier: bool) {
        if modifier {
            let origin = self.viewport.unproject(view_pos);
            let rect = self.clamp_to_scene(Rect::from_corners(origin, origin));
            self.selection = SelectionState::Dragging { origin, rect };
            self.pan_from = None;
            return;
        }

        if matches!(self.selection, SelectionState::Present(_)) {
            tracing::debug!("Selection discarded");
        }
        self.selection = SelectionState::None;

        if matches!(self.zoom, ZoomState::Zoomed { .. }) {
            self.pan_from = Some(view_pos);
        }
    }

    pub fn pointer_moved(&mut self, view_pos: Point) {
        if let SelectionState::Dragging { origin, .. } = self.selection {
            let pointer = self.viewport.unproject(view_pos);
            let rect = self.clamp_to_scene(Rect::from_corners(origin, pointer));
            self.selection = SelectionState::Dragging { origin, rect };
            return;
        }

        if let Some(from) = self.pan_from {
            self.viewport.pan_by(view_pos - from);
            self.pan_from = Some(view_pos);
            self.record_zoom();
        }
    }

    pub fn pointer_released(&mut self) {
        self.pan_from = None;
        if let SelectionState::Dragging { rect, .. } = self.selection {
            self.selection = if rect.is_empty() {
                SelectionState::None
            } else {
                SelectionState::Present(rect)
            };
        }
    }

    /// Mouse wheel: positive notches zoom in, anchored under the pointer
    pub fn wheel(&mut self, notches: f32, anchor: Point) {
        if notches == 0.0 {
            return;
        }
        let factor = self.zoom_step.powf(notches);
        self.viewport.scale_about(factor, anchor);
        self.record_zoom();
    }

    /// Fit the view to the selection rectangle and discard it
    pub fn zoom_to_rect(&mut self) -> bool {
        let SelectionState::Present(rect) = self.selection else {
            tracing::debug!("Zoom to rect ignored: no selection");
            return false;
        };
        self.viewport.fit_in_view(rect);
        self.selection = SelectionState::None;
        self.zoom = ZoomState::Zoomed {
            scale: self.viewport.transform().scale,
            center: rect.center(),
        };
        true
    }

    /// Return to fit-to-window
    pub fn reset_zoom(&mut self) -> bool {
        let was_zoomed = self.can_reset_zoom();
        self.zoom = ZoomState::FitToWindow;
        self.pan_from = None;
        self.fit();
        was_zoomed
    }

    /// View resized: refit when not zoomed, otherwise keep the recorded
    /// scene centre in the middle
    pub fn resize(&mut self, view_size: Size)
    where
        V: ResizableViewport,
    {
        self.viewport.set_view_size(view_size);
        match self.zoom {
            ZoomState::FitToWindow => self.fit(),
            ZoomState::Zoomed { center, .. } => self.viewport.center_on(center),
        }
    }

    fn fit(&mut self) {
        let scene = self.viewport.scene_rect();
        self.viewport.fit_in_view(scene);
    }

    fn record_zoom(&mut self) {
        self.zoom = ZoomState::Zoomed {
            scale: self.viewport.transform().scale,
            center: self.viewport.scene_center(),
        };
    }

    fn clamp_to_scene(&self, rect: Rect) -> Rect {
        self.viewport.scene_rect().intersect(&rect)
    }
}

/// Viewports whose view size is driven by the host widget
pub trait ResizableViewport: Viewport {
    fn set_view_size(&mut self, size: Size);
}

impl ResizableViewport for CanvasViewport {
    fn set_view_size(&mut self, size: Size) {
        CanvasViewport::set_view_size(self, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction(is_image: bool) -> CanvasInteraction {
        let scene = Rect::from_min_size(Point::default(), Size::new(200.0, 100.0));
        let viewport = CanvasViewport::new(Size::new(400.0, 200.0), scene);
        CanvasInteraction::new(viewport, 1.05, is_image)
    }

    #[test]
    fn test_initial_state_fits() {
        let ix = interaction(true);
        assert_eq!(ix.state(), InteractionState::Idle);
        assert_eq!(ix.viewport().transform().scale, 2.0);
        assert!(!ix.can_reset_zoom());
    }

    #[test]
    fn test_drag_rect_stays_inside_image() {
        let mut ix = interaction(true);
        let bounds = ix.viewport().scene_rect();

        ix.pointer_pressed(Point::new(100.0, 50.0), true);
        assert_eq!(ix.state(), InteractionState::Dragging);

        for pos in [
            Point::new(-50.0, -80.0),
            Point::new(390.0, 10.0),
            Point::new(900.0, 900.0),
            Point::new(250.0, 150.0),
        ] {
            ix.pointer_moved(pos);
            let rect = ix.selection_rect().unwrap();
            assert!(bounds.contains_rect(&rect), "{rect:?} escapes {bounds:?}");
        }

        ix.pointer_released();
        assert_eq!(ix.state(), InteractionState::RectPresent);
        assert!(ix.can_zoom_to_rect());
        assert!(ix.can_crop());
        assert_eq!(
            ix.crop_rect(),
            Some(Rect::from_corners(Point::new(50.0, 25.0), Point::new(125.0, 75.0)))
        );
    }

    #[test]
    fn test_plain_click_discards_rect() {
        let mut ix = interaction(true);
        ix.pointer_pressed(Point::new(10.0, 10.0), true);
        ix.pointer_moved(Point::new(60.0, 60.0));
        ix.pointer_released();
        assert_eq!(ix.state(), InteractionState::RectPresent);

        ix.pointer_pressed(Point::new(30.0, 30.0), false);
        ix.pointer_released();
        assert_eq!(ix.state(), InteractionState::Idle);
        assert!(!ix.zoom_to_rect());
    }

    #[test]
    fn test_click_without_move_creates_no_rect() {
        let mut ix = interaction(true);
        ix.pointer_pressed(Point::new(10.0, 10.0), true);
        ix.pointer_released();
        assert_eq!(ix.state(), InteractionState::Idle);
    }

    #[test]
    fn test_zoom_to_rect_and_reset() {
        let mut ix = interaction(true);
        ix.pointer_pressed(Point::new(0.0, 0.0), true);
        ix.pointer_moved(Point::new(100.0, 50.0));
        ix.pointer_released();

        assert!(ix.zoom_to_rect());
        assert_eq!(ix.state(), InteractionState::Zoomed);
        assert!(ix.selection_rect().is_none());
        // 50x25 scene rect in a 400x200 view
        assert_eq!(ix.viewport().transform().scale, 8.0);

        assert!(ix.reset_zoom());
        assert_eq!(ix.state(), InteractionState::Idle);
        assert_eq!(ix.viewport().transform().scale, 2.0);
    }

    #[test]
    fn test_crop_only_for_images() {
        let mut ix = interaction(false);
        ix.pointer_pressed(Point::new(10.0, 10.0), true);
        ix.pointer_moved(Point::new(60.0, 60.0));
        ix.pointer_released();
        assert!(ix.can_zoom_to_rect());
        assert!(!ix.can_crop());
        assert!(ix.crop_rect().is_none());
    }

    #[test]
    fn test_wheel_zooms_under_pointer() {
        let mut ix = interaction(true);
        let anchor = Point::new(120.0, 80.0);
        let before = ix.viewport().unproject(anchor);

        ix.wheel(1.0, anchor);
        assert_eq!(ix.state(), InteractionState::Zoomed);
        assert!((ix.viewport().transform().scale - 2.1).abs() < 1e-4);
        let after = ix.viewport().unproject(anchor);
        assert!((after.x - before.x).abs() < 1e-3 && (after.y - before.y).abs() < 1e-3);

        ix.wheel(-1.0, anchor);
        assert!((ix.viewport().transform().scale - 2.0).abs() < 1e-4);
        assert_eq!(ix.state(), InteractionState::Zoomed);
    }

    #[test]
    fn test_resize_refits_or_recentres() {
        let mut ix = interaction(true);
        ix.resize(Size::new(200.0, 200.0));
        assert_eq!(ix.viewport().transform().scale, 1.0);

        ix.wheel(2.0, Point::new(100.0, 100.0));
        let centre = match ix.zoom() {
            ZoomState::Zoomed { center, .. } => center,
            ZoomState::FitToWindow => panic!("expected zoomed"),
        };
        let scale = ix.viewport().transform().scale;

        ix.resize(Size::new(600.0, 300.0));
        assert_eq!(ix.viewport().transform().scale, scale);
        let now = ix.viewport().scene_center();
        assert!((now.x - centre.x).abs() < 1e-3 && (now.y - centre.y).abs() < 1e-3);
    }

    #[test]
    fn test_pan_only_when_zoomed() {
        let mut ix = interaction(true);
        let before = ix.viewport().transform();
        ix.pointer_pressed(Point::new(100.0, 100.0), false);
        ix.pointer_moved(Point::new(150.0, 100.0));
        ix.pointer_released();
        assert_eq!(ix.viewport().transform(), before);

        ix.wheel(3.0, Point::new(200.0, 100.0));
        let zoomed = ix.viewport().transform();
        ix.pointer_pressed(Point::new(100.0, 100.0), false);
        ix.pointer_moved(Point::new(150.0, 90.0));
        ix.pointer_released();
        let panned = ix.viewport().transform();
        assert!((panned.offset.x - zoomed.offset.x - 50.0).abs() < 1e-3);
        assert!((panned.offset.y - zoomed.offset.y + 10.0).abs() < 1e-3);
    }
}
