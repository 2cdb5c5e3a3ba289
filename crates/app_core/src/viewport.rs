//! Toolkit-independent 2D viewport
//!
//! Scene coordinates are image pixels; view coordinates are logical pixels
//! inside the widget. `view = scene * scale + offset`.

/// 2D point or vector
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle; `min` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn from_min_size(min: Point, size: Size) -> Self {
        Self {
            min,
            max: Point::new(min.x + size.width, min.y + size.height),
        }
    }

    /// Bounding box of two arbitrary corners
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn center(&self) -> Point {
        Point::new((self.min.x + self.max.x) / 2.0, (self.min.y + self.max.y) / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    /// Intersection; disjoint rectangles give an empty rect inside `self`
    pub fn intersect(&self, other: &Rect) -> Rect {
        let min = Point::new(
            self.min.x.max(other.min.x).min(self.max.x),
            self.min.y.max(other.min.y).min(self.max.y),
        );
        let max = Point::new(
            self.max.x.min(other.max.x).max(min.x),
            self.max.y.min(other.max.y).max(min.y),
        );
        Rect { min, max }
    }
}

/// Scene → view mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f32,
    pub offset: Point,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Point::default(),
        }
    }
}

/// A scene shown through a resizable view
pub trait Viewport {
    fn project(&self, scene: Point) -> Point;
    fn unproject(&self, view: Point) -> Point;
    fn set_transform(&mut self, transform: Transform);
    fn transform(&self) -> Transform;
    fn view_size(&self) -> Size;
    fn scene_rect(&self) -> Rect;

    /// Scene point shown at the centre of the view
    fn scene_center(&self) -> Point {
        let size = self.view_size();
        self.unproject(Point::new(size.width / 2.0, size.height / 2.0))
    }

    /// Scale and centre so `rect` fits the view, keeping its aspect ratio
    fn fit_in_view(&mut self, rect: Rect) {
        let view = self.view_size();
        if rect.is_empty() || view.width <= 0.0 || view.height <= 0.0 {
            return;
        }
        let scale = (view.width / rect.width()).min(view.height / rect.height());
        let center = rect.center();
        self.set_transform(Transform {
            scale,
            offset: Point::new(
                view.width / 2.0 - center.x * scale,
                view.height / 2.0 - center.y * scale,
            ),
        });
    }

    /// Keep the scale, move so `scene` is at the view centre
    fn center_on(&mut self, scene: Point) {
        let view = self.view_size();
        let scale = self.transform().scale;
        self.set_transform(Transform {
            scale,
            offset: Point::new(view.width / 2.0 - scene.x * scale, view.height / 2.0 - scene.y * scale),
        });
    }

    /// Multiply the scale, keeping the scene point under `anchor` fixed
    fn scale_about(&mut self, factor: f32, anchor: Point) {
        let scene_anchor = self.unproject(anchor);
        let scale = self.transform().scale * factor;
        self.set_transform(Transform {
            scale,
            offset: Point::new(anchor.x - scene_anchor.x * scale, anchor.y - scene_anchor.y * scale),
        });
    }

    /// Move the scene by a view-space delta
    fn pan_by(&mut self, delta: Point) {
        let t = self.transform();
        self.set_transform(Transform {
            scale: t.scale,
            offset: t.offset + delta,
        });
    }
}

/// Scale + offset viewport used by the viewer canvas
#[derive(Debug, Clone, Default)]
pub struct CanvasViewport {
    view_size: Size,
    scene_rect: Rect,
    transform: Transform,
}

impl CanvasViewport {
    pub fn new(view_size: Size, scene_rect: Rect) -> Self {
        Self {
            view_size,
            scene_rect,
            transform: Transform::default(),
        }
    }

    pub fn set_view_size(&mut self, size: Size) {
        self.view_size = size;
    }

    pub fn set_scene_rect(&mut self, rect: Rect) {
        self.scene_rect = rect;
    }

    /// Scene rectangle in view coordinates
    pub fn projected_scene(&self) -> Rect {
        Rect::from_corners(self.project(self.scene_rect.min), self.project(self.scene_rect.max))
    }
}

impl Viewport for CanvasViewport {
    fn project(&self, scene: Point) -> Point {
        Point::new(
            scene.x * self.transform.scale + self.transform.offset.x,
            scene.y * self.transform.scale + self.transform.offset.y,
        )
    }

    fn unproject(&self, view: Point) -> Point {
        let scale = if self.transform.scale.abs() > f32::EPSILON {
            self.transform.scale
        } else {
            1.0
        };
        Point::new(
            (view.x - self.transform.offset.x) / scale,
            (view.y - self.transform.offset.y) / scale,
        )
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn view_size(&self) -> Size {
        self.view_size
    }

    fn scene_rect(&self) -> Rect {
        self.scene_rect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    #[test]
    fn test_project_unproject_inverse() {
        let mut vp = CanvasViewport::new(Size::new(400.0, 300.0), Rect::default());
        vp.set_transform(Transform {
            scale: 2.5,
            offset: Point::new(-30.0, 12.0),
        });
        let p = Point::new(17.0, 42.0);
        assert!(approx(vp.unproject(vp.project(p)), p));
    }

    #[test]
    fn test_fit_in_view_keeps_aspect_and_centres() {
        let scene = Rect::from_min_size(Point::default(), Size::new(200.0, 100.0));
        let mut vp = CanvasViewport::new(Size::new(400.0, 400.0), scene);
        vp.fit_in_view(scene);

        assert_eq!(vp.transform().scale, 2.0);
        let projected = vp.projected_scene();
        assert!(approx(projected.min, Point::new(0.0, 100.0)));
        assert!(approx(projected.max, Point::new(400.0, 300.0)));
        assert!(approx(vp.scene_center(), scene.center()));
    }

    #[test]
    fn test_scale_about_keeps_anchor_fixed() {
        let scene = Rect::from_min_size(Point::default(), Size::new(100.0, 100.0));
        let mut vp = CanvasViewport::new(Size::new(100.0, 100.0), scene);
        let anchor = Point::new(20.0, 70.0);
        let before = vp.unproject(anchor);
        vp.scale_about(1.05, anchor);
        assert!(approx(vp.unproject(anchor), before));
        assert!((vp.transform().scale - 1.05).abs() < 1e-6);
    }

    #[test]
    fn test_rect_intersect() {
        let bounds = Rect::from_min_size(Point::default(), Size::new(10.0, 10.0));
        let r = Rect::from_corners(Point::new(8.0, -5.0), Point::new(-2.0, 4.0));
        let clipped = bounds.intersect(&r);
        assert_eq!(clipped, Rect::from_corners(Point::new(0.0, 0.0), Point::new(8.0, 4.0)));

        let outside = bounds.intersect(&Rect::from_corners(Point::new(20.0, 20.0), Point::new(30.0, 30.0)));
        assert!(outside.is_empty());
        assert!(bounds.contains_rect(&outside));
    }
}
