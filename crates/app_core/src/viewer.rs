//! Full-size viewer session
//!
//! Owns the displayed image or video, its undo history, the adjust preview
//! and the canvas interaction. Every mutating operation snapshots the
//! committed image first, so undo restores it exactly.

use crate::config::AppConfig;
use crate::filters::{self, Filter};
use crate::interaction::CanvasInteraction;
use crate::undo::UndoStack;
use crate::video::{MediaBackend, MediaBackendProvider, PlaybackState, VideoTransport};
use crate::viewport::{CanvasViewport, Point, Rect, Size, Viewport};
use crate::Result;
use app_fs::MediaKind;
use chrono::Local;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::path::{Path, PathBuf};

/// Upper end of the adjust sliders
pub const ADJUST_MAX: u8 = 20;
/// Slider value that leaves the image unchanged
pub const ADJUST_NEUTRAL: u8 = 10;

/// Scene size used for videos whose frame size is unknown
const DEFAULT_VIDEO_SCENE: Size = Size::new(1280.0, 720.0);

/// Colour / contrast / brightness slider positions (0..=20, neutral 10)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjustSettings {
    pub colour: u8,
    pub contrast: u8,
    pub brightness: u8,
}

impl Default for AdjustSettings {
    fn default() -> Self {
        Self {
            colour: ADJUST_NEUTRAL,
            contrast: ADJUST_NEUTRAL,
            brightness: ADJUST_NEUTRAL,
        }
    }
}

impl AdjustSettings {
    /// Slider value to enhancement factor
    pub fn factor(value: u8) -> f32 {
        value.min(ADJUST_MAX) as f32 / 10.0
    }

    /// The three adjustments in the order they are applied
    pub fn filters(&self) -> [Filter; 3] {
        [
            Filter::Colour(Self::factor(self.colour)),
            Filter::Contrast(Self::factor(self.contrast)),
            Filter::Brightness(Self::factor(self.brightness)),
        ]
    }
}

struct ImageDocument {
    committed: DynamicImage,
    /// Transient slider preview; never on the undo stack
    preview: Option<DynamicImage>,
    adjust: Option<AdjustSettings>,
    undo: UndoStack<DynamicImage>,
    format: Option<ImageFormat>,
}

enum Content {
    Image(ImageDocument),
    Video(VideoTransport),
}

pub struct ViewerSession {
    path: PathBuf,
    content: Content,
    interaction: CanvasInteraction,
    zoom_step: f32,
    enhance_step: f32,
    super_resolution_factor: u32,
    /// Bumped whenever the displayed image changes
    revision: u64,
}

impl ViewerSession {
    /// Open a media file of the given kind
    pub fn open(
        path: &Path,
        kind: MediaKind,
        config: &AppConfig,
        view_size: Size,
        media: &dyn MediaBackendProvider,
    ) -> Result<Self> {
        match kind {
            MediaKind::Image => Self::open_image(path, config, view_size),
            MediaKind::Video => Self::open_video(path, config, view_size, media.create()),
        }
    }

    pub fn open_image(path: &Path, config: &AppConfig, view_size: Size) -> Result<Self> {
        let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        let format = ImageFormat::from_path(path).ok();
        tracing::info!(
            "Opened image {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self::from_image(path, image, format, config, view_size))
    }

    /// Build a session around an already decoded image
    pub fn from_image(
        path: &Path,
        image: DynamicImage,
        format: Option<ImageFormat>,
        config: &AppConfig,
        view_size: Size,
    ) -> Self {
        let scene = image_scene(&image);
        Self {
            path: path.to_path_buf(),
            content: Content::Image(ImageDocument {
                committed: image,
                preview: None,
                adjust: None,
                undo: UndoStack::new(config.viewer.undo_limit),
                format,
            }),
            interaction: new_interaction(view_size, scene, config.viewer.zoom_step, true),
            zoom_step: config.viewer.zoom_step,
            enhance_step: config.viewer.enhance_step,
            super_resolution_factor: config.viewer.super_resolution_factor,
            revision: 0,
        }
    }

    pub fn open_video(
        path: &Path,
        config: &AppConfig,
        view_size: Size,
        backend: Box<dyn MediaBackend>,
    ) -> Result<Self> {
        let mut transport = VideoTransport::new(backend, &config.video);
        transport.load(path)?;
        let scene = transport
            .frame_size()
            .map(|(w, h)| Size::new(w as f32, h as f32))
            .unwrap_or(DEFAULT_VIDEO_SCENE);

        Ok(Self {
            path: path.to_path_buf(),
            content: Content::Video(transport),
            interaction: new_interaction(view_size, scene, config.viewer.zoom_step, false),
            zoom_step: config.viewer.zoom_step,
            enhance_step: config.viewer.enhance_step,
            super_resolution_factor: config.viewer.super_resolution_factor,
            revision: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MediaKind {
        match self.content {
            Content::Image(_) => MediaKind::Image,
            Content::Video(_) => MediaKind::Video,
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind() == MediaKind::Image
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Image currently on screen: the adjust preview if one is active,
    /// otherwise the committed image
    pub fn displayed_image(&self) -> Option<&DynamicImage> {
        match &self.content {
            Content::Image(doc) => Some(doc.preview.as_ref().unwrap_or(&doc.committed)),
            Content::Video(_) => None,
        }
    }

    pub fn committed_image(&self) -> Option<&DynamicImage> {
        match &self.content {
            Content::Image(doc) => Some(&doc.committed),
            Content::Video(_) => None,
        }
    }

    pub fn interaction(&self) -> &CanvasInteraction {
        &self.interaction
    }

    pub fn interaction_mut(&mut self) -> &mut CanvasInteraction {
        &mut self.interaction
    }

    pub fn video(&self) -> Option<&VideoTransport> {
        match &self.content {
            Content::Video(t) => Some(t),
            Content::Image(_) => None,
        }
    }

    pub fn video_mut(&mut self) -> Option<&mut VideoTransport> {
        match &mut self.content {
            Content::Video(t) => Some(t),
            Content::Image(_) => None,
        }
    }

    pub fn set_view_size(&mut self, size: Size) {
        if self.interaction.viewport().view_size() != size {
            self.interaction.resize(size);
        }
    }

    pub fn zoom_to_rect(&mut self) -> bool {
        self.interaction.zoom_to_rect()
    }

    pub fn reset_zoom(&mut self) -> bool {
        self.interaction.reset_zoom()
    }

    /// Factor for the increase/decrease shortcuts
    pub fn step_factor(&self, increase: bool) -> f32 {
        if increase {
            1.0 + self.enhance_step
        } else {
            1.0 - self.enhance_step
        }
    }

    pub fn super_resolution_factor(&self) -> u32 {
        self.super_resolution_factor
    }

    /// Apply a filter as an undoable edit
    pub fn apply_filter(&mut self, filter: Filter) -> bool {
        self.commit(filter.name(), |img| filter.apply(img))
    }

    /// Crop to the selection rectangle
    pub fn crop(&mut self) -> bool {
        let Some(rect) = self.interaction.crop_rect() else {
            tracing::debug!("Crop ignored: no selection");
            return false;
        };
        let x = rect.min.x.round().max(0.0) as u32;
        let y = rect.min.y.round().max(0.0) as u32;
        let width = (rect.max.x.round() as u32).saturating_sub(x);
        let height = (rect.max.y.round() as u32).saturating_sub(y);
        if width == 0 || height == 0 {
            tracing::debug!("Crop ignored: selection smaller than a pixel");
            return false;
        }

        let cropped = self.commit("Crop", |img| filters::crop(img, x, y, width, height));
        if cropped {
            self.reset_scene();
        }
        cropped
    }

    /// Restore the most recent snapshot
    pub fn undo(&mut self) -> bool {
        let Content::Image(doc) = &mut self.content else {
            tracing::debug!("Undo ignored: no image");
            return false;
        };
        if doc.adjust.is_some() {
            tracing::debug!("Undo ignored: adjust dialog open");
            return false;
        }
        let Some(previous) = doc.undo.pop() else {
            tracing::debug!("Undo ignored: history empty");
            return false;
        };
        doc.preview = None;
        doc.adjust = None;

        let before = doc.committed.dimensions();
        doc.committed = previous;
        let after = doc.committed.dimensions();

        self.revision += 1;
        if before != after {
            self.reset_scene();
        }
        tracing::info!("Undo");
        true
    }

    pub fn can_undo(&self) -> bool {
        match &self.content {
            Content::Image(doc) => doc.undo.can_undo(),
            Content::Video(_) => false,
        }
    }

    pub fn is_modified(&self) -> bool {
        match &self.content {
            Content::Image(doc) => doc.undo.is_modified(),
            Content::Video(_) => false,
        }
    }

    /// Write the committed image next to the source as
    /// `<stem> - Modified <timestamp>.png`. Unmodified documents are not
    /// written and yield `None`.
    pub fn save(&self) -> Result<Option<PathBuf>> {
        let Content::Image(doc) = &self.content else {
            tracing::debug!("Save ignored: not an image");
            return Ok(None);
        };
        if !doc.undo.is_modified() {
            tracing::debug!("Save ignored: image unmodified");
            return Ok(None);
        }

        let target = app_fs::modified_save_path(&self.path, &Local::now());
        doc.committed.save_with_format(&target, ImageFormat::Png)?;
        tracing::info!("Saved {}", target.display());
        Ok(Some(target))
    }

    /// Open the adjust dialog state with neutral sliders
    pub fn begin_adjust(&mut self) -> bool {
        let Content::Image(doc) = &mut self.content else {
            tracing::debug!("Adjust ignored: no image");
            return false;
        };
        doc.adjust = Some(AdjustSettings::default());
        doc.preview = None;
        true
    }

    /// Edits and undo wait until the adjust dialog is accepted or cancelled
    pub fn is_adjusting(&self) -> bool {
        matches!(&self.content, Content::Image(doc) if doc.adjust.is_some())
    }

    pub fn adjust_settings(&self) -> Option<AdjustSettings> {
        match &self.content {
            Content::Image(doc) => doc.adjust,
            Content::Video(_) => None,
        }
    }

    /// Recompute the preview from the committed image without touching
    /// the undo history
    pub fn preview_adjust(&mut self, settings: AdjustSettings) -> bool {
        let Content::Image(doc) = &mut self.content else {
            return false;
        };
        let preview = settings
            .filters()
            .iter()
            .fold(doc.committed.clone(), |img, filter| filter.apply(&img));
        doc.adjust = Some(settings);
        doc.preview = Some(preview);
        self.revision += 1;
        true
    }

    /// Commit the slider settings as three undoable edits
    pub fn accept_adjust(&mut self) -> bool {
        let settings = match &mut self.content {
            Content::Image(doc) => {
                doc.preview = None;
                doc.adjust.take()
            }
            Content::Video(_) => None,
        };
        let Some(settings) = settings else {
            tracing::debug!("Adjust accept ignored: dialog not open");
            return false;
        };

        for filter in settings.filters() {
            self.apply_filter(filter);
        }
        true
    }

    /// Drop the preview and redisplay the committed image
    pub fn cancel_adjust(&mut self) -> bool {
        let Content::Image(doc) = &mut self.content else {
            return false;
        };
        let was_open = doc.adjust.take().is_some();
        if doc.preview.take().is_some() {
            self.revision += 1;
        }
        was_open
    }

    /// Format/size rows for the info dialog
    pub fn image_info(&self) -> Option<Vec<(String, String)>> {
        match &self.content {
            Content::Image(doc) => Some(filters::image_info(&doc.committed, doc.format)),
            Content::Video(_) => None,
        }
    }

    /// Advance video clocks
    pub fn tick(&mut self, elapsed_ms: u64) {
        if let Some(video) = self.video_mut() {
            video.tick(elapsed_ms);
        }
    }

    /// Stop playback before the session is discarded
    pub fn close(&mut self) {
        if let Some(video) = self.video_mut() {
            if video.state() != PlaybackState::Stopped {
                video.stop();
            }
        }
    }

    fn commit<F>(&mut self, label: &str, op: F) -> bool
    where
        F: FnOnce(&DynamicImage) -> DynamicImage,
    {
        let Content::Image(doc) = &mut self.content else {
            tracing::debug!("{} ignored: no image", label);
            return false;
        };
        if doc.adjust.is_some() {
            tracing::debug!("{} ignored: adjust dialog open", label);
            return false;
        }
        doc.preview = None;

        let before = doc.committed.dimensions();
        let next = op(&doc.committed);
        let snapshot = std::mem::replace(&mut doc.committed, next);
        doc.undo.push(snapshot);
        let after = doc.committed.dimensions();

        self.revision += 1;
        if before != after {
            self.reset_scene();
        }
        tracing::info!("Applied {}", label);
        true
    }

    /// New scene bounds: discard selection and zoom, refit
    fn reset_scene(&mut self) {
        let scene = match &self.content {
            Content::Image(doc) => image_scene(&doc.committed),
            Content::Video(_) => self.interaction.viewport().scene_rect().size(),
        };
        let view = self.interaction.viewport().view_size();
        self.interaction = new_interaction(view, scene, self.zoom_step, self.is_image());
    }
}

impl Drop for ViewerSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn image_scene(image: &DynamicImage) -> Size {
    Size::new(image.width() as f32, image.height() as f32)
}

fn new_interaction(view: Size, scene: Size, zoom_step: f32, is_image: bool) -> CanvasInteraction {
    let viewport = CanvasViewport::new(view, Rect::from_min_size(Point::default(), scene));
    CanvasInteraction::new(viewport, zoom_step, is_image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::tests::RecordingBackend;
    use image::{Rgb, RgbImage};

    fn sample() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(40, 30, |x, y| {
            Rgb([(x * 6) as u8, (y * 8) as u8, ((x * y) % 256) as u8])
        }))
    }

    fn session() -> ViewerSession {
        ViewerSession::from_image(
            Path::new("/tmp/sample.png"),
            sample(),
            Some(ImageFormat::Png),
            &AppConfig::default(),
            Size::new(400.0, 300.0),
        )
    }

    fn select(session: &mut ViewerSession, from: Point, to: Point) {
        let ix = session.interaction_mut();
        ix.pointer_pressed(from, true);
        ix.pointer_moved(to);
        ix.pointer_released();
    }

    #[test]
    fn test_edits_then_undos_restore_original() {
        let mut s = session();
        let original = s.committed_image().unwrap().as_bytes().to_vec();

        let edits = [
            Filter::Sharpen,
            Filter::Colour(1.1),
            Filter::Emboss,
            Filter::SuperResolution(2),
            Filter::Denoise,
        ];
        for f in edits {
            assert!(s.apply_filter(f));
        }
        assert!(s.is_modified());
        assert_eq!(s.committed_image().unwrap().dimensions(), (80, 60));

        for _ in edits {
            assert!(s.undo());
        }
        assert_eq!(s.committed_image().unwrap().as_bytes(), &original[..]);
        assert_eq!(s.committed_image().unwrap().dimensions(), (40, 30));
        assert!(!s.is_modified());
        assert!(!s.undo());
    }

    #[test]
    fn test_crop_needs_selection() {
        let mut s = session();
        assert!(!s.crop());
        assert!(!s.is_modified());

        // 40x30 image fitted into 400x300: scale 10
        select(&mut s, Point::new(50.0, 50.0), Point::new(250.0, 150.0));
        assert!(s.crop());
        assert_eq!(s.committed_image().unwrap().dimensions(), (20, 10));
        assert!(s.interaction().selection_rect().is_none());
        assert_eq!(s.interaction().viewport().scene_rect().size(), Size::new(20.0, 10.0));

        assert!(s.undo());
        assert_eq!(s.committed_image().unwrap().dimensions(), (40, 30));
    }

    #[test]
    fn test_adjust_preview_and_cancel() {
        let mut s = session();
        let original = s.committed_image().unwrap().as_bytes().to_vec();

        assert!(s.begin_adjust());
        let settings = AdjustSettings {
            colour: 0,
            contrast: 15,
            brightness: 5,
        };
        assert!(s.preview_adjust(settings));
        assert_ne!(s.displayed_image().unwrap().as_bytes(), &original[..]);
        assert!(!s.can_undo());

        assert!(s.cancel_adjust());
        assert_eq!(s.displayed_image().unwrap().as_bytes(), &original[..]);
        assert!(!s.is_modified());
    }

    #[test]
    fn test_adjust_accept_commits_three_edits() {
        let mut s = session();
        s.begin_adjust();
        let settings = AdjustSettings {
            colour: 12,
            contrast: 8,
            brightness: 14,
        };
        s.preview_adjust(settings);
        let preview = s.displayed_image().unwrap().as_bytes().to_vec();

        assert!(s.accept_adjust());
        assert_eq!(s.committed_image().unwrap().as_bytes(), &preview[..]);
        assert!(s.adjust_settings().is_none());

        assert!(s.undo());
        assert!(s.undo());
        assert!(s.undo());
        assert!(!s.undo());
        assert!(!s.accept_adjust());
    }

    #[test]
    fn test_eviction_keeps_document_modified() {
        let mut config = AppConfig::default();
        config.viewer.undo_limit = 2;
        let mut s = ViewerSession::from_image(
            Path::new("/tmp/sample.png"),
            sample(),
            None,
            &config,
            Size::new(100.0, 100.0),
        );
        for _ in 0..3 {
            s.apply_filter(Filter::Blur);
        }
        assert!(s.undo());
        assert!(s.undo());
        assert!(!s.can_undo());
        assert!(s.is_modified());
    }

    #[test]
    fn test_save_only_when_modified() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("holiday.png");
        sample().save(&source).unwrap();

        let mut s = ViewerSession::open_image(&source, &AppConfig::default(), Size::new(400.0, 300.0)).unwrap();
        assert_eq!(s.save().unwrap(), None);

        s.apply_filter(Filter::BlackAndWhite);
        let saved = s.save().unwrap().unwrap();
        assert!(saved.exists());
        let name = saved.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("holiday - Modified "));
        assert!(name.ends_with(".png"));

        // Original untouched
        let reloaded = image::open(&source).unwrap();
        assert_eq!(reloaded.to_rgb8().as_raw(), sample().to_rgb8().as_raw());
    }

    #[test]
    fn test_image_info_reports_source_format() {
        let s = session();
        let info = s.image_info().unwrap();
        assert_eq!(info[0].1, "PNG");
        assert_eq!(info[2].1, "40");
    }

    #[test]
    fn test_video_session_ignores_edits() {
        let mut s = ViewerSession::open_video(
            Path::new("clip.mp4"),
            &AppConfig::default(),
            Size::new(640.0, 360.0),
            Box::new(RecordingBackend {
                duration: Some(10_000),
                ..Default::default()
            }),
        )
        .unwrap();

        assert!(!s.is_image());
        assert!(!s.apply_filter(Filter::Blur));
        assert!(!s.undo());
        assert!(s.image_info().is_none());
        assert_eq!(s.save().unwrap(), None);

        // Selection works but crop is images-only
        select(&mut s, Point::new(10.0, 10.0), Point::new(100.0, 100.0));
        assert!(s.interaction().can_zoom_to_rect());
        assert!(!s.crop());

        let video = s.video_mut().unwrap();
        video.skip_forwards();
        assert_eq!(video.position_ms(), 5_000);
    }

    #[test]
    fn test_edits_wait_for_open_adjust_dialog() {
        let mut s = session();
        assert!(s.begin_adjust());
        let settings = AdjustSettings {
            colour: 0,
            contrast: 15,
            brightness: 5,
        };
        assert!(s.preview_adjust(settings));
        assert!(s.is_adjusting());

        assert!(!s.apply_filter(Filter::Sharpen));
        assert!(!s.undo());
        assert_eq!(s.adjust_settings(), Some(settings));

        assert!(s.accept_adjust());
        assert!(!s.is_adjusting());
        for _ in 0..3 {
            assert!(s.undo());
        }
        assert!(!s.can_undo());
    }

    #[test]
    fn test_edit_after_adjust_accept_is_tracked() {
        let mut s = session();
        assert!(s.apply_filter(Filter::Sharpen));
        assert!(s.begin_adjust());
        assert!(s.accept_adjust());
        assert!(s.apply_filter(Filter::Blur));

        let mut undone = 0;
        while s.undo() {
            undone += 1;
        }
        assert_eq!(undone, 5);
    }

    #[test]
    fn test_closed_video_stops_backend_once() {
        let backend = RecordingBackend {
            duration: Some(10_000),
            ..Default::default()
        };
        let log = backend.log.clone();
        let mut s = ViewerSession::open_video(
            Path::new("clip.mp4"),
            &AppConfig::default(),
            Size::new(640.0, 360.0),
            Box::new(backend),
        )
        .unwrap();

        s.close();
        drop(s);
        assert_eq!(log.borrow().iter().filter(|l| l.as_str() == "stop").count(), 1);
    }

    #[test]
    fn test_step_factor() {
        let s = session();
        assert!((s.step_factor(true) - 1.1).abs() < 1e-6);
        assert!((s.step_factor(false) - 0.9).abs() < 1e-6);
    }
}
