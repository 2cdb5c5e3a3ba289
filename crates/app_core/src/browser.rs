//! Browser window model: folder listing, thumbnail grid and viewer dispatch

use crate::config::AppConfig;
use crate::startup::StartupAction;
use crate::thumbnail::{CellId, ThumbnailCell, ThumbnailService};
use crate::video::MediaBackendProvider;
use crate::viewer::ViewerSession;
use crate::viewport::Size;
use crate::{AppError, Result};
use app_fs::list_directory;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Which surface fills the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    Browser,
    Viewer,
}

/// Position remembered per folder for the life of the process
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FolderVisitState {
    pub scroll_offset: f32,
    pub highlighted_index: usize,
}

/// Highlight movement on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridMove {
    Up,
    Down,
    Left,
    Right,
}

pub struct BrowserWindow {
    config: AppConfig,
    thumbnails: ThumbnailService,
    media: Box<dyn MediaBackendProvider>,
    current_dir: Option<PathBuf>,
    cells: Vec<ThumbnailCell>,
    /// Id of `cells[0]`; ids are consecutive within a listing
    first_cell_id: CellId,
    next_cell_id: CellId,
    highlighted: usize,
    scroll_offset: f32,
    /// Scroll offset the grid should jump to on its next frame
    pending_scroll: Option<f32>,
    reveal_highlight: bool,
    visits: HashMap<PathBuf, FolderVisitState>,
    mode: WindowMode,
    viewer: Option<ViewerSession>,
    view_size: Size,
    exit_requested: bool,
}

impl BrowserWindow {
    pub fn new(
        config: AppConfig,
        thumbnails: ThumbnailService,
        media: Box<dyn MediaBackendProvider>,
    ) -> Self {
        let view_size = Size::new(
            config.general.window_width as f32,
            config.general.window_height as f32,
        );
        Self {
            config,
            thumbnails,
            media,
            current_dir: None,
            cells: Vec::new(),
            first_cell_id: 0,
            next_cell_id: 0,
            highlighted: 0,
            scroll_offset: 0.0,
            pending_scroll: None,
            reveal_highlight: false,
            visits: HashMap::new(),
            mode: WindowMode::Browser,
            viewer: None,
            view_size,
            exit_requested: false,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    pub fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    pub fn cells(&self) -> &[ThumbnailCell] {
        &self.cells
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    pub fn thumbnails_per_row(&self) -> usize {
        self.config.browser.thumbnails_per_row.max(1)
    }

    pub fn visit_state(&self, folder: &Path) -> Option<FolderVisitState> {
        self.visits.get(folder).copied()
    }

    pub fn viewer(&self) -> Option<&ViewerSession> {
        self.viewer.as_ref()
    }

    pub fn viewer_mut(&mut self) -> Option<&mut ViewerSession> {
        self.viewer.as_mut()
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Scroll offset the grid must restore, consumed once
    pub fn take_pending_scroll(&mut self) -> Option<f32> {
        self.pending_scroll.take()
    }

    /// Whether the grid should scroll the highlighted cell into view, consumed once
    pub fn take_reveal_highlight(&mut self) -> bool {
        std::mem::take(&mut self.reveal_highlight)
    }

    /// Grid reports its scroll position every frame
    pub fn record_scroll(&mut self, offset: f32) {
        self.scroll_offset = offset;
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    /// Canvas size of the viewer, forwarded to the open session
    pub fn set_view_size(&mut self, size: Size) {
        self.view_size = size;
        if let Some(viewer) = &mut self.viewer {
            viewer.set_view_size(size);
        }
    }

    /// Replace the listing with `folder`'s contents.
    ///
    /// The current folder's position is remembered, every old cell's load
    /// is cancelled, and a previously visited folder gets its scroll offset
    /// and highlight back.
    pub fn open_folder(&mut self, folder: &Path) -> Result<()> {
        let entries = list_directory(folder, &self.config.browser.list_options())?;

        self.remember_current();
        self.close_viewer();

        for cell in &mut self.cells {
            self.thumbnails.cancel(cell);
        }
        self.cells.clear();

        self.first_cell_id = self.next_cell_id;
        for (index, entry) in entries.into_iter().enumerate() {
            let mut cell = ThumbnailCell::new(self.next_cell_id, entry, index);
            self.next_cell_id += 1;
            if cell.wants_thumbnail() {
                self.thumbnails.submit(&mut cell);
            } else {
                cell.settle();
            }
            self.cells.push(cell);
        }

        let visit = self.visits.get(folder).copied().unwrap_or_default();
        self.highlighted = visit.highlighted_index.min(self.cells.len().saturating_sub(1));
        self.scroll_offset = visit.scroll_offset;
        self.pending_scroll = Some(visit.scroll_offset);
        self.current_dir = Some(folder.to_path_buf());
        self.mode = WindowMode::Browser;

        tracing::info!("Opened folder {} ({} entries)", folder.display(), self.cells.len());
        Ok(())
    }

    /// Open whatever the startup gate decided on
    pub fn apply_startup(&mut self, action: StartupAction) -> Result<()> {
        match action {
            StartupAction::OpenFolder(folder) => self.open_folder(&folder),
            StartupAction::DefaultFolder => {
                let folder = self.config.browser.resolved_default_folder();
                self.open_folder(&folder)
            }
            StartupAction::OpenFile(file) => {
                let folder = file
                    .parent()
                    .map(Path::to_path_buf)
                    .ok_or_else(|| AppError::FileNotFound(file.display().to_string()))?;
                self.open_folder(&folder)?;
                match self.cells.iter().position(|c| c.entry.path == file) {
                    Some(index) => self.activate(index),
                    None => {
                        tracing::warn!("{} is not a supported media file", file.display());
                        Ok(())
                    }
                }
            }
        }
    }

    fn remember_current(&mut self) {
        if let Some(dir) = &self.current_dir {
            self.visits.insert(
                dir.clone(),
                FolderVisitState {
                    scroll_offset: self.scroll_offset,
                    highlighted_index: self.highlighted,
                },
            );
        }
    }

    pub fn set_highlight(&mut self, index: usize) -> bool {
        if index >= self.cells.len() || index == self.highlighted {
            return false;
        }
        self.highlighted = index;
        self.reveal_highlight = true;
        true
    }

    /// Move the highlight one cell or one row, stopping at the ends
    pub fn move_highlight(&mut self, movement: GridMove) -> bool {
        if self.cells.is_empty() {
            return false;
        }
        let per_row = self.thumbnails_per_row();
        let last = self.cells.len() - 1;
        let target = match movement {
            GridMove::Left => self.highlighted.saturating_sub(1),
            GridMove::Right => (self.highlighted + 1).min(last),
            GridMove::Up => self.highlighted.checked_sub(per_row).unwrap_or(self.highlighted),
            GridMove::Down => {
                let next = self.highlighted + per_row;
                if next <= last {
                    next
                } else {
                    self.highlighted
                }
            }
        };
        self.set_highlight(target)
    }

    pub fn activate_highlighted(&mut self) -> Result<()> {
        self.activate(self.highlighted)
    }

    /// Folder: open it. Media file: show it in the viewer.
    pub fn activate(&mut self, index: usize) -> Result<()> {
        let Some(cell) = self.cells.get(index) else {
            tracing::debug!("Activate ignored: no cell {}", index);
            return Ok(());
        };
        let entry = cell.entry.clone();
        self.highlighted = index;

        match entry.media_kind() {
            None => self.open_folder(&entry.path),
            Some(kind) => {
                self.close_viewer();
                let session = ViewerSession::open(
                    &entry.path,
                    kind,
                    &self.config,
                    self.view_size,
                    self.media.as_ref(),
                )?;
                self.viewer = Some(session);
                self.mode = WindowMode::Viewer;
                Ok(())
            }
        }
    }

    /// Open the current folder's parent
    pub fn go_parent(&mut self) -> Result<bool> {
        let Some(parent) = self.current_dir.as_deref().and_then(app_fs::get_parent) else {
            return Ok(false);
        };
        self.open_folder(&parent)?;
        Ok(true)
    }

    /// Show the next media file in the viewer, skipping folders
    pub fn next_media(&mut self) -> Result<bool> {
        let start = self.highlighted + 1;
        let found = (start..self.cells.len()).find(|&i| self.cells[i].entry.media_kind().is_some());
        self.step_media(found)
    }

    /// Show the previous media file in the viewer, skipping folders
    pub fn prev_media(&mut self) -> Result<bool> {
        let found = (0..self.highlighted)
            .rev()
            .find(|&i| self.cells[i].entry.media_kind().is_some());
        self.step_media(found)
    }

    fn step_media(&mut self, index: Option<usize>) -> Result<bool> {
        if self.mode != WindowMode::Viewer {
            return Ok(false);
        }
        match index {
            Some(i) => {
                self.activate(i)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn return_to_browser(&mut self) -> bool {
        if self.mode != WindowMode::Viewer {
            return false;
        }
        self.close_viewer();
        self.mode = WindowMode::Browser;
        self.reveal_highlight = true;
        true
    }

    /// Escape: leave the viewer, or exit from the browser
    pub fn back(&mut self) {
        if !self.return_to_browser() {
            tracing::info!("Exit requested from browser");
            self.exit_requested = true;
        }
    }

    fn close_viewer(&mut self) {
        if let Some(mut viewer) = self.viewer.take() {
            viewer.close();
        }
    }

    /// Apply finished thumbnails to their cells; returns how many changed
    pub fn poll_thumbnails(&mut self) -> usize {
        let mut applied = 0;
        for update in self.thumbnails.drain() {
            let Some(offset) = update.cell.checked_sub(self.first_cell_id) else {
                continue;
            };
            if let Some(cell) = self.cells.get_mut(offset as usize) {
                if cell.id == update.cell {
                    cell.apply(update.outcome);
                    applied += 1;
                }
            }
        }
        applied
    }

    /// Advance clocks of the open viewer
    pub fn tick(&mut self, elapsed_ms: u64) {
        if let Some(viewer) = &mut self.viewer {
            viewer.tick(elapsed_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thumbnail::LoadState;
    use crate::video::tests::RecordingBackend;
    use crate::video::MediaBackend;
    use image::{Rgb, RgbImage};
    use std::fs;
    use std::time::Duration;

    struct TestMedia;

    impl MediaBackendProvider for TestMedia {
        fn create(&self) -> Box<dyn MediaBackend> {
            Box::new(RecordingBackend {
                duration: Some(3_000),
                ..Default::default()
            })
        }
    }

    fn window() -> BrowserWindow {
        let mut config = AppConfig::default();
        config.browser.thumbnails_per_row = 3;
        let service = ThumbnailService::new(2, 16).unwrap();
        BrowserWindow::new(config, service, Box::new(TestMedia))
    }

    fn write_image(path: &Path) {
        RgbImage::from_pixel(8, 6, Rgb([10, 200, 30])).save(path).unwrap();
    }

    /// root/{alpha/, beta/, a.png, b.png, c.mp4, d.png}
    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::create_dir(dir.path().join("beta")).unwrap();
        write_image(&dir.path().join("a.png"));
        write_image(&dir.path().join("b.png"));
        fs::write(dir.path().join("c.mp4"), b"").unwrap();
        write_image(&dir.path().join("d.png"));
        dir
    }

    fn names(win: &BrowserWindow) -> Vec<String> {
        win.cells().iter().map(|c| c.entry.name.clone()).collect()
    }

    #[test]
    fn test_open_folder_builds_cells() {
        let dir = fixture();
        let mut win = window();
        win.open_folder(dir.path()).unwrap();

        assert_eq!(names(&win), vec!["..", "alpha", "beta", "a.png", "b.png", "c.mp4", "d.png"]);
        assert_eq!(win.cells()[1].state(), LoadState::Loaded);
        assert_eq!(win.cells()[5].state(), LoadState::Loaded);
        assert_eq!(win.cells()[3].state(), LoadState::Loading);
        assert_eq!(win.take_pending_scroll(), Some(0.0));
        assert_eq!(win.take_pending_scroll(), None);
    }

    #[test]
    fn test_thumbnails_arrive_through_poll() {
        let dir = fixture();
        let mut win = window();
        win.open_folder(dir.path()).unwrap();

        for cell in win.cells() {
            if let Some(task) = cell.task() {
                assert!(task.wait(Duration::from_secs(5)));
            }
        }
        assert_eq!(win.poll_thumbnails(), 3);
        for i in [3, 4, 6] {
            assert_eq!(win.cells()[i].state(), LoadState::Loaded);
            assert!(!win.cells()[i].is_placeholder());
        }
    }

    #[test]
    fn test_revisit_restores_position() {
        let dir = fixture();
        let mut win = window();
        win.open_folder(dir.path()).unwrap();

        assert!(win.set_highlight(4));
        win.record_scroll(120.0);

        win.activate(1).unwrap();
        assert_eq!(win.current_dir(), Some(dir.path().join("alpha").as_path()));
        assert_eq!(win.highlighted(), 0);

        assert!(win.go_parent().unwrap());
        assert_eq!(win.current_dir(), Some(dir.path()));
        // Activating "alpha" moved the highlight onto it before leaving
        assert_eq!(win.highlighted(), 1);
        assert_eq!(win.scroll_offset(), 120.0);
        assert_eq!(win.take_pending_scroll(), Some(120.0));
        assert_eq!(
            win.visit_state(&dir.path().join("alpha")),
            Some(FolderVisitState {
                scroll_offset: 0.0,
                highlighted_index: 0
            })
        );
    }

    #[test]
    fn test_old_cells_are_cancelled_on_folder_change() {
        let dir = fixture();
        let mut win = window();
        win.open_folder(dir.path()).unwrap();
        let stale_id = win.cells()[3].id;

        win.open_folder(&dir.path().join("beta")).unwrap();
        assert!(win.cells().iter().all(|c| c.id > stale_id));
        // Late results for the old listing are dropped
        std::thread::sleep(Duration::from_millis(50));
        win.poll_thumbnails();
        assert_eq!(names(&win), vec![".."]);
    }

    #[test]
    fn test_highlight_movement() {
        let dir = fixture();
        let mut win = window();
        win.open_folder(dir.path()).unwrap();

        assert!(!win.move_highlight(GridMove::Left));
        assert!(!win.move_highlight(GridMove::Up));
        assert!(win.move_highlight(GridMove::Down));
        assert_eq!(win.highlighted(), 3);
        assert!(win.move_highlight(GridMove::Down));
        assert_eq!(win.highlighted(), 6);
        assert!(!win.move_highlight(GridMove::Down));
        assert!(!win.move_highlight(GridMove::Right));
        assert!(win.move_highlight(GridMove::Left));
        assert_eq!(win.highlighted(), 5);
    }

    #[test]
    fn test_viewer_steps_over_media_only() {
        let dir = fixture();
        let mut win = window();
        win.open_folder(dir.path()).unwrap();

        win.activate(3).unwrap();
        assert_eq!(win.mode(), WindowMode::Viewer);
        assert!(win.viewer().unwrap().is_image());

        assert!(!win.prev_media().unwrap());
        assert!(win.next_media().unwrap());
        assert!(win.next_media().unwrap());
        assert_eq!(win.highlighted(), 5);
        assert!(!win.viewer().unwrap().is_image());
        assert!(win.next_media().unwrap());
        assert!(!win.next_media().unwrap());
        assert_eq!(win.highlighted(), 6);

        win.back();
        assert_eq!(win.mode(), WindowMode::Browser);
        assert!(win.viewer().is_none());
        assert!(!win.exit_requested());
        assert!(win.take_reveal_highlight());

        win.back();
        assert!(win.exit_requested());
    }

    #[test]
    fn test_startup_file_opens_maximised() {
        let dir = fixture();
        let mut win = window();
        win.apply_startup(StartupAction::OpenFile(dir.path().join("b.png"))).unwrap();
        assert_eq!(win.current_dir(), Some(dir.path()));
        assert_eq!(win.mode(), WindowMode::Viewer);
        assert_eq!(win.highlighted(), 4);
    }

    #[test]
    fn test_missing_folder_keeps_listing() {
        let dir = fixture();
        let mut win = window();
        win.open_folder(dir.path()).unwrap();
        assert!(win.open_folder(&dir.path().join("nope")).is_err());
        assert_eq!(win.current_dir(), Some(dir.path()));
        assert_eq!(win.cells().len(), 7);
    }
}
