//! Background thumbnail loading
//!
//! Workers decode and scale on a dedicated rayon pool and post results to a
//! channel. They never touch cells: the UI thread drains the channel and
//! applies each update to the cell it names, if that cell still exists and
//! has not been cancelled.

use crate::{AppError, Result};
use app_fs::DirectoryEntry;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use image::{DynamicImage, ImageReader, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Identity of a cell, unique for the life of the process
pub type CellId = u64;

/// Longest label shown under a thumbnail
const MAX_LABEL_CHARS: usize = 15;
const LABEL_KEEP_CHARS: usize = 6;

/// Cooperative cancellation flag shared with a worker
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Worker-side progress of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskStatus {
    Queued = 0,
    Running = 1,
    Finished = 2,
    Cancelled = 3,
    Failed = 4,
}

impl TaskStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => TaskStatus::Running,
            2 => TaskStatus::Finished,
            3 => TaskStatus::Cancelled,
            4 => TaskStatus::Failed,
            _ => TaskStatus::Queued,
        }
    }
}

/// Handle to a submitted decode-and-scale task
#[derive(Debug)]
pub struct ThumbnailTask {
    cell: CellId,
    token: CancellationToken,
    status: Arc<AtomicU8>,
    /// Disconnects when the worker is done with the task
    done: Receiver<()>,
}

impl ThumbnailTask {
    pub fn cell(&self) -> CellId {
        self.cell
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    /// Block until the worker has finished with this task.
    /// Returns false if `timeout` elapsed first.
    pub fn wait(&self, timeout: Duration) -> bool {
        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }
}

/// Result posted by a worker
#[derive(Debug, Clone)]
pub enum ThumbnailOutcome {
    Loaded(Arc<RgbaImage>),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ThumbnailUpdate {
    pub cell: CellId,
    pub outcome: ThumbnailOutcome,
}

/// Decodes the full image a thumbnail is made from
pub trait ThumbnailDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DynamicImage>;
}

/// Decodes files with the `image` crate, guessing the format from content
#[derive(Debug, Default)]
pub struct ImageFileDecoder;

impl ThumbnailDecoder for ImageFileDecoder {
    fn decode(&self, path: &Path) -> Result<DynamicImage> {
        let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        Ok(img)
    }
}

/// Display state of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Loading,
    Cancelled,
    Loaded,
    Failed,
}

/// One entry of the thumbnail grid
#[derive(Debug)]
pub struct ThumbnailCell {
    pub id: CellId,
    pub entry: DirectoryEntry,
    pub index: usize,
    state: LoadState,
    image: Option<Arc<RgbaImage>>,
    task: Option<ThumbnailTask>,
}

impl ThumbnailCell {
    pub fn new(id: CellId, entry: DirectoryEntry, index: usize) -> Self {
        Self {
            id,
            entry,
            index,
            state: LoadState::Pending,
            image: None,
            task: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.entry.path
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Decoded thumbnail; `None` while the placeholder is shown
    pub fn image(&self) -> Option<&Arc<RgbaImage>> {
        self.image.as_ref()
    }

    pub fn task(&self) -> Option<&ThumbnailTask> {
        self.task.as_ref()
    }

    pub fn is_placeholder(&self) -> bool {
        self.image.is_none()
    }

    /// Whether this cell should be decoded in the background
    pub fn wants_thumbnail(&self) -> bool {
        self.entry.is_image() && self.state == LoadState::Pending
    }

    /// Label under the thumbnail: the folder name or file stem, shortened
    /// to `first6...last6` when longer than 15 characters
    pub fn label(&self) -> String {
        if self.entry.is_folder() {
            shorten_label(&self.entry.name)
        } else {
            shorten_label(&self.entry.stem())
        }
    }

    /// Stop any in-flight load. No further state change will come from it.
    pub fn cancel(&mut self) {
        if matches!(self.state, LoadState::Pending | LoadState::Loading) {
            if let Some(task) = &self.task {
                task.cancel();
            }
            self.state = LoadState::Cancelled;
        }
    }

    /// Mark a cell that has nothing to decode (folders, videos) as settled
    pub fn settle(&mut self) {
        if self.state == LoadState::Pending {
            self.state = LoadState::Loaded;
        }
    }

    fn start(&mut self, task: ThumbnailTask) {
        self.task = Some(task);
        self.state = LoadState::Loading;
    }

    /// Apply a worker result. Ignored unless the cell is still loading.
    pub fn apply(&mut self, outcome: ThumbnailOutcome) {
        if self.state != LoadState::Loading {
            tracing::trace!("Dropping thumbnail update for cell {} in state {:?}", self.id, self.state);
            return;
        }
        match outcome {
            ThumbnailOutcome::Loaded(img) => {
                self.image = Some(img);
                self.state = LoadState::Loaded;
            }
            ThumbnailOutcome::Failed(msg) => {
                tracing::warn!("Thumbnail failed for {}: {}", self.entry.path.display(), msg);
                self.state = LoadState::Failed;
            }
        }
    }
}

impl Drop for ThumbnailCell {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub fn shorten_label(text: &str) -> String {
    let count = text.chars().count();
    if count <= MAX_LABEL_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(LABEL_KEEP_CHARS).collect();
    let tail: String = text.chars().skip(count - LABEL_KEEP_CHARS).collect();
    format!("{}...{}", head, tail)
}

/// Shared worker pool producing thumbnails
pub struct ThumbnailService {
    pool: rayon::ThreadPool,
    decoder: Arc<dyn ThumbnailDecoder>,
    decode_size: u32,
    results_tx: Sender<ThumbnailUpdate>,
    results_rx: Receiver<ThumbnailUpdate>,
}

impl ThumbnailService {
    /// `workers == 0` uses one thread per logical CPU
    pub fn new(workers: usize, decode_size: u32) -> Result<Self> {
        Self::with_decoder(workers, decode_size, Arc::new(ImageFileDecoder))
    }

    pub fn with_decoder(
        workers: usize,
        decode_size: u32,
        decoder: Arc<dyn ThumbnailDecoder>,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("thumb-worker-{}", i))
            .build()
            .map_err(|e| AppError::Init(format!("Thumbnail pool: {}", e)))?;

        tracing::info!("Thumbnail service started with {} workers", pool.current_num_threads());

        let (results_tx, results_rx) = crossbeam_channel::unbounded();
        Ok(Self {
            pool,
            decoder,
            decode_size: decode_size.max(1),
            results_tx,
            results_rx,
        })
    }

    /// Queue a decode for the cell and attach the task handle to it.
    /// Cells that are not pending images are left untouched.
    pub fn submit(&self, cell: &mut ThumbnailCell) {
        if !cell.wants_thumbnail() {
            return;
        }

        let token = CancellationToken::new();
        let status = Arc::new(AtomicU8::new(TaskStatus::Queued as u8));
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(0);

        let job = Job {
            cell: cell.id,
            path: cell.entry.path.clone(),
            size: self.decode_size,
            token: token.clone(),
            status: status.clone(),
            decoder: self.decoder.clone(),
            results: self.results_tx.clone(),
        };

        self.pool.spawn(move || {
            job.run();
            drop(done_tx);
        });

        cell.start(ThumbnailTask {
            cell: cell.id,
            token,
            status,
            done: done_rx,
        });
    }

    pub fn cancel(&self, cell: &mut ThumbnailCell) {
        cell.cancel();
    }

    /// Take every result posted since the last call, without blocking
    pub fn drain(&self) -> Vec<ThumbnailUpdate> {
        self.results_rx.try_iter().collect()
    }

    pub fn decode_size(&self) -> u32 {
        self.decode_size
    }
}

struct Job {
    cell: CellId,
    path: PathBuf,
    size: u32,
    token: CancellationToken,
    status: Arc<AtomicU8>,
    decoder: Arc<dyn ThumbnailDecoder>,
    results: Sender<ThumbnailUpdate>,
}

impl Job {
    fn run(self) {
        if self.cancelled() {
            return;
        }
        self.set_status(TaskStatus::Running);

        let img = match self.decoder.decode(&self.path) {
            Ok(img) => img,
            Err(e) => {
                self.set_status(TaskStatus::Failed);
                self.post(ThumbnailOutcome::Failed(e.to_string()));
                return;
            }
        };

        if self.cancelled() {
            return;
        }
        let thumb = img.thumbnail(self.size, self.size).to_rgba8();

        if self.cancelled() {
            return;
        }
        self.set_status(TaskStatus::Finished);
        self.post(ThumbnailOutcome::Loaded(Arc::new(thumb)));
    }

    fn cancelled(&self) -> bool {
        if self.token.is_cancelled() {
            self.set_status(TaskStatus::Cancelled);
            tracing::trace!("Thumbnail task for cell {} cancelled", self.cell);
            true
        } else {
            false
        }
    }

    fn set_status(&self, status: TaskStatus) {
        self.status.store(status as u8, Ordering::SeqCst);
    }

    fn post(&self, outcome: ThumbnailOutcome) {
        // The receiver only goes away with the service
        let _ = self.results.send(ThumbnailUpdate {
            cell: self.cell,
            outcome,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_fs::{list_directory, ListOptions};
    use image::Rgba;

    /// Decoder that blocks until the test releases it
    struct GatedDecoder {
        gate: Receiver<()>,
    }

    impl ThumbnailDecoder for GatedDecoder {
        fn decode(&self, _path: &Path) -> Result<DynamicImage> {
            let _ = self.gate.recv_timeout(Duration::from_secs(5));
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 20, Rgba([1, 2, 3, 255]))))
        }
    }

    /// Decoder that reports when it starts, then blocks until released
    struct SignallingDecoder {
        started: Sender<()>,
        gate: Receiver<()>,
    }

    impl ThumbnailDecoder for SignallingDecoder {
        fn decode(&self, _path: &Path) -> Result<DynamicImage> {
            let _ = self.started.send(());
            let _ = self.gate.recv_timeout(Duration::from_secs(5));
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 20, Rgba([1, 2, 3, 255]))))
        }
    }

    fn image_cells(dir: &Path, names: &[&str]) -> Vec<ThumbnailCell> {
        for name in names {
            std::fs::write(dir.join(name), b"").unwrap();
        }
        let options = ListOptions {
            include_parent: false,
            ..Default::default()
        };
        list_directory(dir, &options)
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(i, entry)| ThumbnailCell::new(i as CellId, entry, i))
            .collect()
    }

    fn apply_all(service: &ThumbnailService, cells: &mut [ThumbnailCell]) {
        for update in service.drain() {
            if let Some(cell) = cells.iter_mut().find(|c| c.id == update.cell) {
                cell.apply(update.outcome);
            }
        }
    }

    #[test]
    fn test_cancel_before_start_keeps_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let mut cells = image_cells(dir.path(), &["a.png", "b.png"]);

        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let service =
            ThumbnailService::with_decoder(1, 16, Arc::new(GatedDecoder { gate: gate_rx })).unwrap();

        // The only worker blocks on the first task
        service.submit(&mut cells[0]);
        service.submit(&mut cells[1]);
        service.cancel(&mut cells[1]);
        assert_eq!(cells[1].state(), LoadState::Cancelled);

        gate_tx.send(()).unwrap();
        assert!(cells[0].task().unwrap().wait(Duration::from_secs(5)));
        assert!(cells[1].task().unwrap().wait(Duration::from_secs(5)));

        apply_all(&service, &mut cells);

        assert_eq!(cells[0].state(), LoadState::Loaded);
        let thumb = cells[0].image().unwrap();
        assert_eq!((thumb.width(), thumb.height()), (16, 8));

        assert_eq!(cells[1].state(), LoadState::Cancelled);
        assert!(cells[1].is_placeholder());
        assert_eq!(cells[1].task().unwrap().status(), TaskStatus::Cancelled);
    }

    #[test]
    fn test_cancel_during_decode_posts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut cells = image_cells(dir.path(), &["a.png"]);

        let (started_tx, started_rx) = crossbeam_channel::unbounded();
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let decoder = SignallingDecoder {
            started: started_tx,
            gate: gate_rx,
        };
        let service = ThumbnailService::with_decoder(1, 16, Arc::new(decoder)).unwrap();

        service.submit(&mut cells[0]);
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(cells[0].task().unwrap().status(), TaskStatus::Running);

        service.cancel(&mut cells[0]);
        gate_tx.send(()).unwrap();
        assert!(cells[0].task().unwrap().wait(Duration::from_secs(5)));

        assert_eq!(cells[0].task().unwrap().status(), TaskStatus::Cancelled);
        assert!(service.drain().is_empty());
        assert!(cells[0].is_placeholder());
    }

    #[test]
    fn test_decode_failure_marks_cell_failed() {
        let dir = tempfile::tempdir().unwrap();
        // Empty files are not decodable
        let mut cells = image_cells(dir.path(), &["broken.png"]);
        let service = ThumbnailService::new(1, 32).unwrap();

        service.submit(&mut cells[0]);
        assert_eq!(cells[0].state(), LoadState::Loading);
        assert!(cells[0].task().unwrap().wait(Duration::from_secs(5)));

        apply_all(&service, &mut cells);
        assert_eq!(cells[0].state(), LoadState::Failed);
        assert!(cells[0].is_placeholder());
        assert_eq!(cells[0].task().unwrap().status(), TaskStatus::Failed);
    }

    #[test]
    fn test_real_file_is_scaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        RgbaImage::from_pixel(100, 50, Rgba([200, 10, 10, 255])).save(&path).unwrap();

        let options = ListOptions {
            include_parent: false,
            ..Default::default()
        };
        let entry = list_directory(dir.path(), &options).unwrap().remove(0);
        let mut cell = ThumbnailCell::new(7, entry, 0);

        let service = ThumbnailService::new(2, 32).unwrap();
        service.submit(&mut cell);
        assert!(cell.task().unwrap().wait(Duration::from_secs(5)));

        for update in service.drain() {
            assert_eq!(update.cell, 7);
            cell.apply(update.outcome);
        }
        assert_eq!(cell.state(), LoadState::Loaded);
        let thumb = cell.image().unwrap();
        assert_eq!((thumb.width(), thumb.height()), (32, 16));
    }

    #[test]
    fn test_update_after_cancel_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut cells = image_cells(dir.path(), &["late.png"]);
        let service = ThumbnailService::new(1, 8).unwrap();

        service.submit(&mut cells[0]);
        cells[0].cancel();
        cells[0].apply(ThumbnailOutcome::Loaded(Arc::new(RgbaImage::new(8, 8))));
        assert_eq!(cells[0].state(), LoadState::Cancelled);
        assert!(cells[0].is_placeholder());
    }

    #[test]
    fn test_label_shortening() {
        assert_eq!(shorten_label("short"), "short");
        assert_eq!(shorten_label("exactly15chars!"), "exactly15chars!");
        assert_eq!(shorten_label("holiday_photo_2023_final"), "holida..._final");
        assert_eq!(shorten_label("abcdefghijklmnop"), "abcdef...klmnop");
    }
}
