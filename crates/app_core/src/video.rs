//! Video transport: playback state, seeking, volume and the controls overlay

use crate::config::VideoConfig;
use crate::Result;
use std::path::Path;

/// Something that can actually play a clip
pub trait MediaBackend {
    fn load(&mut self, path: &Path) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    fn stop(&mut self);
    fn seek(&mut self, position_ms: u64);
    fn set_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);
    /// Clip length, when the backend knows it
    fn duration_ms(&self) -> Option<u64>;
    /// Playback position reported by the backend, if it tracks one
    fn position_ms(&self) -> Option<u64>;
    /// Native frame size, when known
    fn frame_size(&self) -> Option<(u32, u32)>;
}

/// Creates a backend for each opened clip
pub trait MediaBackendProvider {
    fn create(&self) -> Box<dyn MediaBackend>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Playback controller driving a [`MediaBackend`]. Clips loop forever.
pub struct VideoTransport {
    backend: Box<dyn MediaBackend>,
    state: PlaybackState,
    position_ms: u64,
    duration_ms: Option<u64>,
    volume: f32,
    muted: bool,
    skip_ms: u64,
    volume_step: f32,
    overlay_timeout_ms: u64,
    overlay_remaining_ms: u64,
}

impl VideoTransport {
    pub fn new(backend: Box<dyn MediaBackend>, config: &VideoConfig) -> Self {
        Self {
            backend,
            state: PlaybackState::Stopped,
            position_ms: 0,
            duration_ms: None,
            volume: 1.0,
            muted: false,
            skip_ms: config.skip_ms,
            volume_step: config.volume_step,
            overlay_timeout_ms: config.overlay_timeout_ms,
            overlay_remaining_ms: 0,
        }
    }

    /// Load a clip and start playing it
    pub fn load(&mut self, path: &Path) -> Result<()> {
        self.backend.load(path)?;
        self.duration_ms = self.backend.duration_ms();
        self.position_ms = 0;
        self.backend.set_volume(self.volume);
        self.backend.set_muted(self.muted);
        tracing::info!("Loaded video {} (duration {:?} ms)", path.display(), self.duration_ms);
        self.play()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    /// Position as a fraction of the clip, when the length is known
    pub fn progress(&self) -> Option<f32> {
        match self.duration_ms {
            Some(d) if d > 0 => Some(self.position_ms as f32 / d as f32),
            _ => None,
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.backend.frame_size()
    }

    pub fn play(&mut self) -> Result<()> {
        self.backend.play()?;
        self.state = PlaybackState::Playing;
        Ok(())
    }

    pub fn play_pause(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Playing => {
                self.backend.pause();
                self.state = PlaybackState::Paused;
                Ok(())
            }
            PlaybackState::Paused | PlaybackState::Stopped => self.play(),
        }
    }

    pub fn stop(&mut self) {
        self.backend.stop();
        self.state = PlaybackState::Stopped;
        self.position_ms = 0;
    }

    pub fn skip_forwards(&mut self) {
        self.seek(self.position_ms.saturating_add(self.skip_ms));
    }

    pub fn skip_backwards(&mut self) {
        self.seek(self.position_ms.saturating_sub(self.skip_ms));
    }

    /// Seek to a fraction of the clip. Needs a known duration.
    pub fn jump_to(&mut self, fraction: f32) -> bool {
        let Some(duration) = self.duration_ms else {
            tracing::debug!("Jump ignored: clip length unknown");
            return false;
        };
        let fraction = fraction.clamp(0.0, 1.0);
        self.seek((duration as f64 * fraction as f64) as u64);
        true
    }

    /// Seek, clamped to the clip
    pub fn seek(&mut self, position_ms: u64) {
        let position_ms = match self.duration_ms {
            Some(d) => position_ms.min(d),
            None => position_ms,
        };
        self.backend.seek(position_ms);
        self.position_ms = position_ms;
        self.show_overlay();
    }

    pub fn increase_volume(&mut self) {
        self.set_volume(self.volume + self.volume_step);
    }

    pub fn decrease_volume(&mut self) {
        self.set_volume(self.volume - self.volume_step);
    }

    /// Clamp to 0..=1 and unmute
    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.muted = false;
        self.backend.set_volume(self.volume);
        self.backend.set_muted(false);
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        self.backend.set_muted(self.muted);
    }

    /// Pointer activity over the video restarts the overlay timer
    pub fn pointer_moved(&mut self) {
        self.show_overlay();
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay_remaining_ms > 0
    }

    fn show_overlay(&mut self) {
        self.overlay_remaining_ms = self.overlay_timeout_ms;
    }

    /// Advance clocks by `elapsed_ms`: playback position (wrapping at the end
    /// of the clip) and the overlay timer
    pub fn tick(&mut self, elapsed_ms: u64) {
        self.overlay_remaining_ms = self.overlay_remaining_ms.saturating_sub(elapsed_ms);

        if self.duration_ms.is_none() {
            self.duration_ms = self.backend.duration_ms();
        }

        if self.state != PlaybackState::Playing {
            return;
        }

        self.position_ms = match self.backend.position_ms() {
            Some(p) => p,
            None => self.position_ms.saturating_add(elapsed_ms),
        };
        if let Some(d) = self.duration_ms.filter(|d| *d > 0) {
            if self.position_ms >= d {
                self.position_ms %= d;
            }
        }
    }
}

impl Drop for VideoTransport {
    fn drop(&mut self) {
        if self.state != PlaybackState::Stopped {
            self.backend.stop();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Backend that records the calls it receives
    #[derive(Default)]
    pub(crate) struct RecordingBackend {
        pub duration: Option<u64>,
        pub log: Rc<RefCell<Vec<String>>>,
    }

    impl MediaBackend for RecordingBackend {
        fn load(&mut self, path: &Path) -> Result<()> {
            self.log.borrow_mut().push(format!("load {}", path.display()));
            Ok(())
        }
        fn play(&mut self) -> Result<()> {
            self.log.borrow_mut().push("play".into());
            Ok(())
        }
        fn pause(&mut self) {
            self.log.borrow_mut().push("pause".into());
        }
        fn stop(&mut self) {
            self.log.borrow_mut().push("stop".into());
        }
        fn seek(&mut self, position_ms: u64) {
            self.log.borrow_mut().push(format!("seek {}", position_ms));
        }
        fn set_volume(&mut self, _volume: f32) {}
        fn set_muted(&mut self, muted: bool) {
            self.log.borrow_mut().push(format!("muted {}", muted));
        }
        fn duration_ms(&self) -> Option<u64> {
            self.duration
        }
        fn position_ms(&self) -> Option<u64> {
            None
        }
        fn frame_size(&self) -> Option<(u32, u32)> {
            Some((640, 360))
        }
    }

    fn transport(duration: Option<u64>) -> (VideoTransport, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let backend = RecordingBackend {
            duration,
            log: log.clone(),
        };
        let mut t = VideoTransport::new(Box::new(backend), &VideoConfig::default());
        t.load(Path::new("clip.mp4")).unwrap();
        (t, log)
    }

    #[test]
    fn test_load_starts_playing_and_toggles() {
        let (mut t, log) = transport(Some(60_000));
        assert_eq!(t.state(), PlaybackState::Playing);

        t.play_pause().unwrap();
        assert_eq!(t.state(), PlaybackState::Paused);
        t.play_pause().unwrap();
        assert_eq!(t.state(), PlaybackState::Playing);

        let log = log.borrow();
        assert_eq!(log.first().map(String::as_str), Some("load clip.mp4"));
        assert!(log.iter().any(|l| l == "pause"));
    }

    #[test]
    fn test_skip_is_clamped() {
        let (mut t, _) = transport(Some(8_000));
        t.skip_forwards();
        assert_eq!(t.position_ms(), 5_000);
        t.skip_forwards();
        assert_eq!(t.position_ms(), 8_000);
        t.skip_backwards();
        t.skip_backwards();
        assert_eq!(t.position_ms(), 0);
    }

    #[test]
    fn test_jump_needs_duration() {
        let (mut t, _) = transport(Some(10_000));
        assert!(t.jump_to(0.25));
        assert_eq!(t.position_ms(), 2_500);
        assert_eq!(t.progress(), Some(0.25));

        let (mut unknown, _) = transport(None);
        assert!(!unknown.jump_to(0.5));
        assert_eq!(unknown.position_ms(), 0);
    }

    #[test]
    fn test_volume_clamps_and_unmutes() {
        let (mut t, _) = transport(None);
        t.increase_volume();
        assert_eq!(t.volume(), 1.0);

        t.toggle_mute();
        assert!(t.is_muted());
        t.decrease_volume();
        assert!(!t.is_muted());
        assert!((t.volume() - 0.9).abs() < 1e-6);

        for _ in 0..20 {
            t.decrease_volume();
        }
        assert_eq!(t.volume(), 0.0);
    }

    #[test]
    fn test_overlay_timer() {
        let (mut t, _) = transport(Some(10_000));
        assert!(!t.overlay_visible());
        t.pointer_moved();
        assert!(t.overlay_visible());
        t.tick(1_500);
        assert!(t.overlay_visible());
        t.tick(600);
        assert!(!t.overlay_visible());
    }

    #[test]
    fn test_playback_loops() {
        let (mut t, _) = transport(Some(1_000));
        t.tick(700);
        assert_eq!(t.position_ms(), 700);
        t.tick(700);
        assert_eq!(t.position_ms(), 400);

        t.play_pause().unwrap();
        t.tick(300);
        assert_eq!(t.position_ms(), 400);
    }

    #[test]
    fn test_drop_stops_backend() {
        let (t, log) = transport(None);
        drop(t);
        assert_eq!(log.borrow().last().map(String::as_str), Some("stop"));
    }
}
