//! Video backend that hands clips to the system's default player

use app_core::{AppError, MediaBackend, MediaBackendProvider, Result};
use std::path::{Path, PathBuf};

/// Launches the clip once in the associated application. Transport calls
/// after that only update the in-app clock; the external player owns the
/// actual playback.
#[derive(Debug, Default)]
pub struct SystemPlayerBackend {
    path: Option<PathBuf>,
    launched: bool,
}

impl MediaBackend for SystemPlayerBackend {
    fn load(&mut self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(AppError::FileNotFound(path.display().to_string()));
        }
        self.path = Some(path.to_path_buf());
        self.launched = false;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if self.launched {
            return Ok(());
        }
        let Some(path) = &self.path else {
            return Err(AppError::Playback("no clip loaded".into()));
        };
        open::that_detached(path)
            .map_err(|e| AppError::Playback(format!("{}: {}", path.display(), e)))?;
        tracing::info!("Handed {} to the system player", path.display());
        self.launched = true;
        Ok(())
    }

    fn pause(&mut self) {
        tracing::debug!("Pause is handled by the system player");
    }

    fn stop(&mut self) {
        self.launched = false;
    }

    fn seek(&mut self, position_ms: u64) {
        tracing::debug!("Seek to {} ms is handled by the system player", position_ms);
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn set_muted(&mut self, _muted: bool) {}

    fn duration_ms(&self) -> Option<u64> {
        None
    }

    fn position_ms(&self) -> Option<u64> {
        None
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        None
    }
}

/// One [`SystemPlayerBackend`] per opened clip
pub struct SystemPlayer;

impl MediaBackendProvider for SystemPlayer {
    fn create(&self) -> Box<dyn MediaBackend> {
        Box::new(SystemPlayerBackend::default())
    }
}
