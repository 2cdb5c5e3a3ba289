//! Startup file-open handling
//!
//! A path handed to the process shortly after launch (command line, OS
//! open-file event, file dropped on the window) decides what the first
//! screen shows. If nothing arrives within the grace window the default
//! folder is shown.

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// What to show first
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupAction {
    /// Open the file's folder with the file maximised in the viewer
    OpenFile(PathBuf),
    OpenFolder(PathBuf),
    /// Nothing was requested in time
    DefaultFolder,
}

#[derive(Debug)]
pub struct StartupGate {
    started: Instant,
    grace: Duration,
    decided: bool,
}

impl StartupGate {
    pub fn new(grace: Duration) -> Self {
        Self::starting_at(Instant::now(), grace)
    }

    pub fn starting_at(started: Instant, grace: Duration) -> Self {
        Self {
            started,
            grace,
            decided: false,
        }
    }

    pub fn is_decided(&self) -> bool {
        self.decided
    }

    /// Offer a requested path. Honoured only once and only inside the
    /// grace window.
    pub fn offer(&mut self, path: PathBuf, now: Instant) -> Option<StartupAction> {
        if self.decided {
            tracing::debug!("Startup already decided, ignoring {}", path.display());
            return None;
        }
        if now.saturating_duration_since(self.started) > self.grace {
            tracing::debug!("Open request for {} arrived after the startup window", path.display());
            return None;
        }

        self.decided = true;
        tracing::info!("Startup request: {}", path.display());
        if path.is_dir() {
            Some(StartupAction::OpenFolder(path))
        } else {
            Some(StartupAction::OpenFile(path))
        }
    }

    /// Fall back to the default folder once the grace window has passed
    pub fn poll(&mut self, now: Instant) -> Option<StartupAction> {
        if self.decided || now.saturating_duration_since(self.started) < self.grace {
            return None;
        }
        self.decided = true;
        Some(StartupAction::DefaultFolder)
    }
}
