//! Media classification by file extension

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind of media a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
}

/// Extension allow-list used to decide which files the browser shows.
///
/// Extensions are stored lowercase without the leading dot and matched
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFilter {
    image_extensions: Vec<String>,
    video_extensions: Vec<String>,
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self::new(
            &["gif", "jpg", "jpeg", "png", "webp"],
            &["mp4", "mkv"],
        )
    }
}

impl MediaFilter {
    /// Build a filter from image and video extension lists.
    /// Entries may be given with or without a leading dot.
    pub fn new<S: AsRef<str>>(images: &[S], videos: &[S]) -> Self {
        Self {
            image_extensions: images.iter().map(|e| normalize(e.as_ref())).collect(),
            video_extensions: videos.iter().map(|e| normalize(e.as_ref())).collect(),
        }
    }

    /// Classify a path, `None` if its extension is not allowed
    pub fn classify<P: AsRef<Path>>(&self, path: P) -> Option<MediaKind> {
        let ext = path
            .as_ref()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())?;

        if self.image_extensions.contains(&ext) {
            Some(MediaKind::Image)
        } else if self.video_extensions.contains(&ext) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn image_extensions(&self) -> &[String] {
        &self.image_extensions
    }

    pub fn video_extensions(&self) -> &[String] {
        &self.video_extensions
    }
}

fn normalize(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_classification() {
        let filter = MediaFilter::default();
        assert_eq!(filter.classify("a.png"), Some(MediaKind::Image));
        assert_eq!(filter.classify("a.JPG"), Some(MediaKind::Image));
        assert_eq!(filter.classify("a.WebP"), Some(MediaKind::Image));
        assert_eq!(filter.classify("clip.MKV"), Some(MediaKind::Video));
        assert_eq!(filter.classify("notes.txt"), None);
        assert_eq!(filter.classify("no_extension"), None);
    }

    #[test]
    fn test_dotted_extensions_are_normalized() {
        let filter = MediaFilter::new(&[".PNG", ".jpg"], &[".mp4"]);
        assert_eq!(filter.image_extensions(), &["png".to_string(), "jpg".to_string()]);
        assert_eq!(filter.classify("x.png"), Some(MediaKind::Image));
        assert_eq!(filter.classify("x.gif"), None);
    }
}
