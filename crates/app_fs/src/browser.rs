//! Directory listing for the thumbnail browser

use crate::{FsError, MediaFilter, MediaKind, Result};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

/// What a listing entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    MediaFile(MediaKind),
}

/// One entry of a directory listing. Identity is the path.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub path: PathBuf,
    pub name: String,
    pub kind: EntryKind,
    /// The navigable parent directory prepended to every listing
    pub is_parent: bool,
}

impl PartialEq for DirectoryEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for DirectoryEntry {}

impl DirectoryEntry {
    fn folder(path: PathBuf, is_parent: bool) -> Self {
        let name = if is_parent {
            "..".to_string()
        } else {
            display_name(&path)
        };
        Self {
            path,
            name,
            kind: EntryKind::Folder,
            is_parent,
        }
    }

    fn media(path: PathBuf, kind: MediaKind) -> Self {
        let name = display_name(&path);
        Self {
            path,
            name,
            kind: EntryKind::MediaFile(kind),
            is_parent: false,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    pub fn media_kind(&self) -> Option<MediaKind> {
        match self.kind {
            EntryKind::MediaFile(kind) => Some(kind),
            EntryKind::Folder => None,
        }
    }

    pub fn is_image(&self) -> bool {
        self.media_kind() == Some(MediaKind::Image)
    }

    pub fn is_video(&self) -> bool {
        self.media_kind() == Some(MediaKind::Video)
    }

    /// File stem (or folder name) used for labels
    pub fn stem(&self) -> String {
        if self.is_parent {
            return self.name.clone();
        }
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.name.clone())
    }
}

/// Options for listing directory contents
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Include folders whose name starts with a dot
    pub show_hidden: bool,
    /// Prepend the parent directory as a navigable entry
    pub include_parent: bool,
    pub filter: MediaFilter,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            show_hidden: false,
            include_parent: true,
            filter: MediaFilter::default(),
        }
    }
}

/// List a directory's immediate children.
///
/// Order: parent (if any), folders sorted case-insensitively, then media
/// files sorted case-insensitively. Files whose extension is not in the
/// allow-list are skipped, as are entries that cannot be read.
pub fn list_directory<P: AsRef<Path>>(path: P, options: &ListOptions) -> Result<Vec<DirectoryEntry>> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(FsError::NotFound(path.display().to_string()));
    }

    if !path.is_dir() {
        return Err(FsError::InvalidPath(format!("Not a directory: {}", path.display())));
    }

    let read_dir = fs::read_dir(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => FsError::AccessDenied(path.display().to_string()),
        _ => FsError::Io(e),
    })?;

    let mut folders = Vec::new();
    let mut files = Vec::new();

    for entry in read_dir {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry in {}: {}", path.display(), e);
                continue;
            }
        };
        let child = entry.path();

        if child.is_dir() {
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if hidden && !options.show_hidden {
                continue;
            }
            folders.push(DirectoryEntry::folder(child, false));
        } else if let Some(kind) = options.filter.classify(&child) {
            files.push(DirectoryEntry::media(child, kind));
        }
    }

    folders.sort_by(compare_names);
    files.sort_by(compare_names);

    let mut entries = Vec::with_capacity(folders.len() + files.len() + 1);
    if options.include_parent {
        if let Some(parent) = get_parent(path) {
            entries.push(DirectoryEntry::folder(parent, true));
        }
    }
    entries.extend(folders);
    entries.extend(files);

    tracing::debug!("Listed {} entries in {}", entries.len(), path.display());
    Ok(entries)
}

fn compare_names(a: &DirectoryEntry, b: &DirectoryEntry) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Get parent directory
pub fn get_parent<P: AsRef<Path>>(path: P) -> Option<PathBuf> {
    path.as_ref()
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

/// Check if path is a root/drive
pub fn is_root<P: AsRef<Path>>(path: P) -> bool {
    get_parent(path).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    fn names(entries: &[DirectoryEntry]) -> Vec<String> {
        entries.iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn test_listing_order_and_filtering() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("subfolderB")).unwrap();
        fs::create_dir(dir.path().join("subfolderA")).unwrap();
        touch(dir.path(), "video1.mp4");
        touch(dir.path(), "image2.JPG");
        touch(dir.path(), "image1.png");
        touch(dir.path(), "readme.txt");

        let options = ListOptions {
            filter: MediaFilter::new(&[".png", ".jpg"], &[".mp4"]),
            ..Default::default()
        };
        let entries = list_directory(dir.path(), &options).unwrap();

        assert_eq!(
            names(&entries),
            vec!["..", "subfolderA", "subfolderB", "image1.png", "image2.JPG", "video1.mp4"]
        );
        assert!(entries[0].is_parent);
        assert_eq!(entries[0].path, dir.path().parent().unwrap());
        assert!(entries[1].is_folder());
        assert!(entries[4].is_image());
        assert!(entries[5].is_video());
    }

    #[test]
    fn test_sort_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.png");
        touch(dir.path(), "A.png");
        touch(dir.path(), "c.PNG");

        let options = ListOptions {
            include_parent: false,
            ..Default::default()
        };
        let entries = list_directory(dir.path(), &options).unwrap();
        assert_eq!(names(&entries), vec!["A.png", "b.png", "c.PNG"]);
    }

    #[test]
    fn test_hidden_folders_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".cache")).unwrap();
        fs::create_dir(dir.path().join("visible")).unwrap();

        let mut options = ListOptions {
            include_parent: false,
            ..Default::default()
        };
        let entries = list_directory(dir.path(), &options).unwrap();
        assert_eq!(names(&entries), vec!["visible"]);

        options.show_hidden = true;
        let entries = list_directory(dir.path(), &options).unwrap();
        assert_eq!(names(&entries), vec![".cache", "visible"]);
    }

    #[test]
    fn test_missing_and_file_paths_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            list_directory(&missing, &ListOptions::default()),
            Err(FsError::NotFound(_))
        ));

        touch(dir.path(), "file.png");
        assert!(matches!(
            list_directory(dir.path().join("file.png"), &ListOptions::default()),
            Err(FsError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_root_has_no_parent() {
        assert!(is_root("/"));
        assert!(get_parent("/").is_none());
        assert_eq!(get_parent("/a/b"), Some(PathBuf::from("/a")));
    }
}
