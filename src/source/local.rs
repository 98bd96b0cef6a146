//! Local clip discovery.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SourceError};

/// File extensions accepted as candidate source clips.
pub const VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "mov", "avi", "mkv", "wmv"];

/// Scan a directory (non-recursively) for video files.
///
/// Results are sorted by file name so discovery order is stable across runs;
/// any shuffling happens later, under the injected random source.
pub fn scan_directory(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(SourceError::DirectoryNotFound { path: dir.display().to_string() }.into());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_video_extension(path))
        .collect();
    files.sort();

    debug!(dir = %dir.display(), found = files.len(), "scanned for video files");
    if files.is_empty() {
        return Err(SourceError::NoClipsFound { path: dir.display().to_string() }.into());
    }
    Ok(files)
}

/// Keep only the paths that still exist and carry a video extension.
pub fn validate_files(files: &[PathBuf]) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|path| path.is_file() && has_video_extension(path))
        .cloned()
        .collect()
}

fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn scan_picks_up_video_files_only() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a.mp4");
        touch(dir.path(), "b.MOV");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "cover.png");

        let files = scan_directory(dir.path()).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| has_video_extension(p)));
    }

    #[test]
    fn scan_is_sorted_for_stable_discovery() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "c.mp4");
        touch(dir.path(), "a.mp4");
        touch(dir.path(), "b.mp4");

        let files = scan_directory(dir.path()).unwrap();
        let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_owned()).collect();

        assert_eq!(names, ["a.mp4", "b.mp4", "c.mp4"]);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(scan_directory(dir.path()).is_err());
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(scan_directory("definitely/not/a/dir").is_err());
    }

    #[test]
    fn validate_drops_vanished_files() {
        let dir = tempdir().unwrap();
        let kept = touch(dir.path(), "keep.mp4");
        let gone = dir.path().join("gone.mp4");

        let valid = validate_files(&[kept.clone(), gone]);

        assert_eq!(valid, vec![kept]);
    }
}
