use std::path::{Path, PathBuf};

use image::GrayImage;
use turbidity::{FrameSource, Result, TurbidityError};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Replays the images of a directory, in file-name order, as camera frames
#[derive(Debug, Clone)]
pub struct DirectoryFrameSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
}

impl DirectoryFrameSource {
    /// Fails with a capture error if the directory is missing or holds no images
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let entries = std::fs::read_dir(&dir).map_err(|e| {
            TurbidityError::Capture(format!("Cannot open frame directory {}: {}", dir.display(), e))
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(TurbidityError::Capture(format!(
                "No frames found in {}",
                dir.display()
            )));
        }

        Ok(Self { dir, files, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for DirectoryFrameSource {
    fn capture_frame(&mut self) -> Result<Option<GrayImage>> {
        let Some(path) = self.files.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;

        let frame = image::open(path).map_err(|e| {
            TurbidityError::Capture(format!("Failed to grab frame {}: {}", path.display(), e))
        })?;
        Ok(Some(frame.to_luma8()))
    }

    fn description(&self) -> String {
        format!("Directory: {} ({} frames)", self.dir.display(), self.files.len())
    }
}
