// src/detection/source.rs

use anyhow::{Context, Result};
use image::GrayImage;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

const FRAME_EXTENSIONS: [&str; 6] = ["png", "pgm", "tif", "tiff", "bmp", "pnm"];

/// One 8-bit depth frame. Brighter = nearer after normalisation.
#[derive(Debug, Clone)]
pub struct DepthFrame {
    pub index: u64,
    pub timestamp_secs: f64,
    pub image: GrayImage,
}

pub trait FrameSource {
    /// `Ok(None)` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<DepthFrame>>;
}

/// Replays a directory of recorded depth images in path order.
pub struct DirectoryFrameSource {
    paths: Vec<PathBuf>,
    cursor: usize,
    emitted: u64,
    fps: f64,
    unreadable: usize,
}

impl DirectoryFrameSource {
    pub fn open(dir: impl AsRef<Path>, fps: f64) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            anyhow::bail!("Frame directory {} does not exist", dir.display());
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_frame_file(p))
            .collect();
        paths.sort();

        info!("Found {} depth frames in {}", paths.len(), dir.display());

        Ok(Self {
            paths,
            cursor: 0,
            emitted: 0,
            fps,
            unreadable: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn unreadable(&self) -> usize {
        self.unreadable
    }
}

impl FrameSource for DirectoryFrameSource {
    fn next_frame(&mut self) -> Result<Option<DepthFrame>> {
        while let Some(path) = self.paths.get(self.cursor) {
            self.cursor += 1;
            match load_depth_image(path) {
                Ok(image) => {
                    let index = self.emitted;
                    self.emitted += 1;
                    return Ok(Some(DepthFrame {
                        index,
                        timestamp_secs: index as f64 / self.fps,
                        image,
                    }));
                }
                Err(e) => {
                    self.unreadable += 1;
                    warn!("Skipping unreadable frame {}: {:#}", path.display(), e);
                }
            }
        }
        Ok(None)
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            FRAME_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Decode any supported image as 8-bit luma (16-bit depth is scaled down).
pub fn load_depth_image(path: &Path) -> Result<GrayImage> {
    let img = image::open(path).with_context(|| format!("decoding {}", path.display()))?;
    Ok(img.to_luma8())
}
