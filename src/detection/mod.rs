// src/detection/mod.rs
//
// Detection collaborator: depth frames in, labelled blobs out.
//
//   DepthFrame → contours (band-pass + outer contours) → label_tracker → LabeledDetection

mod contours;
mod label_tracker;
mod source;

pub use contours::BlobExtractor;
pub use label_tracker::LabelTracker;
pub use source::{DepthFrame, DirectoryFrameSource, FrameSource};

use crate::types::{LabeledDetection, SourceConfig};
use image::GrayImage;

/// Per-frame detection interface consumed by the tracking core.
pub trait DetectionSource {
    fn detect(&mut self, image: &GrayImage) -> Vec<LabeledDetection>;
}

pub struct BlobDetector {
    extractor: BlobExtractor,
    labels: LabelTracker,
}

impl BlobDetector {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            extractor: BlobExtractor::new(config),
            labels: LabelTracker::new(config.max_match_distance, config.persistence),
        }
    }

    /// Pick up edited thresholds. Live labels are kept.
    pub fn reconfigure(&mut self, config: &SourceConfig) {
        self.extractor = BlobExtractor::new(config);
        self.labels
            .set_params(config.max_match_distance, config.persistence);
    }
}

impl DetectionSource for BlobDetector {
    fn detect(&mut self, image: &GrayImage) -> Vec<LabeledDetection> {
        let blobs = self.extractor.extract(image);
        self.labels.label(blobs)
    }
}
