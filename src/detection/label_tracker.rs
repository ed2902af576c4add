// src/detection/label_tracker.rs
//
// Persistence-windowed label emission for extracted blobs.
//
// Design:
//   - Greedy nearest-centroid matching (a handful of blobs per frame)
//   - A label outlives its blob by `persistence` frames, so a blob that
//     flickers out briefly comes back under the same label
//   - New blobs take the smallest free label; freed values are reused

use crate::types::{Identity, LabeledDetection, Point, RawDetection};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone)]
struct LabeledBlob {
    label: Identity,
    center: Point,
    missed_frames: u32,
}

pub struct LabelTracker {
    max_distance: f32,
    persistence: u32,
    blobs: Vec<LabeledBlob>,
}

impl LabelTracker {
    pub fn new(max_distance: f32, persistence: u32) -> Self {
        Self {
            max_distance,
            persistence,
            blobs: Vec::new(),
        }
    }

    pub fn set_params(&mut self, max_distance: f32, persistence: u32) {
        self.max_distance = max_distance;
        self.persistence = persistence;
    }

    /// Label this frame's detections. Output keeps detection order.
    pub fn label(&mut self, detections: Vec<RawDetection>) -> Vec<LabeledDetection> {
        let centers: Vec<Point> = detections.iter().map(|d| d.bounds.center()).collect();

        let mut candidates: Vec<(usize, usize, f32)> = Vec::new();
        for (bi, blob) in self.blobs.iter().enumerate() {
            for (di, center) in centers.iter().enumerate() {
                let dist = blob.center.distance(center);
                if dist <= self.max_distance {
                    candidates.push((bi, di, dist));
                }
            }
        }
        candidates.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

        let mut blob_taken = vec![false; self.blobs.len()];
        let mut labels: Vec<Option<Identity>> = vec![None; detections.len()];
        for (bi, di, _) in candidates {
            if blob_taken[bi] || labels[di].is_some() {
                continue;
            }
            blob_taken[bi] = true;
            labels[di] = Some(self.blobs[bi].label);
            self.blobs[bi].center = centers[di];
            self.blobs[bi].missed_frames = 0;
        }

        for (blob, taken) in self.blobs.iter_mut().zip(&blob_taken) {
            if !taken {
                blob.missed_frames += 1;
            }
        }
        let persistence = self.persistence;
        self.blobs.retain(|b| {
            let keep = b.missed_frames <= persistence;
            if !keep {
                debug!("Label {} released", b.label);
            }
            keep
        });

        for (di, label) in labels.iter_mut().enumerate() {
            if label.is_none() {
                let fresh = self.smallest_free_label();
                debug!("Label {} assigned to new blob", fresh);
                self.blobs.push(LabeledBlob {
                    label: fresh,
                    center: centers[di],
                    missed_frames: 0,
                });
                *label = Some(fresh);
            }
        }

        detections
            .into_iter()
            .zip(labels)
            .filter_map(|(detection, label)| label.map(|label| LabeledDetection { label, detection }))
            .collect()
    }

    fn smallest_free_label(&self) -> Identity {
        let used: HashSet<Identity> = self.blobs.iter().map(|b| b.label).collect();
        (0..).find(|l| !used.contains(l)).unwrap_or(0)
    }

    #[cfg(test)]
    pub fn active_labels(&self) -> usize {
        self.blobs.len()
    }
}
