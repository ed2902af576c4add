// src/pipeline/metrics.rs
//
// Run counters. Shared between the capture thread and the frame loop,
// hence atomics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub frames_captured: Arc<AtomicU64>,
    pub frames_unreadable: Arc<AtomicU64>,
    pub total_frames: Arc<AtomicU64>,
    pub frames_with_detections: Arc<AtomicU64>,
    pub detections_skipped: Arc<AtomicU64>,
    pub outlines_seeded: Arc<AtomicU64>,
    pub outlines_reseeded: Arc<AtomicU64>,
    pub identities_pruned: Arc<AtomicU64>,
    pub fade_frames: Arc<AtomicU64>,
    pub state_transitions: Arc<AtomicU64>,
    pub update_time_us: Arc<AtomicU64>,
    pub update_time_total_us: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            frames_captured: Arc::new(AtomicU64::new(0)),
            frames_unreadable: Arc::new(AtomicU64::new(0)),
            total_frames: Arc::new(AtomicU64::new(0)),
            frames_with_detections: Arc::new(AtomicU64::new(0)),
            detections_skipped: Arc::new(AtomicU64::new(0)),
            outlines_seeded: Arc::new(AtomicU64::new(0)),
            outlines_reseeded: Arc::new(AtomicU64::new(0)),
            identities_pruned: Arc::new(AtomicU64::new(0)),
            fade_frames: Arc::new(AtomicU64::new(0)),
            state_transitions: Arc::new(AtomicU64::new(0)),
            update_time_us: Arc::new(AtomicU64::new(0)),
            update_time_total_us: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, counter: &AtomicU64, amount: u64) {
        counter.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn set_timing(&self, duration_us: u64) {
        self.update_time_us.store(duration_us, Ordering::Relaxed);
        self.update_time_total_us
            .fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let total_frames = self.total_frames.load(Ordering::Relaxed);
        let total_us = self.update_time_total_us.load(Ordering::Relaxed);
        MetricsSummary {
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
            frames_unreadable: self.frames_unreadable.load(Ordering::Relaxed),
            total_frames,
            fps: self.fps(),
            frames_with_detections: self.frames_with_detections.load(Ordering::Relaxed),
            detections_skipped: self.detections_skipped.load(Ordering::Relaxed),
            outlines_seeded: self.outlines_seeded.load(Ordering::Relaxed),
            outlines_reseeded: self.outlines_reseeded.load(Ordering::Relaxed),
            identities_pruned: self.identities_pruned.load(Ordering::Relaxed),
            fade_frames: self.fade_frames.load(Ordering::Relaxed),
            state_transitions: self.state_transitions.load(Ordering::Relaxed),
            last_update_us: self.update_time_us.load(Ordering::Relaxed),
            avg_update_us: if total_frames > 0 {
                total_us / total_frames
            } else {
                0
            },
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub frames_captured: u64,
    pub frames_unreadable: u64,
    pub total_frames: u64,
    pub fps: f64,
    pub frames_with_detections: u64,
    pub detections_skipped: u64,
    pub outlines_seeded: u64,
    pub outlines_reseeded: u64,
    pub identities_pruned: u64,
    pub fade_frames: u64,
    pub state_transitions: u64,
    pub last_update_us: u64,
    pub avg_update_us: u64,
    pub elapsed_secs: f64,
}
