// src/pipeline/orchestrator.rs
//
// One frame through the tracking core:
//
//   labelled detections
//     → IdentityAssigner   (presence set, malformed/duplicate filtered)
//     → ShapeTracker       (resample + blend per identity, scale hint)
//     → LifecycleManager   (prune absent, idle timer, fade signal)
//     → FrameContext       (render items in detection order)
//
// Single-threaded. Owns every piece of per-identity state.

use crate::color::IdentityPalette;
use crate::geometry::outline_distance;
use crate::pipeline::frame_context::FrameContext;
use crate::pipeline::metrics::PipelineMetrics;
use crate::tracking::{
    IdentityAssigner, LifecycleManager, ShapeTracker, TrackedShape, UpdateOutcome,
};
use crate::types::{CanvasConfig, Identity, LabeledDetection, RenderItem, TrackingConfig};
use std::time::Instant;
use tracing::{debug, trace};

pub struct CanvasPipeline {
    assigner: IdentityAssigner,
    tracker: ShapeTracker,
    lifecycle: LifecycleManager,
    palette: IdentityPalette,
    metrics: PipelineMetrics,
    frame_id: u64,
}

impl CanvasPipeline {
    pub fn new(tracking: &TrackingConfig, canvas: &CanvasConfig) -> Self {
        Self {
            assigner: IdentityAssigner::new(),
            tracker: ShapeTracker::new(tracking),
            lifecycle: LifecycleManager::new(tracking),
            palette: IdentityPalette::new(canvas.base_color, canvas.hue_step_degrees),
            metrics: PipelineMetrics::new(),
            frame_id: 0,
        }
    }

    /// `now_secs` must come from a monotonic source (frame timestamps).
    pub fn process_frame(
        &mut self,
        detections: Vec<LabeledDetection>,
        now_secs: f64,
    ) -> FrameContext {
        let started = Instant::now();
        let mut ctx = FrameContext::new(self.frame_id, now_secs);
        self.frame_id += 1;

        let frame = self.assigner.assign(detections);
        ctx.skipped = frame.skipped.len();
        if frame.is_empty() {
            trace!("Frame {}: nothing present", ctx.frame_id);
        }

        let mut order: Vec<Identity> = Vec::with_capacity(frame.assigned.len());
        for (identity, detection) in &frame.assigned {
            match self.tracker.update(*identity, detection) {
                UpdateOutcome::Seeded => {
                    self.metrics.inc(&self.metrics.outlines_seeded);
                    order.push(*identity);
                }
                UpdateOutcome::Blended => order.push(*identity),
                UpdateOutcome::Reseeded { stored, expected } => {
                    trace!("Identity {} reseeded ({} → {} vertices)", identity, stored, expected);
                    ctx.reseeded += 1;
                    order.push(*identity);
                }
                UpdateOutcome::Rejected => ctx.skipped += 1,
            }
        }

        let report = self
            .lifecycle
            .update(&frame.presence, &mut self.tracker, now_secs);

        ctx.render = order
            .into_iter()
            .filter_map(|id| self.tracker.shape(id))
            .map(|shape| self.render_item(shape))
            .collect();
        ctx.fade = report.fade;
        ctx.state = report.state;
        ctx.transition = report.transition;
        ctx.pruned = report.pruned;

        trace!(
            "Frame {}: {} rendered, {} skipped, fade={}",
            ctx.frame_id,
            ctx.render.len(),
            ctx.skipped,
            ctx.fade
        );
        self.record(&ctx, started);
        ctx
    }

    fn render_item(&self, shape: TrackedShape) -> RenderItem {
        if let Some(lag) = self
            .tracker
            .observation(shape.identity)
            .and_then(|raw| outline_distance(&shape.outline, raw))
        {
            trace!("Identity {}: smoothed lags observation by {:.2}", shape.identity, lag);
        }
        RenderItem {
            identity: shape.identity,
            fill: self.palette.color_for(shape.identity),
            scale: shape.scale,
            outline: shape.outline,
        }
    }

    fn record(&self, ctx: &FrameContext, started: Instant) {
        let m = &self.metrics;
        m.inc(&m.total_frames);
        if !ctx.is_empty() {
            m.inc(&m.frames_with_detections);
        }
        if ctx.fade {
            m.inc(&m.fade_frames);
        }
        if ctx.transition.is_some() {
            m.inc(&m.state_transitions);
        }
        m.add(&m.detections_skipped, ctx.skipped as u64);
        m.add(&m.outlines_reseeded, ctx.reseeded as u64);
        m.add(&m.identities_pruned, ctx.pruned.len() as u64);
        m.set_timing(started.elapsed().as_micros() as u64);
    }

    /// Live parameter update. Per-identity state survives; outlines with a
    /// stale vertex count reseed on their next update.
    pub fn apply_tracking_config(&mut self, tracking: &TrackingConfig) {
        debug!(
            "Tracking config applied: {} vertices, blend {:.3}, idle {:.1}s",
            tracking.resample_vertex_count,
            tracking.blend_factor,
            tracking.idle_fade_threshold_seconds
        );
        self.tracker.reconfigure(tracking);
        self.lifecycle.reconfigure(tracking);
    }

    pub fn set_palette(&mut self, canvas: &CanvasConfig) {
        self.palette = IdentityPalette::new(canvas.base_color, canvas.hue_step_degrees);
    }

    pub fn tracker(&self) -> &ShapeTracker {
        &self.tracker
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn palette(&self) -> &IdentityPalette {
        &self.palette
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn frames_processed(&self) -> u64 {
        self.frame_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::CanvasState;
    use crate::types::{BoundingRegion, Point, RawDetection};

    fn square(label: Identity, x0: f32, y0: f32) -> LabeledDetection {
        let outline = vec![
            Point::new(x0, y0),
            Point::new(x0 + 10.0, y0),
            Point::new(x0 + 10.0, y0 + 10.0),
            Point::new(x0, y0 + 10.0),
        ];
        LabeledDetection {
            label,
            detection: RawDetection {
                bounds: BoundingRegion {
                    x: x0,
                    y: y0,
                    width: 10.0,
                    height: 10.0,
                },
                outline,
            },
        }
    }

    fn pipeline() -> CanvasPipeline {
        CanvasPipeline::new(&TrackingConfig::default(), &CanvasConfig::default())
    }

    #[test]
    fn test_first_sighting_renders_resampled_outline() {
        let mut p = pipeline();
        let ctx = p.process_frame(vec![square(1, 0.0, 0.0)], 0.0);
        assert_eq!(ctx.render.len(), 1);
        let item = &ctx.render[0];
        assert_eq!(item.identity, 1);
        assert_eq!(item.outline.len(), 40);
        assert_eq!(item.outline[0], Point::new(0.0, 0.0));
        assert!((item.scale - 1.5).abs() < 1e-6);
        assert_eq!(item.fill, p.palette().color_for(1));
        assert!(!ctx.fade);
    }

    #[test]
    fn test_shifted_square_blends_five_percent() {
        let mut p = pipeline();
        p.process_frame(vec![square(1, 0.0, 0.0)], 0.0);
        let ctx = p.process_frame(vec![square(1, 5.0, 0.0)], 1.0 / 30.0);

        let first = ctx.render[0].outline[0];
        assert!((first.x - 0.25).abs() < 1e-4);
        assert!(first.y.abs() < 1e-4);
    }

    #[test]
    fn test_render_follows_detection_order() {
        let mut p = pipeline();
        let ctx = p.process_frame(
            vec![square(9, 0.0, 0.0), square(2, 50.0, 0.0), square(4, 0.0, 50.0)],
            0.0,
        );
        assert_eq!(ctx.identities(), vec![9, 2, 4]);
        assert_ne!(ctx.render[0].fill, ctx.render[1].fill);
    }

    #[test]
    fn test_zero_detections_render_nothing() {
        let mut p = pipeline();
        let ctx = p.process_frame(Vec::new(), 0.0);
        assert!(ctx.is_empty());
        assert!(!ctx.fade);
        assert_eq!(ctx.state, CanvasState::Active);
    }

    #[test]
    fn test_absent_identity_pruned_then_reseeded() {
        let mut p = pipeline();
        p.process_frame(vec![square(3, 0.0, 0.0)], 0.0);
        p.process_frame(vec![square(3, 2.0, 0.0)], 0.1);

        let gone = p.process_frame(Vec::new(), 0.2);
        assert_eq!(gone.pruned, vec![3]);
        assert!(!p.tracker().contains(3));

        // Back far away: no blending from the old outline
        let back = p.process_frame(vec![square(3, 100.0, 100.0)], 0.3);
        assert_eq!(back.render[0].outline[0], Point::new(100.0, 100.0));
        assert_eq!(p.metrics().summary().outlines_seeded, 2);
    }

    #[test]
    fn test_fade_after_long_silence_stops_on_detection() {
        let mut p = pipeline();
        p.process_frame(vec![square(1, 0.0, 0.0)], 0.0);

        let quiet = p.process_frame(Vec::new(), 20.0);
        assert!(quiet.fade);
        assert_eq!(quiet.state, CanvasState::Idling);

        let seen = p.process_frame(vec![square(1, 0.0, 0.0)], 20.5);
        assert!(!seen.fade);
        assert_eq!(seen.state, CanvasState::Active);
        assert!(seen.transition.is_some());
    }

    #[test]
    fn test_malformed_detection_skipped_and_not_present() {
        let mut p = pipeline();
        let mut bad = square(5, 0.0, 0.0);
        bad.detection.outline.truncate(1);
        let ctx = p.process_frame(vec![bad, square(6, 0.0, 0.0)], 0.0);
        assert_eq!(ctx.identities(), vec![6]);
        assert_eq!(ctx.skipped, 1);
        assert!(!p.tracker().contains(5));
    }

    #[test]
    fn test_vertex_count_change_reseeds() {
        let mut p = pipeline();
        p.process_frame(vec![square(1, 0.0, 0.0)], 0.0);

        let tracking = TrackingConfig {
            resample_vertex_count: 24,
            ..Default::default()
        };
        p.apply_tracking_config(&tracking);
        let ctx = p.process_frame(vec![square(1, 5.0, 0.0)], 0.1);
        assert_eq!(ctx.reseeded, 1);
        assert_eq!(ctx.render[0].outline.len(), 24);
        assert_eq!(ctx.render[0].outline[0], Point::new(5.0, 0.0));
    }

    #[test]
    fn test_metrics_track_frames() {
        let mut p = pipeline();
        p.process_frame(vec![square(1, 0.0, 0.0)], 0.0);
        p.process_frame(Vec::new(), 0.1);
        let summary = p.metrics().summary();
        assert_eq!(summary.total_frames, 2);
        assert_eq!(summary.frames_with_detections, 1);
        assert_eq!(summary.identities_pruned, 1);
        assert_eq!(p.frames_processed(), 2);
    }

    #[test]
    fn test_nan_velocity_range_does_not_crash_tracking() {
        let mut tracking = TrackingConfig::default();
        tracking.velocity.min_displacement = f32::NAN;
        let mut p = CanvasPipeline::new(&tracking, &CanvasConfig::default());

        p.process_frame(vec![square(1, 0.0, 0.0)], 0.0);
        let ctx = p.process_frame(vec![square(1, 5.0, 0.0)], 0.1);
        assert_eq!(ctx.render.len(), 1);
        assert!((ctx.render[0].scale - 1.5).abs() < 1e-6);
    }
}
