// src/tracking/shape_tracker.rs
//
// Per-identity outline smoothing.
//
// Every raw outline is resampled to a fixed vertex count before anything
// else touches it, so vertex i of one frame corresponds to vertex i of the
// next and per-vertex interpolation is well defined.
//
// Two maps per identity:
//   current:  this frame's resampled raw observation (overwritten)
//   smoothed: the last blended outline, the interpolation source for the
//             next frame and what gets rendered
//
// Each frame moves `blend_factor` of the remaining distance toward the
// observation (default 5%).

use crate::geometry::{blend_outlines, resample_outline};
use crate::tracking::velocity::{displacement_to_scale, ReferenceMotion};
use crate::types::{Identity, Point, RawDetection, TrackingConfig, VelocityConfig};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOutcome {
    /// First sighting: resampled outline stored verbatim
    Seeded,
    /// Blended toward the new observation
    Blended,
    /// Stored outline had the wrong vertex count; treated as first sighting
    Reseeded { stored: usize, expected: usize },
    /// Outline could not be resampled
    Rejected,
}

/// A ready-to-render tracked shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedShape {
    pub identity: Identity,
    pub outline: Vec<Point>,
    pub scale: f32,
}

pub struct ShapeTracker {
    resample_count: usize,
    blend_factor: f32,
    velocity: VelocityConfig,
    current: HashMap<Identity, Vec<Point>>,
    smoothed: HashMap<Identity, Vec<Point>>,
    motion: HashMap<Identity, ReferenceMotion>,
    scales: HashMap<Identity, f32>,
}

impl ShapeTracker {
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            resample_count: config.resample_vertex_count,
            blend_factor: config.blend_factor,
            velocity: config.velocity.clone(),
            current: HashMap::new(),
            smoothed: HashMap::new(),
            motion: HashMap::new(),
            scales: HashMap::new(),
        }
    }

    /// Apply new parameters. Outlines already stored keep their old vertex
    /// count until their identity's next update reseeds them.
    pub fn reconfigure(&mut self, config: &TrackingConfig) {
        if config.resample_vertex_count != self.resample_count {
            debug!(
                "Resample count {} → {}",
                self.resample_count, config.resample_vertex_count
            );
        }
        self.resample_count = config.resample_vertex_count;
        self.blend_factor = config.blend_factor;
        self.velocity = config.velocity.clone();
    }

    pub fn update(&mut self, identity: Identity, detection: &RawDetection) -> UpdateOutcome {
        let Some(resampled) = resample_outline(&detection.outline, self.resample_count) else {
            warn!(
                "Identity {}: cannot resample {}-point outline",
                identity,
                detection.outline.len()
            );
            return UpdateOutcome::Rejected;
        };

        let reference = resampled[0];
        let displacement = match self.motion.get_mut(&identity) {
            Some(motion) => motion.advance(reference),
            None => {
                self.motion.insert(identity, ReferenceMotion::new(reference));
                0.0
            }
        };
        self.scales
            .insert(identity, displacement_to_scale(displacement, &self.velocity));

        let blended = self
            .smoothed
            .get(&identity)
            .map(|previous| {
                (
                    previous.len(),
                    blend_outlines(previous, &resampled, self.blend_factor),
                )
            });

        let outcome = match blended {
            None => {
                debug!("Identity {} seeded", identity);
                self.smoothed.insert(identity, resampled.clone());
                UpdateOutcome::Seeded
            }
            Some((_, Some(outline))) => {
                self.smoothed.insert(identity, outline);
                UpdateOutcome::Blended
            }
            Some((stored, None)) => {
                warn!(
                    "Identity {}: stored outline has {} points, expected {}; reseeding",
                    identity, stored, self.resample_count
                );
                self.smoothed.insert(identity, resampled.clone());
                UpdateOutcome::Reseeded {
                    stored,
                    expected: self.resample_count,
                }
            }
        };

        self.current.insert(identity, resampled);
        outcome
    }

    /// The smoothed outline for `identity`.
    pub fn outline(&self, identity: Identity) -> Option<&[Point]> {
        self.smoothed.get(&identity).map(Vec::as_slice)
    }

    /// This frame's resampled raw observation for `identity`.
    pub fn observation(&self, identity: Identity) -> Option<&[Point]> {
        self.current.get(&identity).map(Vec::as_slice)
    }

    pub fn scale(&self, identity: Identity) -> Option<f32> {
        self.scales.get(&identity).copied()
    }

    pub fn shape(&self, identity: Identity) -> Option<TrackedShape> {
        let outline = self.outline(identity)?;
        Some(TrackedShape {
            identity,
            outline: outline.to_vec(),
            scale: self.scale(identity).unwrap_or(1.0),
        })
    }

    pub fn identities(&self) -> Vec<Identity> {
        self.smoothed.keys().copied().collect()
    }

    #[cfg(test)]
    pub fn contains(&self, identity: Identity) -> bool {
        self.smoothed.contains_key(&identity)
    }

    /// Drop every trace of `identity`. Returns whether it was tracked.
    pub fn remove(&mut self, identity: Identity) -> bool {
        self.current.remove(&identity);
        self.motion.remove(&identity);
        self.scales.remove(&identity);
        self.smoothed.remove(&identity).is_some()
    }

    pub fn len(&self) -> usize {
        self.smoothed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.smoothed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{bounding_region, outline_distance};

    fn detection(points: Vec<Point>) -> RawDetection {
        RawDetection {
            bounds: bounding_region(&points),
            outline: points,
        }
    }

    fn square(x: f32, y: f32, size: f32) -> RawDetection {
        detection(vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ])
    }

    #[test]
    fn test_first_sighting_stores_resampled_outline() {
        let mut tracker = ShapeTracker::new(&TrackingConfig::default());
        let det = square(0.0, 0.0, 10.0);

        assert_eq!(tracker.update(7, &det), UpdateOutcome::Seeded);

        let expected = resample_outline(&det.outline, 40).unwrap();
        assert_eq!(tracker.outline(7).unwrap(), expected.as_slice());
        assert_eq!(tracker.observation(7).unwrap(), expected.as_slice());
    }

    #[test]
    fn test_shifted_square_moves_five_percent() {
        let mut tracker = ShapeTracker::new(&TrackingConfig::default());
        tracker.update(7, &square(0.0, 0.0, 10.0));
        assert_eq!(tracker.update(7, &square(5.0, 0.0, 10.0)), UpdateOutcome::Blended);

        let first = tracker.outline(7).unwrap()[0];
        assert!((first.x - 0.25).abs() < 1e-4);
        assert!(first.y.abs() < 1e-4);
    }

    #[test]
    fn test_static_outline_converges_monotonically() {
        let mut tracker = ShapeTracker::new(&TrackingConfig::default());
        tracker.update(3, &square(0.0, 0.0, 20.0));

        let target = square(30.0, 12.0, 20.0);
        let target_resampled = resample_outline(&target.outline, 40).unwrap();

        let mut last = f32::INFINITY;
        for _ in 0..400 {
            tracker.update(3, &target);
            let d = outline_distance(tracker.outline(3).unwrap(), &target_resampled).unwrap();
            if d < 0.05 {
                break;
            }
            assert!(d < last, "distance {} did not shrink below {}", d, last);
            last = d;
        }
        let d = outline_distance(tracker.outline(3).unwrap(), &target_resampled).unwrap();
        assert!(d < 0.5);
    }

    #[test]
    fn test_resample_count_change_reseeds() {
        let mut config = TrackingConfig::default();
        let mut tracker = ShapeTracker::new(&config);
        tracker.update(1, &square(0.0, 0.0, 10.0));

        config.resample_vertex_count = 24;
        tracker.reconfigure(&config);

        let det = square(5.0, 5.0, 10.0);
        assert_eq!(
            tracker.update(1, &det),
            UpdateOutcome::Reseeded {
                stored: 40,
                expected: 24
            }
        );
        let expected = resample_outline(&det.outline, 24).unwrap();
        assert_eq!(tracker.outline(1).unwrap(), expected.as_slice());
    }

    #[test]
    fn test_malformed_outline_rejected() {
        let mut tracker = ShapeTracker::new(&TrackingConfig::default());
        let det = detection(vec![Point::new(1.0, 1.0)]);
        assert_eq!(tracker.update(2, &det), UpdateOutcome::Rejected);
        assert!(!tracker.contains(2));
    }

    #[test]
    fn test_scale_hint_from_reference_displacement() {
        let mut tracker = ShapeTracker::new(&TrackingConfig::default());
        tracker.update(4, &square(0.0, 0.0, 10.0));
        assert!((tracker.scale(4).unwrap() - 1.5).abs() < 1e-6);

        tracker.update(4, &square(40.0, 0.0, 10.0));
        assert!((tracker.scale(4).unwrap() - 1.15).abs() < 1e-5);

        tracker.update(4, &square(400.0, 0.0, 10.0));
        assert!((tracker.scale(4).unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_scale_does_not_affect_blend() {
        let mut tracker = ShapeTracker::new(&TrackingConfig::default());
        tracker.update(9, &square(0.0, 0.0, 10.0));
        tracker.update(9, &square(200.0, 0.0, 10.0));
        let first = tracker.outline(9).unwrap()[0];
        assert!((first.x - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_remove_clears_history() {
        let mut tracker = ShapeTracker::new(&TrackingConfig::default());
        tracker.update(6, &square(0.0, 0.0, 10.0));
        assert!(tracker.remove(6));
        assert!(!tracker.remove(6));
        assert!(tracker.is_empty());
        assert!(tracker.scale(6).is_none());

        assert_eq!(tracker.update(6, &square(50.0, 0.0, 10.0)), UpdateOutcome::Seeded);
        assert_eq!(tracker.outline(6).unwrap()[0], Point::new(50.0, 0.0));
    }
}
