// src/tracking/velocity.rs
//
// Render-scale hint from how far an outline's reference vertex moved since
// the previous frame. Fast movers shrink, still shapes swell. Never feeds
// back into blending or identity assignment.

use crate::types::{Point, VelocityConfig};

/// Map a displacement onto the configured scale range.
/// Displacement is clamped to the range before mapping. A degenerate or
/// non-finite range yields `scale_at_min`.
pub fn displacement_to_scale(displacement: f32, cfg: &VelocityConfig) -> f32 {
    let span = cfg.max_displacement - cfg.min_displacement;
    if !span.is_finite() || span <= f32::EPSILON || !displacement.is_finite() {
        return cfg.scale_at_min;
    }
    let clamped = displacement.clamp(cfg.min_displacement, cfg.max_displacement);
    let t = (clamped - cfg.min_displacement) / span;
    cfg.scale_at_min + (cfg.scale_at_max - cfg.scale_at_min) * t
}

/// Previous raw position of one identity's reference vertex.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceMotion {
    last: Point,
}

impl ReferenceMotion {
    pub fn new(start: Point) -> Self {
        Self { last: start }
    }

    /// Record the new raw reference position and return the distance moved.
    pub fn advance(&mut self, position: Point) -> f32 {
        let moved = self.last.distance(&position);
        self.last = position;
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_endpoints() {
        let cfg = VelocityConfig::default();
        assert!((displacement_to_scale(0.0, &cfg) - 1.5).abs() < 1e-6);
        assert!((displacement_to_scale(80.0, &cfg) - 0.8).abs() < 1e-6);
        assert!((displacement_to_scale(40.0, &cfg) - 1.15).abs() < 1e-5);
    }

    #[test]
    fn test_scale_clamps_out_of_range() {
        let cfg = VelocityConfig::default();
        assert!((displacement_to_scale(500.0, &cfg) - 0.8).abs() < 1e-6);
        assert!((displacement_to_scale(-3.0, &cfg) - 1.5).abs() < 1e-6);
        assert!((displacement_to_scale(f32::NAN, &cfg) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_range_falls_back_to_scale_at_min() {
        let cfg = VelocityConfig {
            min_displacement: f32::NAN,
            ..Default::default()
        };
        assert!((displacement_to_scale(12.0, &cfg) - 1.5).abs() < 1e-6);

        let cfg = VelocityConfig {
            max_displacement: f32::INFINITY,
            ..Default::default()
        };
        assert!((displacement_to_scale(12.0, &cfg) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_range() {
        let cfg = VelocityConfig {
            min_displacement: 10.0,
            max_displacement: 10.0,
            ..Default::default()
        };
        assert_eq!(displacement_to_scale(50.0, &cfg), cfg.scale_at_min);
    }

    #[test]
    fn test_reference_motion() {
        let mut motion = ReferenceMotion::new(Point::new(0.0, 0.0));
        assert!((motion.advance(Point::new(3.0, 4.0)) - 5.0).abs() < 1e-6);
        assert_eq!(motion.advance(Point::new(3.0, 4.0)), 0.0);
    }
}
