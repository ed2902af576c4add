// src/types.rs

use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracking: TrackingConfig,
    pub source: SourceConfig,
    pub canvas: CanvasConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Fixed vertex count every tracked outline is resampled to
    pub resample_vertex_count: usize,
    /// Fraction of the remaining distance moved toward the new observation per frame
    pub blend_factor: f32,
    /// Seconds of empty scene before the canvas starts fading
    pub idle_fade_threshold_seconds: f64,
    pub velocity: VelocityConfig,
    /// Absent frames an identity keeps its history for. 0 = prune immediately.
    pub grace_frames: u32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            resample_vertex_count: 40,
            blend_factor: 0.05,
            idle_fade_threshold_seconds: 10.0,
            velocity: VelocityConfig::default(),
            grace_frames: 0,
        }
    }
}

/// Maps reference-vertex displacement (px/frame) onto a render scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    pub min_displacement: f32,
    pub max_displacement: f32,
    pub scale_at_min: f32,
    pub scale_at_max: f32,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            min_displacement: 0.0,
            max_displacement: 80.0,
            scale_at_min: 1.5,
            scale_at_max: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub input_dir: String,
    pub fps: f64,
    /// Normalised (0..1) depth band considered foreground
    pub min_depth: f32,
    pub max_depth: f32,
    /// Contour area bounds in source pixels²
    pub min_contour_area: f32,
    pub max_contour_area: f32,
    /// Max centroid jump (source pixels) for a blob to keep its label
    pub max_match_distance: f32,
    /// Frames a label survives without a matching blob
    pub persistence: u32,
    pub queue_capacity: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            input_dir: "frames".to_string(),
            fps: 30.0,
            min_depth: 0.1,
            max_depth: 0.9,
            min_contour_area: 50.0,
            max_contour_area: 100_000.0,
            max_match_distance: 40.0,
            persistence: 15,
            queue_capacity: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    /// Colour of identity 0; other identities rotate its hue
    pub base_color: [u8; 3],
    pub hue_step_degrees: f32,
    /// White overlay alpha applied per fading frame
    pub fade_alpha: u8,
    pub brush: BrushConfig,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            base_color: [255, 0, 0],
            hue_step_degrees: 5.0,
            fade_alpha: 2,
            brush: BrushConfig::default(),
        }
    }
}

/// Depth stipple painted under the shapes: one black dot per in-band pixel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    pub enabled: bool,
    /// Base dot size in canvas pixels (1..=5). Nearest readings get
    /// `anchor_size + 1`, farthest get 1, jittered towards `anchor_size`.
    pub anchor_size: f32,
    /// White overlay alpha applied after each stipple pass (0 = none)
    pub trail_alpha: u8,
    /// Fixed jitter seed; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            anchor_size: 1.0,
            trail_alpha: 0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
    /// Write a canvas snapshot every N frames (0 = only the final canvas)
    pub save_every: u64,
    pub save_debug: bool,
    /// Check the config file for edits every N frames (0 = never)
    pub reload_check_every: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "output".to_string(),
            save_every: 30,
            save_debug: false,
            reload_check_every: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "depth_canvas=info".to_string(),
        }
    }
}

// ============================================================================
// FRAME DATA
// ============================================================================

/// Small integer token for one physical object. Values are reused.
pub type Identity = u32;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Move `t` of the way from `self` toward `target`.
    pub fn lerp(&self, target: &Point, t: f32) -> Point {
        Point {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingRegion {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// One unlabeled observation from the blob extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub bounds: BoundingRegion,
    pub outline: Vec<Point>,
}

/// A detection carrying the label emitted by the detection collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDetection {
    pub label: Identity,
    pub detection: RawDetection,
}

/// What the compositor rasterizes for one identity this frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderItem {
    pub identity: Identity,
    pub outline: Vec<Point>,
    pub fill: [u8; 3],
    pub scale: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_lerp_five_percent() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(5.0, 0.0);
        let p = a.lerp(&b, 0.05);
        assert!((p.x - 0.25).abs() < 1e-6);
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn test_bounding_region_center() {
        let r = BoundingRegion {
            x: 10.0,
            y: 20.0,
            width: 4.0,
            height: 6.0,
        };
        assert_eq!(r.center(), Point::new(12.0, 23.0));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = "tracking:\n  blend_factor: 0.2\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!((config.tracking.blend_factor - 0.2).abs() < 1e-6);
        assert_eq!(config.tracking.resample_vertex_count, 40);
        assert_eq!(config.tracking.velocity.max_displacement, 80.0);
        assert_eq!(config.canvas.fade_alpha, 2);
    }
}
