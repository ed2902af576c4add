use crate::types::{Config, VelocityConfig};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Load `path`, or fall back to defaults when the file does not exist.
    /// The flag tells the caller which happened (logging is not up yet).
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<(Self, bool)> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok((Config::default(), false));
        }
        Ok((Config::load(path)?, true))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = serde_yaml::to_string(self)?;
        fs::write(path, contents).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }

    /// Clamp out-of-range values in place. Returns one line per correction.
    pub fn validate(&mut self) -> Vec<String> {
        let mut fixes = Vec::new();

        let t = &mut self.tracking;
        if t.resample_vertex_count < 3 {
            fixes.push(format!(
                "tracking.resample_vertex_count {} < 3, using 3",
                t.resample_vertex_count
            ));
            t.resample_vertex_count = 3;
        }
        if !(t.blend_factor > 0.0 && t.blend_factor <= 1.0) {
            let clamped = if t.blend_factor.is_nan() {
                0.05
            } else {
                t.blend_factor.clamp(0.001, 1.0)
            };
            fixes.push(format!(
                "tracking.blend_factor {} outside (0, 1], using {}",
                t.blend_factor, clamped
            ));
            t.blend_factor = clamped;
        }
        if !(t.idle_fade_threshold_seconds >= 0.0) {
            fixes.push(format!(
                "tracking.idle_fade_threshold_seconds {} negative, using 0",
                t.idle_fade_threshold_seconds
            ));
            t.idle_fade_threshold_seconds = 0.0;
        }
        let v = &mut t.velocity;
        if !v.min_displacement.is_finite() || !v.max_displacement.is_finite() {
            let d = VelocityConfig::default();
            fixes.push(format!(
                "tracking.velocity displacement range {}..{} not finite, using {}..{}",
                v.min_displacement, v.max_displacement, d.min_displacement, d.max_displacement
            ));
            v.min_displacement = d.min_displacement;
            v.max_displacement = d.max_displacement;
        }
        if !v.scale_at_min.is_finite() || !v.scale_at_max.is_finite() {
            let d = VelocityConfig::default();
            fixes.push(format!(
                "tracking.velocity scale range {}..{} not finite, using {}..{}",
                v.scale_at_min, v.scale_at_max, d.scale_at_min, d.scale_at_max
            ));
            v.scale_at_min = d.scale_at_min;
            v.scale_at_max = d.scale_at_max;
        }
        if v.max_displacement < v.min_displacement {
            fixes.push(format!(
                "tracking.velocity displacement range {}..{} reversed, swapping",
                v.min_displacement, v.max_displacement
            ));
            std::mem::swap(&mut v.min_displacement, &mut v.max_displacement);
        }

        let s = &mut self.source;
        if s.fps <= 0.0 {
            fixes.push(format!("source.fps {} not positive, using 30", s.fps));
            s.fps = 30.0;
        }
        let (lo, hi) = (s.min_depth.clamp(0.0, 1.0), s.max_depth.clamp(0.0, 1.0));
        if (lo, hi) != (s.min_depth, s.max_depth) || lo > hi {
            let (lo, hi) = if lo > hi { (hi, lo) } else { (lo, hi) };
            fixes.push(format!(
                "source depth band {}..{} invalid, using {}..{}",
                s.min_depth, s.max_depth, lo, hi
            ));
            s.min_depth = lo;
            s.max_depth = hi;
        }
        if s.min_contour_area > s.max_contour_area {
            fixes.push(format!(
                "source contour area bounds {}..{} reversed, swapping",
                s.min_contour_area, s.max_contour_area
            ));
            std::mem::swap(&mut s.min_contour_area, &mut s.max_contour_area);
        }
        if s.queue_capacity == 0 {
            fixes.push("source.queue_capacity 0, using 1".to_string());
            s.queue_capacity = 1;
        }

        let c = &mut self.canvas;
        if c.width == 0 || c.height == 0 {
            fixes.push(format!(
                "canvas size {}x{} empty, using 1280x720",
                c.width, c.height
            ));
            c.width = 1280;
            c.height = 720;
        }
        let b = &mut c.brush;
        if !(b.anchor_size >= 1.0 && b.anchor_size <= 5.0) {
            let clamped = if b.anchor_size.is_nan() {
                1.0
            } else {
                b.anchor_size.clamp(1.0, 5.0)
            };
            fixes.push(format!(
                "canvas.brush.anchor_size {} outside 1..5, using {}",
                b.anchor_size, clamped
            ));
            b.anchor_size = clamped;
        }

        for fix in &fixes {
            warn!("Config: {}", fix);
        }
        fixes
    }
}

// ============================================================================
// LIVE RELOAD
// ============================================================================

/// Polls the config file's modification time. The frame loop calls `poll`
/// every few frames; nothing watches the filesystem in the background.
pub struct ConfigWatcher {
    path: PathBuf,
    modified: Option<SystemTime>,
}

impl ConfigWatcher {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let modified = modified_time(&path);
        Self { path, modified }
    }

    /// A freshly loaded and validated config if the file changed since the
    /// last poll. Parse failures are logged and the running config is kept.
    pub fn poll(&mut self) -> Option<Config> {
        let modified = modified_time(&self.path)?;
        if self.modified == Some(modified) {
            return None;
        }
        self.modified = Some(modified);

        match Config::load(&self.path) {
            Ok(mut config) => {
                config.validate();
                info!("✓ Configuration reloaded from {}", self.path.display());
                Some(config)
            }
            Err(e) => {
                warn!("Config reload failed, keeping current settings: {:#}", e);
                None
            }
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let mut config = Config::default();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_clamps_bad_values() {
        let mut config = Config::default();
        config.tracking.resample_vertex_count = 1;
        config.tracking.blend_factor = 3.0;
        config.tracking.velocity.min_displacement = 80.0;
        config.tracking.velocity.max_displacement = 0.0;
        config.source.min_depth = 0.8;
        config.source.max_depth = 0.2;

        let fixes = config.validate();
        assert_eq!(fixes.len(), 4);
        assert_eq!(config.tracking.resample_vertex_count, 3);
        assert_eq!(config.tracking.blend_factor, 1.0);
        assert_eq!(config.tracking.velocity.min_displacement, 0.0);
        assert_eq!(config.tracking.velocity.max_displacement, 80.0);
        assert!(config.source.min_depth < config.source.max_depth);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = Config::default();
        config.tracking.idle_fade_threshold_seconds = 5.0;
        config.canvas.hue_step_degrees = 12.0;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.tracking.idle_fade_threshold_seconds, 5.0);
        assert_eq!(loaded.canvas.hue_step_degrees, 12.0);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, loaded) = Config::load_or_default(dir.path().join("nope.yaml")).unwrap();
        assert!(!loaded);
        assert_eq!(config.tracking.resample_vertex_count, 40);
    }

    #[test]
    fn test_watcher_picks_up_new_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut watcher = ConfigWatcher::new(&path);
        assert!(watcher.poll().is_none());

        let mut config = Config::default();
        config.tracking.blend_factor = 0.2;
        config.save(&path).unwrap();

        let reloaded = watcher.poll().unwrap();
        assert_eq!(reloaded.tracking.blend_factor, 0.2);
        assert!(watcher.poll().is_none());
    }

    #[test]
    fn test_watcher_keeps_settings_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut watcher = ConfigWatcher::new(&path);
        fs::write(&path, "tracking: [not, a, map").unwrap();
        assert!(watcher.poll().is_none());
    }

    #[test]
    fn test_validate_resets_nan_velocity_bounds() {
        let yaml = "tracking:\n  velocity:\n    min_displacement: .nan\n    scale_at_max: .inf\n";
        let mut config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.tracking.velocity.min_displacement.is_nan());

        let fixes = config.validate();
        assert_eq!(fixes.len(), 2);
        let v = &config.tracking.velocity;
        assert_eq!(v.min_displacement, 0.0);
        assert_eq!(v.max_displacement, 80.0);
        assert_eq!(v.scale_at_min, 1.5);
        assert_eq!(v.scale_at_max, 0.8);
    }

    #[test]
    fn test_validate_clamps_brush_anchor() {
        let mut config = Config::default();
        config.canvas.brush.anchor_size = f32::NAN;
        assert_eq!(config.validate().len(), 1);
        assert_eq!(config.canvas.brush.anchor_size, 1.0);

        config.canvas.brush.anchor_size = 9.0;
        assert_eq!(config.validate().len(), 1);
        assert_eq!(config.canvas.brush.anchor_size, 5.0);
    }
}
