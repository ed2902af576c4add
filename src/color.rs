// src/color.rs
//
// Identity fill colours. Each identity takes the base colour with its hue
// rotated by identity × step degrees, so neighbouring labels get
// neighbouring hues and a reused label gets the same colour back.

use crate::types::Identity;

// ============================================================================
// HSV CONVERSION
// ============================================================================

/// Convert RGB to HSV.
/// Returns (H: 0-360, S: 0-100, V: 0-255).
#[inline]
pub fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let r_n = r / 255.0;
    let g_n = g / 255.0;
    let b_n = b / 255.0;

    let max = r_n.max(g_n).max(b_n);
    let min = r_n.min(g_n).min(b_n);
    let delta = max - min;

    // Hue
    let h = if delta < 1e-6 {
        0.0
    } else if (max - r_n).abs() < 1e-6 {
        60.0 * (((g_n - b_n) / delta) % 6.0)
    } else if (max - g_n).abs() < 1e-6 {
        60.0 * (((b_n - r_n) / delta) + 2.0)
    } else {
        60.0 * (((r_n - g_n) / delta) + 4.0)
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    let s = if max < 1e-6 { 0.0 } else { (delta / max) * 100.0 };
    let v = max * 255.0;

    (h, s, v)
}

/// Inverse of [`rgb_to_hsv`], same ranges. Hue wraps.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let h = h.rem_euclid(360.0);
    let s = (s / 100.0).clamp(0.0, 1.0);
    let v = (v / 255.0).clamp(0.0, 1.0);

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    ]
}

// ============================================================================
// IDENTITY PALETTE
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct IdentityPalette {
    base_hue: f32,
    saturation: f32,
    value: f32,
    hue_step: f32,
}

impl IdentityPalette {
    pub fn new(base: [u8; 3], hue_step_degrees: f32) -> Self {
        let (h, s, v) = rgb_to_hsv(base[0] as f32, base[1] as f32, base[2] as f32);
        Self {
            base_hue: h,
            saturation: s,
            value: v,
            hue_step: hue_step_degrees,
        }
    }

    pub fn color_for(&self, identity: Identity) -> [u8; 3] {
        let hue = self.base_hue + identity as f32 * self.hue_step;
        hsv_to_rgb(hue, self.saturation, self.value)
    }
}
