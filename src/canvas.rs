// src/canvas.rs
//
// Persistent drawing surface. Shapes accumulate frame after frame; the only
// thing that erases them is the fade pass, which runs while the lifecycle
// reports the scene idle. Under the shapes sits the depth stipple: black
// dots for every in-band depth reading, laid down before each composite.

use crate::geometry::{build_pixel_path, centroid, scale_about};
use crate::pipeline::FrameContext;
use crate::types::{BrushConfig, CanvasConfig, Point, RenderItem};
use anyhow::{Context, Result};
use image::{GrayImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tracing::{debug, info, trace};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

// ============================================================================
// FRAME → CANVAS MAPPING
// ============================================================================

/// Uniform scale that covers the whole canvas, centred. Overflow on the
/// longer axis is cropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMapping {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl FrameMapping {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    pub fn fill(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Self {
        if src_w == 0 || src_h == 0 {
            return Self::identity();
        }
        let scale = (dst_w as f32 / src_w as f32).max(dst_h as f32 / src_h as f32);
        Self {
            scale,
            offset_x: (dst_w as f32 - src_w as f32 * scale) / 2.0,
            offset_y: (dst_h as f32 - src_h as f32 * scale) / 2.0,
        }
    }

    pub fn apply(&self, p: &Point) -> Point {
        Point::new(
            p.x * self.scale + self.offset_x,
            p.y * self.scale + self.offset_y,
        )
    }
}

// ============================================================================
// CANVAS
// ============================================================================

pub struct Canvas {
    image: RgbaImage,
    mapping: FrameMapping,
    source_size: Option<(u32, u32)>,
    fade_alpha: u8,
    brush: BrushConfig,
    rng: StdRng,
}

impl Canvas {
    pub fn new(config: &CanvasConfig) -> Self {
        let rng = match config.brush.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            image: RgbaImage::from_pixel(config.width.max(1), config.height.max(1), WHITE),
            mapping: FrameMapping::identity(),
            source_size: None,
            fade_alpha: config.fade_alpha,
            brush: config.brush.clone(),
            rng,
        }
    }

    /// Set the source frame size that detection coordinates refer to.
    pub fn fit_source(&mut self, width: u32, height: u32) {
        if self.source_size == Some((width, height)) {
            return;
        }
        self.mapping = FrameMapping::fill(width, height, self.image.width(), self.image.height());
        self.source_size = Some((width, height));
        debug!(
            "Canvas mapping {}x{} → {}x{}: scale {:.3}",
            width,
            height,
            self.image.width(),
            self.image.height(),
            self.mapping.scale
        );
    }

    /// Paint one black dot per depth reading strictly inside
    /// `(min_depth, max_depth)`. Nearer readings get bigger dots. Returns the
    /// number of dots painted.
    pub fn stipple(&mut self, frame: &GrayImage, min_depth: f32, max_depth: f32) -> usize {
        if !self.brush.enabled {
            return 0;
        }
        let span = max_depth - min_depth;
        if !span.is_finite() || span <= f32::EPSILON {
            return 0;
        }

        let anchor = if self.brush.anchor_size.is_finite() {
            self.brush.anchor_size.clamp(1.0, 5.0)
        } else {
            1.0
        };
        let mut painted = 0;
        for (x, y, px) in frame.enumerate_pixels() {
            let v = px[0];
            let depth = v as f32 / 255.0;
            if v == 0 || depth <= min_depth || depth >= max_depth {
                continue;
            }
            let t = (depth - min_depth) / span;
            let radius = (anchor + 1.0) - t * anchor;
            let r = self
                .rng
                .random_range(radius.min(anchor)..=radius.max(anchor));

            let c = self.mapping.apply(&Point::new(x as f32, y as f32));
            let centre = ((c.x + anchor).round() as i32, (c.y + anchor).round() as i32);
            draw_filled_circle_mut(&mut self.image, centre, r.round().max(1.0) as i32, INK);
            painted += 1;
        }

        self.overlay_white(self.brush.trail_alpha);
        trace!("Stippled {} depth readings", painted);
        painted
    }

    pub fn composite(&mut self, frame: &FrameContext) {
        if frame.fade {
            self.fade();
        }
        for item in &frame.render {
            self.draw(item);
        }
    }

    pub fn draw(&mut self, item: &RenderItem) {
        let scaled = scale_about(&item.outline, centroid(&item.outline), item.scale);
        let mapped: Vec<Point> = scaled.iter().map(|p| self.mapping.apply(p)).collect();
        let path = build_pixel_path(&mapped);
        if path.is_empty() {
            return;
        }
        let [r, g, b] = item.fill;
        draw_polygon_mut(&mut self.image, &path, Rgba([r, g, b, 255]));
    }

    pub fn fade(&mut self) {
        self.overlay_white(self.fade_alpha);
    }

    /// Blend a white overlay of `alpha` over every pixel. Rounds up so
    /// repeated passes always reach white.
    fn overlay_white(&mut self, alpha: u8) {
        let alpha = alpha as u32;
        if alpha == 0 {
            return;
        }
        for pixel in self.image.pixels_mut() {
            for c in pixel.0.iter_mut().take(3) {
                let gap = 255 - *c as u32;
                *c += ((gap * alpha + 254) / 255) as u8;
            }
        }
    }

    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = WHITE;
        }
    }

    /// Pick up edited style parameters. A size change starts a new blank canvas.
    pub fn set_style(&mut self, config: &CanvasConfig) {
        self.fade_alpha = config.fade_alpha;
        if let Some(seed) = config.brush.seed.filter(|s| Some(*s) != self.brush.seed) {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.brush = config.brush.clone();
        let (w, h) = (config.width.max(1), config.height.max(1));
        if (w, h) != self.image.dimensions() {
            info!("Canvas resized to {}x{}; cleared", w, h);
            self.image = RgbaImage::new(w, h);
            self.clear();
            if let Some((sw, sh)) = self.source_size.take() {
                self.fit_source(sw, sh);
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.image
            .save(path)
            .with_context(|| format!("Failed to save canvas to {}", path.display()))
    }

    #[cfg(test)]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}
