// src/debug.rs
//
// Contour debug view: every labelled blob's raw outline and bounding box,
// coloured by identity, on a black frame of the source size.

use crate::color::IdentityPalette;
use crate::types::{LabeledDetection, Point};
use anyhow::{Context, Result};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::path::Path;

pub fn render_overlay(
    frame: &GrayImage,
    detections: &[LabeledDetection],
    palette: &IdentityPalette,
) -> RgbImage {
    let mut overlay = RgbImage::new(frame.width(), frame.height());

    for labeled in detections {
        let color = Rgb(palette.color_for(labeled.label));
        let b = &labeled.detection.bounds;
        let rect = Rect::at(b.x.round() as i32, b.y.round() as i32).of_size(
            (b.width.round() as u32).max(1),
            (b.height.round() as u32).max(1),
        );
        draw_hollow_rect_mut(&mut overlay, rect, color);
        draw_outline(&mut overlay, &labeled.detection.outline, color);
    }

    overlay
}

fn draw_outline(image: &mut RgbImage, outline: &[Point], color: Rgb<u8>) {
    if outline.len() < 2 {
        return;
    }
    for (i, a) in outline.iter().enumerate() {
        let b = &outline[(i + 1) % outline.len()];
        draw_line_segment_mut(image, (a.x, a.y), (b.x, b.y), color);
    }
}

pub fn save_overlay(overlay: &RgbImage, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    overlay
        .save(path)
        .with_context(|| format!("Failed to save debug overlay to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingRegion, RawDetection};

    fn detection(label: u32) -> LabeledDetection {
        LabeledDetection {
            label,
            detection: RawDetection {
                bounds: BoundingRegion {
                    x: 10.0,
                    y: 10.0,
                    width: 20.0,
                    height: 10.0,
                },
                outline: vec![
                    Point::new(10.0, 10.0),
                    Point::new(30.0, 10.0),
                    Point::new(30.0, 20.0),
                    Point::new(10.0, 20.0),
                ],
            },
        }
    }

    #[test]
    fn test_overlay_draws_in_identity_color() {
        let palette = IdentityPalette::new([255, 0, 0], 5.0);
        let frame = GrayImage::new(64, 48);
        let overlay = render_overlay(&frame, &[detection(24)], &palette);

        assert_eq!(overlay.dimensions(), (64, 48));
        assert_eq!(*overlay.get_pixel(10, 10), Rgb([0, 255, 0]));
        assert_eq!(*overlay.get_pixel(20, 15), Rgb([0, 0, 0]));
        assert_eq!(*overlay.get_pixel(50, 40), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_empty_detections_give_black_frame() {
        let palette = IdentityPalette::new([255, 0, 0], 5.0);
        let overlay = render_overlay(&GrayImage::new(8, 8), &[], &palette);
        assert!(overlay.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
