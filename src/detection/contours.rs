// src/detection/contours.rs
//
// Depth band-pass → binary mask → outer contours → RawDetection.

use crate::geometry::{bounding_region, polygon_area};
use crate::types::{Point, RawDetection, SourceConfig};
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use tracing::trace;

#[derive(Debug, Clone)]
pub struct BlobExtractor {
    min_depth: f32,
    max_depth: f32,
    min_area: f32,
    max_area: f32,
}

impl BlobExtractor {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            min_depth: config.min_depth,
            max_depth: config.max_depth,
            min_area: config.min_contour_area,
            max_area: config.max_contour_area,
        }
    }

    /// Foreground = normalised pixel value within the depth band.
    /// Zero is "no reading" and never foreground.
    pub fn mask(&self, image: &GrayImage) -> GrayImage {
        let lo = (self.min_depth * 255.0).round() as u8;
        let hi = (self.max_depth * 255.0).round() as u8;
        GrayImage::from_fn(image.width(), image.height(), |x, y| {
            let v = image.get_pixel(x, y)[0];
            if v >= lo && v <= hi && v > 0 {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }

    pub fn extract(&self, image: &GrayImage) -> Vec<RawDetection> {
        let mask = self.mask(image);
        let contours = find_contours::<i32>(&mask);

        let mut blobs = Vec::new();
        for contour in contours {
            if contour.border_type != BorderType::Outer || contour.points.is_empty() {
                continue;
            }
            let outline: Vec<Point> = contour
                .points
                .iter()
                .map(|p| Point::new(p.x as f32, p.y as f32))
                .collect();

            let area = polygon_area(&outline);
            if area < self.min_area || area > self.max_area {
                trace!("Dropping contour: area {:.1} outside bounds", area);
                continue;
            }

            blobs.push(RawDetection {
                bounds: bounding_region(&outline),
                outline,
            });
        }
        blobs
    }
}
