// src/geometry.rs
//
// Outline helpers for the shape tracker and compositor.
// Outlines are closed polygons: the last vertex connects back to the first.

use crate::types::{BoundingRegion, Point};
use imageproc::point::Point as PixelPoint;

/// Resample a closed outline to exactly `count` vertices spaced evenly by
/// arclength, starting at the outline's first vertex.
///
/// Returns `None` for outlines with fewer than two points or `count == 0`.
/// An outline whose points all coincide yields `count` copies of that point.
pub fn resample_outline(points: &[Point], count: usize) -> Option<Vec<Point>> {
    if points.len() < 2 || count == 0 {
        return None;
    }

    // Cumulative length at the start of each closing segment
    let n = points.len();
    let mut cumulative = Vec::with_capacity(n + 1);
    cumulative.push(0.0f32);
    for i in 0..n {
        let next = &points[(i + 1) % n];
        let last = cumulative[i];
        cumulative.push(last + points[i].distance(next));
    }
    let perimeter = cumulative[n];

    if perimeter <= f32::EPSILON {
        return Some(vec![points[0]; count]);
    }

    let step = perimeter / count as f32;
    let mut resampled = Vec::with_capacity(count);
    let mut segment = 0usize;

    for k in 0..count {
        let target = step * k as f32;
        while segment + 1 < n && cumulative[segment + 1] <= target {
            segment += 1;
        }
        let seg_len = cumulative[segment + 1] - cumulative[segment];
        let a = &points[segment];
        let b = &points[(segment + 1) % n];
        if seg_len <= f32::EPSILON {
            resampled.push(*a);
        } else {
            let t = ((target - cumulative[segment]) / seg_len).clamp(0.0, 1.0);
            resampled.push(a.lerp(b, t));
        }
    }

    Some(resampled)
}

/// Per-vertex linear interpolation from `previous` toward `current`.
/// `None` when the two outlines differ in vertex count.
pub fn blend_outlines(previous: &[Point], current: &[Point], factor: f32) -> Option<Vec<Point>> {
    if previous.len() != current.len() {
        return None;
    }
    Some(
        previous
            .iter()
            .zip(current)
            .map(|(p, c)| p.lerp(c, factor))
            .collect(),
    )
}

/// L2 distance over all vertex coordinates. `None` on vertex count mismatch.
pub fn outline_distance(a: &[Point], b: &[Point]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let sum: f32 = a
        .iter()
        .zip(b)
        .map(|(p, q)| (p.x - q.x).powi(2) + (p.y - q.y).powi(2))
        .sum();
    Some(sum.sqrt())
}

/// Vertex mean. Origin for an empty outline.
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::default();
    }
    let (sx, sy) = points
        .iter()
        .fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x, sy + p.y));
    let n = points.len() as f32;
    Point::new(sx / n, sy / n)
}

/// Unsigned shoelace area.
pub fn polygon_area(points: &[Point]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let twice: f32 = (0..n)
        .map(|i| {
            let a = &points[i];
            let b = &points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    (twice * 0.5).abs()
}

pub fn bounding_region(points: &[Point]) -> BoundingRegion {
    if points.is_empty() {
        return BoundingRegion::default();
    }
    let min_x = points.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
    let max_x = points.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
    let min_y = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let max_y = points.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
    BoundingRegion {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    }
}

pub fn scale_about(points: &[Point], origin: Point, factor: f32) -> Vec<Point> {
    points
        .iter()
        .map(|p| {
            Point::new(
                origin.x + (p.x - origin.x) * factor,
                origin.y + (p.y - origin.y) * factor,
            )
        })
        .collect()
}

/// Round an outline to a pixel path suitable for polygon filling:
/// consecutive duplicates are collapsed and a trailing vertex equal to the
/// first is dropped (the fill closes the path itself).
///
/// Returns an empty path when fewer than three distinct vertices remain.
pub fn build_pixel_path(points: &[Point]) -> Vec<PixelPoint<i32>> {
    let mut path: Vec<PixelPoint<i32>> = Vec::with_capacity(points.len());
    for p in points {
        let px = PixelPoint::new(p.x.round() as i32, p.y.round() as i32);
        if path.last() != Some(&px) {
            path.push(px);
        }
    }
    while path.len() > 1 && path.first() == path.last() {
        path.pop();
    }
    if path.len() < 3 {
        path.clear();
    }
    path
}
