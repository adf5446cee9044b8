use serde::{Deserialize, Serialize};
use xr_core::Point2f;

/// Shoelace area of the implicitly closed polygon. Positive when the interior
/// lies on the right of each edge in the y-down frame, which is how traced
/// contours are oriented.
pub fn signed_area(points: &[Point2f]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            f64::from(a.x) * f64::from(b.y) - f64::from(b.x) * f64::from(a.y)
        })
        .sum();
    (twice * 0.5) as f32
}

/// Length of the closed polyline, including the closing segment.
pub fn perimeter(points: &[Point2f]) -> f32 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| f64::from(points[i].distance(points[(i + 1) % n])))
        .sum::<f64>() as f32
}

/// Area-weighted centroid. Falls back to the vertex mean for zero-area
/// polygons.
pub fn centroid(points: &[Point2f]) -> Point2f {
    let n = points.len();
    if n == 0 {
        return Point2f::default();
    }

    let mut twice_area = 0.0f64;
    let mut cx = 0.0f64;
    let mut cy = 0.0f64;
    for i in 0..n {
        let (ax, ay) = (f64::from(points[i].x), f64::from(points[i].y));
        let b = points[(i + 1) % n];
        let (bx, by) = (f64::from(b.x), f64::from(b.y));
        let cross = ax * by - bx * ay;
        twice_area += cross;
        cx += (ax + bx) * cross;
        cy += (ay + by) * cross;
    }

    if twice_area.abs() < 1e-12 {
        let (sx, sy) = points.iter().fold((0.0f64, 0.0f64), |(sx, sy), p| {
            (sx + f64::from(p.x), sy + f64::from(p.y))
        });
        return Point2f::new((sx / n as f64) as f32, (sy / n as f64) as f32);
    }

    let k = 1.0 / (3.0 * twice_area);
    Point2f::new((cx * k) as f32, (cy * k) as f32)
}

/// Scalar summary of one closed contour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Descriptors {
    pub area: f32,
    pub perimeter: f32,
    pub centroid: Point2f,
    /// Radius of the disk with the same area.
    pub effective_radius: f32,
    /// Pixels in the traced component; holes are not counted.
    pub pixel_count: usize,
}

impl Descriptors {
    pub fn of(points: &[Point2f], pixel_count: usize) -> Self {
        let area = signed_area(points);
        Self {
            area,
            perimeter: perimeter(points),
            centroid: centroid(points),
            effective_radius: (area.max(0.0) / std::f32::consts::PI).sqrt(),
            pixel_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use xr_core::Point2f;

    use super::{Descriptors, centroid, perimeter, signed_area};

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<Point2f> {
        vec![
            Point2f::new(x0, y0),
            Point2f::new(x1, y0),
            Point2f::new(x1, y1),
            Point2f::new(x0, y1),
        ]
    }

    #[test]
    fn rectangle_descriptors() {
        let r = rect(2.0, 1.0, 6.0, 3.0);
        assert_relative_eq!(signed_area(&r), 8.0);
        assert_relative_eq!(perimeter(&r), 12.0);
        let c = centroid(&r);
        assert_relative_eq!(c.x, 4.0);
        assert_relative_eq!(c.y, 2.0);

        let d = Descriptors::of(&r, 8);
        assert_relative_eq!(d.effective_radius, (8.0 / std::f32::consts::PI).sqrt());
    }

    #[test]
    fn reversed_winding_flips_sign() {
        let mut r = rect(0.0, 0.0, 3.0, 3.0);
        r.reverse();
        assert_relative_eq!(signed_area(&r), -9.0);
    }

    #[test]
    fn centroid_of_non_convex_polygon_is_area_weighted() {
        // L-shape: 2x1 bar on top of a 1x1 foot at the left.
        let l = vec![
            Point2f::new(0.0, 0.0),
            Point2f::new(2.0, 0.0),
            Point2f::new(2.0, 1.0),
            Point2f::new(1.0, 1.0),
            Point2f::new(1.0, 2.0),
            Point2f::new(0.0, 2.0),
        ];
        let c = centroid(&l);
        // (2 * (1, 0.5) + 1 * (0.5, 1.5)) / 3
        assert_relative_eq!(c.x, 2.5 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(c.y, 2.5 / 3.0, epsilon = 1e-6);
    }
}
