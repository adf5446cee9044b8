use xr_core::{Degeneracy, Point2f};

use crate::descriptors::centroid;

/// First reason `processed` is not an acceptable replacement for `raw`.
pub(crate) fn degeneracy(
    raw: &[Point2f],
    processed: &[Point2f],
    max_centroid_shift: f32,
) -> Option<Degeneracy> {
    if processed.len() < 3 {
        return Some(Degeneracy::TooFewPoints(processed.len()));
    }
    if self_intersects(processed) {
        return Some(Degeneracy::SelfIntersection);
    }
    let shift = centroid(raw).distance(centroid(processed));
    if shift > max_centroid_shift {
        return Some(Degeneracy::CentroidShift {
            shift,
            tolerance: max_centroid_shift,
        });
    }
    None
}

/// True when two non-adjacent edges of the closed polygon cross at a point
/// interior to both. Edges that only touch do not count.
pub(crate) fn self_intersects(points: &[Point2f]) -> bool {
    let n = points.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let (a, b) = (points[i], points[(i + 1) % n]);
        for j in i + 2..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (c, d) = (points[j], points[(j + 1) % n]);
            if segments_cross(a, b, c, d) {
                return true;
            }
        }
    }
    false
}

fn orient(a: Point2f, b: Point2f, c: Point2f) -> f32 {
    (b - a).cross(c - a)
}

fn segments_cross(a: Point2f, b: Point2f, c: Point2f, d: Point2f) -> bool {
    let d1 = orient(c, d, a);
    let d2 = orient(c, d, b);
    let d3 = orient(a, b, c);
    let d4 = orient(a, b, d);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

#[cfg(test)]
mod tests {
    use xr_core::{Degeneracy, Point2f};

    use super::{degeneracy, self_intersects};

    fn pts(coords: &[(f32, f32)]) -> Vec<Point2f> {
        coords.iter().map(|&(x, y)| Point2f::new(x, y)).collect()
    }

    #[test]
    fn bow_tie_crosses_square_does_not() {
        let square = pts(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        assert!(!self_intersects(&square));
        let bow_tie = pts(&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]);
        assert!(self_intersects(&bow_tie));
    }

    #[test]
    fn touching_at_a_vertex_is_not_a_crossing() {
        // Two squares sharing the corner (2, 2), walked as one outline.
        let touching = pts(&[
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (4.0, 2.0),
            (4.0, 4.0),
            (2.0, 4.0),
            (2.0, 2.0),
            (0.0, 2.0),
        ]);
        assert!(!self_intersects(&touching));
    }

    #[test]
    fn reports_first_failure() {
        let square = pts(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        assert_eq!(
            degeneracy(&square, &square[..2], 1.0),
            Some(Degeneracy::TooFewPoints(2))
        );
        let shifted = pts(&[(1.0, 0.0), (3.0, 0.0), (3.0, 2.0), (1.0, 2.0)]);
        assert!(matches!(
            degeneracy(&square, &shifted, 0.5),
            Some(Degeneracy::CentroidShift { .. })
        ));
        assert_eq!(degeneracy(&square, &shifted, 1.0), None);
    }
}
