//! Ramer-Douglas-Peucker simplification of closed contours.
//!
//! The contour is split at vertex 0 and the vertex farthest from it (first
//! maximum), and each half is simplified as an open chain. A vertex survives
//! only when its distance to the current chord is strictly greater than the
//! tolerance, so tolerance 0 removes exactly the collinear vertices. Running
//! the result through again with the same tolerance returns it unchanged.

use xr_core::{Point2f, Vec2f};

pub fn simplify_closed(points: &[Point2f], tolerance: f32) -> Vec<Point2f> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let origin = points[0];
    let mut far = 0;
    let mut far_d2 = 0.0f32;
    for (i, p) in points.iter().enumerate().skip(1) {
        let d = *p - origin;
        let d2 = d.dot(d);
        if d2 > far_d2 {
            far = i;
            far_d2 = d2;
        }
    }
    if far == 0 {
        return vec![origin];
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[far] = true;
    // Chain indices run past `n - 1`; index `n` is vertex 0 again.
    simplify_chain(points, 0, far, tolerance, &mut keep);
    simplify_chain(points, far, n, tolerance, &mut keep);

    points
        .iter()
        .zip(&keep)
        .filter_map(|(&p, &k)| k.then_some(p))
        .collect()
}

fn simplify_chain(points: &[Point2f], first: usize, last: usize, tolerance: f32, keep: &mut [bool]) {
    let n = points.len();
    let mut stack = vec![(first, last)];

    while let Some((a, b)) = stack.pop() {
        if b <= a + 1 {
            continue;
        }
        let pa = points[a % n];
        let pb = points[b % n];

        let mut best = a;
        let mut best_d = tolerance;
        for i in a + 1..b {
            let d = segment_distance(points[i % n], pa, pb);
            if d > best_d {
                best = i;
                best_d = d;
            }
        }

        if best != a {
            keep[best % n] = true;
            stack.push((best, b));
            stack.push((a, best));
        }
    }
}

fn segment_distance(p: Point2f, a: Point2f, b: Point2f) -> f32 {
    let ab: Vec2f = b - a;
    let ap: Vec2f = p - a;
    let len2 = ab.dot(ab);
    if len2 == 0.0 {
        return ap.norm();
    }
    let t = (ap.dot(ab) / len2).clamp(0.0, 1.0);
    let closest = a + Vec2f {
        x: ab.x * t,
        y: ab.y * t,
    };
    p.distance(closest)
}

#[cfg(test)]
mod tests {
    use xr_core::Point2f;

    use super::simplify_closed;

    fn square_outline(x0: f32, y0: f32, side: usize) -> Vec<Point2f> {
        let s = side as f32;
        let mut pts = Vec::new();
        for i in 0..side {
            pts.push(Point2f::new(x0 + i as f32, y0));
        }
        for i in 0..side {
            pts.push(Point2f::new(x0 + s, y0 + i as f32));
        }
        for i in 0..side {
            pts.push(Point2f::new(x0 + s - i as f32, y0 + s));
        }
        for i in 0..side {
            pts.push(Point2f::new(x0, y0 + s - i as f32));
        }
        pts
    }

    fn wobbly_ring() -> Vec<Point2f> {
        (0..40)
            .map(|i| {
                let a = i as f32 * std::f32::consts::TAU / 40.0;
                let r = 10.0 + if i % 3 == 0 { 0.6 } else { -0.2 } + (i % 7) as f32 * 0.15;
                Point2f::new(20.0 + r * a.cos(), 20.0 + r * a.sin())
            })
            .collect()
    }

    #[test]
    fn zero_tolerance_keeps_only_corners() {
        let pts = square_outline(3.0, 3.0, 4);
        assert_eq!(pts.len(), 16);
        let out = simplify_closed(&pts, 0.0);
        assert_eq!(
            out,
            vec![
                Point2f::new(3.0, 3.0),
                Point2f::new(7.0, 3.0),
                Point2f::new(7.0, 7.0),
                Point2f::new(3.0, 7.0),
            ]
        );
    }

    #[test]
    fn simplification_is_idempotent() {
        let ring = wobbly_ring();
        for tol in [0.0f32, 0.1, 0.5, 1.0, 3.0] {
            let once = simplify_closed(&ring, tol);
            let twice = simplify_closed(&once, tol);
            assert_eq!(once, twice, "tolerance {tol}");
            assert!(once.len() <= ring.len());
        }
    }

    #[test]
    fn large_tolerance_collapses_to_the_two_anchors() {
        let ring = wobbly_ring();
        let out = simplify_closed(&ring, 100.0);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], ring[0]);
    }

    #[test]
    fn coincident_points_collapse_to_one() {
        let p = Point2f::new(1.0, 1.0);
        assert_eq!(simplify_closed(&[p, p, p], 0.0), vec![p]);
    }
}
