//! Crack-following boundary tracer.
//!
//! Pixel `(x, y)` covers the unit square `[x, x + 1] x [y, y + 1]`; contours
//! run along pixel edges through integer vertices. Tracing starts at the
//! top-left corner of a component's first row-major pixel heading +x and keeps
//! the interior on the right in the y-down frame. At every vertex the walk
//! turns right if the pixel ahead-right is outside, turns left if both
//! pixels ahead are inside, and goes straight otherwise. Preferring the right
//! turn keeps diagonal-only neighbours out of the boundary (4-connectivity).
//!
//! The result is the outer boundary only; holes are not traced.

use std::collections::HashMap;

use xr_core::Point2f;
use xr_segment::{Connectivity, LabelMap};

/// Outer boundary of one 4-connected component of a label.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedComponent {
    pub label: u32,
    /// Index among the label's components, by first pixel in row-major order.
    pub component: usize,
    pub pixel_count: usize,
    /// Every unit vertex on the boundary, implicitly closed.
    pub boundary: Vec<Point2f>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Heading {
    E,
    S,
    W,
    N,
}

impl Heading {
    fn right(self) -> Self {
        match self {
            Self::E => Self::S,
            Self::S => Self::W,
            Self::W => Self::N,
            Self::N => Self::E,
        }
    }

    fn left(self) -> Self {
        match self {
            Self::E => Self::N,
            Self::S => Self::E,
            Self::W => Self::S,
            Self::N => Self::W,
        }
    }

    fn step(self) -> (isize, isize) {
        match self {
            Self::E => (1, 0),
            Self::S => (0, 1),
            Self::W => (-1, 0),
            Self::N => (0, -1),
        }
    }

    /// Pixels `(ahead_right, ahead_left)` seen from vertex `(vx, vy)`.
    fn ahead(self, vx: isize, vy: isize) -> ((isize, isize), (isize, isize)) {
        match self {
            Self::E => ((vx, vy), (vx, vy - 1)),
            Self::S => ((vx - 1, vy), (vx, vy)),
            Self::W => ((vx - 1, vy - 1), (vx - 1, vy)),
            Self::N => ((vx, vy - 1), (vx - 1, vy - 1)),
        }
    }
}

/// Traces every 4-connected component of every non-zero label.
///
/// Output is ordered by the components' first pixels in row-major order.
pub fn trace_components(labels: &LabelMap) -> Vec<TracedComponent> {
    let (w, _) = labels.dims();
    let mut per_label = HashMap::<u32, usize>::new();

    labels
        .components(Connectivity::C4)
        .into_iter()
        .map(|(label, pixels)| {
            let counter = per_label.entry(label).or_insert(0);
            let component = *counter;
            *counter += 1;

            let first = pixels[0];
            let boundary = trace_boundary(labels, label, (first % w, first / w));
            TracedComponent {
                label,
                component,
                pixel_count: pixels.len(),
                boundary,
            }
        })
        .collect()
}

/// Boundary vertices of the component holding `start`, which must be the
/// component's first row-major pixel.
fn trace_boundary(labels: &LabelMap, label: u32, start: (usize, usize)) -> Vec<Point2f> {
    let inside = |(x, y): (isize, isize)| {
        x >= 0 && y >= 0 && labels.get(x as usize, y as usize) == Some(label)
    };

    let origin = (start.0 as isize, start.1 as isize);
    let mut v = origin;
    let mut heading = Heading::E;
    let mut out = Vec::new();

    loop {
        out.push(Point2f::new(v.0 as f32, v.1 as f32));
        let (dx, dy) = heading.step();
        v = (v.0 + dx, v.1 + dy);

        let (right, left) = heading.ahead(v.0, v.1);
        heading = if !inside(right) {
            heading.right()
        } else if inside(left) {
            heading.left()
        } else {
            heading
        };

        if v == origin && heading == Heading::E {
            break;
        }
    }

    out
}
