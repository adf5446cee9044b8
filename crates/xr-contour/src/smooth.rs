use serde::{Deserialize, Serialize};
use xr_core::{Error, Point2f, Result};

/// Closed-contour smoothing applied before simplification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Smoothing {
    #[default]
    None,
    /// Circular moving average over an odd `window` of vertices.
    MovingAverage { window: usize },
    /// Uniform Catmull-Rom spline through every `decimation`-th vertex,
    /// sampled `samples_per_span` times per span.
    CatmullRom {
        decimation: usize,
        samples_per_span: usize,
    },
}

impl Smoothing {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::None => Ok(()),
            Self::MovingAverage { window } => {
                if window == 0 || window % 2 == 0 {
                    return Err(Error::invalid(
                        "smoothing.window",
                        format!("must be odd and > 0, got {window}"),
                    ));
                }
                Ok(())
            }
            Self::CatmullRom {
                decimation,
                samples_per_span,
            } => {
                if decimation == 0 {
                    return Err(Error::invalid("smoothing.decimation", "must be > 0"));
                }
                if samples_per_span == 0 {
                    return Err(Error::invalid("smoothing.samples_per_span", "must be > 0"));
                }
                Ok(())
            }
        }
    }
}

pub fn smooth(points: &[Point2f], method: &Smoothing) -> Result<Vec<Point2f>> {
    method.validate()?;
    Ok(match *method {
        Smoothing::None => points.to_vec(),
        Smoothing::MovingAverage { window } => moving_average(points, window),
        Smoothing::CatmullRom {
            decimation,
            samples_per_span,
        } => catmull_rom(points, decimation, samples_per_span),
    })
}

fn moving_average(points: &[Point2f], window: usize) -> Vec<Point2f> {
    let n = points.len();
    if n == 0 || window == 1 {
        return points.to_vec();
    }
    let half = (window / 2) as isize;
    let inv = 1.0 / window as f32;
    (0..n as isize)
        .map(|i| {
            let (sx, sy) = (-half..=half).fold((0.0f32, 0.0f32), |(sx, sy), k| {
                let p = points[(i + k).rem_euclid(n as isize) as usize];
                (sx + p.x, sy + p.y)
            });
            Point2f::new(sx * inv, sy * inv)
        })
        .collect()
}

fn catmull_rom(points: &[Point2f], decimation: usize, samples: usize) -> Vec<Point2f> {
    let ctrl: Vec<Point2f> = points.iter().copied().step_by(decimation).collect();
    let m = ctrl.len();
    if m < 3 {
        return ctrl;
    }

    let mut out = Vec::with_capacity(m * samples);
    for i in 0..m {
        let p0 = ctrl[(i + m - 1) % m];
        let p1 = ctrl[i];
        let p2 = ctrl[(i + 1) % m];
        let p3 = ctrl[(i + 2) % m];
        for s in 0..samples {
            let t = s as f32 / samples as f32;
            out.push(catmull_rom_point(p0, p1, p2, p3, t));
        }
    }
    out
}

fn catmull_rom_point(p0: Point2f, p1: Point2f, p2: Point2f, p3: Point2f, t: f32) -> Point2f {
    let t2 = t * t;
    let t3 = t2 * t;
    let blend = |a: f32, b: f32, c: f32, d: f32| {
        0.5 * (2.0 * b + (c - a) * t + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2
            + (3.0 * b - a - 3.0 * c + d) * t3)
    };
    Point2f::new(
        blend(p0.x, p1.x, p2.x, p3.x),
        blend(p0.y, p1.y, p2.y, p3.y),
    )
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use xr_core::Point2f;

    use super::{Smoothing, smooth};
    use crate::descriptors::{centroid, signed_area};

    fn octagon() -> Vec<Point2f> {
        (0..8)
            .map(|i| {
                let a = i as f32 * std::f32::consts::FRAC_PI_4;
                Point2f::new(10.0 + 4.0 * a.cos(), 10.0 + 4.0 * a.sin())
            })
            .collect()
    }

    #[test]
    fn none_is_identity_and_window_one_too() {
        let pts = octagon();
        assert_eq!(smooth(&pts, &Smoothing::None).expect("valid"), pts);
        let w1 = smooth(&pts, &Smoothing::MovingAverage { window: 1 }).expect("valid");
        assert_eq!(w1, pts);
    }

    #[test]
    fn moving_average_keeps_symmetric_centroid() {
        let pts = octagon();
        let out = smooth(&pts, &Smoothing::MovingAverage { window: 3 }).expect("valid");
        assert_eq!(out.len(), pts.len());
        let c = centroid(&out);
        assert_relative_eq!(c.x, 10.0, epsilon = 1e-4);
        assert_relative_eq!(c.y, 10.0, epsilon = 1e-4);
        assert!(signed_area(&out) < signed_area(&pts));
    }

    #[test]
    fn catmull_rom_interpolates_control_points() {
        let pts = octagon();
        let out = smooth(
            &pts,
            &Smoothing::CatmullRom {
                decimation: 2,
                samples_per_span: 5,
            },
        )
        .expect("valid");
        assert_eq!(out.len(), 4 * 5);
        for (k, ctrl) in pts.iter().step_by(2).enumerate() {
            assert_relative_eq!(out[k * 5].x, ctrl.x, epsilon = 1e-5);
            assert_relative_eq!(out[k * 5].y, ctrl.y, epsilon = 1e-5);
        }
    }

    #[test]
    fn rejects_even_or_zero_parameters() {
        let pts = octagon();
        for bad in [
            Smoothing::MovingAverage { window: 0 },
            Smoothing::MovingAverage { window: 4 },
            Smoothing::CatmullRom {
                decimation: 0,
                samples_per_span: 3,
            },
            Smoothing::CatmullRom {
                decimation: 1,
                samples_per_span: 0,
            },
        ] {
            assert!(smooth(&pts, &bad).is_err(), "{bad:?}");
        }
    }
}
