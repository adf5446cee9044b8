//! Region boundaries from a watershed [`LabelMap`].
//!
//! [`extract_contours`] runs, per 4-connected component of every non-zero
//! label:
//! 1. crack-following trace of the outer boundary ([`trace_components`]),
//! 2. optional [`Smoothing`],
//! 3. closed Ramer-Douglas-Peucker simplification ([`simplify_closed`]),
//! 4. validity checks (at least 3 points, no proper self-intersection,
//!    bounded centroid shift), failing with
//!    [`Error::DegenerateContour`](xr_core::Error::DegenerateContour),
//! 5. descriptors, in physical units when a pixel pitch is given.
//!
//! Traced contours are pixel-edge aligned and have positive shoelace area:
//! in the y-down image frame the interior lies to the right of every edge.

mod checks;
pub mod descriptors;
pub mod set;
pub mod simplify;
pub mod smooth;
pub mod trace;

use serde::{Deserialize, Serialize};
use tracing::debug;
use xr_core::{Error, Result};
use xr_segment::LabelMap;

pub use descriptors::{Descriptors, centroid, perimeter, signed_area};
pub use set::{ContourEntry, ContourKey, ContourSet, Units};
pub use simplify::simplify_closed;
pub use smooth::{Smoothing, smooth};
pub use trace::{TracedComponent, trace_components};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    pub smoothing: Smoothing,
    /// RDP tolerance in pixels; `0` drops only collinear vertices.
    pub simplify_tolerance: f32,
    /// Largest centroid displacement, in pixels, that post-processing may cause.
    pub max_centroid_shift: f32,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            smoothing: Smoothing::None,
            simplify_tolerance: 0.0,
            max_centroid_shift: 1.0,
        }
    }
}

impl ContourConfig {
    pub fn validate(&self) -> Result<()> {
        self.smoothing.validate()?;
        non_negative("simplify_tolerance", self.simplify_tolerance)?;
        non_negative("max_centroid_shift", self.max_centroid_shift)
    }
}

fn non_negative(name: &'static str, v: f32) -> Result<()> {
    if v.is_nan() || v < 0.0 {
        return Err(Error::invalid(name, format!("must be >= 0, got {v}")));
    }
    Ok(())
}

pub fn extract_contours(
    labels: &LabelMap,
    cfg: &ContourConfig,
    pixel_pitch: Option<f32>,
) -> Result<ContourSet> {
    cfg.validate()?;
    let units = match pixel_pitch {
        None => Units::Pixels,
        Some(pitch) if pitch.is_finite() && pitch > 0.0 => Units::Physical { pitch },
        Some(pitch) => {
            return Err(Error::invalid(
                "pixel_pitch",
                format!("must be finite and > 0, got {pitch}"),
            ));
        }
    };

    let traced = trace_components(labels);
    let mut entries = Vec::with_capacity(traced.len());
    for t in traced {
        let smoothed = smooth(&t.boundary, &cfg.smoothing)?;
        let processed = simplify_closed(&smoothed, cfg.simplify_tolerance);
        if let Some(reason) = checks::degeneracy(&t.boundary, &processed, cfg.max_centroid_shift)
        {
            return Err(Error::DegenerateContour {
                label: t.label,
                component: t.component,
                reason,
            });
        }

        let points = match units {
            Units::Pixels => processed,
            Units::Physical { pitch } => processed.into_iter().map(|p| p.scaled(pitch)).collect(),
        };
        entries.push(ContourEntry {
            key: ContourKey {
                label: t.label,
                component: t.component,
            },
            descriptors: Descriptors::of(&points, t.pixel_count),
            points,
        });
    }

    debug!(contours = entries.len(), ?units, "contours extracted");
    Ok(ContourSet::new(units, entries))
}
