//! Marker-seeded watershed segmentation of corrected radiographs.
//!
//! The flow is `elevation` -> markers -> [`watershed`] -> [`LabelMap`]:
//! - [`elevation()`] turns the corrected image into the surface to flood.
//! - Markers come from explicit seeds ([`MarkerSet::from_seeds`],
//!   [`MarkerSet::from_physical_seeds`], [`MarkerSet::from_regions`]) or from
//!   automatic detection ([`detect_extrema`], [`markers_from_low_elevation`]).
//! - [`watershed`] grows every marker over the surface with a stable
//!   first-in-first-out tie rule.
//!
//! Every traversal runs in row-major or fixed direction order; no result
//! depends on hash iteration.

mod grid;

pub mod elevation;
pub mod labels;
pub mod markers;
pub mod watershed;

pub use elevation::{ElevationSource, elevation};
pub use grid::{Connectivity, connected_components};
pub use labels::LabelMap;
pub use markers::{
    ExtremaConfig, ExtremumKind, LowElevationConfig, MarkerSet, Seed, detect_extrema,
    markers_from_low_elevation,
};
pub use watershed::{WatershedConfig, watershed};
