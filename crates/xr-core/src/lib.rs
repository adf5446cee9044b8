//! Foundational types for radiograph processing.
//!
//! ## Grids
//! [`Image`] is an owned row-major grid; [`ImageView`] borrows a possibly
//! strided buffer (stride counted in elements). All pipeline stages take and
//! return `Image<f32>` intensities or `Image<u32>` labels.
//!
//! ## Border Modes
//! Neighbourhood operations resolve out-of-image indices through
//! [`map_index`]. Reflect-101 mirrors around the edge pixel without repeating
//! it and keeps mirroring for kernels wider than the image.
//!
//! ## Coordinates
//! Pixel `(x, y)` covers the unit square `[x, x + 1] x [y, y + 1]` with `y`
//! pointing down. Contours are traced along these pixel edges.

mod border;
mod error;
mod footprint;
mod geom;
mod image;
mod radiograph;

pub use border::{BorderMode, map_index, reflect101};
pub use error::{Degeneracy, Error, Result};
pub use footprint::{Footprint, FootprintShape};
pub use geom::{Point2f, Vec2f};
pub use image::{Image, ImageView, ensure_dims, to_f32};
pub use radiograph::Radiograph;
