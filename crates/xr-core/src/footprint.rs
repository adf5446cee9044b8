use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FootprintShape {
    #[default]
    Disk,
    Square,
}

/// Neighbourhood offsets shared by rank filters and morphology.
///
/// A disk of radius `r` holds every `(dx, dy)` with `dx² + dy² <= r²`;
/// a square holds the full `(2r + 1)²` window. Offsets are stored row by row,
/// and each row is one contiguous horizontal run `[-half_width, half_width]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    radius: usize,
    /// `(dy, half_width)` per row, top to bottom.
    runs: Vec<(isize, usize)>,
}

impl Footprint {
    pub fn new(shape: FootprintShape, radius: usize) -> Result<Self> {
        if radius == 0 {
            return Err(Error::invalid("radius", "footprint radius must be > 0"));
        }

        let r = radius as isize;
        let runs = (-r..=r)
            .map(|dy| {
                let half = match shape {
                    FootprintShape::Square => radius,
                    FootprintShape::Disk => {
                        let rem = (r * r - dy * dy) as f64;
                        rem.sqrt().floor() as usize
                    }
                };
                (dy, half)
            })
            .collect();

        Ok(Self { radius, runs })
    }

    pub fn disk(radius: usize) -> Result<Self> {
        Self::new(FootprintShape::Disk, radius)
    }

    pub fn square(radius: usize) -> Result<Self> {
        Self::new(FootprintShape::Square, radius)
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Side length of the bounding window.
    pub fn extent(&self) -> usize {
        2 * self.radius + 1
    }

    pub fn runs(&self) -> &[(isize, usize)] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.iter().map(|&(_, half)| 2 * half + 1).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn offsets(&self) -> impl Iterator<Item = (isize, isize)> + '_ {
        self.runs.iter().flat_map(|&(dy, half)| {
            let h = half as isize;
            (-h..=h).map(move |dx| (dx, dy))
        })
    }
}
