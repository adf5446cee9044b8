//! Marker seeding for the watershed.
//!
//! A [`MarkerSet`] maps ids `1..` to the pixels that anchor one region. Ids
//! are assigned by each constructor in a documented order, and automatic
//! detection walks pixels row-major, so the same input always yields the same
//! set.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;
use xr_core::{Error, Footprint, Image, Radiograph, Result};

use crate::grid::{Connectivity, connected_components};

/// One externally supplied seed pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seed {
    pub x: usize,
    pub y: usize,
}

impl Seed {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSet {
    width: usize,
    height: usize,
    markers: BTreeMap<u32, Vec<(usize, usize)>>,
}

impl MarkerSet {
    /// One single-pixel marker per seed, ids `1..=n` in input order.
    pub fn from_seeds(width: usize, height: usize, seeds: &[Seed]) -> Result<Self> {
        let mut seen = HashSet::with_capacity(seeds.len());
        let mut markers = BTreeMap::new();
        for (i, s) in seeds.iter().enumerate() {
            if s.x >= width || s.y >= height {
                return Err(Error::invalid(
                    "seeds",
                    format!("seed ({}, {}) outside {width}x{height}", s.x, s.y),
                ));
            }
            if !seen.insert(*s) {
                return Err(Error::invalid(
                    "seeds",
                    format!("duplicate seed ({}, {})", s.x, s.y),
                ));
            }
            markers.insert(marker_id(i)?, vec![(s.x, s.y)]);
        }
        Ok(Self {
            width,
            height,
            markers,
        })
    }

    /// Seeds given in physical units, converted through the pixel pitch and
    /// rounded to the nearest pixel.
    pub fn from_physical_seeds(radiograph: &Radiograph, coords: &[(f32, f32)]) -> Result<Self> {
        let Some(pitch) = radiograph.pixel_pitch() else {
            return Err(Error::invalid(
                "pixel_pitch",
                "physical seeds need a radiograph with a pixel pitch",
            ));
        };

        let seeds = coords
            .iter()
            .map(|&(px, py)| {
                let x = (px / pitch).round();
                let y = (py / pitch).round();
                if !(x >= 0.0 && y >= 0.0) {
                    return Err(Error::invalid(
                        "seeds",
                        format!("physical seed ({px}, {py}) maps outside the image"),
                    ));
                }
                Ok(Seed::new(x as usize, y as usize))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_seeds(radiograph.width(), radiograph.height(), &seeds)
    }

    /// Explicit marker regions. Pixels of one region are kept in the given
    /// order.
    pub fn from_regions(
        width: usize,
        height: usize,
        regions: BTreeMap<u32, Vec<(usize, usize)>>,
    ) -> Result<Self> {
        let mut owner: HashSet<(usize, usize)> = HashSet::new();
        for (&id, pixels) in &regions {
            if id == 0 {
                return Err(Error::invalid("markers", "id 0 is reserved for unassigned pixels"));
            }
            if pixels.is_empty() {
                return Err(Error::invalid("markers", format!("marker {id} has no pixels")));
            }
            for &(x, y) in pixels {
                if x >= width || y >= height {
                    return Err(Error::invalid(
                        "markers",
                        format!("marker {id} pixel ({x}, {y}) outside {width}x{height}"),
                    ));
                }
                if !owner.insert((x, y)) {
                    return Err(Error::invalid(
                        "markers",
                        format!("pixel ({x}, {y}) claimed twice"),
                    ));
                }
            }
        }
        Ok(Self {
            width,
            height,
            markers: regions,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.markers.keys().copied()
    }

    pub fn pixels(&self, id: u32) -> Option<&[(usize, usize)]> {
        self.markers.get(&id).map(Vec::as_slice)
    }

    /// Markers in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[(usize, usize)])> + '_ {
        self.markers.iter().map(|(&id, px)| (id, px.as_slice()))
    }

    /// Fails with [`Error::InsufficientMarkers`] below `min` markers.
    pub fn require(&self, min: usize) -> Result<()> {
        if self.len() < min {
            return Err(Error::InsufficientMarkers {
                found: self.len(),
                required: min,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremumKind {
    #[default]
    Maxima,
    Minima,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtremaConfig {
    pub kind: ExtremumKind,
    /// Smallest Euclidean distance, in pixels, between two accepted seeds.
    pub min_separation: f32,
    /// Maxima below (minima above) this value are ignored.
    pub threshold: Option<f32>,
}

impl Default for ExtremaConfig {
    fn default() -> Self {
        Self {
            kind: ExtremumKind::Maxima,
            min_separation: 10.0,
            threshold: None,
        }
    }
}

impl ExtremaConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.min_separation.is_finite() || self.min_separation < 0.0 {
            return Err(Error::invalid(
                "min_separation",
                format!("must be finite and >= 0, got {}", self.min_separation),
            ));
        }
        if let Some(t) = self.threshold
            && !t.is_finite()
        {
            return Err(Error::invalid("threshold", "must be finite"));
        }
        Ok(())
    }
}

/// Single-pixel markers on 3x3 local extrema.
///
/// A pixel is a candidate when no in-bounds 8-neighbour is strictly more
/// extreme, so every pixel of a plateau qualifies. Candidates are visited from
/// most to least extreme, ties broken by row-major index, and a candidate
/// closer than `min_separation` to an accepted one is dropped. Ids follow
/// acceptance order.
pub fn detect_extrema(image: &Image<f32>, cfg: &ExtremaConfig) -> Result<MarkerSet> {
    cfg.validate()?;
    let (w, h) = image.dims();
    let data = image.data();

    // Flip minima into maxima so one comparison serves both.
    let sign = match cfg.kind {
        ExtremumKind::Maxima => 1.0f32,
        ExtremumKind::Minima => -1.0f32,
    };
    let threshold = cfg.threshold.map(|t| sign * t);

    let mut candidates = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let v = sign * data[y * w + x];
            if v.is_nan() || threshold.is_some_and(|t| v < t) {
                continue;
            }
            if is_local_max(data, w, h, x, y, v, sign) {
                candidates.push((v, y * w + x));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut grid = SeparationGrid::new(w, h, cfg.min_separation);
    let mut accepted: Vec<(usize, usize)> = Vec::new();
    for &(_, idx) in &candidates {
        let (x, y) = (idx % w, idx / w);
        if !grid.crowded(x, y) {
            grid.insert(x, y);
            accepted.push((x, y));
        }
    }

    debug!(
        candidates = candidates.len(),
        accepted = accepted.len(),
        "local extrema detected"
    );

    let seeds: Vec<Seed> = accepted.into_iter().map(|(x, y)| Seed::new(x, y)).collect();
    MarkerSet::from_seeds(w, h, &seeds)
}

/// Accepted seeds bucketed into square cells at least `min_separation`
/// wide, so a crowding check only visits the 3x3 cells around a pixel.
struct SeparationGrid {
    cell: usize,
    cols: usize,
    rows: usize,
    min_sep2: f32,
    buckets: Vec<Vec<(usize, usize)>>,
}

impl SeparationGrid {
    fn new(width: usize, height: usize, min_separation: f32) -> Self {
        let cell = (min_separation.ceil() as usize).max(1);
        let cols = width.div_ceil(cell).max(1);
        let rows = height.div_ceil(cell).max(1);
        Self {
            cell,
            cols,
            rows,
            min_sep2: min_separation * min_separation,
            buckets: vec![Vec::new(); cols * rows],
        }
    }

    fn crowded(&self, x: usize, y: usize) -> bool {
        let (cx, cy) = (x / self.cell, y / self.cell);
        for by in cy.saturating_sub(1)..=(cy + 1).min(self.rows - 1) {
            for bx in cx.saturating_sub(1)..=(cx + 1).min(self.cols - 1) {
                let near = self.buckets[by * self.cols + bx].iter().any(|&(ax, ay)| {
                    let dx = ax as f32 - x as f32;
                    let dy = ay as f32 - y as f32;
                    dx * dx + dy * dy < self.min_sep2
                });
                if near {
                    return true;
                }
            }
        }
        false
    }

    fn insert(&mut self, x: usize, y: usize) {
        let idx = (y / self.cell) * self.cols + x / self.cell;
        self.buckets[idx].push((x, y));
    }
}

fn is_local_max(data: &[f32], w: usize, h: usize, x: usize, y: usize, v: f32, sign: f32) -> bool {
    for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
        for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
            if sign * data[ny * w + nx] > v {
                return false;
            }
        }
    }
    true
}

/// Seeds from low-elevation basins: threshold, optional disk opening, then
/// 4-connected components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowElevationConfig {
    /// Pixels with elevation strictly below this join the mask.
    pub threshold: f32,
    /// Disk radius of the binary opening; `0` skips it.
    pub opening_radius: usize,
}

impl Default for LowElevationConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            opening_radius: 2,
        }
    }
}

impl LowElevationConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(Error::invalid("threshold", "must be finite"));
        }
        Ok(())
    }
}

/// One marker per 4-connected basin, ids in row-major order of each basin's
/// first pixel.
pub fn markers_from_low_elevation(
    elevation: &Image<f32>,
    cfg: &LowElevationConfig,
) -> Result<MarkerSet> {
    cfg.validate()?;
    let (w, h) = elevation.dims();

    let mut mask = elevation.map(|&e| if e < cfg.threshold { 255u8 } else { 0 });
    if cfg.opening_radius > 0 {
        mask = xr_morph::open_binary_u8(&mask, &Footprint::disk(cfg.opening_radius)?);
    }

    let components = connected_components(w, h, Connectivity::C4, |i| mask.data()[i] != 0);
    let mut regions = BTreeMap::new();
    for (i, comp) in components.iter().enumerate() {
        let pixels = comp.iter().map(|&p| (p % w, p / w)).collect();
        regions.insert(marker_id(i)?, pixels);
    }

    debug!(basins = regions.len(), "low-elevation markers");
    MarkerSet::from_regions(w, h, regions)
}

fn marker_id(index: usize) -> Result<u32> {
    u32::try_from(index + 1).map_err(|_| Error::invalid("markers", "more than u32::MAX markers"))
}
