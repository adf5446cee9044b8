//! Marker-seeded priority-flood watershed.
//!
//! The queue pops the lowest elevation first; entries of equal elevation pop
//! in insertion order. Boundary placement depends on that order, so it is part
//! of the contract:
//! - all marker pixels are labelled before anything is queued;
//! - markers then queue their unlabelled neighbours in ascending id order,
//!   pixels in stored order, neighbours in [`Connectivity`] direction order;
//! - a popped entry labels its pixel only if it is still unlabelled, then
//!   queues that pixel's unlabelled neighbours under the same id.
//!
//! Pixels above `flood_max_elevation` are never queued and stay `0`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use xr_core::{Error, Image, Result, ensure_dims};

use crate::grid::{Connectivity, neighbor_index};
use crate::labels::LabelMap;
use crate::markers::MarkerSet;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatershedConfig {
    pub connectivity: Connectivity,
    /// Flood barrier: pixels with a higher elevation are left unassigned.
    pub flood_max_elevation: Option<f32>,
}

impl WatershedConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(max) = self.flood_max_elevation
            && max.is_nan()
        {
            return Err(Error::invalid("flood_max_elevation", "must not be NaN"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    elevation: f32,
    seq: u64,
    idx: usize,
    label: u32,
}

impl Ord for Entry {
    // Reversed: `BinaryHeap` is a max-heap.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .elevation
            .total_cmp(&self.elevation)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

struct Flood<'a> {
    elevation: &'a [f32],
    width: usize,
    height: usize,
    connectivity: Connectivity,
    max_elevation: Option<f32>,
    labels: Vec<u32>,
    heap: BinaryHeap<Entry>,
    seq: u64,
}

impl Flood<'_> {
    fn push_neighbors(&mut self, p: usize, label: u32) {
        for &dir in self.connectivity.dirs() {
            let Some(nb) = neighbor_index(p, dir, self.width, self.height) else {
                continue;
            };
            if self.labels[nb] != 0 {
                continue;
            }
            let e = self.elevation[nb];
            if self.max_elevation.is_some_and(|m| e.is_nan() || e > m) {
                continue;
            }
            self.heap.push(Entry {
                elevation: e,
                seq: self.seq,
                idx: nb,
                label,
            });
            self.seq += 1;
        }
    }
}

pub fn watershed(
    elevation: &Image<f32>,
    markers: &MarkerSet,
    cfg: &WatershedConfig,
) -> Result<LabelMap> {
    cfg.validate()?;
    ensure_dims(elevation.dims(), markers.dims())?;

    let (w, h) = elevation.dims();
    let mut flood = Flood {
        elevation: elevation.data(),
        width: w,
        height: h,
        connectivity: cfg.connectivity,
        max_elevation: cfg.flood_max_elevation,
        labels: vec![0; w * h],
        heap: BinaryHeap::new(),
        seq: 0,
    };

    for (id, pixels) in markers.iter() {
        for &(x, y) in pixels {
            flood.labels[y * w + x] = id;
        }
    }
    for (id, pixels) in markers.iter() {
        for &(x, y) in pixels {
            flood.push_neighbors(y * w + x, id);
        }
    }

    while let Some(entry) = flood.heap.pop() {
        if flood.labels[entry.idx] != 0 {
            continue;
        }
        flood.labels[entry.idx] = entry.label;
        flood.push_neighbors(entry.idx, entry.label);
    }

    let unassigned = flood.labels.iter().filter(|&&l| l == 0).count();
    debug!(
        markers = markers.len(),
        pushed = flood.seq,
        unassigned,
        "watershed flooded"
    );

    Ok(LabelMap::from_image(Image::from_vec(w, h, flood.labels)?))
}
