use std::collections::BTreeMap;

use xr_core::{Error, Image, Result};

use crate::grid::{Connectivity, components_where};

/// Per-pixel marker ids produced by the watershed. `0` is unassigned.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    labels: Image<u32>,
}

impl LabelMap {
    pub fn from_image(labels: Image<u32>) -> Self {
        Self { labels }
    }

    pub fn image(&self) -> &Image<u32> {
        &self.labels
    }

    pub fn into_image(self) -> Image<u32> {
        self.labels
    }

    pub fn width(&self) -> usize {
        self.labels.width()
    }

    pub fn height(&self) -> usize {
        self.labels.height()
    }

    pub fn dims(&self) -> (usize, usize) {
        self.labels.dims()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        self.labels.get(x, y).copied()
    }

    /// Distinct non-zero labels, ascending.
    pub fn labels(&self) -> Vec<u32> {
        self.histogram().into_keys().filter(|&l| l != 0).collect()
    }

    pub fn area(&self, label: u32) -> usize {
        self.labels.data().iter().filter(|&&l| l == label).count()
    }

    /// `255` where the pixel carries `label`, `0` elsewhere.
    pub fn mask(&self, label: u32) -> Image<u8> {
        self.labels.map(|&l| if l == label { 255 } else { 0 })
    }

    /// Pixel count per label, including `0` when present.
    pub fn histogram(&self) -> BTreeMap<u32, usize> {
        let mut hist = BTreeMap::new();
        for &l in self.labels.data() {
            *hist.entry(l).or_insert(0) += 1;
        }
        hist
    }

    /// Relabels every pixel of `labels` as `into`.
    ///
    /// Merging into `0` is refused; use a mask instead to discard regions.
    pub fn merge(&self, labels: &[u32], into: u32) -> Result<Self> {
        if into == 0 {
            return Err(Error::invalid("into", "cannot merge into the unassigned label"));
        }
        let merged = self
            .labels
            .map(|&l| if l != 0 && labels.contains(&l) { into } else { l });
        Ok(Self { labels: merged })
    }

    /// Connected components of every non-zero label as `(label, pixels)`.
    ///
    /// Pixels join only when they share a label. Components are ordered by
    /// their first pixel in row-major order, and pixel lists are sorted
    /// row-major.
    pub fn components(&self, connectivity: Connectivity) -> Vec<(u32, Vec<usize>)> {
        let (w, h) = self.dims();
        let l = self.labels.data();
        components_where(w, h, connectivity, |i| l[i] != 0, |p, nb| l[nb] == l[p])
            .into_iter()
            .map(|comp| (l[comp[0]], comp))
            .collect()
    }

    /// Up to `n` non-zero labels, by area descending then id ascending.
    pub fn largest_labels(&self, n: usize) -> Vec<u32> {
        let mut by_area: Vec<(u32, usize)> = self
            .histogram()
            .into_iter()
            .filter(|&(l, _)| l != 0)
            .collect();
        by_area.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        by_area.into_iter().take(n).map(|(l, _)| l).collect()
    }
}
