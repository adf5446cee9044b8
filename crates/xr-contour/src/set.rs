use serde::{Deserialize, Serialize};
use xr_core::Point2f;

use crate::descriptors::Descriptors;

/// Unit basis of every point and descriptor in a [`ContourSet`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum Units {
    Pixels,
    /// Physical units per pixel edge.
    Physical { pitch: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContourKey {
    pub label: u32,
    pub component: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourEntry {
    pub key: ContourKey,
    /// Implicitly closed; the first point is not repeated.
    pub points: Vec<Point2f>,
    pub descriptors: Descriptors,
}

/// Contours keyed by `(label, component)`, sorted by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourSet {
    units: Units,
    entries: Vec<ContourEntry>,
}

impl ContourSet {
    pub fn new(units: Units, mut entries: Vec<ContourEntry>) -> Self {
        entries.sort_by_key(|e| e.key);
        Self { units, entries }
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContourEntry> {
        self.entries.iter()
    }

    pub fn get(&self, key: ContourKey) -> Option<&ContourEntry> {
        self.entries
            .binary_search_by_key(&key, |e| e.key)
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn for_label(&self, label: u32) -> impl Iterator<Item = &ContourEntry> {
        self.entries.iter().filter(move |e| e.key.label == label)
    }

    /// Up to `n` entries by perimeter descending, ties by key.
    pub fn longest(&self, n: usize) -> Vec<&ContourEntry> {
        self.top_by(n, |e| e.descriptors.perimeter)
    }

    /// Up to `n` entries by area descending, ties by key.
    pub fn largest(&self, n: usize) -> Vec<&ContourEntry> {
        self.top_by(n, |e| e.descriptors.area)
    }

    fn top_by(&self, n: usize, metric: impl Fn(&ContourEntry) -> f32) -> Vec<&ContourEntry> {
        let mut refs: Vec<&ContourEntry> = self.entries.iter().collect();
        refs.sort_by(|a, b| metric(b).total_cmp(&metric(a)).then(a.key.cmp(&b.key)));
        refs.truncate(n);
        refs
    }
}

impl<'a> IntoIterator for &'a ContourSet {
    type Item = &'a ContourEntry;
    type IntoIter = std::slice::Iter<'a, ContourEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
