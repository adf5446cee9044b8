//! Sliding-window median over a [`Footprint`].
//!
//! Pixel values are replaced by their rank among the distinct values of the
//! image, and the window is kept as a Fenwick tree of rank counts. Moving one
//! column right removes and adds one sample per footprint row, so the cost per
//! pixel grows with the footprint height, not its area.

use xr_core::{Footprint, Image, reflect101};

/// Rank-50% filter over `footprint`, reflect-101 borders.
///
/// Footprints always hold an odd number of samples, so the result is the
/// middle sample of the window and always an input value.
pub fn median_filter(src: &Image<f32>, footprint: &Footprint) -> Image<f32> {
    let (w, h) = src.dims();
    let mut out = Image::new_fill(w, h, 0.0f32);
    if w == 0 || h == 0 {
        return out;
    }

    let mut levels = src.data().to_vec();
    levels.sort_unstable_by(f32::total_cmp);
    levels.dedup_by(|a, b| a.total_cmp(b).is_eq());
    let ranks: Vec<usize> = src
        .data()
        .iter()
        .map(|v| {
            levels
                .binary_search_by(|l| l.total_cmp(v))
                .unwrap_or_else(|i| i)
        })
        .collect();

    let mid = footprint.len() / 2;
    let mut counts = RankCounts::new(levels.len());

    for y in 0..h {
        counts.clear();
        for (dx, dy) in footprint.offsets() {
            let sx = reflect101(dx, w);
            let sy = reflect101(y as isize + dy, h);
            counts.add(ranks[sy * w + sx], 1);
        }
        out.data_mut()[y * w] = levels[counts.kth(mid)];

        for x in 1..w {
            for &(dy, half) in footprint.runs() {
                let row = reflect101(y as isize + dy, h) * w;
                let half = half as isize;
                let leaving = reflect101(x as isize - 1 - half, w);
                let entering = reflect101(x as isize + half, w);
                counts.add(ranks[row + leaving], -1);
                counts.add(ranks[row + entering], 1);
            }
            out.data_mut()[y * w + x] = levels[counts.kth(mid)];
        }
    }

    out
}

/// Fenwick tree of sample counts indexed by rank.
struct RankCounts {
    tree: Vec<i32>,
    top: usize,
}

impl RankCounts {
    fn new(levels: usize) -> Self {
        let top = if levels == 0 {
            0
        } else {
            1 << (usize::BITS - 1 - levels.leading_zeros())
        };
        Self {
            tree: vec![0; levels + 1],
            top,
        }
    }

    fn clear(&mut self) {
        self.tree.fill(0);
    }

    fn add(&mut self, rank: usize, delta: i32) {
        let mut i = rank + 1;
        while i < self.tree.len() {
            self.tree[i] += delta;
            i += i & i.wrapping_neg();
        }
    }

    /// Rank of the `k`-th smallest sample, zero-based.
    fn kth(&self, k: usize) -> usize {
        let n = self.tree.len() - 1;
        let mut pos = 0;
        let mut rem = k as i32;
        let mut step = self.top;
        while step > 0 {
            let next = pos + step;
            if next <= n && self.tree[next] <= rem {
                pos = next;
                rem -= self.tree[next];
            }
            step >>= 1;
        }
        pos
    }
}
