//! Histogram equalization for viewing radiographs.
//!
//! Both functions return intensities in `[0, 1]`. They are display aids and
//! are not part of the segmentation path. A constant image maps to `1.0`
//! everywhere: its single occupied bin holds the whole distribution.

use serde::{Deserialize, Serialize};
use tracing::debug;
use xr_core::{Error, Image, Result};

/// Global equalization: each pixel is replaced by the cumulative share of
/// pixels at or below its level, interpolated between bin centres over the
/// image's `[min, max]`.
pub fn equalize_hist(src: &Image<f32>, nbins: usize) -> Result<Image<f32>> {
    if nbins == 0 {
        return Err(Error::invalid("nbins", "must be > 0"));
    }
    let Some((lo, hi)) = src.min_max() else {
        return Ok(src.clone());
    };

    let scaled: Vec<f32> = src.data().iter().map(|&v| unit(v, lo, hi)).collect();
    let cdf = cumulative(&histogram(&scaled, nbins));

    let data = scaled.iter().map(|&u| interp_cdf(&cdf, u)).collect();
    Image::from_vec(src.width(), src.height(), data)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaheConfig {
    /// Tile `(width, height)` in pixels; edge tiles may be smaller.
    pub tile_size: (usize, usize),
    /// Bin height cap as a share of the tile's pixel count, in `(0, 1]`.
    pub clip_limit: f32,
    pub nbins: usize,
}

impl Default for ClaheConfig {
    fn default() -> Self {
        Self {
            tile_size: (256, 256),
            clip_limit: 0.03,
            nbins: 256,
        }
    }
}

impl ClaheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tile_size.0 == 0 || self.tile_size.1 == 0 {
            return Err(Error::invalid("tile_size", "tile sides must be > 0"));
        }
        if !self.clip_limit.is_finite() || self.clip_limit <= 0.0 || self.clip_limit > 1.0 {
            return Err(Error::invalid(
                "clip_limit",
                format!("must be in (0, 1], got {}", self.clip_limit),
            ));
        }
        if self.nbins == 0 {
            return Err(Error::invalid("nbins", "must be > 0"));
        }
        Ok(())
    }
}

/// Contrast-limited adaptive equalization.
///
/// Each tile gets its own clipped histogram; the clipped excess is spread
/// evenly over all bins. Pixels blend the mappings of the four nearest tile
/// centres bilinearly, so tile seams do not show.
pub fn equalize_adapthist(src: &Image<f32>, cfg: &ClaheConfig) -> Result<Image<f32>> {
    cfg.validate()?;
    let Some((lo, hi)) = src.min_max() else {
        return Ok(src.clone());
    };

    let (w, h) = src.dims();
    if hi <= lo {
        return Ok(Image::new_fill(w, h, 1.0));
    }
    let (tw, th) = cfg.tile_size;
    let (tiles_x, tiles_y) = (w.div_ceil(tw), h.div_ceil(th));
    let scaled: Vec<f32> = src.data().iter().map(|&v| unit(v, lo, hi)).collect();

    let mut luts = Vec::with_capacity(tiles_x * tiles_y);
    let mut tile = Vec::new();
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            tile.clear();
            for y in ty * th..((ty + 1) * th).min(h) {
                let row = &scaled[y * w..(y + 1) * w];
                tile.extend_from_slice(&row[tx * tw..((tx + 1) * tw).min(w)]);
            }
            let mut hist = histogram(&tile, cfg.nbins);
            clip_histogram(&mut hist, cfg.clip_limit * tile.len() as f32);
            luts.push(cumulative(&hist));
        }
    }
    debug!(tiles_x, tiles_y, nbins = cfg.nbins, "clahe tiles mapped");

    let nbins = cfg.nbins;
    Ok(Image::from_fn(w, h, |x, y| {
        let bin = bin_of(scaled[y * w + x], nbins);
        let (x0, x1, ax) = tile_blend(x, tw, tiles_x);
        let (y0, y1, ay) = tile_blend(y, th, tiles_y);
        let at = |tx: usize, ty: usize| luts[ty * tiles_x + tx][bin];
        let top = at(x0, y0) * (1.0 - ax) + at(x1, y0) * ax;
        let bottom = at(x0, y1) * (1.0 - ax) + at(x1, y1) * ax;
        top * (1.0 - ay) + bottom * ay
    }))
}

fn unit(v: f32, lo: f32, hi: f32) -> f32 {
    if hi > lo { (v - lo) / (hi - lo) } else { 0.0 }
}

fn bin_of(u: f32, nbins: usize) -> usize {
    ((u * nbins as f32) as usize).min(nbins - 1)
}

fn histogram(values: &[f32], nbins: usize) -> Vec<f32> {
    let mut hist = vec![0.0f32; nbins];
    for &u in values {
        hist[bin_of(u, nbins)] += 1.0;
    }
    hist
}

fn clip_histogram(hist: &mut [f32], limit: f32) {
    let limit = limit.max(1.0);
    let mut excess = 0.0f32;
    for c in hist.iter_mut() {
        if *c > limit {
            excess += *c - limit;
            *c = limit;
        }
    }
    let share = excess / hist.len() as f32;
    for c in hist.iter_mut() {
        *c += share;
    }
}

/// Normalized running sum; the last entry is `1.0` for a non-empty histogram.
fn cumulative(hist: &[f32]) -> Vec<f32> {
    let total: f32 = hist.iter().sum();
    let mut acc = 0.0f32;
    hist.iter()
        .map(|&c| {
            acc += c;
            if total > 0.0 { acc / total } else { 0.0 }
        })
        .collect()
}

/// Piecewise-linear CDF lookup between bin centres, flat past the end bins.
fn interp_cdf(cdf: &[f32], u: f32) -> f32 {
    let n = cdf.len();
    let pos = u * n as f32 - 0.5;
    if pos <= 0.0 {
        return cdf[0];
    }
    let i = pos as usize;
    if i + 1 >= n {
        return cdf[n - 1];
    }
    let t = pos - i as f32;
    cdf[i] * (1.0 - t) + cdf[i + 1] * t
}

/// Neighbouring tile indices along one axis and the weight of the second.
fn tile_blend(p: usize, size: usize, tiles: usize) -> (usize, usize, f32) {
    let f = ((p as f32 + 0.5) / size as f32 - 0.5).clamp(0.0, (tiles - 1) as f32);
    let i0 = f as usize;
    let i1 = (i0 + 1).min(tiles - 1);
    (i0, i1, f - i0 as f32)
}
