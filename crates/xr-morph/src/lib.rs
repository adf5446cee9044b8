//! Grey-level and binary morphology over disk or square footprints.
//!
//! Out-of-image samples come from reflect-101 padding, never from a constant,
//! so large structuring elements do not bias results near the edges.
//!
//! Binary helpers treat pixels as set when `> 0`; outputs are `0` or `255` in
//! `u8`.
//!
//! Every footprint row is a contiguous horizontal run, so each operation is
//! computed as one 1D sliding extreme per footprint row (van Herk/Gil-Werman,
//! O(1) per sample) folded across rows.

use serde::{Deserialize, Serialize};
use xr_core::{Error, Footprint, FootprintShape, Image, Result, reflect101};

pub fn erode(src: &Image<f32>, fp: &Footprint) -> Image<f32> {
    rank_extreme(src, fp, f32::min)
}

pub fn dilate(src: &Image<f32>, fp: &Footprint) -> Image<f32> {
    rank_extreme(src, fp, f32::max)
}

/// Erosion then dilation: removes bright structures the footprint cannot fit in.
pub fn open(src: &Image<f32>, fp: &Footprint) -> Image<f32> {
    dilate(&erode(src, fp), fp)
}

/// Dilation then erosion: fills dark structures the footprint cannot fit in.
pub fn close(src: &Image<f32>, fp: &Footprint) -> Image<f32> {
    erode(&dilate(src, fp), fp)
}

/// `dilate - erode`: local intensity spread, large on region boundaries.
pub fn morphological_gradient(src: &Image<f32>, fp: &Footprint) -> Image<f32> {
    let hi = dilate(src, fp);
    let lo = erode(src, fp);
    let data = hi.data().iter().zip(lo.data()).map(|(&a, &b)| a - b).collect();
    Image::from_vec(src.width(), src.height(), data).expect("same dimensions as source")
}

pub fn erode_binary_u8(src: &Image<u8>, fp: &Footprint) -> Image<u8> {
    rank_extreme(&binarize(src), fp, u8::min)
}

pub fn dilate_binary_u8(src: &Image<u8>, fp: &Footprint) -> Image<u8> {
    rank_extreme(&binarize(src), fp, u8::max)
}

pub fn open_binary_u8(src: &Image<u8>, fp: &Footprint) -> Image<u8> {
    let eroded = erode_binary_u8(src, fp);
    dilate_binary_u8(&eroded, fp)
}

pub fn close_binary_u8(src: &Image<u8>, fp: &Footprint) -> Image<u8> {
    let dilated = dilate_binary_u8(src, fp);
    erode_binary_u8(&dilated, fp)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningOrder {
    /// Opening then closing: bright streaks and hot pixels go first.
    #[default]
    OpenThenClose,
    /// Closing then opening, for inverted radiographs.
    CloseThenOpen,
}

/// Removes detector artifacts (streaks, hot and dead pixels) smaller than a
/// disk of `radius`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactCleaning {
    pub radius: usize,
    #[serde(default)]
    pub order: CleaningOrder,
}

impl ArtifactCleaning {
    pub fn validate(&self) -> Result<()> {
        if self.radius == 0 {
            return Err(Error::invalid("artifact_cleaning.radius", "must be > 0"));
        }
        Ok(())
    }
}

pub fn clean_artifacts(src: &Image<f32>, cfg: &ArtifactCleaning) -> Result<Image<f32>> {
    cfg.validate()?;
    let fp = Footprint::new(FootprintShape::Disk, cfg.radius)?;
    Ok(match cfg.order {
        CleaningOrder::OpenThenClose => close(&open(src, &fp), &fp),
        CleaningOrder::CloseThenOpen => open(&close(src, &fp), &fp),
    })
}

fn binarize(src: &Image<u8>) -> Image<u8> {
    src.map(|&v| if v > 0 { 255 } else { 0 })
}

fn rank_extreme<T: Copy>(src: &Image<T>, fp: &Footprint, op: impl Fn(T, T) -> T + Copy) -> Image<T> {
    let (w, h) = src.dims();
    if w == 0 || h == 0 {
        return Image::from_vec(w, h, Vec::new()).expect("empty images have no pixels");
    }

    let mut out: Vec<T> = Vec::with_capacity(w * h);
    let mut acc: Vec<T> = Vec::with_capacity(w);
    let mut padded: Vec<T> = Vec::new();
    let mut fwd: Vec<T> = Vec::new();
    let mut bwd: Vec<T> = Vec::new();
    let mut line: Vec<T> = Vec::with_capacity(w);

    for y in 0..h {
        acc.clear();
        for &(dy, half) in fp.runs() {
            let sy = reflect101(y as isize + dy, h);
            let row = src.row(sy);

            padded.clear();
            let hw = half as isize;
            padded.extend((-hw..w as isize + hw).map(|x| row[reflect101(x, w)]));

            line.clear();
            sliding_extreme(&padded, 2 * half + 1, w, op, &mut fwd, &mut bwd, &mut line);

            if acc.is_empty() {
                acc.extend_from_slice(&line);
            } else {
                for (a, &v) in acc.iter_mut().zip(&line) {
                    *a = op(*a, v);
                }
            }
        }
        out.extend_from_slice(&acc);
    }

    Image::from_vec(w, h, out).expect("one output per source pixel")
}

/// Extreme of every length-`k` window of `x`, for the first `count` windows.
fn sliding_extreme<T: Copy>(
    x: &[T],
    k: usize,
    count: usize,
    op: impl Fn(T, T) -> T,
    fwd: &mut Vec<T>,
    bwd: &mut Vec<T>,
    out: &mut Vec<T>,
) {
    let n = x.len();
    debug_assert!(count + k - 1 <= n);

    fwd.clear();
    for (i, &v) in x.iter().enumerate() {
        let next = if i % k == 0 { v } else { op(fwd[i - 1], v) };
        fwd.push(next);
    }

    bwd.clear();
    bwd.extend_from_slice(x);
    for i in (0..n).rev() {
        let block_end = i % k == k - 1 || i == n - 1;
        if !block_end {
            bwd[i] = op(bwd[i + 1], x[i]);
        }
    }

    out.extend((0..count).map(|j| op(bwd[j], fwd[j + k - 1])));
}

#[cfg(test)]
mod tests {
    use xr_core::{Footprint, Image};

    use crate::{
        ArtifactCleaning, CleaningOrder, clean_artifacts, close_binary_u8, dilate, erode,
        morphological_gradient, open, open_binary_u8,
    };

    fn brute_force(src: &Image<f32>, fp: &Footprint, take_min: bool) -> Image<f32> {
        let (w, h) = src.dims();
        Image::from_fn(w, h, |x, y| {
            let mut best = if take_min { f32::INFINITY } else { f32::NEG_INFINITY };
            for (dx, dy) in fp.offsets() {
                let sx = xr_core::reflect101(x as isize + dx, w);
                let sy = xr_core::reflect101(y as isize + dy, h);
                let v = src.data()[sy * w + sx];
                best = if take_min { best.min(v) } else { best.max(v) };
            }
            best
        })
    }

    fn ramp_with_bumps(w: usize, h: usize) -> Image<f32> {
        Image::from_fn(w, h, |x, y| ((x * 31 + y * 17) % 23) as f32 + 0.5 * x as f32)
    }

    #[test]
    fn sliding_extreme_matches_brute_force() {
        let img = ramp_with_bumps(19, 13);
        for fp in [
            Footprint::disk(1).expect("valid"),
            Footprint::disk(3).expect("valid"),
            Footprint::square(2).expect("valid"),
        ] {
            assert_eq!(erode(&img, &fp), brute_force(&img, &fp, true));
            assert_eq!(dilate(&img, &fp), brute_force(&img, &fp, false));
        }
    }

    #[test]
    fn footprint_wider_than_image() {
        let img = ramp_with_bumps(4, 3);
        let fp = Footprint::disk(6).expect("valid");
        assert_eq!(erode(&img, &fp), brute_force(&img, &fp, true));
    }

    #[test]
    fn open_removes_small_bright_spot_and_keeps_flat_background() {
        let mut img = Image::new_fill(11, 11, 10.0f32);
        *img.get_mut(5, 5).expect("in bounds") = 90.0;
        let out = open(&img, &Footprint::disk(1).expect("valid"));
        assert!(out.data().iter().all(|&v| v == 10.0));
    }

    #[test]
    fn gradient_is_zero_on_flat_regions() {
        let img = Image::from_fn(12, 6, |x, _| if x < 6 { 1.0f32 } else { 5.0 });
        let g = morphological_gradient(&img, &Footprint::disk(1).expect("valid"));
        assert_eq!(*g.get(1, 3).expect("in bounds"), 0.0);
        assert_eq!(*g.get(5, 3).expect("in bounds"), 4.0);
        assert_eq!(*g.get(6, 3).expect("in bounds"), 4.0);
        assert_eq!(*g.get(10, 3).expect("in bounds"), 0.0);
    }

    #[test]
    fn binary_open_removes_speck_and_close_fills_hole() {
        let mut data = vec![0u8; 25];
        data[12] = 1;
        let img = Image::from_vec(5, 5, data).expect("valid image");
        let fp = Footprint::square(1).expect("valid");
        assert!(open_binary_u8(&img, &fp).data().iter().all(|&v| v == 0));

        let mut data = vec![255u8; 25];
        data[12] = 0;
        let img = Image::from_vec(5, 5, data).expect("valid image");
        assert_eq!(close_binary_u8(&img, &fp).data()[12], 255);
    }

    #[test]
    fn artifact_cleaning_removes_hot_and_dead_pixels() {
        let mut img = Image::new_fill(15, 15, 0.5f32);
        *img.get_mut(3, 3).expect("in bounds") = 1.0;
        *img.get_mut(10, 10).expect("in bounds") = 0.0;

        for order in [CleaningOrder::OpenThenClose, CleaningOrder::CloseThenOpen] {
            let out = clean_artifacts(&img, &ArtifactCleaning { radius: 1, order })
                .expect("valid radius");
            assert!(out.data().iter().all(|&v| v == 0.5), "{order:?}");
        }

        let bad = ArtifactCleaning {
            radius: 0,
            order: CleaningOrder::OpenThenClose,
        };
        assert!(clean_artifacts(&img, &bad).is_err());
    }
}
