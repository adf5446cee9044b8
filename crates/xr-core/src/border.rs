use serde::{Deserialize, Serialize};

/// Out-of-image index policy for neighbourhood operations.
///
/// Background estimation and denoising use [`BorderMode::Reflect101`]; zero
/// padding would pull estimates down near the image edges. Gradients use
/// [`BorderMode::Clamp`] so flat regions at the edge read as flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderMode {
    Clamp,
    Reflect101,
}

/// Maps a possibly out-of-range index onto `[0, len)`. `len` must be non-zero.
#[inline]
pub fn map_index(i: isize, len: usize, mode: BorderMode) -> usize {
    debug_assert!(len > 0, "map_index on an empty axis");
    if i >= 0 && (i as usize) < len {
        return i as usize;
    }

    match mode {
        BorderMode::Clamp => {
            if i < 0 {
                0
            } else {
                len - 1
            }
        }
        BorderMode::Reflect101 => reflect101(i, len),
    }
}

/// Mirror index without repeating the edge sample: `-1 -> 1`, `len -> len - 2`.
///
/// Indices far outside the axis keep mirroring, so kernels wider than the
/// image are well defined. `len` must be non-zero.
#[inline]
pub fn reflect101(i: isize, len: usize) -> usize {
    debug_assert!(len > 0, "reflect101 on an empty axis");
    if len == 1 {
        return 0;
    }

    let period = (2 * len - 2) as isize;
    let r = i.rem_euclid(period) as usize;
    if r < len { r } else { (2 * len - 2) - r }
}
