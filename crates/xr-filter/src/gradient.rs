//! 3x3 Scharr gradients.
//!
//! Borders are clamped (edge pixels repeat), so a flat region touching the
//! image edge has zero gradient. Responses are divided by 32, which makes a
//! unit intensity step read as ~1.

use xr_core::{BorderMode, Image, map_index};

const SCHARR_NORM: f32 = 1.0 / 32.0;

/// Per-pixel `(gx, gy)` images.
pub fn scharr_gradients(src: &Image<f32>) -> (Image<f32>, Image<f32>) {
    let (w, h) = src.dims();
    let mut gx = Image::new_fill(w, h, 0.0f32);
    let mut gy = Image::new_fill(w, h, 0.0f32);
    let s = src.data();

    let at = |i: usize, d: isize, len: usize| map_index(i as isize + d, len, BorderMode::Clamp);

    for y in 0..h {
        let ym1 = at(y, -1, h);
        let yp1 = at(y, 1, h);
        for x in 0..w {
            let xm1 = at(x, -1, w);
            let xp1 = at(x, 1, w);

            let p00 = s[ym1 * w + xm1];
            let p01 = s[ym1 * w + x];
            let p02 = s[ym1 * w + xp1];
            let p10 = s[y * w + xm1];
            let p12 = s[y * w + xp1];
            let p20 = s[yp1 * w + xm1];
            let p21 = s[yp1 * w + x];
            let p22 = s[yp1 * w + xp1];

            let gxx = (3.0 * p02 + 10.0 * p12 + 3.0 * p22) - (3.0 * p00 + 10.0 * p10 + 3.0 * p20);
            let gyy = (3.0 * p20 + 10.0 * p21 + 3.0 * p22) - (3.0 * p00 + 10.0 * p01 + 3.0 * p02);

            let idx = y * w + x;
            gx.data_mut()[idx] = gxx * SCHARR_NORM;
            gy.data_mut()[idx] = gyy * SCHARR_NORM;
        }
    }

    (gx, gy)
}

pub fn scharr_magnitude(src: &Image<f32>) -> Image<f32> {
    let (gx, gy) = scharr_gradients(src);
    let data = gx
        .data()
        .iter()
        .zip(gy.data())
        .map(|(&a, &b)| (a * a + b * b).sqrt())
        .collect();
    Image::from_vec(src.width(), src.height(), data).expect("gradient keeps source dimensions")
}
