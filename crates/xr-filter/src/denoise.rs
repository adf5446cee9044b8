//! Intensity denoising ahead of background estimation and segmentation.
//!
//! Every method reads neighbours through reflect-101 padding and returns an
//! image of the input's exact dimensions.
//!
//! Range behaviour:
//! - `Median` only emits input values.
//! - `Gaussian` and `Box` are normalized linear filters.
//! - `Bilateral` weights are positive and normalized per pixel, so each output
//!   is a convex combination of inputs; the edge-preserving filter does not
//!   expand the range.
//! - The three weighted filters clamp their output to the input `[min, max]`
//!   so f32 round-off cannot leave that range.

use serde::{Deserialize, Serialize};
use tracing::debug;
use xr_core::{BorderMode, Error, Footprint, FootprintShape, Image, Result, reflect101};

use crate::conv1d::separable_filter;
use crate::kernels::{GaussianKernel1D, box_kernel};
use crate::median::median_filter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DenoiseMethod {
    None,
    Median {
        radius: usize,
        #[serde(default)]
        shape: FootprintShape,
    },
    Gaussian {
        sigma: f32,
    },
    Bilateral {
        radius: usize,
        sigma_spatial: f32,
        sigma_range: f32,
    },
    Box {
        size: usize,
    },
}

impl Default for DenoiseMethod {
    fn default() -> Self {
        Self::Median {
            radius: 5,
            shape: FootprintShape::Disk,
        }
    }
}

impl DenoiseMethod {
    /// Side length of the window this method samples.
    pub fn kernel_extent(&self) -> usize {
        match *self {
            Self::None => 1,
            Self::Median { radius, .. } | Self::Bilateral { radius, .. } => 2 * radius + 1,
            Self::Gaussian { sigma } => 2 * GaussianKernel1D::radius_for(sigma) + 1,
            Self::Box { size } => size,
        }
    }

    /// Checks the parameters that do not depend on the image.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::None => Ok(()),
            Self::Median { radius, .. } => positive_radius(radius),
            Self::Gaussian { sigma } => positive_finite("sigma", sigma),
            Self::Bilateral {
                radius,
                sigma_spatial,
                sigma_range,
            } => {
                positive_radius(radius)?;
                positive_finite("sigma_spatial", sigma_spatial)?;
                positive_finite("sigma_range", sigma_range)
            }
            Self::Box { size } => {
                if size == 0 {
                    return Err(Error::invalid("size", "box size must be > 0"));
                }
                Ok(())
            }
        }
    }
}

pub fn denoise(src: &Image<f32>, method: &DenoiseMethod) -> Result<Image<f32>> {
    method.validate()?;

    let extent = method.kernel_extent();
    if extent > src.width() || extent > src.height() {
        return Err(Error::invalid(
            "kernel",
            format!(
                "extent {extent} exceeds image {}x{}",
                src.width(),
                src.height()
            ),
        ));
    }

    debug!(?method, width = src.width(), height = src.height(), "denoise");

    let out = match *method {
        DenoiseMethod::None => src.clone(),
        DenoiseMethod::Median { radius, shape } => {
            median_filter(src, &Footprint::new(shape, radius)?)
        }
        DenoiseMethod::Gaussian { sigma } => clamp_to_input_range(src, gaussian_blur(src, sigma)?),
        DenoiseMethod::Bilateral {
            radius,
            sigma_spatial,
            sigma_range,
        } => clamp_to_input_range(src, bilateral(src, radius, sigma_spatial, sigma_range)),
        DenoiseMethod::Box { size } => {
            let (kernel, radius) = box_kernel(size)?;
            let out = separable_filter(src, &kernel, radius, BorderMode::Reflect101);
            clamp_to_input_range(src, out)
        }
    };

    Ok(out)
}

/// Separable Gaussian with reflect-101 borders and no limit on kernel size.
pub fn gaussian_blur(src: &Image<f32>, sigma: f32) -> Result<Image<f32>> {
    let k = GaussianKernel1D::new(sigma)?;
    Ok(separable_filter(
        src,
        &k.weights,
        k.radius,
        BorderMode::Reflect101,
    ))
}

fn bilateral(src: &Image<f32>, radius: usize, sigma_spatial: f32, sigma_range: f32) -> Image<f32> {
    let (w, h) = src.dims();
    let r = radius as isize;
    let inv_2ss = 1.0 / (2.0 * sigma_spatial * sigma_spatial);
    let inv_2sr = 1.0 / (2.0 * sigma_range * sigma_range);

    let spatial: Vec<f32> = (-r..=r)
        .flat_map(|dy| (-r..=r).map(move |dx| ((dx * dx + dy * dy) as f32 * -inv_2ss).exp()))
        .collect();

    Image::from_fn(w, h, |x, y| {
        let center = src.data()[y * w + x];
        let mut acc = 0.0f32;
        let mut norm = 0.0f32;
        let mut k = 0;
        for dy in -r..=r {
            let sy = reflect101(y as isize + dy, h);
            for dx in -r..=r {
                let sx = reflect101(x as isize + dx, w);
                let v = src.data()[sy * w + sx];
                let d = v - center;
                let weight = spatial[k] * (-(d * d) * inv_2sr).exp();
                acc += weight * v;
                norm += weight;
                k += 1;
            }
        }
        // The centre tap has weight 1, so `norm` never vanishes.
        acc / norm
    })
}

fn clamp_to_input_range(src: &Image<f32>, mut out: Image<f32>) -> Image<f32> {
    if let Some((lo, hi)) = src.min_max() {
        for v in out.data_mut() {
            *v = v.clamp(lo, hi);
        }
    }
    out
}

fn positive_radius(radius: usize) -> Result<()> {
    if radius == 0 {
        return Err(Error::invalid("radius", "kernel radius must be > 0"));
    }
    Ok(())
}

fn positive_finite(name: &'static str, v: f32) -> Result<()> {
    if !v.is_finite() || v <= 0.0 {
        return Err(Error::invalid(name, format!("must be finite and > 0, got {v}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use xr_core::{Error, FootprintShape, Image};

    use super::{DenoiseMethod, denoise};

    fn noisy_step(w: usize, h: usize) -> Image<f32> {
        Image::from_fn(w, h, |x, y| {
            let base = if x >= w / 2 { 200.0 } else { 50.0 };
            // Deterministic salt: a few isolated hot pixels.
            if (x * 7 + y * 13) % 29 == 0 { 255.0 } else { base }
        })
    }

    fn range(img: &Image<f32>) -> (f32, f32) {
        img.min_max().expect("non-empty")
    }

    #[test]
    fn every_method_preserves_dims_and_range() {
        let img = noisy_step(24, 16);
        let (lo, hi) = range(&img);
        let methods = [
            DenoiseMethod::None,
            DenoiseMethod::Median {
                radius: 2,
                shape: FootprintShape::Disk,
            },
            DenoiseMethod::Gaussian { sigma: 1.5 },
            DenoiseMethod::Bilateral {
                radius: 2,
                sigma_spatial: 1.5,
                sigma_range: 30.0,
            },
            DenoiseMethod::Box { size: 2 },
        ];

        for m in &methods {
            let out = denoise(&img, m).expect("valid parameters");
            assert_eq!(out.dims(), img.dims());
            let (olo, ohi) = range(&out);
            assert!(olo >= lo && ohi <= hi, "{m:?} left [{lo}, {hi}]");
        }
    }

    #[test]
    fn even_box_window_leans_forward() {
        let img = Image::from_fn(5, 2, |x, _| if x == 2 { 1.0f32 } else { 0.0 });
        let out = denoise(&img, &DenoiseMethod::Box { size: 2 }).expect("valid size");
        for y in 0..2 {
            let row: Vec<f32> = (0..5).map(|x| *out.get(x, y).expect("in bounds")).collect();
            assert_eq!(row, vec![0.0, 0.5, 0.5, 0.0, 0.0]);
        }
    }

    #[test]
    fn median_removes_isolated_hot_pixels() {
        let mut img = Image::new_fill(9, 9, 10.0f32);
        *img.get_mut(4, 4).expect("in bounds") = 1000.0;
        let out = denoise(
            &img,
            &DenoiseMethod::Median {
                radius: 1,
                shape: FootprintShape::Square,
            },
        )
        .expect("valid parameters");
        assert!(out.data().iter().all(|&v| v == 10.0));
    }

    #[test]
    fn bilateral_keeps_step_sharp() {
        let img = Image::from_fn(16, 8, |x, _| if x >= 8 { 200.0f32 } else { 50.0 });
        let out = denoise(
            &img,
            &DenoiseMethod::Bilateral {
                radius: 2,
                sigma_spatial: 2.0,
                sigma_range: 5.0,
            },
        )
        .expect("valid parameters");
        assert!((out.get(7, 4).expect("in bounds") - 50.0).abs() < 1e-3);
        assert!((out.get(8, 4).expect("in bounds") - 200.0).abs() < 1e-3);
    }

    #[test]
    fn rejects_bad_kernels() {
        let img = Image::new_fill(10, 6, 1.0f32);

        let zero = DenoiseMethod::Median {
            radius: 0,
            shape: FootprintShape::Disk,
        };
        assert!(matches!(
            denoise(&img, &zero),
            Err(Error::InvalidParameter { .. })
        ));

        // extent 7 > height 6
        let wide = DenoiseMethod::Box { size: 7 };
        assert!(matches!(
            denoise(&img, &wide),
            Err(Error::InvalidParameter { name: "kernel", .. })
        ));

        let nan = DenoiseMethod::Gaussian { sigma: f32::NAN };
        assert!(denoise(&img, &nan).is_err());
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let img = noisy_step(20, 12);
        let m = DenoiseMethod::Gaussian { sigma: 1.0 };
        let a = denoise(&img, &m).expect("valid parameters");
        let b = denoise(&img, &m).expect("valid parameters");
        assert_eq!(a, b);
    }
}
