use xr_core::{Error, Result};

/// Normalized 1D Gaussian.
///
/// Conventions:
/// - `radius = ceil(3*sigma)`, minimum 1.
/// - `weights.len() == 2 * radius + 1` and `sum(weights) ~= 1`.
#[derive(Debug, Clone)]
pub struct GaussianKernel1D {
    pub sigma: f32,
    pub radius: usize,
    pub weights: Vec<f32>,
}

impl GaussianKernel1D {
    pub fn new(sigma: f32) -> Result<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(Error::invalid(
                "sigma",
                format!("must be finite and > 0, got {sigma}"),
            ));
        }

        let radius = Self::radius_for(sigma);
        let sigma2 = sigma * sigma;
        let mut weights: Vec<f32> = (0..2 * radius + 1)
            .map(|i| {
                let x = i as f32 - radius as f32;
                (-(x * x) / (2.0 * sigma2)).exp()
            })
            .collect();

        let sum: f32 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }

        Ok(Self {
            sigma,
            radius,
            weights,
        })
    }

    pub fn radius_for(sigma: f32) -> usize {
        ((3.0 * sigma).ceil() as usize).max(1)
    }
}

/// Uniform weights over `x - (size - 1)/2 ..= x + size/2`.
///
/// Returned as a centred kernel of radius `size / 2`; for even sizes the
/// left-most tap is zero, so the window leans forward by one sample.
pub fn box_kernel(size: usize) -> Result<(Vec<f32>, usize)> {
    if size == 0 {
        return Err(Error::invalid("size", "box size must be > 0"));
    }

    let radius = size / 2;
    let skip = 2 * radius + 1 - size;
    let w = 1.0 / size as f32;
    let kernel = (0..2 * radius + 1)
        .map(|k| if k >= skip { w } else { 0.0 })
        .collect();
    Ok((kernel, radius))
}
