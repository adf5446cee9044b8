use serde::{Deserialize, Serialize};
use tracing::debug;
use xr_core::{Error, Footprint, FootprintShape, Image, Result};
use xr_filter::{gaussian_blur, median_filter};

/// Grey-level operation used by [`BackgroundMethod::Morphological`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MorphOperation {
    /// Removes bright features narrower than the footprint.
    #[default]
    Opening,
    /// Removes dark (absorbing) features narrower than the footprint.
    Closing,
}

/// How the smooth background is synthesized from the image itself.
///
/// Every strategy samples outside the image through reflect-101 padding, so a
/// kernel larger than the image keeps mirroring instead of reading zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum BackgroundMethod {
    /// Gaussian low-pass; `sigma` should be large next to the finest feature
    /// of interest.
    LowPass { sigma: f32 },
    /// Disk median followed by a Gaussian low-pass.
    MedianLowPass { median_radius: usize, sigma: f32 },
    /// Grey opening or closing with a footprint wider than the foreground.
    Morphological {
        radius: usize,
        #[serde(default)]
        shape: FootprintShape,
        #[serde(default)]
        operation: MorphOperation,
    },
}

impl Default for BackgroundMethod {
    fn default() -> Self {
        Self::LowPass { sigma: 50.0 }
    }
}

impl BackgroundMethod {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::LowPass { sigma } => positive_sigma(sigma),
            Self::MedianLowPass {
                median_radius,
                sigma,
            } => {
                if median_radius == 0 {
                    return Err(Error::invalid("median_radius", "must be > 0"));
                }
                positive_sigma(sigma)
            }
            Self::Morphological { radius, .. } => {
                if radius == 0 {
                    return Err(Error::invalid("radius", "structuring element radius must be > 0"));
                }
                Ok(())
            }
        }
    }
}

/// Estimated background, never negative.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundField {
    field: Image<f32>,
    clamped: usize,
}

impl BackgroundField {
    /// Wraps an externally estimated field, clamping negative values to zero.
    pub fn from_image(mut field: Image<f32>) -> Self {
        let mut clamped = 0;
        for v in field.data_mut() {
            if *v < 0.0 {
                *v = 0.0;
                clamped += 1;
            }
        }
        Self { field, clamped }
    }

    pub fn image(&self) -> &Image<f32> {
        &self.field
    }

    pub fn into_image(self) -> Image<f32> {
        self.field
    }

    pub fn dims(&self) -> (usize, usize) {
        self.field.dims()
    }

    /// Pixels that came out of the estimator below zero.
    pub fn clamped_pixels(&self) -> usize {
        self.clamped
    }
}

pub fn estimate_background(src: &Image<f32>, method: &BackgroundMethod) -> Result<BackgroundField> {
    method.validate()?;

    let raw = match *method {
        BackgroundMethod::LowPass { sigma } => gaussian_blur(src, sigma)?,
        BackgroundMethod::MedianLowPass {
            median_radius,
            sigma,
        } => {
            let fp = Footprint::disk(median_radius)?;
            gaussian_blur(&median_filter(src, &fp), sigma)?
        }
        BackgroundMethod::Morphological {
            radius,
            shape,
            operation,
        } => {
            let fp = Footprint::new(shape, radius)?;
            match operation {
                MorphOperation::Opening => xr_morph::open(src, &fp),
                MorphOperation::Closing => xr_morph::close(src, &fp),
            }
        }
    };

    let field = BackgroundField::from_image(raw);
    debug!(
        ?method,
        clamped = field.clamped_pixels(),
        "background estimated"
    );
    Ok(field)
}

fn positive_sigma(sigma: f32) -> Result<()> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(Error::invalid("sigma", format!("must be finite and > 0, got {sigma}")));
    }
    Ok(())
}
