//! Applies a [`BackgroundField`] to its source image.
//!
//! Divisive mode refuses any background value that is zero or below `epsilon`
//! and reports the first offender in row-major order. Clipping to the valid
//! range is never an error: it is counted in a [`ClipReport`] returned with
//! the corrected image. NaN results are counted apart and written as the
//! range minimum.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use xr_core::{Error, Image, Result};

use crate::background::BackgroundField;

/// Clip fraction above which correction is logged at `warn`.
const HEAVY_CLIP_FRACTION: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CorrectionMode {
    /// `image / background * normalization`
    Divisive { normalization: f32 },
    /// `image - background + offset`
    Subtractive { offset: f32 },
}

impl Default for CorrectionMode {
    fn default() -> Self {
        Self::Divisive { normalization: 1.0 }
    }
}

/// Closed interval corrected values are clipped to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityRange {
    pub min: f32,
    pub max: f32,
}

impl Default for IntensityRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: f32::MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    pub mode: CorrectionMode,
    /// Smallest background value divisive correction accepts. Zero is
    /// always refused, even when `epsilon` is `0.0`.
    pub epsilon: f32,
    pub valid_range: IntensityRange,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            mode: CorrectionMode::default(),
            epsilon: 1e-6,
            valid_range: IntensityRange::default(),
        }
    }
}

impl CorrectionConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(Error::invalid(
                "epsilon",
                format!("must be finite and >= 0, got {}", self.epsilon),
            ));
        }
        match self.mode {
            CorrectionMode::Divisive { normalization } if !normalization.is_finite() => {
                return Err(Error::invalid("normalization", "must be finite"));
            }
            CorrectionMode::Subtractive { offset } if !offset.is_finite() => {
                return Err(Error::invalid("offset", "must be finite"));
            }
            _ => {}
        }
        let IntensityRange { min, max } = self.valid_range;
        if min.is_nan() || max.is_nan() || min > max {
            return Err(Error::invalid(
                "valid_range",
                format!("expected min <= max, got [{min}, {max}]"),
            ));
        }
        Ok(())
    }
}

/// Pixels clipped while correcting one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClipReport {
    pub below: usize,
    pub above: usize,
    /// NaN results, from NaN source pixels.
    #[serde(default)]
    pub non_finite: usize,
    pub total: usize,
}

impl ClipReport {
    pub fn clipped(&self) -> usize {
        self.below + self.above + self.non_finite
    }

    /// Clipped share of all pixels, `0.0` for empty images.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.clipped() as f64 / self.total as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlatfieldResult {
    pub corrected: Image<f32>,
    pub background: BackgroundField,
    pub clip: ClipReport,
}

pub fn correct(
    src: &Image<f32>,
    background: &BackgroundField,
    cfg: &CorrectionConfig,
) -> Result<FlatfieldResult> {
    cfg.validate()?;
    src.ensure_same_dims(background.image())?;

    let (w, _) = src.dims();
    let bg = background.image().data();

    if matches!(cfg.mode, CorrectionMode::Divisive { .. })
        && let Some(idx) = bg.iter().position(|&b| b.is_nan() || b <= 0.0 || b < cfg.epsilon)
    {
        return Err(Error::DivisionSingularity {
            x: idx % w,
            y: idx / w,
            value: bg[idx],
            epsilon: cfg.epsilon,
        });
    }

    let IntensityRange { min, max } = cfg.valid_range;
    let mut clip = ClipReport {
        total: src.len(),
        ..ClipReport::default()
    };

    let data = src
        .data()
        .iter()
        .zip(bg)
        .map(|(&v, &b)| {
            let c = match cfg.mode {
                CorrectionMode::Divisive { normalization } => v / b * normalization,
                CorrectionMode::Subtractive { offset } => v - b + offset,
            };
            if c.is_nan() {
                clip.non_finite += 1;
                min
            } else if c < min {
                clip.below += 1;
                min
            } else if c > max {
                clip.above += 1;
                max
            } else {
                c
            }
        })
        .collect();
    let corrected = Image::from_vec(src.width(), src.height(), data)?;

    let fraction = clip.fraction();
    if fraction > HEAVY_CLIP_FRACTION {
        warn!(
            below = clip.below,
            above = clip.above,
            non_finite = clip.non_finite,
            fraction,
            "flatfield correction clipped a large share of pixels"
        );
    } else {
        debug!(below = clip.below, above = clip.above, fraction, "flatfield corrected");
    }

    Ok(FlatfieldResult {
        corrected,
        background: background.clone(),
        clip,
    })
}
