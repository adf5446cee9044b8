//! Pseudo-flatfield correction: the background is synthesized from the image
//! itself, then divided or subtracted out.
//!
//! No physically captured flatfield is needed. The estimate is only as good as
//! the scale separation between background and foreground, so pick `sigma` or
//! the structuring-element radius well above the size of the features of
//! interest.

pub mod background;
pub mod correct;

use serde::{Deserialize, Serialize};
use xr_core::{Image, Result};

pub use background::{BackgroundField, BackgroundMethod, MorphOperation, estimate_background};
pub use correct::{
    ClipReport, CorrectionConfig, CorrectionMode, FlatfieldResult, IntensityRange, correct,
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatfieldConfig {
    pub background: BackgroundMethod,
    pub correction: CorrectionConfig,
}

impl FlatfieldConfig {
    pub fn validate(&self) -> Result<()> {
        self.background.validate()?;
        self.correction.validate()
    }
}

/// Estimates the background of `src` and corrects `src` with it.
pub fn flatfield(src: &Image<f32>, cfg: &FlatfieldConfig) -> Result<FlatfieldResult> {
    cfg.validate()?;
    let background = estimate_background(src, &cfg.background)?;
    correct(src, &background, &cfg.correction)
}
