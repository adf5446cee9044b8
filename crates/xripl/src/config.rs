use serde::{Deserialize, Serialize};
use xr_contour::ContourConfig;
use xr_core::Result;
use xr_filter::DenoiseMethod;
use xr_flatfield::FlatfieldConfig;
use xr_morph::ArtifactCleaning;
use xr_segment::{ElevationSource, ExtremaConfig, LowElevationConfig, WatershedConfig};

/// Where watershed markers come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum MarkerStrategy {
    /// Pixel seeds passed to [`Pipeline::run`](crate::Pipeline::run).
    Seeds,
    /// Local extrema of the corrected image.
    Extrema(ExtremaConfig),
    /// Basins of the elevation surface.
    LowElevation(LowElevationConfig),
}

impl Default for MarkerStrategy {
    fn default() -> Self {
        Self::LowElevation(LowElevationConfig::default())
    }
}

impl MarkerStrategy {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Seeds => Ok(()),
            Self::Extrema(cfg) => cfg.validate(),
            Self::LowElevation(cfg) => cfg.validate(),
        }
    }
}

/// Every option of one correction-segmentation-contouring run.
///
/// Missing fields deserialize to their defaults, so a config file only needs
/// to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub denoise: DenoiseMethod,
    /// Morphological open/close pass on the denoised image.
    pub artifact_cleaning: Option<ArtifactCleaning>,
    /// Divide the calibrated frame by its maximum before denoising.
    pub normalize_input: bool,
    pub flatfield: FlatfieldConfig,
    pub elevation_source: ElevationSource,
    pub markers: MarkerStrategy,
    /// Fewest markers a run accepts before flooding.
    pub min_markers: usize,
    pub watershed: WatershedConfig,
    pub contours: ContourConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            denoise: DenoiseMethod::default(),
            artifact_cleaning: None,
            normalize_input: false,
            flatfield: FlatfieldConfig::default(),
            elevation_source: ElevationSource::default(),
            markers: MarkerStrategy::default(),
            min_markers: 1,
            watershed: WatershedConfig::default(),
            contours: ContourConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.denoise.validate()?;
        if let Some(cleaning) = &self.artifact_cleaning {
            cleaning.validate()?;
        }
        self.flatfield.validate()?;
        self.elevation_source.validate()?;
        self.markers.validate()?;
        self.watershed.validate()?;
        self.contours.validate()
    }
}
