use serde::{Deserialize, Serialize};
use xr_core::{Error, Footprint, Image, Result};
use xr_filter::scharr_magnitude;

/// Topographic surface the watershed floods.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ElevationSource {
    /// Raw intensity. With `invert`, `max - v`, so bright regions become basins.
    Intensity {
        #[serde(default)]
        invert: bool,
    },
    /// Scharr gradient magnitude.
    #[default]
    Gradient,
    /// Disk dilation minus erosion.
    MorphologicalGradient { radius: usize },
}

impl ElevationSource {
    pub fn validate(&self) -> Result<()> {
        if let Self::MorphologicalGradient { radius: 0 } = self {
            return Err(Error::invalid("elevation.radius", "must be > 0"));
        }
        Ok(())
    }
}

pub fn elevation(image: &Image<f32>, source: &ElevationSource) -> Result<Image<f32>> {
    source.validate()?;
    Ok(match *source {
        ElevationSource::Intensity { invert: false } => image.clone(),
        ElevationSource::Intensity { invert: true } => {
            let max = image.min_max().map_or(0.0, |(_, hi)| hi);
            image.map(|&v| max - v)
        }
        ElevationSource::Gradient => scharr_magnitude(image),
        ElevationSource::MorphologicalGradient { radius } => {
            xr_morph::morphological_gradient(image, &Footprint::disk(radius)?)
        }
    })
}
