//! One radiograph in, corrected images plus region contours out.
//!
//! Stage order:
//! 1. calibration offset removed, optionally divided by the frame maximum;
//! 2. denoise, then optional morphological artifact cleaning;
//! 3. pseudo-flatfield correction;
//! 4. elevation surface and markers;
//! 5. watershed, then contour extraction in the frame's pixel pitch.
//!
//! Every stage validates its own input and the first failure aborts the run.

use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info};
use xr_contour::{ContourSet, extract_contours};
use xr_core::{Error, Image, Radiograph, Result};
use xr_filter::denoise;
use xr_flatfield::{BackgroundField, ClipReport, flatfield};
use xr_morph::clean_artifacts;
use xr_segment::{
    LabelMap, MarkerSet, Seed, detect_extrema, elevation, markers_from_low_elevation, watershed,
};

use crate::config::{MarkerStrategy, PipelineConfig};

/// Everything a run produced, in stage order.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Calibrated, denoised (and cleaned) frame.
    pub denoised: Radiograph,
    pub corrected: Radiograph,
    pub background: BackgroundField,
    pub clip: ClipReport,
    pub elevation: Image<f32>,
    pub markers: MarkerSet,
    pub labels: LabelMap,
    pub contours: ContourSet,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Fails with `InvalidParameter` before any image is touched.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage on `frame`.
    ///
    /// `seeds` is required by [`MarkerStrategy::Seeds`] and ignored otherwise.
    pub fn run(&self, frame: &Radiograph, seeds: Option<&[Seed]>) -> Result<PipelineOutput> {
        let t0 = Instant::now();
        let cfg = &self.config;

        let calibrated = frame.with_image(frame.calibrated())?;
        let input = if cfg.normalize_input {
            calibrated.normalized_to_max()?
        } else {
            calibrated.into_image()
        };

        let mut smoothed = denoise(&input, &cfg.denoise)?;
        if let Some(cleaning) = &cfg.artifact_cleaning {
            smoothed = clean_artifacts(&smoothed, cleaning)?;
        }
        let denoised = frame.with_image(smoothed)?;

        let ff = flatfield(denoised.image(), &cfg.flatfield)?;
        let corrected = frame.with_image(ff.corrected)?;
        debug!(
            clipped = ff.clip.clipped(),
            clamped = ff.background.clamped_pixels(),
            "flatfield applied"
        );

        let surface = elevation(corrected.image(), &cfg.elevation_source)?;
        let markers = self.markers(corrected.image(), &surface, seeds)?;
        markers.require(cfg.min_markers)?;

        let labels = watershed(&surface, &markers, &cfg.watershed)?;
        let contours = extract_contours(&labels, &cfg.contours, frame.pixel_pitch())?;

        info!(
            width = frame.width(),
            height = frame.height(),
            markers = markers.len(),
            contours = contours.len(),
            elapsed_ms = t0.elapsed().as_secs_f64() * 1e3,
            "radiograph processed"
        );

        Ok(PipelineOutput {
            denoised,
            corrected,
            background: ff.background,
            clip: ff.clip,
            elevation: surface,
            markers,
            labels,
            contours,
        })
    }

    /// Runs independent frames, one result per frame in input order.
    ///
    /// With the `parallel` feature the frames are spread over the rayon pool.
    /// A failing frame does not stop the others.
    pub fn run_batch(
        &self,
        frames: &[Radiograph],
        seeds: Option<&[Seed]>,
    ) -> Vec<Result<PipelineOutput>> {
        #[cfg(feature = "parallel")]
        {
            frames
                .par_iter()
                .map(|frame| self.run(frame, seeds))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            frames.iter().map(|frame| self.run(frame, seeds)).collect()
        }
    }

    fn markers(
        &self,
        corrected: &Image<f32>,
        surface: &Image<f32>,
        seeds: Option<&[Seed]>,
    ) -> Result<MarkerSet> {
        match &self.config.markers {
            MarkerStrategy::Seeds => {
                let seeds = seeds.ok_or_else(|| {
                    Error::invalid("seeds", "marker strategy `seeds` needs seed pixels")
                })?;
                MarkerSet::from_seeds(corrected.width(), corrected.height(), seeds)
            }
            MarkerStrategy::Extrema(cfg) => detect_extrema(corrected, cfg),
            MarkerStrategy::LowElevation(cfg) => markers_from_low_elevation(surface, cfg),
        }
    }
}
