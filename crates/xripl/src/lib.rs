//! Umbrella crate for the `xripl` workspace.
//!
//! Re-exports the stage crates and adds [`Pipeline`], which chains them for
//! one radiograph or a batch of independent frames:
//!
//! - `xr-core`: grids, borders, footprints, [`Radiograph`], the shared [`Error`];
//! - `xr-filter`: denoising and gradients;
//! - `xr-morph`: grey and binary morphology;
//! - `xr-flatfield`: background estimation and flatfield correction;
//! - `xr-segment`: markers, elevation surfaces and the watershed;
//! - `xr-contour`: boundary tracing, smoothing, simplification, descriptors.

pub mod config;
pub mod pipeline;

pub use xr_contour::{
    ContourConfig, ContourEntry, ContourKey, ContourSet, Descriptors, Smoothing, Units,
    extract_contours, simplify_closed, trace_components,
};
pub use xr_core::{
    BorderMode, Degeneracy, Error, Footprint, FootprintShape, Image, ImageView, Point2f,
    Radiograph, Result, to_f32,
};
pub use xr_filter::{
    ClaheConfig, DenoiseMethod, denoise, equalize_adapthist, equalize_hist, gaussian_blur,
    scharr_magnitude,
};
pub use xr_flatfield::{
    BackgroundField, BackgroundMethod, ClipReport, CorrectionConfig, CorrectionMode,
    FlatfieldConfig, FlatfieldResult, IntensityRange, MorphOperation, correct,
    estimate_background, flatfield,
};
pub use xr_morph::{ArtifactCleaning, CleaningOrder, clean_artifacts};
pub use xr_segment::{
    Connectivity, ElevationSource, ExtremaConfig, ExtremumKind, LabelMap, LowElevationConfig,
    MarkerSet, Seed, WatershedConfig, detect_extrema, elevation, markers_from_low_elevation,
    watershed,
};

pub use config::{MarkerStrategy, PipelineConfig};
pub use pipeline::{Pipeline, PipelineOutput};
