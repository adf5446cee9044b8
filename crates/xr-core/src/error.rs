use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors shared by every stage of the radiograph pipeline.
///
/// Stages validate their inputs on entry and return the first violation they
/// find. Nothing is retried and nothing is replaced by a default.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("out of bounds")]
    OutOfBounds,

    #[error("invalid stride")]
    InvalidStride,

    #[error("background value {value} at ({x}, {y}) is below epsilon {epsilon}")]
    DivisionSingularity {
        x: usize,
        y: usize,
        value: f32,
        epsilon: f32,
    },

    #[error("found {found} foreground markers, {required} required")]
    InsufficientMarkers { found: usize, required: usize },

    #[error("degenerate contour for label {label} component {component}: {reason}")]
    DegenerateContour {
        label: u32,
        component: usize,
        reason: Degeneracy,
    },
}

impl Error {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Why a traced region could not be turned into a valid closed boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Degeneracy {
    TooFewPoints(usize),
    SelfIntersection,
    CentroidShift { shift: f32, tolerance: f32 },
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewPoints(n) => write!(f, "{n} boundary points, at least 3 required"),
            Self::SelfIntersection => write!(f, "post-processing introduced a self-intersection"),
            Self::CentroidShift { shift, tolerance } => {
                write!(f, "centroid moved by {shift}, tolerance {tolerance}")
            }
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
