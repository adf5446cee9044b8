//! Denoising filters and gradients for radiographs.
//!
//! Coordinates follow the `xr-core` convention: sample `(x, y)` lives at
//! `data[y * width + x]`.
//!
//! All neighbourhood filters read outside the image through reflect-101
//! padding. [`denoise`] rejects kernels larger than the image; the background
//! estimator calls [`gaussian_blur`] directly, which has no such limit.

pub mod contrast;
pub mod conv1d;
pub mod denoise;
pub mod gradient;
pub mod kernels;
pub mod median;

pub use contrast::{ClaheConfig, equalize_adapthist, equalize_hist};
pub use conv1d::{convolve_f32, separable_filter};
pub use denoise::{DenoiseMethod, denoise, gaussian_blur};
pub use gradient::{scharr_gradients, scharr_magnitude};
pub use kernels::{GaussianKernel1D, box_kernel};
pub use median::median_filter;
