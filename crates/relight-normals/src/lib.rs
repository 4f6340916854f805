//! Depth → surface normal reconstruction.
//!
//! Two separable Gaussian passes (the second over an 8-bit re-quantized copy
//! of the first), then a 3×3 Sobel gradient turned into unit normals.

pub mod blur;
pub mod gradient;
pub mod reconstruct;

pub use blur::{gaussian_blur, gaussian_kernel};
pub use gradient::sobel_gradient;
pub use reconstruct::{generate_normal_map, generate_normal_map_with, NormalOptions};
