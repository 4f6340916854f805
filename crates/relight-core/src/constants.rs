//! Single source of truth for constants shared by the CPU kernel and WGSL.
//! The renderer injects the kernel constants into the compose shader preamble.

/// Maximum number of concurrent lights held by the registry and the uniform array.
pub const MAX_LIGHTS: usize = 4;

/// Default relief exaggeration for normal reconstruction.
pub const DEFAULT_NORMAL_STRENGTH: f32 = 12.0;

/// Gaussian radius of the first depth smoothing pass (pixels).
pub const NORMAL_FIRST_BLUR_RADIUS: u32 = 6;

/// Gaussian radius of the second depth smoothing pass (pixels).
pub const NORMAL_SECOND_BLUR_RADIUS: u32 = 4;

/// Depth value treated as nearest to the camera. 1.0 is farthest.
pub const NEAR_DEPTH: f32 = 0.0;

/// Constant depth substituted when no depth texture is bound.
pub const FLAT_DEPTH: f32 = 0.5;

// -- SSAO --

/// Number of fixed SSAO sample directions.
pub const SSAO_SAMPLE_COUNT: usize = 8;

/// SSAO sample radius in output pixels.
pub const SSAO_RADIUS_PX: f32 = 4.0;

/// Depth difference below which a neighbor does not occlude.
pub const SSAO_BIAS: f32 = 0.002;

/// Depth difference at which a neighbor fully occludes.
pub const SSAO_RANGE: f32 = 0.05;

/// `ssao_strength` below this skips the SSAO loop entirely (ao = 1).
pub const SSAO_BYPASS_EPSILON: f32 = 1e-3;

/// Unit sample directions at 45° increments, +x first, counter-clockwise in image space.
pub const SSAO_DIRECTIONS: [[f32; 2]; SSAO_SAMPLE_COUNT] = [
    [1.0, 0.0],
    [std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2],
    [0.0, 1.0],
    [-std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2],
    [-1.0, 0.0],
    [-std::f32::consts::FRAC_1_SQRT_2, -std::f32::consts::FRAC_1_SQRT_2],
    [0.0, -1.0],
    [std::f32::consts::FRAC_1_SQRT_2, -std::f32::consts::FRAC_1_SQRT_2],
];

// -- Shading --

/// Lower edge of the diffuse terminator smoothstep (upper edge is 1.0).
pub const DIFFUSE_TERMINATOR_EDGE: f32 = -0.1;

/// Blinn-Phong exponent.
pub const SPECULAR_EXPONENT: f32 = 32.0;

/// Falloff: 1 / (1 + d² · FALLOFF_SCALE), d in aspect-corrected uv units.
pub const FALLOFF_SCALE: f32 = 3.0;

// -- Soft shadows --

/// Ray march steps per light per pixel.
pub const SHADOW_STEPS: u32 = 48;

/// Longest march toward a light, in aspect-corrected uv units.
pub const SHADOW_MAX_DISTANCE: f32 = 0.1;

/// Tap spacing of the 9-tap depth smoothing used while marching (output pixels).
pub const SHADOW_BLUR_RADIUS_PX: f32 = 3.0;

/// Depth difference the ray must exceed before a sample starts to block.
pub const SHADOW_BIAS: f32 = 0.005;

/// Blocking band width at `shadow_softness = 0`.
pub const SHADOW_BAND_MIN: f32 = 0.01;

/// Blocking band width at `shadow_softness = 1`.
pub const SHADOW_BAND_MAX: f32 = 0.15;

/// Sample weight: 1 / (1 + t · SHADOW_DISTANCE_WEIGHT).
pub const SHADOW_DISTANCE_WEIGHT: f32 = 4.0;

/// Upper edge of the final occlusion smoothstep at `shadow_softness = 0`.
pub const SHADOW_SHAPE_MIN: f32 = 0.3;

/// Compute workgroup edge length; must match `@workgroup_size` in compose.wgsl.
pub const WORKGROUP_SIZE: u32 = 8;
