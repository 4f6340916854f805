//! Dithered soft-shadow ray march toward a light.
//!
//! The ray leaves the pixel at its own depth and rises toward `NEAR_DEPTH` as
//! it travels, `light_height` controlling how fast. A sample whose smoothed
//! depth is nearer than the ray blocks it. Steps are spaced quadratically
//! (dense near the pixel) and offset by a per-pixel hash so the fixed step
//! grid does not band. Closer samples carry more weight.

use glam::Vec2;
use relight_core::constants::{
    NEAR_DEPTH, SHADOW_BAND_MAX, SHADOW_BAND_MIN, SHADOW_BIAS, SHADOW_BLUR_RADIUS_PX,
    SHADOW_DISTANCE_WEIGHT, SHADOW_MAX_DISTANCE, SHADOW_SHAPE_MIN, SHADOW_STEPS,
};
use relight_core::math::{hash_to_float, mix, pixel_hash, smoothstep};

use crate::sampling::DepthSampler;

/// Inputs shared by every light for one pixel.
#[derive(Debug, Clone, Copy)]
pub struct ShadowContext {
    pub uv: Vec2,
    /// Integer pixel coordinate, seeds the dither.
    pub pixel: (u32, u32),
    /// One output pixel in uv units.
    pub texel: Vec2,
    pub aspect: f32,
    pub light_height: f32,
    pub shadow_strength: f32,
    pub shadow_softness: f32,
}

/// Shadow factor in [0, 1] (1 = fully lit) for one pixel/light pair.
///
/// `shadow_strength <= 0` returns exactly 1.0 without marching.
pub fn shadow_factor(depth: &DepthSampler, ctx: &ShadowContext, light_position: Vec2) -> f32 {
    if ctx.shadow_strength <= 0.0 {
        return 1.0;
    }

    let to_light = light_position - ctx.uv;
    let distance = (to_light * Vec2::new(ctx.aspect, 1.0)).length();
    if distance < 1e-5 {
        return 1.0;
    }
    let march = to_light * (distance.min(SHADOW_MAX_DISTANCE) / distance);

    let center = depth.fetch(ctx.uv);
    let dither = hash_to_float(pixel_hash(ctx.pixel.0, ctx.pixel.1));
    let band = mix(SHADOW_BAND_MIN, SHADOW_BAND_MAX, ctx.shadow_softness);
    let tap_step = ctx.texel * SHADOW_BLUR_RADIUS_PX;

    let mut blocked = 0.0;
    let mut total_weight = 0.0;
    for i in 0..SHADOW_STEPS {
        let s = (i as f32 + dither) / SHADOW_STEPS as f32;
        let t = s * s;
        let sample = depth.smoothed(ctx.uv + march * t, tap_step);
        let expected = mix(center, NEAR_DEPTH, (t * ctx.light_height).min(1.0));
        let weight = 1.0 / (1.0 + t * SHADOW_DISTANCE_WEIGHT);
        blocked += smoothstep(SHADOW_BIAS, SHADOW_BIAS + band, expected - sample) * weight;
        total_weight += weight;
    }

    let occlusion = blocked / total_weight;
    let shaped = smoothstep(0.0, mix(SHADOW_SHAPE_MIN, 1.0, ctx.shadow_softness), occlusion);
    1.0 - shaped * ctx.shadow_strength
}
