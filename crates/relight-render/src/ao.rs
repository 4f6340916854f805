//! Screen-space ambient occlusion.
//! Eight fixed directions at `SSAO_RADIUS_PX` around the pixel; a neighbor
//! nearer than the center (smaller depth) occludes it through a smoothstep.

use glam::Vec2;
use relight_core::constants::{
    SSAO_BIAS, SSAO_BYPASS_EPSILON, SSAO_DIRECTIONS, SSAO_RADIUS_PX, SSAO_RANGE,
    SSAO_SAMPLE_COUNT,
};
use relight_core::math::smoothstep;

use crate::sampling::DepthSampler;

/// AO factor in [0, 1] for the pixel at `uv`. `texel` is one output pixel in uv units.
///
/// `ssao_strength` below `SSAO_BYPASS_EPSILON` skips sampling and returns exactly 1.0.
pub fn ambient_occlusion(depth: &DepthSampler, uv: Vec2, texel: Vec2, ssao_strength: f32) -> f32 {
    if ssao_strength < SSAO_BYPASS_EPSILON {
        return 1.0;
    }

    let center = depth.fetch(uv);
    let mut occlusion = 0.0;
    for [dx, dy] in SSAO_DIRECTIONS {
        let neighbor = depth.fetch(uv + Vec2::new(dx, dy) * SSAO_RADIUS_PX * texel);
        occlusion += smoothstep(SSAO_BIAS, SSAO_RANGE, center - neighbor);
    }

    (1.0 - occlusion / SSAO_SAMPLE_COUNT as f32 * ssao_strength).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relight_core::DepthMap;

    fn pit(size: u32) -> DepthMap {
        // Far pixel in the middle of a near plateau.
        let mut values = vec![0.2; (size * size) as usize];
        let c = size / 2;
        values[(c * size + c) as usize] = 0.9;
        DepthMap::new(size, size, values).expect("valid")
    }

    #[test]
    fn test_zero_strength_bypass_is_exactly_one() {
        let map = pit(16);
        let s = DepthSampler::new(&map);
        let texel = Vec2::splat(1.0 / 16.0);
        let uv = Vec2::splat(8.5 / 16.0);
        assert_eq!(ambient_occlusion(&s, uv, texel, 0.0), 1.0);
        assert_eq!(ambient_occlusion(&s, uv, texel, SSAO_BYPASS_EPSILON * 0.5), 1.0);
    }

    #[test]
    fn test_pit_is_occluded() {
        let map = pit(16);
        let s = DepthSampler::new(&map);
        let texel = Vec2::splat(1.0 / 16.0);
        let ao = ambient_occlusion(&s, Vec2::splat(8.5 / 16.0), texel, 1.0);
        assert!(ao < 0.01, "fully surrounded pit should be dark, got {ao}");
    }

    #[test]
    fn test_flat_depth_unoccluded() {
        let map = DepthMap::constant(16, 16, 0.5).expect("valid");
        let s = DepthSampler::new(&map);
        let ao = ambient_occlusion(&s, Vec2::splat(0.5), Vec2::splat(1.0 / 16.0), 1.0);
        assert_eq!(ao, 1.0);
    }

    #[test]
    fn test_strength_scales_darkening() {
        let map = pit(16);
        let s = DepthSampler::new(&map);
        let texel = Vec2::splat(1.0 / 16.0);
        let uv = Vec2::splat(8.5 / 16.0);
        let half = ambient_occlusion(&s, uv, texel, 0.5);
        let full = ambient_occlusion(&s, uv, texel, 1.0);
        assert!(half > full);
        assert!((half - 0.5).abs() < 0.01, "got {half}");
    }
}
