use glam::Vec3;
use relight_core::config::NormalConfig;
use relight_core::constants::{
    DEFAULT_NORMAL_STRENGTH, NORMAL_FIRST_BLUR_RADIUS, NORMAL_SECOND_BLUR_RADIUS,
};
use relight_core::math::quantize_unorm8;
use relight_core::{DepthMap, NormalMap};

use crate::blur::gaussian_blur;
use crate::gradient::sobel_gradient;

/// Tunables for `generate_normal_map_with`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalOptions {
    /// Relief exaggeration. `<= 0` gives a flat field.
    pub strength: f32,
    pub first_radius: u32,
    pub second_radius: u32,
    /// Round the first pass to 8-bit levels before the second pass.
    /// Turning this off changes output on smooth ramps; see DESIGN.md.
    pub quantize_intermediate: bool,
}

impl Default for NormalOptions {
    fn default() -> Self {
        Self {
            strength: DEFAULT_NORMAL_STRENGTH,
            first_radius: NORMAL_FIRST_BLUR_RADIUS,
            second_radius: NORMAL_SECOND_BLUR_RADIUS,
            quantize_intermediate: true,
        }
    }
}

impl From<NormalConfig> for NormalOptions {
    fn from(config: NormalConfig) -> Self {
        Self {
            strength: config.strength,
            quantize_intermediate: config.quantize_intermediate,
            ..Self::default()
        }
    }
}

/// Reconstruct unit normals from a depth map with the default blur cascade.
pub fn generate_normal_map(depth: &DepthMap, strength: f32) -> NormalMap {
    generate_normal_map_with(
        depth,
        &NormalOptions {
            strength,
            ..NormalOptions::default()
        },
    )
}

/// Reconstruct unit normals from a depth map.
///
/// Total over any well-formed `DepthMap`: constant depth (or `strength <= 0`)
/// yields (0, 0, 1) everywhere.
pub fn generate_normal_map_with(depth: &DepthMap, options: &NormalOptions) -> NormalMap {
    let (width, height) = (depth.width(), depth.height());

    if options.strength <= 0.0 || options.strength.is_nan() {
        return NormalMap::flat_for(depth);
    }

    let mut smoothed = gaussian_blur(depth.values(), width, height, options.first_radius);
    if options.quantize_intermediate {
        for v in &mut smoothed {
            *v = quantize_unorm8(*v);
        }
    }
    let smoothed = gaussian_blur(&smoothed, width, height, options.second_radius);

    let mut normals = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            let (gx, gy) = sobel_gradient(&smoothed, width, height, x, y);
            normals.push(Vec3::new(-gx * options.strength, -gy * options.strength, 1.0));
        }
    }

    log::debug!(
        "Reconstructed {}x{} normal map (strength {}, quantized {})",
        width,
        height,
        options.strength,
        options.quantize_intermediate
    );

    NormalMap::from_vectors(width, height, normals).unwrap_or_else(|| NormalMap::flat_for(depth))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: u32, height: u32, slope: f32) -> DepthMap {
        let values = (0..width * height)
            .map(|i| 0.2 + (i % width) as f32 * slope)
            .collect();
        DepthMap::new(width, height, values).expect("valid ramp")
    }

    fn max_deviation(map: &NormalMap) -> f32 {
        map.normals()
            .iter()
            .map(|n| n.truncate().length())
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_constant_depth_is_flat_for_any_strength() {
        let depth = DepthMap::constant(24, 16, 0.42).expect("valid map");
        for strength in [0.5, 1.0, 12.0, 100.0] {
            let normals = generate_normal_map(&depth, strength);
            for n in normals.normals() {
                assert_eq!(*n, Vec3::Z, "strength {strength}");
            }
        }
    }

    #[test]
    fn test_non_positive_strength_is_flat() {
        let depth = ramp(16, 16, 0.03);
        for strength in [0.0, -4.0] {
            let normals = generate_normal_map(&depth, strength);
            assert!(normals.normals().iter().all(|n| *n == Vec3::Z));
        }
    }

    #[test]
    fn test_all_normals_unit_length() {
        let depth = ramp(32, 20, 0.02);
        let normals = generate_normal_map(&depth, DEFAULT_NORMAL_STRENGTH);
        for n in normals.normals() {
            assert!((n.length() - 1.0).abs() < 1e-5);
        }
        assert_eq!(normals.width(), 32);
        assert_eq!(normals.height(), 20);
    }

    #[test]
    fn test_larger_strength_larger_deviation() {
        let depth = ramp(40, 40, 0.015);
        let weak = generate_normal_map(&depth, 2.0);
        let strong = generate_normal_map(&depth, 8.0);
        // Center pixel sits on an interior gradient unaffected by the border clamp.
        let idx = 20 * 40 + 20;
        let a = weak.normals()[idx].truncate().length();
        let b = strong.normals()[idx].truncate().length();
        assert!(a > 0.0);
        assert!(b > a, "strength 8 deviation {b} not above strength 2 deviation {a}");
        assert!(max_deviation(&strong) > max_deviation(&weak));
    }

    #[test]
    fn test_normals_lean_against_depth_increase() {
        // Depth grows to the right, so -gx * strength points the normal left.
        let depth = ramp(40, 40, 0.015);
        let normals = generate_normal_map(&depth, DEFAULT_NORMAL_STRENGTH);
        let n = normals.normals()[20 * 40 + 20];
        assert!(n.x < 0.0);
        assert!(n.y.abs() < 1e-4);
        assert!(n.z > 0.0);
    }

    #[test]
    fn test_quantization_toggle_changes_smooth_ramp() {
        // A very shallow ramp sits between 8-bit levels, so quantizing it creates steps.
        let depth = ramp(64, 8, 0.0007);
        let quantized = generate_normal_map_with(&depth, &NormalOptions::default());
        let float = generate_normal_map_with(
            &depth,
            &NormalOptions {
                quantize_intermediate: false,
                ..NormalOptions::default()
            },
        );
        assert_ne!(quantized, float);
    }

    #[test]
    fn test_options_from_config() {
        let options = NormalOptions::from(NormalConfig {
            strength: 3.0,
            quantize_intermediate: false,
        });
        assert_eq!(options.strength, 3.0);
        assert!(!options.quantize_intermediate);
        assert_eq!(options.first_radius, NORMAL_FIRST_BLUR_RADIUS);
    }
}
