//! Scalar helpers shared by the normal reconstructor and the CPU compose kernel.
//! Each function has a WGSL twin in `shaders/common/sampling.wgsl` that must
//! produce identical results.

/// GLSL/WGSL `smoothstep`. Callers guarantee `edge0 != edge1`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// GLSL `mix` / WGSL `mix`.
#[inline]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hash a pixel coordinate into a deterministic pseudo-random u32.
///
/// Same prime-multiplier seed and PCG-style mixing rounds as `pixel_hash` in WGSL.
pub fn pixel_hash(x: u32, y: u32) -> u32 {
    let mut state = x
        .wrapping_mul(0x9E3779B9)
        .wrapping_add(y.wrapping_mul(0x517CC1B7));

    state ^= state >> 16;
    state = state.wrapping_mul(0x45D9F3B);
    state ^= state >> 16;
    state = state.wrapping_mul(0x45D9F3B);
    state ^= state >> 16;

    state
}

/// Convert a hash value to a float in [0, 1).
#[inline]
pub fn hash_to_float(hash: u32) -> f32 {
    (hash >> 8) as f32 / 16_777_216.0 // 2^24
}

/// Round a unit-range value to the nearest 8-bit level and map it back to [0, 1].
#[inline]
pub fn quantize_unorm8(value: f32) -> f32 {
    (value.clamp(0.0, 1.0) * 255.0).round() / 255.0
}

/// Convert a unit-range float to an 8-bit channel with round-to-nearest.
#[inline]
pub fn unorm_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Clamp a setting into `[min, max]`. NaN collapses to `min`.
#[inline]
pub fn clamp_setting(value: f32, (min, max): (f32, f32)) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_pixel_hash_deterministic() {
        assert_eq!(pixel_hash(17, 42), pixel_hash(17, 42));
    }

    #[test]
    fn test_pixel_hash_symmetry_broken() {
        assert_ne!(pixel_hash(1, 2), pixel_hash(2, 1));
        assert_ne!(pixel_hash(0, 1), pixel_hash(1, 0));
    }

    #[test]
    fn test_hash_to_float_range() {
        for (x, y) in [(0, 0), (1, 0), (511, 733), (u32::MAX, u32::MAX)] {
            let f = hash_to_float(pixel_hash(x, y));
            assert!((0.0..1.0).contains(&f), "got {f}");
        }
    }

    #[test]
    fn test_quantize_unorm8() {
        assert_eq!(quantize_unorm8(0.0), 0.0);
        assert_eq!(quantize_unorm8(1.0), 1.0);
        assert_eq!(quantize_unorm8(1.5), 1.0);
        // 0.5 * 255 = 127.5 rounds away from zero
        assert_eq!(quantize_unorm8(0.5), 128.0 / 255.0);
    }

    #[test]
    fn test_clamp_setting_nan() {
        assert_eq!(clamp_setting(f32::NAN, (0.1, 2.0)), 0.1);
        assert_eq!(clamp_setting(5.0, (0.1, 2.0)), 2.0);
        assert_eq!(clamp_setting(-5.0, (0.1, 2.0)), 0.1);
    }
}
