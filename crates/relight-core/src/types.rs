use glam::{Vec2, Vec3};
use image::{GrayImage, RgbaImage};

use crate::error::DepthMapError;
use crate::math::unorm_to_u8;

/// Per-pixel depth in [0, 1]. 0.0 is nearest to the camera, 1.0 is farthest.
///
/// Relative ordering only, not metric distance. Immutable once built: a new
/// estimate replaces the whole map.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl DepthMap {
    /// Build from row-major values. Values are clamped into [0, 1]; NaN becomes far.
    pub fn new(width: u32, height: u32, mut values: Vec<f32>) -> Result<Self, DepthMapError> {
        if width == 0 || height == 0 {
            return Err(DepthMapError::EmptyDimensions { width, height });
        }
        let expected = width as usize * height as usize;
        if values.len() != expected {
            return Err(DepthMapError::LengthMismatch {
                expected,
                actual: values.len(),
            });
        }
        for v in &mut values {
            *v = if v.is_nan() { 1.0 } else { v.clamp(0.0, 1.0) };
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Depth map with the same value everywhere.
    pub fn constant(width: u32, height: u32, value: f32) -> Result<Self, DepthMapError> {
        Self::new(width, height, vec![value; width as usize * height as usize])
    }

    /// Build from an 8-bit grayscale raster, `value / 255`.
    pub fn from_luma(image: &GrayImage) -> Result<Self, DepthMapError> {
        let values = image.pixels().map(|p| p.0[0] as f32 / 255.0).collect();
        Self::new(image.width(), image.height(), values)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Depth at integer coordinates, clamped to the border.
    #[inline]
    pub fn get_clamped(&self, x: i64, y: i64) -> f32 {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.height as i64 - 1) as usize;
        self.values[cy * self.width as usize + cx]
    }
}

/// Per-pixel unit surface normals derived from a depth map.
///
/// Every vector is normalized on construction; zero-length or non-finite
/// inputs become the flat normal (0, 0, 1).
#[derive(Debug, Clone, PartialEq)]
pub struct NormalMap {
    width: u32,
    height: u32,
    normals: Vec<Vec3>,
}

impl NormalMap {
    pub const FLAT: Vec3 = Vec3::Z;

    /// Returns None when `normals.len() != width * height` or a dimension is zero.
    pub fn from_vectors(width: u32, height: u32, mut normals: Vec<Vec3>) -> Option<Self> {
        if width == 0 || height == 0 || normals.len() != width as usize * height as usize {
            return None;
        }
        for n in &mut normals {
            *n = n.try_normalize().unwrap_or(Self::FLAT);
        }
        Some(Self {
            width,
            height,
            normals,
        })
    }

    /// Flat normal field (0, 0, 1) everywhere.
    pub fn flat(width: u32, height: u32) -> Option<Self> {
        Self::from_vectors(width, height, vec![Self::FLAT; width as usize * height as usize])
    }

    /// Flat normal field matching a depth map's dimensions.
    pub fn flat_for(depth: &DepthMap) -> Self {
        Self {
            width: depth.width,
            height: depth.height,
            normals: vec![Self::FLAT; depth.values.len()],
        }
    }

    /// Decode an RGBA8 normal texture (`rgb / 255 * 2 - 1`), re-normalizing each texel.
    pub fn from_rgba8(image: &RgbaImage) -> Option<Self> {
        let normals = image
            .pixels()
            .map(|p| {
                Vec3::new(
                    p.0[0] as f32 / 255.0 * 2.0 - 1.0,
                    p.0[1] as f32 / 255.0 * 2.0 - 1.0,
                    p.0[2] as f32 / 255.0 * 2.0 - 1.0,
                )
            })
            .collect();
        Self::from_vectors(image.width(), image.height(), normals)
    }

    /// Encode to RGBA8 with `n * 0.5 + 0.5` per channel and opaque alpha.
    pub fn to_rgba8(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.width, self.height);
        for (pixel, n) in out.pixels_mut().zip(&self.normals) {
            let e = *n * 0.5 + Vec3::splat(0.5);
            pixel.0 = [unorm_to_u8(e.x), unorm_to_u8(e.y), unorm_to_u8(e.z), 255];
        }
        out
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Normal at integer coordinates, clamped to the border.
    #[inline]
    pub fn get_clamped(&self, x: i64, y: i64) -> Vec3 {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.height as i64 - 1) as usize;
        self.normals[cy * self.width as usize + cx]
    }
}

/// Opaque light identifier, unique within the registry that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(pub u64);

/// A movable virtual point light positioned in normalized image space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub id: LightId,
    /// (u, v) in [0, 1]², origin top-left.
    pub position: Vec2,
    /// Linear RGB in [0, 1]³.
    pub color: Vec3,
    /// Typically 0–2, clamped to `settings::LIGHT_INTENSITY_RANGE`.
    pub intensity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_map_clamps_values() {
        let map = DepthMap::new(2, 1, vec![-0.5, 3.0]).expect("valid map");
        assert_eq!(map.values(), &[0.0, 1.0]);
    }

    #[test]
    fn test_depth_map_nan_is_far() {
        let map = DepthMap::new(1, 1, vec![f32::NAN]).expect("valid map");
        assert_eq!(map.values(), &[1.0]);
    }

    #[test]
    fn test_depth_map_length_mismatch() {
        let err = DepthMap::new(3, 3, vec![0.0; 8]).unwrap_err();
        assert_eq!(
            err,
            DepthMapError::LengthMismatch {
                expected: 9,
                actual: 8
            }
        );
    }

    #[test]
    fn test_depth_map_rejects_empty() {
        assert!(matches!(
            DepthMap::new(0, 4, vec![]),
            Err(DepthMapError::EmptyDimensions { .. })
        ));
    }

    #[test]
    fn test_depth_map_from_luma() {
        let gray = GrayImage::from_raw(2, 1, vec![0, 255]).expect("raw gray");
        let map = DepthMap::from_luma(&gray).expect("valid map");
        assert_eq!(map.values(), &[0.0, 1.0]);
    }

    #[test]
    fn test_depth_get_clamped_border() {
        let map = DepthMap::new(2, 2, vec![0.1, 0.2, 0.3, 0.4]).expect("valid map");
        assert_eq!(map.get_clamped(-5, -5), 0.1);
        assert_eq!(map.get_clamped(9, 0), 0.2);
        assert_eq!(map.get_clamped(0, 9), 0.3);
        assert_eq!(map.get_clamped(9, 9), 0.4);
    }

    #[test]
    fn test_normal_map_normalizes() {
        let map = NormalMap::from_vectors(2, 1, vec![Vec3::new(3.0, 0.0, 4.0), Vec3::ZERO])
            .expect("valid map");
        assert!((map.normals()[0].length() - 1.0).abs() < 1e-6);
        assert_eq!(map.normals()[1], NormalMap::FLAT);
    }

    #[test]
    fn test_normal_map_rgba8_decode_is_unit() {
        let n = Vec3::new(0.3, -0.5, 0.8).normalize();
        let map = NormalMap::from_vectors(1, 1, vec![n]).expect("valid map");
        let decoded = NormalMap::from_rgba8(&map.to_rgba8()).expect("valid map");
        let d = decoded.normals()[0];
        assert!((d.length() - 1.0).abs() < 1e-5);
        assert!(d.dot(n) > 0.999, "decoded {d} too far from {n}");
    }

    #[test]
    fn test_flat_normal_encoding() {
        let map = NormalMap::flat(1, 1).expect("valid map");
        assert_eq!(map.to_rgba8().get_pixel(0, 0).0, [128, 128, 255, 255]);
    }
}
