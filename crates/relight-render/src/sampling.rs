//! Nearest-texel sampling in normalized image space, the CPU twin of
//! `textureLoad` with a clamped `floor(uv * dims)` coordinate in WGSL.
//! Depth and normal rasters may differ in size from the output.

use glam::{Vec2, Vec3};
use relight_core::{DepthMap, NormalMap};

/// 3×3 Gaussian tap weights (1-2-1 / 2-4-2 / 1-2-1), row-major, to be divided by 16.
pub const GAUSS_3X3: [[f32; 3]; 3] = [[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]];

#[inline]
fn texel_coord(uv: Vec2, width: u32, height: u32) -> (i64, i64) {
    (
        (uv.x * width as f32).floor() as i64,
        (uv.y * height as f32).floor() as i64,
    )
}

#[derive(Clone, Copy)]
pub struct DepthSampler<'a> {
    map: &'a DepthMap,
}

impl<'a> DepthSampler<'a> {
    pub fn new(map: &'a DepthMap) -> Self {
        Self { map }
    }

    #[inline]
    pub fn fetch(&self, uv: Vec2) -> f32 {
        let (x, y) = texel_coord(uv, self.map.width(), self.map.height());
        self.map.get_clamped(x, y)
    }

    /// 9-tap Gaussian around `uv` with taps spaced `step` apart (uv units).
    pub fn smoothed(&self, uv: Vec2, step: Vec2) -> f32 {
        let mut acc = 0.0;
        for (j, row) in GAUSS_3X3.iter().enumerate() {
            for (i, weight) in row.iter().enumerate() {
                let offset = Vec2::new(i as f32 - 1.0, j as f32 - 1.0) * step;
                acc += self.fetch(uv + offset) * weight;
            }
        }
        acc / 16.0
    }
}

#[derive(Clone, Copy)]
pub struct NormalSampler<'a> {
    map: &'a NormalMap,
}

impl<'a> NormalSampler<'a> {
    pub fn new(map: &'a NormalMap) -> Self {
        Self { map }
    }

    #[inline]
    pub fn fetch(&self, uv: Vec2) -> Vec3 {
        let (x, y) = texel_coord(uv, self.map.width(), self.map.height());
        self.map.get_clamped(x, y)
    }

    /// Gaussian-weighted 3×3 normal around `uv`, re-normalized.
    pub fn smoothed(&self, uv: Vec2, step: Vec2) -> Vec3 {
        let mut acc = Vec3::ZERO;
        for (j, row) in GAUSS_3X3.iter().enumerate() {
            for (i, weight) in row.iter().enumerate() {
                let offset = Vec2::new(i as f32 - 1.0, j as f32 - 1.0) * step;
                acc += self.fetch(uv + offset) * *weight;
            }
        }
        (acc / 16.0).try_normalize().unwrap_or(NormalMap::FLAT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauss_weights_sum() {
        let sum: f32 = GAUSS_3X3.iter().flatten().sum();
        assert_eq!(sum, 16.0);
    }

    #[test]
    fn test_depth_fetch_maps_uv_to_texel() {
        let map = DepthMap::new(4, 1, vec![0.0, 0.25, 0.5, 1.0]).expect("valid");
        let s = DepthSampler::new(&map);
        assert_eq!(s.fetch(Vec2::new(0.1, 0.5)), 0.0);
        assert_eq!(s.fetch(Vec2::new(0.3, 0.5)), 0.25);
        assert_eq!(s.fetch(Vec2::new(0.99, 0.5)), 1.0);
        // Outside [0, 1] clamps to the border.
        assert_eq!(s.fetch(Vec2::new(-0.5, 0.5)), 0.0);
        assert_eq!(s.fetch(Vec2::new(1.5, 0.5)), 1.0);
    }

    #[test]
    fn test_depth_smoothed_constant() {
        let map = DepthMap::constant(8, 8, 0.4).expect("valid");
        let s = DepthSampler::new(&map);
        let v = s.smoothed(Vec2::splat(0.5), Vec2::splat(3.0 / 8.0));
        assert!((v - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_normal_smoothed_is_unit() {
        let normals: Vec<Vec3> = (0..16)
            .map(|i| Vec3::new((i % 4) as f32 * 0.2 - 0.3, 0.1, 1.0))
            .collect();
        let map = NormalMap::from_vectors(4, 4, normals).expect("valid");
        let n = NormalSampler::new(&map).smoothed(Vec2::splat(0.5), Vec2::splat(0.25));
        assert!((n.length() - 1.0).abs() < 1e-5);
    }
}
