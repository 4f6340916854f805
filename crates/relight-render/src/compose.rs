//! CPU compose kernel: one full-image pass, same math as `compose.wgsl`.

use glam::{Vec2, Vec3};
use image::RgbaImage;
use relight_core::constants::{DIFFUSE_TERMINATOR_EDGE, FALLOFF_SCALE, SPECULAR_EXPONENT};
use relight_core::math::{smoothstep, unorm_to_u8};
use relight_core::{DepthMap, NormalMap};

use crate::ao::ambient_occlusion;
use crate::sampling::{DepthSampler, NormalSampler};
use crate::shadow::{shadow_factor, ShadowContext};
use crate::uniforms::{ComposeUniforms, FLAG_HAS_DEPTH, FLAG_HAS_NORMALS};

/// Lighting terms of one pixel before they are applied to the color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelLighting {
    pub ao: f32,
    pub normal: Vec3,
    /// Σ diffuse · falloff · shadow · color · intensity.
    pub diffuse: Vec3,
    /// Σ specular · falloff · shadow · color · intensity. Not attenuated by AO.
    pub specular: Vec3,
}

/// Borrowed scene rasters. `None` depth/normals select the flat fallbacks.
#[derive(Clone, Copy)]
pub struct SceneView<'a> {
    pub color: &'a RgbaImage,
    pub depth: Option<DepthSampler<'a>>,
    pub normals: Option<NormalSampler<'a>>,
}

/// Evaluate AO, the smoothed normal and every active light at pixel `(x, y)`.
pub fn light_pixel(scene: &SceneView, uniforms: &ComposeUniforms, x: u32, y: u32) -> PixelLighting {
    let [width, height] = uniforms.output_size;
    let texel = Vec2::new(1.0 / width as f32, 1.0 / height as f32);
    let uv = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) * texel;

    let ao = match &scene.depth {
        Some(depth) => ambient_occlusion(depth, uv, texel, uniforms.ssao_strength),
        None => 1.0,
    };
    let normal = match &scene.normals {
        Some(normals) => normals.smoothed(uv, texel),
        None => NormalMap::FLAT,
    };

    let shadow_ctx = ShadowContext {
        uv,
        pixel: (x, y),
        texel,
        aspect: uniforms.aspect,
        light_height: uniforms.light_height,
        shadow_strength: uniforms.shadow_strength,
        shadow_softness: uniforms.shadow_softness,
    };

    let mut diffuse_sum = Vec3::ZERO;
    let mut specular_sum = Vec3::ZERO;
    for light in uniforms.active_lights() {
        let light_pos = Vec2::from(light.position);
        let delta = (light_pos - uv) * Vec2::new(uniforms.aspect, 1.0);
        let to_light = Vec3::new(delta.x, delta.y, uniforms.light_height).normalize();

        let diffuse = smoothstep(DIFFUSE_TERMINATOR_EDGE, 1.0, normal.dot(to_light));
        let half = (to_light + Vec3::Z).normalize();
        let specular =
            normal.dot(half).max(0.0).powf(SPECULAR_EXPONENT) * uniforms.specular_intensity;
        let falloff = 1.0 / (1.0 + delta.length_squared() * FALLOFF_SCALE);
        let shadow = match &scene.depth {
            Some(depth) => shadow_factor(depth, &shadow_ctx, light_pos),
            None => 1.0,
        };

        let radiance = Vec3::new(light.color[0], light.color[1], light.color[2])
            * light.intensity
            * falloff
            * shadow;
        diffuse_sum += radiance * diffuse;
        specular_sum += radiance * specular;
    }

    PixelLighting {
        ao,
        normal,
        diffuse: diffuse_sum,
        specular: specular_sum,
    }
}

/// `color × (ambient·ao + Σdiffuse) × brightness + Σspecular`, clamped; alpha passes through.
pub fn shade_pixel(scene: &SceneView, uniforms: &ComposeUniforms, x: u32, y: u32) -> [u8; 4] {
    let lighting = light_pixel(scene, uniforms, x, y);
    let [r, g, b, a] = scene.color.get_pixel(x, y).0;
    let base = Vec3::new(r as f32, g as f32, b as f32) / 255.0;

    let lit = base * (Vec3::splat(uniforms.ambient * lighting.ao) + lighting.diffuse)
        * uniforms.brightness
        + lighting.specular;

    [unorm_to_u8(lit.x), unorm_to_u8(lit.y), unorm_to_u8(lit.z), a]
}

/// Run the compose kernel over every output pixel.
pub fn compose_image(scene: &SceneView, uniforms: &ComposeUniforms) -> RgbaImage {
    let [width, height] = uniforms.output_size;
    let mut out = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            out.put_pixel(x, y, image::Rgba(shade_pixel(scene, uniforms, x, y)));
        }
    }
    out
}

/// CPU-resident textures for the fallback backend.
#[derive(Debug, Default)]
pub struct CpuBackend {
    color: Option<RgbaImage>,
    depth: Option<DepthMap>,
    normals: Option<NormalMap>,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_color(&mut self, image: RgbaImage) {
        self.color = Some(image);
    }

    pub fn set_depth(&mut self, depth: &DepthMap) {
        self.depth = Some(depth.clone());
    }

    pub fn set_normals(&mut self, normals: &NormalMap) {
        self.normals = Some(normals.clone());
    }

    pub fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.depth.is_some() {
            flags |= FLAG_HAS_DEPTH;
        }
        if self.normals.is_some() {
            flags |= FLAG_HAS_NORMALS;
        }
        flags
    }

    /// `None` when no color image is bound.
    pub fn compose(&self, uniforms: &ComposeUniforms) -> Option<RgbaImage> {
        let color = self.color.as_ref()?;
        let scene = SceneView {
            color,
            depth: self.depth.as_ref().map(DepthSampler::new),
            normals: self.normals.as_ref().map(NormalSampler::new),
        };
        Some(compose_image(&scene, uniforms))
    }
}
