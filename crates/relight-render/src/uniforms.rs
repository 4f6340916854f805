use relight_core::constants::MAX_LIGHTS;
use relight_core::LightingSettings;

use crate::lighting::{GpuLight, LightRegistry};

/// `flags` bit: a real depth texture is bound (otherwise the color texture stands in).
pub const FLAG_HAS_DEPTH: u32 = 1 << 0;
/// `flags` bit: a real normal texture is bound.
pub const FLAG_HAS_NORMALS: u32 = 1 << 1;

/// Per-dispatch compose uniforms (176 bytes, matches WGSL ComposeUniforms).
///
/// Both backends read settings from this struct, so the CPU kernel and the
/// shader always see the same values.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ComposeUniforms {
    pub output_size: [u32; 2],
    pub light_count: u32,
    pub flags: u32,
    pub ambient: f32,
    pub shadow_strength: f32,
    pub shadow_softness: f32,
    pub brightness: f32,
    pub light_height: f32,
    pub specular_intensity: f32,
    pub ssao_strength: f32,
    /// width / height of the output, applied to uv-space x distances.
    pub aspect: f32,
    pub lights: [GpuLight; MAX_LIGHTS],
}

impl ComposeUniforms {
    pub fn new(registry: &LightRegistry, width: u32, height: u32, flags: u32) -> Self {
        let LightingSettings {
            ambient,
            shadow_strength,
            shadow_softness,
            brightness,
            light_height,
            specular_intensity,
            ssao_strength,
        } = *registry.settings();
        let (lights, light_count) = registry.gpu_lights();

        Self {
            output_size: [width, height],
            light_count,
            flags,
            ambient,
            shadow_strength,
            shadow_softness,
            brightness,
            light_height,
            specular_intensity,
            ssao_strength,
            aspect: width as f32 / height.max(1) as f32,
            lights,
        }
    }

    pub fn has_depth(&self) -> bool {
        self.flags & FLAG_HAS_DEPTH != 0
    }

    pub fn has_normals(&self) -> bool {
        self.flags & FLAG_HAS_NORMALS != 0
    }

    /// Lights in use, bounded by `MAX_LIGHTS`.
    pub fn active_lights(&self) -> &[GpuLight] {
        let count = (self.light_count as usize).min(MAX_LIGHTS);
        &self.lights[..count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    #[test]
    fn test_compose_uniforms_size() {
        assert_eq!(std::mem::size_of::<ComposeUniforms>(), 176);
        // WGSL places the light array at offset 48 (16-byte aligned).
        assert_eq!(std::mem::offset_of!(ComposeUniforms, lights), 48);
    }

    #[test]
    fn test_new_copies_settings_and_lights() {
        let mut reg = LightRegistry::new();
        reg.set_ambient(0.25);
        reg.add_light(Vec2::new(0.5, 0.3), Vec3::ONE, 1.5);

        let u = ComposeUniforms::new(&reg, 200, 100, FLAG_HAS_DEPTH);
        assert_eq!(u.ambient, 0.25);
        assert_eq!(u.light_count, 1);
        assert_eq!(u.active_lights().len(), 1);
        assert_eq!(u.lights[0].position, [0.5, 0.3]);
        assert_eq!(u.aspect, 2.0);
        assert!(u.has_depth());
        assert!(!u.has_normals());
    }
}
