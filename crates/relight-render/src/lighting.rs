use bytemuck::Zeroable;
use glam::{Vec2, Vec3};
use relight_core::constants::MAX_LIGHTS;
use relight_core::math::clamp_setting;
use relight_core::settings::{
    AMBIENT_RANGE, BRIGHTNESS_RANGE, LIGHT_HEIGHT_RANGE, LIGHT_INTENSITY_RANGE, LIGHT_UNIT_RANGE,
    SHADOW_SOFTNESS_RANGE, SHADOW_STRENGTH_RANGE, SPECULAR_INTENSITY_RANGE, SSAO_STRENGTH_RANGE,
};
use relight_core::{Light, LightId, LightingSettings};

/// GPU light data (32 bytes, matches WGSL GpuLight).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuLight {
    pub position: [f32; 2],
    pub intensity: f32,
    pub _padding: f32,
    pub color: [f32; 4],
}

impl From<&Light> for GpuLight {
    fn from(light: &Light) -> Self {
        Self {
            position: light.position.to_array(),
            intensity: light.intensity,
            _padding: 0.0,
            color: light.color.extend(1.0).to_array(),
        }
    }
}

/// Partial light update; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightUpdate {
    pub position: Option<Vec2>,
    pub color: Option<Vec3>,
    pub intensity: Option<f32>,
}

/// Holds up to `MAX_LIGHTS` lights plus the global lighting settings.
///
/// Pure state. Every observable mutation sets the `needs_render` flag, which
/// the renderer pulls and clears; the registry never renders on its own.
/// Mutations on unknown ids and adds beyond capacity are soft no-ops.
#[derive(Debug, Clone)]
pub struct LightRegistry {
    lights: Vec<Light>,
    settings: LightingSettings,
    next_id: u64,
    needs_render: bool,
}

impl Default for LightRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LightRegistry {
    pub fn new() -> Self {
        Self {
            lights: Vec::with_capacity(MAX_LIGHTS),
            settings: LightingSettings::default(),
            next_id: 1,
            // A fresh scene has never been rendered.
            needs_render: true,
        }
    }

    /// Append a light. Returns `None` (list unchanged) when the registry is full.
    pub fn add_light(&mut self, position: Vec2, color: Vec3, intensity: f32) -> Option<LightId> {
        if self.lights.len() >= MAX_LIGHTS {
            log::warn!("add_light rejected: registry already holds {MAX_LIGHTS} lights");
            return None;
        }
        let id = LightId(self.next_id);
        self.next_id += 1;
        self.lights.push(Light {
            id,
            position: clamp_position(position),
            color: clamp_color(color),
            intensity: clamp_setting(intensity, LIGHT_INTENSITY_RANGE),
        });
        self.needs_render = true;
        Some(id)
    }

    /// Remove exactly the light with `id`. Unknown ids return `false`.
    pub fn remove_light(&mut self, id: LightId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.lights.remove(index);
        self.needs_render = true;
        true
    }

    pub fn move_light(&mut self, id: LightId, position: Vec2) -> bool {
        self.update_light(
            id,
            LightUpdate {
                position: Some(position),
                ..Default::default()
            },
        )
    }

    pub fn update_light(&mut self, id: LightId, update: LightUpdate) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let light = &mut self.lights[index];
        if let Some(position) = update.position {
            light.position = clamp_position(position);
        }
        if let Some(color) = update.color {
            light.color = clamp_color(color);
        }
        if let Some(intensity) = update.intensity {
            light.intensity = clamp_setting(intensity, LIGHT_INTENSITY_RANGE);
        }
        self.needs_render = true;
        true
    }

    pub fn clear_lights(&mut self) {
        self.lights.clear();
        self.needs_render = true;
    }

    pub fn set_ambient(&mut self, value: f32) {
        self.settings.ambient = clamp_setting(value, AMBIENT_RANGE);
        self.needs_render = true;
    }

    pub fn set_shadow_strength(&mut self, value: f32) {
        self.settings.shadow_strength = clamp_setting(value, SHADOW_STRENGTH_RANGE);
        self.needs_render = true;
    }

    pub fn set_shadow_softness(&mut self, value: f32) {
        self.settings.shadow_softness = clamp_setting(value, SHADOW_SOFTNESS_RANGE);
        self.needs_render = true;
    }

    pub fn set_brightness(&mut self, value: f32) {
        self.settings.brightness = clamp_setting(value, BRIGHTNESS_RANGE);
        self.needs_render = true;
    }

    pub fn set_light_height(&mut self, value: f32) {
        self.settings.light_height = clamp_setting(value, LIGHT_HEIGHT_RANGE);
        self.needs_render = true;
    }

    pub fn set_specular_intensity(&mut self, value: f32) {
        self.settings.specular_intensity = clamp_setting(value, SPECULAR_INTENSITY_RANGE);
        self.needs_render = true;
    }

    pub fn set_ssao_strength(&mut self, value: f32) {
        self.settings.ssao_strength = clamp_setting(value, SSAO_STRENGTH_RANGE);
        self.needs_render = true;
    }

    /// Copy every field of `settings` in, clamped. The settings value itself is never replaced.
    pub fn apply_settings(&mut self, settings: LightingSettings) {
        self.set_ambient(settings.ambient);
        self.set_shadow_strength(settings.shadow_strength);
        self.set_shadow_softness(settings.shadow_softness);
        self.set_brightness(settings.brightness);
        self.set_light_height(settings.light_height);
        self.set_specular_intensity(settings.specular_intensity);
        self.set_ssao_strength(settings.ssao_strength);
    }

    pub fn settings(&self) -> &LightingSettings {
        &self.settings
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.iter().find(|l| l.id == id)
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Whether observable state changed since the last `mark_rendered`.
    pub fn needs_render(&self) -> bool {
        self.needs_render
    }

    /// Called by the renderer after producing a frame from the current state.
    pub fn mark_rendered(&mut self) {
        self.needs_render = false;
    }

    /// Light array padded to `MAX_LIGHTS` zeroed entries, plus the active count.
    pub fn gpu_lights(&self) -> ([GpuLight; MAX_LIGHTS], u32) {
        let mut padded = [GpuLight::zeroed(); MAX_LIGHTS];
        let count = self.lights.len().min(MAX_LIGHTS);
        for (slot, light) in padded.iter_mut().zip(&self.lights[..count]) {
            *slot = GpuLight::from(light);
        }
        (padded, count as u32)
    }

    fn index_of(&self, id: LightId) -> Option<usize> {
        self.lights.iter().position(|l| l.id == id)
    }
}

fn clamp_position(p: Vec2) -> Vec2 {
    Vec2::new(
        clamp_setting(p.x, LIGHT_UNIT_RANGE),
        clamp_setting(p.y, LIGHT_UNIT_RANGE),
    )
}

fn clamp_color(c: Vec3) -> Vec3 {
    Vec3::new(
        clamp_setting(c.x, LIGHT_UNIT_RANGE),
        clamp_setting(c.y, LIGHT_UNIT_RANGE),
        clamp_setting(c.z, LIGHT_UNIT_RANGE),
    )
}
