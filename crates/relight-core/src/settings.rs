//! Global lighting settings and the valid range of every tunable.

use serde::{Deserialize, Serialize};

use crate::math::clamp_setting;

pub const AMBIENT_RANGE: (f32, f32) = (0.0, 1.0);
pub const SHADOW_STRENGTH_RANGE: (f32, f32) = (0.0, 1.0);
pub const SHADOW_SOFTNESS_RANGE: (f32, f32) = (0.0, 1.0);
pub const BRIGHTNESS_RANGE: (f32, f32) = (0.0, 2.0);
/// Lower bound keeps light directions off the image plane.
pub const LIGHT_HEIGHT_RANGE: (f32, f32) = (0.05, 2.0);
pub const SPECULAR_INTENSITY_RANGE: (f32, f32) = (0.0, 2.0);
pub const SSAO_STRENGTH_RANGE: (f32, f32) = (0.0, 1.0);

/// Per-light ranges.
pub const LIGHT_INTENSITY_RANGE: (f32, f32) = (0.0, 4.0);
pub const LIGHT_UNIT_RANGE: (f32, f32) = (0.0, 1.0);

/// Scene-wide lighting parameters. Created with defaults, mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSettings {
    pub ambient: f32,
    pub shadow_strength: f32,
    pub shadow_softness: f32,
    pub brightness: f32,
    pub light_height: f32,
    pub specular_intensity: f32,
    pub ssao_strength: f32,
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            ambient: 0.3,
            shadow_strength: 0.6,
            shadow_softness: 0.5,
            brightness: 1.0,
            light_height: 0.5,
            specular_intensity: 0.3,
            ssao_strength: 0.5,
        }
    }
}

impl LightingSettings {
    /// Return a copy with every field clamped into its valid range.
    pub fn clamped(self) -> Self {
        Self {
            ambient: clamp_setting(self.ambient, AMBIENT_RANGE),
            shadow_strength: clamp_setting(self.shadow_strength, SHADOW_STRENGTH_RANGE),
            shadow_softness: clamp_setting(self.shadow_softness, SHADOW_SOFTNESS_RANGE),
            brightness: clamp_setting(self.brightness, BRIGHTNESS_RANGE),
            light_height: clamp_setting(self.light_height, LIGHT_HEIGHT_RANGE),
            specular_intensity: clamp_setting(self.specular_intensity, SPECULAR_INTENSITY_RANGE),
            ssao_strength: clamp_setting(self.ssao_strength, SSAO_STRENGTH_RANGE),
        }
    }
}
