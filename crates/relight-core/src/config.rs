//! RON render configuration: backend choice, normal reconstruction options,
//! initial lighting settings and an optional starting light rig.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_NORMAL_STRENGTH, MAX_LIGHTS};
use crate::error::ConfigError;
use crate::settings::LightingSettings;

/// Which compose backend `Renderer::init` should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackendPreference {
    /// wgpu if an adapter exists, otherwise the CPU kernel.
    #[default]
    Auto,
    /// wgpu only; init fails without an adapter.
    Gpu,
    /// CPU kernel only.
    Cpu,
}

impl std::str::FromStr for BackendPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "gpu" => Ok(Self::Gpu),
            "cpu" => Ok(Self::Cpu),
            other => Err(format!("unknown backend '{other}' (expected auto, gpu or cpu)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalConfig {
    pub strength: f32,
    /// Round the first blur pass to 8-bit levels before the second pass.
    pub quantize_intermediate: bool,
}

impl Default for NormalConfig {
    fn default() -> Self {
        Self {
            strength: DEFAULT_NORMAL_STRENGTH,
            quantize_intermediate: true,
        }
    }
}

/// A light as declared in a config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    pub position: [f32; 2],
    #[serde(default = "white")]
    pub color: [f32; 3],
    #[serde(default = "unit_intensity")]
    pub intensity: f32,
}

fn white() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn unit_intensity() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub backend: BackendPreference,
    pub normals: NormalConfig,
    pub settings: LightingSettings,
    pub lights: Vec<LightConfig>,
}

/// Parse a render config from a RON string. Settings are clamped on load.
pub fn load_config_from_str(ron_str: &str) -> Result<RenderConfig, ConfigError> {
    let options = ron::Options::default();
    let mut config: RenderConfig = options
        .from_str(ron_str)
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    if config.lights.len() > MAX_LIGHTS {
        return Err(ConfigError::TooManyLights(config.lights.len(), MAX_LIGHTS));
    }

    let clamped = config.settings.clamped();
    if clamped != config.settings {
        log::warn!("Render config settings out of range, clamped to {clamped:?}");
    }
    config.settings = clamped;
    Ok(config)
}
