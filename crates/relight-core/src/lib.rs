pub mod config;
pub mod constants;
pub mod error;
pub mod estimate;
pub mod math;
pub mod settings;
pub mod types;

pub use config::{load_config_from_str, BackendPreference, LightConfig, NormalConfig, RenderConfig};
pub use error::{ConfigError, DepthMapError, EstimateError, RelightError};
pub use estimate::{DepthEstimator, EstimateStage, LuminanceDepthEstimator, ProgressSink};
pub use settings::LightingSettings;
pub use types::{DepthMap, Light, LightId, NormalMap};
