use thiserror::Error;

/// Fatal setup errors raised by `Renderer::init`. Everything after init is a soft no-op.
#[derive(Debug, Error)]
pub enum RelightError {
    #[error("GPU adapter not found: {0}")]
    AdapterNotFound(String),

    #[error("Failed to request GPU device: {0}")]
    DeviceRequestFailed(String),

    #[error("Shader compilation failed: {0}")]
    ShaderCompilationFailed(String),

    #[error("Compute pipeline creation failed: {0}")]
    PipelineCreationFailed(String),

    #[error("invalid render target size {width}x{height}")]
    InvalidTargetSize { width: u32, height: u32 },
}

/// Errors building a depth map from raw data.
#[derive(Debug, Error, PartialEq)]
pub enum DepthMapError {
    #[error("depth map dimensions must be non-zero (got {width}x{height})")]
    EmptyDimensions { width: u32, height: u32 },

    #[error("depth data length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Errors loading a render configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse render config RON: {0}")]
    ParseError(String),

    #[error("config declares {0} lights, at most {1} are supported")]
    TooManyLights(usize, usize),
}

/// Errors reported by a depth estimator.
#[derive(Debug, Error)]
pub enum EstimateError {
    #[error("depth estimation model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("cannot estimate depth for an empty image")]
    EmptyImage,

    #[error(transparent)]
    InvalidOutput(#[from] DepthMapError),
}
