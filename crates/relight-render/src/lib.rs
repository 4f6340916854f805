pub mod ao;
pub mod compose;
pub mod gpu;
pub mod lighting;
pub mod renderer;
pub mod sampling;
pub mod shadow;
pub mod texture;
pub mod uniforms;

pub use compose::{compose_image, CpuBackend, SceneView};
pub use gpu::GpuBackend;
pub use lighting::{GpuLight, LightRegistry, LightUpdate};
pub use renderer::{BackendKind, Renderer, RendererState};
pub use texture::TextureSource;
pub use uniforms::ComposeUniforms;
