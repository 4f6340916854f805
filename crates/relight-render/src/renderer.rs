use glam::{Vec2, Vec3};
use image::RgbaImage;
use relight_core::{BackendPreference, DepthMap, NormalMap, RelightError, RenderConfig};

use crate::compose::CpuBackend;
use crate::gpu::GpuBackend;
use crate::lighting::LightRegistry;
use crate::texture::TextureSource;
use crate::uniforms::ComposeUniforms;

/// Lifecycle of a `Renderer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    /// Backend allocated, no color image yet.
    Initialized,
    /// Color image bound; `render` produces frames.
    Ready,
    Disposed,
}

/// Which backend an initialized renderer is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Gpu,
    Cpu,
}

enum Backend {
    Gpu(Box<GpuBackend>),
    Cpu(CpuBackend),
}

impl Backend {
    fn kind(&self) -> BackendKind {
        match self {
            Backend::Gpu(_) => BackendKind::Gpu,
            Backend::Cpu(_) => BackendKind::Cpu,
        }
    }

    fn adapter_name(&self) -> Option<&str> {
        match self {
            Backend::Gpu(gpu) => Some(gpu.adapter_name()),
            Backend::Cpu(_) => None,
        }
    }

    fn max_texture_dimension(&self) -> Option<u32> {
        match self {
            Backend::Gpu(gpu) => Some(gpu.max_texture_dimension()),
            Backend::Cpu(_) => None,
        }
    }

    /// The GPU refuses textures past the device limit; the CPU kernel has none.
    fn resize_target(&mut self, width: u32, height: u32) -> bool {
        match self {
            Backend::Gpu(gpu) => gpu.resize_target(width, height),
            Backend::Cpu(_) => true,
        }
    }

    fn set_color(&mut self, image: RgbaImage) -> bool {
        match self {
            Backend::Gpu(gpu) => gpu.upload_color(&image),
            Backend::Cpu(cpu) => {
                cpu.set_color(image);
                true
            }
        }
    }

    fn set_depth(&mut self, depth: &DepthMap) -> bool {
        match self {
            Backend::Gpu(gpu) => gpu.upload_depth(depth),
            Backend::Cpu(cpu) => {
                cpu.set_depth(depth);
                true
            }
        }
    }

    fn set_normals(&mut self, normals: &NormalMap) -> bool {
        match self {
            Backend::Gpu(gpu) => gpu.upload_normals(normals),
            Backend::Cpu(cpu) => {
                cpu.set_normals(normals);
                true
            }
        }
    }

    fn flags(&self) -> u32 {
        match self {
            Backend::Gpu(gpu) => gpu.flags(),
            Backend::Cpu(cpu) => cpu.flags(),
        }
    }

    fn compose(&mut self, uniforms: &ComposeUniforms) -> Option<RgbaImage> {
        match self {
            Backend::Gpu(gpu) => gpu.compose(uniforms),
            Backend::Cpu(cpu) => cpu.compose(uniforms),
        }
    }
}

/// Relighting renderer: one per editing session, owns its backend resources
/// and the light registry.
///
/// Only `init` can fail. Every other call on a renderer in the wrong state
/// is a logged no-op returning `false` / `None`.
pub struct Renderer {
    state: RendererState,
    backend: Option<Backend>,
    registry: LightRegistry,
    target_size: (u32, u32),
    /// Set when a texture changes; the registry tracks its own changes.
    scene_dirty: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            state: RendererState::Uninitialized,
            backend: None,
            registry: LightRegistry::new(),
            target_size: (0, 0),
            scene_dirty: false,
        }
    }

    /// Allocate backend resources for a `width × height` target.
    ///
    /// `Auto` falls back to the CPU kernel only when no adapter exists; shader
    /// or pipeline validation failures are returned as errors. Calling `init`
    /// again (including after `dispose`) drops all bound textures and starts over.
    pub fn init(
        &mut self,
        target_size: (u32, u32),
        preference: BackendPreference,
    ) -> Result<(), RelightError> {
        let (width, height) = target_size;
        if width == 0 || height == 0 {
            return Err(RelightError::InvalidTargetSize { width, height });
        }

        let mut backend = create_backend(preference)?;
        if !backend.resize_target(width, height) {
            return Err(RelightError::InvalidTargetSize { width, height });
        }
        log::info!(
            "Renderer initialized: {:?} backend, target {}x{}",
            backend.kind(),
            width,
            height
        );

        self.backend = Some(backend);
        self.target_size = target_size;
        self.state = RendererState::Initialized;
        self.scene_dirty = true;
        Ok(())
    }

    fn accepts_textures(&self, what: &str) -> bool {
        match self.state {
            RendererState::Initialized | RendererState::Ready => true,
            state => {
                log::warn!("{what} ignored: renderer is {state:?}");
                false
            }
        }
    }

    /// Bind the color image and resize the target to its dimensions.
    pub fn set_image(&mut self, source: TextureSource) -> bool {
        if !self.accepts_textures("set_image") {
            return false;
        }
        let Some(image) = source.to_rgba8() else {
            log::warn!("set_image ignored: unusable texture source");
            return false;
        };
        let Some(backend) = self.backend.as_mut() else {
            return false;
        };

        let size = image.dimensions();
        if size != self.target_size {
            log::info!("Render target resized to {}x{}", size.0, size.1);
        }
        if !backend.resize_target(size.0, size.1) || !backend.set_color(image) {
            log::warn!(
                "set_image ignored: {}x{} image too large for the backend",
                size.0,
                size.1
            );
            return false;
        }
        self.target_size = size;
        self.state = RendererState::Ready;
        self.scene_dirty = true;
        true
    }

    pub fn set_depth(&mut self, depth: &DepthMap) -> bool {
        if !self.accepts_textures("set_depth") {
            return false;
        }
        let Some(backend) = self.backend.as_mut() else {
            return false;
        };
        if !backend.set_depth(depth) {
            log::warn!("set_depth ignored: depth map too large for the backend");
            return false;
        }
        self.scene_dirty = true;
        true
    }

    pub fn set_normals(&mut self, normals: &NormalMap) -> bool {
        if !self.accepts_textures("set_normals") {
            return false;
        }
        let Some(backend) = self.backend.as_mut() else {
            return false;
        };
        if !backend.set_normals(normals) {
            log::warn!("set_normals ignored: normal map too large for the backend");
            return false;
        }
        self.scene_dirty = true;
        true
    }

    /// Recompute the full image from the current textures and registry.
    /// Clears the registry's dirty flag on success.
    pub fn render(&mut self) -> Option<RgbaImage> {
        if self.state != RendererState::Ready {
            log::debug!("render skipped: renderer is {:?}", self.state);
            return None;
        }
        let backend = self.backend.as_mut()?;

        let (width, height) = self.target_size;
        let uniforms = ComposeUniforms::new(&self.registry, width, height, backend.flags());
        let frame = backend.compose(&uniforms)?;

        self.registry.mark_rendered();
        self.scene_dirty = false;
        log::debug!(
            "Rendered {}x{} with {} light(s)",
            width,
            height,
            uniforms.light_count
        );
        Some(frame)
    }

    /// Release every backend resource and clear the lights. Idempotent.
    pub fn dispose(&mut self) {
        if self.state == RendererState::Disposed {
            return;
        }
        self.backend = None;
        self.registry.clear_lights();
        self.target_size = (0, 0);
        self.state = RendererState::Disposed;
        log::info!("Renderer disposed");
    }

    /// Apply settings and replace the light rig from a loaded config.
    pub fn apply_config(&mut self, config: &RenderConfig) {
        self.registry.apply_settings(config.settings);
        self.registry.clear_lights();
        for light in &config.lights {
            self.registry.add_light(
                Vec2::from(light.position),
                Vec3::from(light.color),
                light.intensity,
            );
        }
    }

    /// Whether a `render` would produce a different frame than the last one.
    pub fn needs_render(&self) -> bool {
        self.state == RendererState::Ready && (self.scene_dirty || self.registry.needs_render())
    }

    pub fn registry(&self) -> &LightRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut LightRegistry {
        &mut self.registry
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    /// `None` unless initialized.
    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.backend.as_ref().map(Backend::kind)
    }

    /// GPU adapter name, `None` on the CPU kernel or before init.
    pub fn adapter_name(&self) -> Option<&str> {
        self.backend.as_ref().and_then(Backend::adapter_name)
    }

    /// Largest texture side the backend accepts. `None` means unbounded (CPU).
    pub fn max_texture_dimension(&self) -> Option<u32> {
        self.backend.as_ref().and_then(Backend::max_texture_dimension)
    }

    pub fn target_size(&self) -> (u32, u32) {
        self.target_size
    }
}

fn create_backend(preference: BackendPreference) -> Result<Backend, RelightError> {
    match preference {
        BackendPreference::Cpu => Ok(Backend::Cpu(CpuBackend::new())),
        BackendPreference::Gpu => Ok(Backend::Gpu(Box::new(GpuBackend::new()?))),
        BackendPreference::Auto => match GpuBackend::new() {
            Ok(gpu) => Ok(Backend::Gpu(Box::new(gpu))),
            Err(RelightError::AdapterNotFound(reason)) => {
                log::warn!("No GPU adapter ({reason}), using CPU compose kernel");
                Ok(Backend::Cpu(CpuBackend::new()))
            }
            Err(e) => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relight_core::LightingSettings;

    const W: u32 = 48;
    const H: u32 = 32;

    fn color() -> RgbaImage {
        RgbaImage::from_fn(W, H, |x, y| {
            image::Rgba([(x * 5) as u8, (y * 7) as u8, 140, 255])
        })
    }

    /// Near plateau on the left, far background on the right.
    fn step_depth() -> DepthMap {
        let values = (0..W * H)
            .map(|i| if i % W < W / 2 { 0.0 } else { 1.0 })
            .collect();
        DepthMap::new(W, H, values).expect("valid")
    }

    fn ready_renderer() -> Renderer {
        let mut r = Renderer::new();
        r.init((W, H), BackendPreference::Cpu).expect("cpu init");
        let img = color();
        assert!(r.set_image(TextureSource::Raster(&img)));
        let depth = step_depth();
        assert!(r.set_depth(&depth));
        assert!(r.set_normals(&relight_normals::generate_normal_map(&depth, 12.0)));
        r
    }

    #[test]
    fn test_lifecycle_states() {
        let mut r = Renderer::new();
        assert_eq!(r.state(), RendererState::Uninitialized);
        assert!(r.render().is_none());
        assert!(r.backend_kind().is_none());

        r.init((16, 16), BackendPreference::Cpu).expect("cpu init");
        assert_eq!(r.state(), RendererState::Initialized);
        assert_eq!(r.backend_kind(), Some(BackendKind::Cpu));
        assert!(r.adapter_name().is_none());
        assert!(r.max_texture_dimension().is_none());
        // Initialized but no image bound yet.
        assert!(r.render().is_none());

        let img = color();
        assert!(r.set_image(TextureSource::Raster(&img)));
        assert_eq!(r.state(), RendererState::Ready);
        assert!(r.render().is_some());

        r.dispose();
        assert_eq!(r.state(), RendererState::Disposed);
        assert!(r.render().is_none());
    }

    #[test]
    fn test_init_rejects_empty_target() {
        let mut r = Renderer::new();
        assert!(matches!(
            r.init((0, 10), BackendPreference::Cpu),
            Err(RelightError::InvalidTargetSize { width: 0, height: 10 })
        ));
        assert_eq!(r.state(), RendererState::Uninitialized);
    }

    #[test]
    fn test_textures_before_init_are_noops() {
        let mut r = Renderer::new();
        let img = color();
        assert!(!r.set_image(TextureSource::Raster(&img)));
        assert!(!r.set_depth(&step_depth()));
        assert!(!r.set_normals(&NormalMap::flat(W, H).expect("valid")));
        assert_eq!(r.state(), RendererState::Uninitialized);
    }

    #[test]
    fn test_set_image_resizes_target() {
        let mut r = Renderer::new();
        r.init((8, 8), BackendPreference::Cpu).expect("cpu init");
        let img = color();
        assert!(r.set_image(TextureSource::Raster(&img)));
        assert_eq!(r.target_size(), (W, H));
        let frame = r.render().expect("frame");
        assert_eq!(frame.dimensions(), (W, H));
    }

    #[test]
    fn test_malformed_packed_bytes_leave_state() {
        let mut r = Renderer::new();
        r.init((4, 4), BackendPreference::Cpu).expect("cpu init");
        let bytes = [0u8; 10];
        let bad = TextureSource::PackedBytes {
            width: 4,
            height: 4,
            channels: 4,
            bytes: &bytes,
        };
        assert!(!r.set_image(bad));
        assert_eq!(r.state(), RendererState::Initialized);
        assert_eq!(r.target_size(), (4, 4));
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut r = ready_renderer();
        r.registry_mut()
            .add_light(Vec2::new(0.2, 0.5), Vec3::new(1.0, 0.9, 0.7), 1.5);
        r.registry_mut()
            .add_light(Vec2::new(0.8, 0.2), Vec3::new(0.3, 0.5, 1.0), 0.8);
        let a = r.render().expect("frame");
        let b = r.render().expect("frame");
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_render_clears_dirty_flags() {
        let mut r = ready_renderer();
        assert!(r.needs_render());
        r.render().expect("frame");
        assert!(!r.needs_render());
        assert!(!r.registry().needs_render());

        r.registry_mut().set_ambient(0.4);
        assert!(r.needs_render());
        r.render().expect("frame");
        assert!(!r.needs_render());

        let depth = DepthMap::constant(W, H, 0.5).expect("valid");
        r.set_depth(&depth);
        assert!(r.needs_render());
    }

    #[test]
    fn test_add_then_remove_restores_frame() {
        let mut r = ready_renderer();
        r.registry_mut().add_light(Vec2::new(0.3, 0.4), Vec3::ONE, 1.0);
        r.registry_mut()
            .add_light(Vec2::new(0.7, 0.6), Vec3::new(1.0, 0.4, 0.2), 2.0);
        let before = r.render().expect("frame");

        let extra = r
            .registry_mut()
            .add_light(Vec2::new(0.5, 0.9), Vec3::new(0.2, 0.2, 1.0), 3.0)
            .expect("capacity available");
        let with_extra = r.render().expect("frame");
        assert_ne!(before.as_raw(), with_extra.as_raw());

        assert!(r.registry_mut().remove_light(extra));
        let after = r.render().expect("frame");
        assert_eq!(before.as_raw(), after.as_raw());
    }

    #[test]
    fn test_step_edge_is_shadowed() {
        let mut r = ready_renderer();
        r.registry_mut().set_ssao_strength(0.0);
        r.registry_mut().add_light(Vec2::new(0.25, 0.5), Vec3::ONE, 1.5);

        r.registry_mut().set_shadow_strength(0.0);
        let unshadowed = r.render().expect("frame");
        r.registry_mut().set_shadow_strength(1.0);
        let shadowed = r.render().expect("frame");

        // First far pixel right of the step, facing the light across it.
        let (x, y) = (W / 2 + 1, H / 2);
        let lit = unshadowed.get_pixel(x, y).0;
        let dark = shadowed.get_pixel(x, y).0;
        assert!(dark[0] < lit[0] && dark[2] < lit[2], "{dark:?} vs {lit:?}");

        // Pixels on the near plateau are never occluded.
        let near = (W / 4, H / 2);
        assert_eq!(unshadowed.get_pixel(near.0, near.1), shadowed.get_pixel(near.0, near.1));
    }

    #[test]
    fn test_without_shadow_or_ssao_depth_has_no_effect() {
        let mut with_depth = ready_renderer();
        let mut flat = Renderer::new();
        flat.init((W, H), BackendPreference::Cpu).expect("cpu init");
        let img = color();
        flat.set_image(TextureSource::Raster(&img));
        flat.set_normals(&relight_normals::generate_normal_map(&step_depth(), 12.0));

        for r in [&mut with_depth, &mut flat] {
            r.registry_mut().apply_settings(LightingSettings {
                shadow_strength: 0.0,
                ssao_strength: 0.0,
                ..LightingSettings::default()
            });
            r.registry_mut().add_light(Vec2::new(0.6, 0.4), Vec3::ONE, 1.0);
        }
        assert_eq!(
            with_depth.render().expect("frame").as_raw(),
            flat.render().expect("frame").as_raw()
        );
    }

    #[test]
    fn test_dispose_is_idempotent_and_clears_lights() {
        let mut r = ready_renderer();
        r.registry_mut().add_light(Vec2::splat(0.5), Vec3::ONE, 1.0);
        r.dispose();
        assert!(r.registry().is_empty());
        assert!(r.backend_kind().is_none());
        r.dispose();
        assert_eq!(r.state(), RendererState::Disposed);

        let img = color();
        assert!(!r.set_image(TextureSource::Raster(&img)));
        assert!(r.render().is_none());
    }

    #[test]
    fn test_reinit_after_dispose_starts_fresh() {
        let mut r = ready_renderer();
        r.dispose();
        r.init((W, H), BackendPreference::Cpu).expect("cpu init");
        assert_eq!(r.state(), RendererState::Initialized);
        // Previous textures were released with the old backend.
        assert!(r.render().is_none());
        let img = color();
        assert!(r.set_image(TextureSource::Raster(&img)));
        assert!(r.render().is_some());
    }

    #[test]
    fn test_apply_config_replaces_rig() {
        let mut r = Renderer::new();
        r.registry_mut().add_light(Vec2::ZERO, Vec3::ONE, 1.0);
        let config = relight_core::load_config_from_str(
            "(settings: (ambient: 0.25), lights: [(position: (0.5, 0.3), intensity: 1.5)])",
        )
        .expect("parse");
        r.apply_config(&config);
        assert_eq!(r.registry().len(), 1);
        assert_eq!(r.registry().lights()[0].position, Vec2::new(0.5, 0.3));
        assert_eq!(r.registry().settings().ambient, 0.25);
    }
}
