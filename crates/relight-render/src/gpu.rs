use image::RgbaImage;
use relight_core::constants::{
    DIFFUSE_TERMINATOR_EDGE, FALLOFF_SCALE, MAX_LIGHTS, NEAR_DEPTH, SHADOW_BAND_MAX,
    SHADOW_BAND_MIN, SHADOW_BIAS, SHADOW_BLUR_RADIUS_PX, SHADOW_DISTANCE_WEIGHT,
    SHADOW_MAX_DISTANCE, SHADOW_SHAPE_MIN, SHADOW_STEPS, SPECULAR_EXPONENT, SSAO_BIAS,
    SSAO_BYPASS_EPSILON, SSAO_DIRECTIONS, SSAO_RADIUS_PX, SSAO_RANGE, SSAO_SAMPLE_COUNT,
    WORKGROUP_SIZE,
};
use relight_core::{DepthMap, NormalMap, RelightError};

use crate::uniforms::{ComposeUniforms, FLAG_HAS_DEPTH, FLAG_HAS_NORMALS};

/// Storage texture written by the kernel plus the staging buffer it is copied into.
struct OutputTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    staging: wgpu::Buffer,
    width: u32,
    height: u32,
    /// `width * 4` rounded up to `COPY_BYTES_PER_ROW_ALIGNMENT`.
    padded_bytes_per_row: u32,
}

/// Compute-shader backend. Owns the device, the compose pipeline and every
/// texture the kernel reads or writes (concrete, no traits).
///
/// Pipeline and uniform buffer are built once in `new`; textures are rebuilt
/// only when their source changes.
pub struct GpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    /// `max_texture_dimension_2d` of the created device.
    max_texture_dimension: u32,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    color: Option<wgpu::TextureView>,
    depth: Option<wgpu::TextureView>,
    normals: Option<wgpu::TextureView>,
    output: Option<OutputTarget>,
    /// Invalidated whenever a bound texture is replaced.
    bind_group: Option<wgpu::BindGroup>,
}

impl GpuBackend {
    /// Request an adapter and device and build the compose pipeline. Blocks on
    /// the async wgpu calls.
    pub fn new() -> Result<Self, RelightError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| RelightError::AdapterNotFound("no compatible GPU adapter".into()))?;

        let adapter_name = adapter.get_info().name;
        log::info!(
            "Relight adapter: {} ({:?})",
            adapter_name,
            adapter.get_info().backend
        );

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("relight-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .map_err(|e| RelightError::DeviceRequestFailed(format!("{e}")))?;

        let max_texture_dimension = device.limits().max_texture_dimension_2d;
        log::debug!("Max texture dimension: {max_texture_dimension}");

        let (pipeline, bind_group_layout) = Self::create_pipeline(&device)?;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("compose-uniforms"),
            size: std::mem::size_of::<ComposeUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            device,
            queue,
            adapter_name,
            max_texture_dimension,
            pipeline,
            bind_group_layout,
            uniform_buffer,
            color: None,
            depth: None,
            normals: None,
            output: None,
            bind_group: None,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    pub fn max_texture_dimension(&self) -> u32 {
        self.max_texture_dimension
    }

    fn check_size(&self, what: &str, width: u32, height: u32) -> bool {
        if fits_texture_limit(width, height, self.max_texture_dimension) {
            return true;
        }
        log::warn!(
            "{what} {width}x{height} exceeds the device limit of {} px",
            self.max_texture_dimension
        );
        false
    }

    fn create_pipeline(
        device: &wgpu::Device,
    ) -> Result<(wgpu::ComputePipeline, wgpu::BindGroupLayout), RelightError> {
        let sampling_wgsl = include_str!("../../../shaders/common/sampling.wgsl");
        let compose_wgsl = include_str!("../../../shaders/relight/compose.wgsl");
        let source = format!("{}\n{sampling_wgsl}\n{compose_wgsl}", shader_preamble());

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("compose-shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RelightError::ShaderCompilationFailed(format!("{err}")));
        }

        let sampled = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("compose-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                sampled(1),
                sampled(2),
                sampled(3),
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba8Unorm,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("compose-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("compose-pipeline"),
            layout: Some(&layout),
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RelightError::PipelineCreationFailed(format!("{err}")));
        }

        Ok((pipeline, bind_group_layout))
    }

    /// (Re)create the output storage texture and staging buffer. Returns
    /// `false` and keeps the old target if the size exceeds the device limit.
    pub fn resize_target(&mut self, width: u32, height: u32) -> bool {
        if let Some(out) = &self.output {
            if out.width == width && out.height == height {
                return true;
            }
        }
        if !self.check_size("Render target", width, height) {
            return false;
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("compose-output"),
            size: extent(width, height),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let padded_bytes_per_row = padded_bytes_per_row(width);
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("compose-staging"),
            size: padded_bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::debug!("GPU target resized to {width}x{height}");
        self.output = Some(OutputTarget {
            texture,
            view,
            staging,
            width,
            height,
            padded_bytes_per_row,
        });
        self.bind_group = None;
        true
    }

    pub fn upload_color(&mut self, image: &RgbaImage) -> bool {
        if !self.check_size("Color image", image.width(), image.height()) {
            return false;
        }
        self.color = Some(self.upload(
            "color-texture",
            image.width(),
            image.height(),
            wgpu::TextureFormat::Rgba8Unorm,
            image.as_raw(),
        ));
        self.bind_group = None;
        true
    }

    pub fn upload_depth(&mut self, depth: &DepthMap) -> bool {
        if !self.check_size("Depth map", depth.width(), depth.height()) {
            return false;
        }
        self.depth = Some(self.upload(
            "depth-texture",
            depth.width(),
            depth.height(),
            wgpu::TextureFormat::R32Float,
            bytemuck::cast_slice(depth.values()),
        ));
        self.bind_group = None;
        true
    }

    pub fn upload_normals(&mut self, normals: &NormalMap) -> bool {
        if !self.check_size("Normal map", normals.width(), normals.height()) {
            return false;
        }
        let encoded = normals.to_rgba8();
        self.normals = Some(self.upload(
            "normal-texture",
            normals.width(),
            normals.height(),
            wgpu::TextureFormat::Rgba8Unorm,
            encoded.as_raw(),
        ));
        self.bind_group = None;
        true
    }

    fn upload(
        &self,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        bytes: &[u8],
    ) -> wgpu::TextureView {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(width, height),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let bytes_per_texel = format.block_copy_size(None).unwrap_or(4);
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * bytes_per_texel),
                rows_per_image: Some(height),
            },
            extent(width, height),
        );
        texture.create_view(&wgpu::TextureViewDescriptor::default())
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

    fn ensure_bind_group(&mut self) -> bool {
        if self.bind_group.is_some() {
            return true;
        }
        let (Some(color), Some(output)) = (&self.color, &self.output) else {
            return false;
        };
        // Missing depth/normals bind the color view; FLAG bits keep the kernel from reading it.
        let depth_view = self.depth.as_ref().unwrap_or(color);
        let normal_view = self.normals.as_ref().unwrap_or(color);

        self.bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("compose-bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(color),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(depth_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(normal_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&output.view),
                },
            ],
        }));
        true
    }

    /// Dispatch the compose kernel and read the result back. `None` when no
    /// color image or target is bound, or the readback fails.
    pub fn compose(&mut self, uniforms: &ComposeUniforms) -> Option<RgbaImage> {
        if !self.ensure_bind_group() {
            return None;
        }
        let (Some(bind_group), Some(output)) = (&self.bind_group, &self.output) else {
            return None;
        };

        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("compose-encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("compose-pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(
                output.width.div_ceil(WORKGROUP_SIZE),
                output.height.div_ceil(WORKGROUP_SIZE),
                1,
            );
        }
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &output.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output.staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(output.padded_bytes_per_row),
                    rows_per_image: Some(output.height),
                },
            },
            extent(output.width, output.height),
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        read_back(&self.device, output)
    }
}

/// Blocking readback of the staging buffer, stripping row padding.
fn read_back(device: &wgpu::Device, output: &OutputTarget) -> Option<RgbaImage> {
    let slice = output.staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            log::warn!("compose readback failed: {e}");
            return None;
        }
        Err(_) => {
            log::warn!("compose readback callback dropped");
            return None;
        }
    }

    let row_bytes = (output.width * 4) as usize;
    let data = slice.get_mapped_range();
    let mut pixels = Vec::with_capacity(row_bytes * output.height as usize);
    for row in data.chunks_exact(output.padded_bytes_per_row as usize) {
        pixels.extend_from_slice(&row[..row_bytes]);
    }
    drop(data);
    output.staging.unmap();

    RgbaImage::from_raw(output.width, output.height, pixels)
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

/// Whether a `width × height` 2D texture is allowed under `max_dimension`.
pub fn fits_texture_limit(width: u32, height: u32, max_dimension: u32) -> bool {
    width <= max_dimension && height <= max_dimension
}

fn padded_bytes_per_row(width: u32) -> u32 {
    (width * 4).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
}

/// WGSL constant block prepended to the compose shader, generated from
/// `relight_core::constants` so both backends share one definition.
pub fn shader_preamble() -> String {
    let dirs = SSAO_DIRECTIONS
        .iter()
        .map(|[x, y]| format!("vec2<f32>({x:?}, {y:?})"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "const MAX_LIGHTS: u32 = {MAX_LIGHTS}u;\n\
         const WORKGROUP_SIZE: u32 = {WORKGROUP_SIZE}u;\n\
         const FLAG_HAS_DEPTH: u32 = {FLAG_HAS_DEPTH}u;\n\
         const FLAG_HAS_NORMALS: u32 = {FLAG_HAS_NORMALS}u;\n\
         const NEAR_DEPTH: f32 = {NEAR_DEPTH:?};\n\
         const SSAO_SAMPLE_COUNT: u32 = {SSAO_SAMPLE_COUNT}u;\n\
         const SSAO_RADIUS_PX: f32 = {SSAO_RADIUS_PX:?};\n\
         const SSAO_BIAS: f32 = {SSAO_BIAS:?};\n\
         const SSAO_RANGE: f32 = {SSAO_RANGE:?};\n\
         const SSAO_BYPASS_EPSILON: f32 = {SSAO_BYPASS_EPSILON:?};\n\
         const SSAO_DIRECTIONS = array<vec2<f32>, {SSAO_SAMPLE_COUNT}>({dirs});\n\
         const DIFFUSE_TERMINATOR_EDGE: f32 = {DIFFUSE_TERMINATOR_EDGE:?};\n\
         const SPECULAR_EXPONENT: f32 = {SPECULAR_EXPONENT:?};\n\
         const FALLOFF_SCALE: f32 = {FALLOFF_SCALE:?};\n\
         const SHADOW_STEPS: u32 = {SHADOW_STEPS}u;\n\
         const SHADOW_MAX_DISTANCE: f32 = {SHADOW_MAX_DISTANCE:?};\n\
         const SHADOW_BLUR_RADIUS_PX: f32 = {SHADOW_BLUR_RADIUS_PX:?};\n\
         const SHADOW_BIAS: f32 = {SHADOW_BIAS:?};\n\
         const SHADOW_BAND_MIN: f32 = {SHADOW_BAND_MIN:?};\n\
         const SHADOW_BAND_MAX: f32 = {SHADOW_BAND_MAX:?};\n\
         const SHADOW_DISTANCE_WEIGHT: f32 = {SHADOW_DISTANCE_WEIGHT:?};\n\
         const SHADOW_SHAPE_MIN: f32 = {SHADOW_SHAPE_MIN:?};\n"
    )
}
