use pixelate_core::{
    BlendMode, BlockSize, BufferId, FilterOptions, PixelateConfig, PixelateOptions, Size,
    UniformBuffer,
};
use thiserror::Error;
use wgpu::util::DeviceExt;
use wgpu::{BindGroup, BindGroupLayout, Buffer, Device, RenderPipeline, Sampler};

use crate::program::{Backend, Program, ProgramError, ProgramErrorKind, ProgramPair, Stage};

/// Block size as the fragment stage sees it. Must match `PixelateUniforms`
/// in `pixelate.wgsl` and the `pixelateUniforms` block in `pixelate.frag`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PixelateUniforms {
    pub size: [f32; 2],
    pub _pad: [f32; 2], // keep 16-byte alignment
}

impl PixelateUniforms {
    pub fn new(size: BlockSize) -> Self {
        Self {
            size: size.to_array(),
            _pad: [0.0; 2],
        }
    }
}

/// Per-draw values supplied by the filter host, group 0 binding 0.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalFilterUniforms {
    /// xy = render-target size in pixels, zw = 1 / xy.
    pub input_size: [f32; 4],
}

impl GlobalFilterUniforms {
    pub fn for_target([width, height]: [u32; 2]) -> Self {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        Self {
            input_size: [w, h, 1.0 / w, 1.0 / h],
        }
    }
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error(transparent)]
    Program(#[from] ProgramError),
}

// ---------------------------------------------------------------------------
// PixelateFilter
// ---------------------------------------------------------------------------

/// `uSize` as captured for one buffer identity and version.
///
/// The GPU buffer behind `bind_group` is never written after creation, so
/// passes already recorded with it keep the value they were recorded with.
struct SizeBinding {
    key: (BufferId, u64),
    bind_group: BindGroup,
}

impl SizeBinding {
    fn new(device: &Device, layout: &BindGroupLayout, buffer: &UniformBuffer) -> Self {
        let uniforms = PixelateUniforms::new(buffer.value());
        let gpu_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("pixelateUniforms"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pixelate_uniforms_bg"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: gpu_buf.as_entire_binding(),
            }],
        });
        log::trace!("uSize -> {:?}", uniforms.size);
        Self {
            key: (buffer.id(), buffer.version()),
            bind_group,
        }
    }
}

fn globals_buffer(device: &Device, target_size: [u32; 2]) -> Buffer {
    let globals = GlobalFilterUniforms::for_target(target_size);
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("pixelate_globals"),
        contents: bytemuck::bytes_of(&globals),
        usage: wgpu::BufferUsages::UNIFORM,
    })
}

/// The pixelate effect bound to a wgpu device.
///
/// Owns the host-side configuration, both backend programs and their
/// pipelines. Each [`apply`](Self::apply) binds uniform buffers holding the
/// block size and target size as they are at that call, so several passes
/// recorded into one submission each draw with their own values.
pub struct PixelateFilter {
    config: PixelateConfig,
    programs: ProgramPair,
    /// Indexed by [`Backend::index`].
    pipelines: [RenderPipeline; 2],
    target_format: wgpu::TextureFormat,

    input_bgl: BindGroupLayout,
    uniform_bgl: BindGroupLayout,
    sampler: Sampler,

    /// Snapshot of the config's `uSize` buffer; rebuilt when it goes stale.
    size_binding: SizeBinding,
    /// Resolution uniform for the last target size seen by `apply`.
    globals: Option<([u32; 2], Buffer)>,
}

impl PixelateFilter {
    /// Build both programs for `target_format`.
    ///
    /// Fails if either backend's program does not parse, validate or compile
    /// on `device`; the filter is not usable in that case.
    pub fn new(
        device: &Device,
        target_format: wgpu::TextureFormat,
        options: impl Into<PixelateOptions>,
    ) -> Result<Self, FilterError> {
        let config = PixelateConfig::new(options);
        let programs = ProgramPair::pixelate();
        programs.validate()?;

        // --- bind group layouts ----------------------------------------------
        // group 0 : filter input (globals, source texture, sampler)
        // group 1 : pixelateUniforms
        let input_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pixelate_input_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pixelate_uniforms_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pixelate_pl"),
            bind_group_layouts: &[&input_bgl, &uniform_bgl],
            push_constant_ranges: &[],
        });

        let size_binding = SizeBinding::new(device, &uniform_bgl, config.buffer());

        // Blocks must come out as flat colour, so no filtering between texels.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("pixelate_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // --- pipelines -------------------------------------------------------
        let blend = blend_state(config.base_options().blend_mode);
        let pipelines = [
            make_pipeline(device, &programs.gpu, &pipeline_layout, target_format, blend)?,
            make_pipeline(device, &programs.gl, &pipeline_layout, target_format, blend)?,
        ];
        log::debug!(
            "pixelate filter ready: {:?}, size {}",
            target_format,
            config.size()
        );

        Ok(Self {
            config,
            programs,
            pipelines,
            target_format,
            input_bgl,
            uniform_bgl,
            sampler,
            size_binding,
            globals: None,
        })
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    pub fn size(&self) -> BlockSize {
        self.config.size()
    }

    pub fn set_size(&mut self, size: impl Into<Size>) {
        self.config.set_size(size);
    }

    pub fn size_x(&self) -> f32 {
        self.config.size_x()
    }

    pub fn set_size_x(&mut self, x: f32) {
        self.config.set_size_x(x);
    }

    pub fn size_y(&self) -> f32 {
        self.config.size_y()
    }

    pub fn set_size_y(&mut self, y: f32) {
        self.config.set_size_y(y);
    }

    pub fn config(&self) -> &PixelateConfig {
        &self.config
    }

    pub fn base_options(&self) -> &FilterOptions {
        self.config.base_options()
    }

    pub fn programs(&self) -> &ProgramPair {
        &self.programs
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    /// True when the host-side block size has changed since the last
    /// snapshot was taken for the GPU.
    pub fn needs_upload(&self) -> bool {
        let buffer = self.config.buffer();
        self.size_binding.key != (buffer.id(), buffer.version())
    }

    // -------------------------------------------------------------------------
    // Draw
    // -------------------------------------------------------------------------

    /// Record one pixelate pass from `source` into `target` using
    /// `backend`'s program, with the block size as it is now.
    ///
    /// Later size changes or calls with another `target_size` do not affect
    /// passes already recorded, even within the same submission.
    pub fn apply(
        &mut self,
        device: &Device,
        encoder: &mut wgpu::CommandEncoder,
        source: &wgpu::TextureView,
        target: &wgpu::TextureView,
        target_size: [u32; 2],
        backend: Backend,
    ) {
        if self.needs_upload() {
            self.size_binding = SizeBinding::new(device, &self.uniform_bgl, self.config.buffer());
        }
        let globals_buf = match self.globals.take() {
            Some((size, buf)) if size == target_size => buf,
            _ => globals_buffer(device, target_size),
        };
        let (_, globals_buf) = self.globals.insert((target_size, globals_buf));

        let input_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pixelate_input_bg"),
            layout: &self.input_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("pixelate_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipelines[backend.index()]);
        pass.set_bind_group(0, &input_bg, &[]);
        pass.set_bind_group(1, &self.size_binding.bind_group, &[]);
        pass.draw(0..3, 0..1); // one full-screen triangle
    }
}

// ---------------------------------------------------------------------------
// Pipeline construction
// ---------------------------------------------------------------------------

/// Colour blending for each base blend mode. Sources are premultiplied.
pub fn blend_state(mode: BlendMode) -> Option<wgpu::BlendState> {
    let both = |color: wgpu::BlendComponent| wgpu::BlendState {
        color,
        alpha: wgpu::BlendComponent::OVER,
    };
    match mode {
        BlendMode::Normal => Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
        BlendMode::Add => Some(both(wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        })),
        BlendMode::Multiply => Some(both(wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::Dst,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        })),
        BlendMode::Screen => Some(both(wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrc,
            operation: wgpu::BlendOperation::Add,
        })),
        BlendMode::None => None,
    }
}

fn shader_module(
    device: &Device,
    program: &Program,
    stage: Stage,
) -> Result<wgpu::ShaderModule, ProgramError> {
    let label = format!("{}:{}:{}", program.name, program.backend, stage);
    let source = match program.backend {
        Backend::Gpu => wgpu::ShaderSource::Wgsl(program.source(stage).into()),
        Backend::Gl => wgpu::ShaderSource::Glsl {
            shader: program.source(stage).into(),
            stage: stage.naga(),
            defines: Default::default(),
        },
    };

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&label),
        source,
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(program.error(stage, ProgramErrorKind::Device(err.to_string()))),
        None => Ok(module),
    }
}

fn make_pipeline(
    device: &Device,
    program: &Program,
    layout: &wgpu::PipelineLayout,
    target_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> Result<RenderPipeline, ProgramError> {
    let vertex = shader_module(device, program, Stage::Vertex)?;
    let fragment = shader_module(device, program, Stage::Fragment)?;
    let label = format!("{}:{}", program.name, program.backend);

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &vertex,
            entry_point: program.entry_points.vertex,
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &fragment,
            entry_point: program.entry_points.fragment,
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });
    // Link errors (stage interface mismatch) surface here.
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(program.error(
            Stage::Fragment,
            ProgramErrorKind::Device(format!("pipeline: {err}")),
        )),
        None => {
            log::debug!("pipeline {label} built");
            Ok(pipeline)
        }
    }
}
