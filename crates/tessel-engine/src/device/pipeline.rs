use std::borrow::Cow;
use std::num::NonZeroU64;

use bytemuck::bytes_of;

use crate::coords::Viewport;
use crate::error::{RenderError, RenderResult};
use crate::render::{validate_layout, TransformUniform};

/// WGSL program with its two entry points.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub label: &'static str,
    pub source: Cow<'static, str>,
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
}

impl ShaderSource {
    /// Built-in solid-color quad program.
    pub fn quad() -> Self {
        Self {
            label: "tessel quad shader",
            source: Cow::Borrowed(include_str!("shaders/quad.wgsl")),
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
        }
    }

    /// Rejects programs that cannot possibly link before handing them to the driver.
    pub fn validate(&self) -> RenderResult<()> {
        if self.source.trim().is_empty() {
            return Err(RenderError::Init(format!("shader '{}' has no source", self.label)));
        }
        if self.vertex_entry.is_empty() || self.fragment_entry.is_empty() {
            return Err(RenderError::Init(format!(
                "shader '{}' is missing an entry point name",
                self.label
            )));
        }
        Ok(())
    }
}

fn compile(device: &wgpu::Device, shader: &ShaderSource) -> RenderResult<wgpu::ShaderModule> {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(shader.label),
        source: wgpu::ShaderSource::Wgsl(shader.source.clone()),
    });

    let info = pollster::block_on(module.get_compilation_info());
    let mut errors = Vec::new();
    for msg in &info.messages {
        match msg.message_type {
            wgpu::CompilationMessageType::Error => errors.push(msg.message.clone()),
            wgpu::CompilationMessageType::Warning => {
                log::warn!("shader '{}': {}", shader.label, msg.message)
            }
            _ => {
                log::debug!("shader '{}': {}", shader.label, msg.message)
            }
        }
    }
    if !errors.is_empty() {
        return Err(RenderError::Init(format!(
            "shader '{}' failed to compile: {}",
            shader.label,
            errors.join("; ")
        )));
    }
    Ok(module)
}

/// Runs `f` inside a validation error scope.
///
/// Validation failures would otherwise reach the device's uncaptured-error
/// handler, which panics.
fn with_validation_scope<T>(
    device: &wgpu::Device,
    label: &str,
    f: impl FnOnce() -> RenderResult<T>,
) -> RenderResult<T> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let out = f();
    if let Some(err) = pollster::block_on(scope.pop()) {
        log::error!("'{label}' rejected by the device: {err}");
        return Err(RenderError::Init(format!("'{label}' rejected by the device: {err}")));
    }
    out
}

/// Compiled programs, input layout, transform constant buffer and viewport.
///
/// Immutable after creation apart from the transform contents and the viewport,
/// which follows the output size.
pub struct PipelineState {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    transform_ubo: wgpu::Buffer,
    viewport: Viewport,
}

impl PipelineState {
    pub fn new(
        device: &wgpu::Device,
        shader: &ShaderSource,
        vertex_layout: wgpu::VertexBufferLayout<'static>,
        format: wgpu::TextureFormat,
        viewport: Viewport,
    ) -> RenderResult<Self> {
        validate_layout(&vertex_layout)?;
        if !viewport.is_valid() {
            return Err(RenderError::Init(format!("invalid viewport {viewport:?}")));
        }
        shader.validate()?;

        let (pipeline, bind_group, transform_ubo) =
            with_validation_scope(device, shader.label, || {
                Self::build(device, shader, vertex_layout, format)
            })?;

        log::debug!("pipeline '{}' created for {format:?}", shader.label);

        Ok(Self {
            pipeline,
            bind_group,
            transform_ubo,
            viewport,
        })
    }

    fn build(
        device: &wgpu::Device,
        shader: &ShaderSource,
        vertex_layout: wgpu::VertexBufferLayout<'static>,
        format: wgpu::TextureFormat,
    ) -> RenderResult<(wgpu::RenderPipeline, wgpu::BindGroup, wgpu::Buffer)> {
        let module = compile(device, shader)?;

        let uniform_size = std::mem::size_of::<TransformUniform>() as u64;
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessel transform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(uniform_size),
                },
                count: None,
            }],
        });

        let transform_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessel transform ubo"),
            size: uniform_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tessel transform bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_ubo.as_entire_binding(),
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessel quad pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tessel quad pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(shader.vertex_entry),
                compilation_options: Default::default(),
                buffers: &[vertex_layout],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some(shader.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok((pipeline, bind_group, transform_ubo))
    }

    /// Sets pipeline, transform binding and viewport on `pass`.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        let v = self.viewport;
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_viewport(v.x, v.y, v.width, v.height, v.min_depth, v.max_depth);
    }

    pub fn upload_transform(&self, queue: &wgpu::Queue, uniform: &TransformUniform) {
        queue.write_buffer(&self.transform_ubo, 0, bytes_of(uniform));
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}
