use winit::window::Window;

use crate::coords::{Extent, Viewport};
use crate::error::{RenderError, RenderResult};
use crate::paint::Color;
use crate::render::{
    BackendConfig, BackendKind, ClearMask, FrameStats, FrameTransform, GeometryBatch,
    LifecycleState, RendererBackend, SwapChainManager, Vertex,
};
use crate::scene::DrawList;

use super::buffer::GpuVertexBuffer;
use super::frame::{record_clear, FramePass};
use super::gpu::GpuDevice;
use super::pipeline::{PipelineState, ShaderSource};
use super::surface::WgpuSurface;

/// Declared in release order: fields drop top to bottom.
struct Resources<'w> {
    batch: GeometryBatch<GpuVertexBuffer>,
    pipeline: PipelineState,
    swapchain: SwapChainManager<WgpuSurface<'w>>,
    gpu: GpuDevice,
}

/// Hardware backend on wgpu, presenting to a winit window.
///
/// The window must outlive the backend; `'w` ties the surface to it.
pub struct WgpuBackend<'w> {
    window: &'w Window,
    config: BackendConfig,
    state: LifecycleState,
    size: Extent,
    transform: FrameTransform,
    /// Open command encoder for the current frame; `None` when the frame was skipped.
    encoder: Option<wgpu::CommandEncoder>,
    resources: Option<Resources<'w>>,
}

impl<'w> WgpuBackend<'w> {
    pub fn new(window: &'w Window, config: BackendConfig) -> Self {
        let size = window.inner_size().into();
        Self {
            window,
            config,
            state: LifecycleState::Uninitialized,
            size,
            transform: FrameTransform::new(size),
            encoder: None,
            resources: None,
        }
    }

    /// Surface format chosen at init.
    pub fn surface_format(&self) -> Option<wgpu::TextureFormat> {
        self.resources.as_ref().map(|r| r.swapchain.surface().format())
    }

    pub fn swapchain(&self) -> Option<&SwapChainManager<WgpuSurface<'w>>> {
        self.resources.as_ref().map(|r| &r.swapchain)
    }

    fn create_resources(&self, size: Extent) -> RenderResult<Resources<'w>> {
        let gpu_init = &self.config.gpu;
        let (gpu, surface) = pollster::block_on(GpuDevice::request(self.window, gpu_init))
            .map_err(|e| RenderError::Init(format!("{e:#}")))?;

        let surface = WgpuSurface::new(
            surface,
            gpu.adapter(),
            gpu.device().clone(),
            gpu.lost_flag(),
            gpu_init,
            self.config.vsync,
        )?;
        let swapchain = SwapChainManager::init(surface, size)?;

        let pipeline = PipelineState::new(
            gpu.device(),
            &ShaderSource::quad(),
            Vertex::layout(),
            swapchain.surface().format(),
            Viewport::from_extent(size),
        )?;

        let buffer = GpuVertexBuffer::new(gpu.device(), self.config.batch_capacity);
        let batch = GeometryBatch::new(buffer);

        Ok(Resources { batch, pipeline, swapchain, gpu })
    }
}

fn missing_resources(op: &'static str, state: LifecycleState) -> RenderError {
    RenderError::InvalidState { op, reason: state.as_str() }
}

impl RendererBackend for WgpuBackend<'_> {
    fn kind(&self) -> BackendKind {
        BackendKind::Wgpu
    }

    fn state(&self) -> LifecycleState {
        self.state
    }

    fn init(&mut self) -> RenderResult<()> {
        self.state.require("init", &[LifecycleState::Uninitialized])?;
        self.config.validate()?;

        let size: Extent = self.window.inner_size().into();
        if size.is_zero_area() {
            return Err(RenderError::Init(format!("window has zero size ({size})")));
        }

        // Everything is built into locals first; an error drops them in place.
        let resources = self.create_resources(size)?;

        self.size = size;
        self.transform = FrameTransform::new(size);
        self.resources = Some(resources);
        self.state = LifecycleState::Initialized;
        log::info!(
            "wgpu renderer initialized ({size}, {} vertex batch)",
            self.config.batch_capacity
        );
        Ok(())
    }

    fn before_render(&mut self, output_size: Extent) -> RenderResult<()> {
        self.state.require(
            "before_render",
            &[LifecycleState::Initialized, LifecycleState::Rendering],
        )?;
        let res = self
            .resources
            .as_mut()
            .ok_or_else(|| missing_resources("before_render", self.state))?;

        if res.swapchain.on_before_render(output_size)? {
            res.pipeline.set_viewport(Viewport::from_extent(res.swapchain.size()));
        }
        self.size = res.swapchain.size();
        self.state = LifecycleState::Rendering;

        let (surface, target) = res.swapchain.parts_mut()?;
        if !surface.acquire(target)? {
            self.encoder = None;
            return Ok(());
        }
        if self.encoder.is_none() {
            self.encoder = Some(res.gpu.device().create_command_encoder(
                &wgpu::CommandEncoderDescriptor { label: Some("tessel frame encoder") },
            ));
        }
        Ok(())
    }

    fn clear_backbuffer(
        &mut self,
        color: Color,
        _depth: f32,
        _stencil: u8,
        mask: ClearMask,
    ) -> RenderResult<()> {
        self.state.require("clear_backbuffer", &[LifecycleState::Rendering])?;
        if !mask.contains(ClearMask::COLOR) {
            return Ok(());
        }
        let Some(encoder) = self.encoder.as_mut() else {
            return Ok(());
        };
        let res = self
            .resources
            .as_mut()
            .ok_or_else(|| missing_resources("clear_backbuffer", self.state))?;
        if let Some(view) = res.swapchain.target_mut()?.view() {
            record_clear(encoder, view, color);
        }
        Ok(())
    }

    fn render(&mut self, draw_list: &mut DrawList) -> RenderResult<FrameStats> {
        self.state.require("render", &[LifecycleState::Rendering])?;
        let Some(encoder) = self.encoder.as_mut() else {
            log::debug!("backbuffer unavailable; frame skipped");
            return Ok(FrameStats::skipped());
        };
        let Resources { batch, pipeline, swapchain, gpu } = self
            .resources
            .as_mut()
            .ok_or_else(|| missing_resources("render", self.state))?;

        self.transform.update(self.size);
        pipeline.upload_transform(gpu.queue(), &self.transform.to_uniform());

        let view = swapchain.target_mut()?.view().ok_or(RenderError::InvalidState {
            op: "render",
            reason: "no backbuffer acquired",
        })?;

        let quads = match batch.append_draw_list(draw_list) {
            Ok(n) => n as u32,
            Err(err) => {
                batch.discard();
                return Err(err);
            }
        };

        let mut pass = FramePass {
            device: gpu.device(),
            encoder,
            view,
            pipeline,
            draw_calls: 0,
        };
        let vertices = batch.flush(&mut pass)?;

        Ok(FrameStats {
            quads,
            vertices,
            draw_calls: pass.draw_calls,
            skipped: false,
        })
    }

    fn after_render(&mut self) -> RenderResult<()> {
        self.state.require("after_render", &[LifecycleState::Rendering])?;
        self.state = LifecycleState::Initialized;

        let res = self
            .resources
            .as_mut()
            .ok_or_else(|| missing_resources("after_render", self.state))?;

        if let Some(encoder) = self.encoder.take() {
            res.gpu.queue().submit(std::iter::once(encoder.finish()));
            self.window.pre_present_notify();
        }
        res.swapchain.present(self.config.vsync)
    }

    fn shutdown(&mut self) -> RenderResult<()> {
        if self.state == LifecycleState::ShutDown {
            return Err(RenderError::InvalidState {
                op: "shutdown",
                reason: self.state.as_str(),
            });
        }

        drop(self.encoder.take());
        if let Some(Resources { batch, pipeline, swapchain, gpu }) = self.resources.take() {
            drop(batch);
            drop(pipeline);
            swapchain.shutdown();
            drop(gpu);
        }
        self.state = LifecycleState::ShutDown;
        log::info!("wgpu renderer shut down");
        Ok(())
    }

    fn output_size(&self) -> Extent {
        self.size
    }

    fn transform(&self) -> &FrameTransform {
        &self.transform
    }
}
