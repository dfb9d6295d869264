use crate::coords::{Extent, Viewport};
use crate::error::{RenderError, RenderResult};
use crate::paint::Color;
use crate::render::{
    BackendConfig, BackendKind, BatchSink, ClearMask, FrameStats, FrameTransform,
    GeometryBatch, LifecycleState, RendererBackend, SwapChainManager, Vertex,
};
use crate::scene::DrawList;

use super::buffer::CpuVertexBuffer;
use super::framebuffer::Framebuffer;
use super::pipeline::{SoftwarePipeline, SoftwareProgram};
use super::surface::{SoftwareSurface, SoftwareTarget};

/// Declared in release order: fields drop top to bottom.
struct Resources {
    batch: GeometryBatch<CpuVertexBuffer>,
    pipeline: SoftwarePipeline,
    swapchain: SwapChainManager<SoftwareSurface>,
}

/// Backend that rasterizes on the CPU into an in-memory surface.
///
/// Needs no window or GPU. The presented frame is readable through
/// [`front_buffer`](Self::front_buffer).
pub struct SoftwareBackend {
    config: BackendConfig,
    state: LifecycleState,
    size: Extent,
    transform: FrameTransform,
    resources: Option<Resources>,
}

impl SoftwareBackend {
    pub fn new(size: Extent, config: BackendConfig) -> Self {
        Self {
            config,
            state: LifecycleState::Uninitialized,
            size,
            transform: FrameTransform::new(size),
            resources: None,
        }
    }

    /// Last presented frame, if initialized.
    pub fn front_buffer(&self) -> Option<&Framebuffer> {
        self.resources.as_ref().map(|r| r.swapchain.surface().front_buffer())
    }

    pub fn swapchain(&self) -> Option<&SwapChainManager<SoftwareSurface>> {
        self.resources.as_ref().map(|r| &r.swapchain)
    }

    pub fn batch(&self) -> Option<&GeometryBatch<CpuVertexBuffer>> {
        self.resources.as_ref().map(|r| &r.batch)
    }

    /// Simulates device removal on the underlying surface.
    pub fn mark_device_lost(&mut self) {
        if let Some(res) = self.resources.as_mut() {
            res.swapchain.surface_mut().mark_device_lost();
        }
    }

    fn resources_mut(&mut self, op: &'static str) -> RenderResult<&mut Resources> {
        let state = self.state;
        self.resources
            .as_mut()
            .ok_or(RenderError::InvalidState { op, reason: state.as_str() })
    }
}

/// Draw sink for one flush: the bound pipeline plus the current backbuffer.
struct SoftwarePass<'a> {
    pipeline: &'a SoftwarePipeline,
    target: &'a mut Framebuffer,
    draw_calls: u32,
}

impl BatchSink for SoftwarePass<'_> {
    type Buffer = CpuVertexBuffer;

    fn upload(&mut self, buffer: &mut CpuVertexBuffer, vertices: &[Vertex]) -> RenderResult<()> {
        let mut range = buffer.map_write()?;
        range.write(vertices)
    }

    fn draw(&mut self, buffer: &CpuVertexBuffer, vertex_count: u32) -> RenderResult<()> {
        if buffer.is_mapped() {
            return Err(RenderError::InvalidState {
                op: "draw",
                reason: "vertex buffer is still mapped",
            });
        }
        let contents = buffer.contents();
        let count = (vertex_count as usize).min(contents.len());
        self.pipeline.draw(self.target, &contents[..count]);
        self.draw_calls += 1;
        Ok(())
    }
}

fn bound_backbuffer<'a>(
    swapchain: &'a mut SwapChainManager<SoftwareSurface>,
) -> RenderResult<&'a mut Framebuffer> {
    let (surface, target): (&mut SoftwareSurface, &mut SoftwareTarget) = swapchain.parts_mut()?;
    surface.check_target(target)?;
    Ok(surface.back_buffer_mut())
}

impl RendererBackend for SoftwareBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Software
    }

    fn state(&self) -> LifecycleState {
        self.state
    }

    fn init(&mut self) -> RenderResult<()> {
        self.state.require("init", &[LifecycleState::Uninitialized])?;
        self.config.validate()?;

        let swapchain = SwapChainManager::init(SoftwareSurface::new(), self.size)?;
        let pipeline = SoftwarePipeline::new(
            SoftwareProgram::quad(),
            &Vertex::layout(),
            Viewport::from_extent(self.size),
        )?;
        let batch = GeometryBatch::new(CpuVertexBuffer::new(self.config.batch_capacity));

        self.transform = FrameTransform::new(self.size);
        self.resources = Some(Resources { batch, pipeline, swapchain });
        self.state = LifecycleState::Initialized;
        log::info!(
            "software renderer initialized ({}, {} vertex batch)",
            self.size,
            self.config.batch_capacity
        );
        Ok(())
    }

    fn before_render(&mut self, output_size: Extent) -> RenderResult<()> {
        self.state.require(
            "before_render",
            &[LifecycleState::Initialized, LifecycleState::Rendering],
        )?;
        let res = self.resources_mut("before_render")?;

        if res.swapchain.on_before_render(output_size)? {
            res.pipeline.set_viewport(Viewport::from_extent(res.swapchain.size()));
        }
        let size = res.swapchain.size();
        self.size = size;
        self.state = LifecycleState::Rendering;
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
        let res = self.resources_mut("clear_backbuffer")?;
        if mask.contains(ClearMask::COLOR) {
            bound_backbuffer(&mut res.swapchain)?.clear(color);
        }
        Ok(())
    }

    fn render(&mut self, draw_list: &mut DrawList) -> RenderResult<FrameStats> {
        self.state.require("render", &[LifecycleState::Rendering])?;
        self.transform.update(self.size);
        let uniform = self.transform.to_uniform();

        let Resources { batch, pipeline, swapchain } = self
            .resources
            .as_mut()
            .ok_or(RenderError::InvalidState { op: "render", reason: "no resources" })?;

        pipeline.upload_transform(&uniform);
        let target = bound_backbuffer(swapchain)?;

        let quads = match batch.append_draw_list(draw_list) {
            Ok(n) => n as u32,
            Err(err) => {
                batch.discard();
                return Err(err);
            }
        };

        let mut pass = SoftwarePass { pipeline, target, draw_calls: 0 };
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
        let vsync = self.config.vsync;
        let res = self.resources_mut("after_render")?;
        let result = res.swapchain.present(vsync);
        self.state = LifecycleState::Initialized;
        result
    }

    fn shutdown(&mut self) -> RenderResult<()> {
        if self.state == LifecycleState::ShutDown {
            return Err(RenderError::InvalidState {
                op: "shutdown",
                reason: self.state.as_str(),
            });
        }
        if let Some(Resources { batch, pipeline, swapchain }) = self.resources.take() {
            drop(batch);
            drop(pipeline);
            swapchain.shutdown();
        }
        self.state = LifecycleState::ShutDown;
        log::info!("software renderer shut down");
        Ok(())
    }

    fn output_size(&self) -> Extent {
        self.size
    }

    fn transform(&self) -> &FrameTransform {
        &self.transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;
    use crate::scene::ZIndex;

    fn backend(width: u32, height: u32) -> SoftwareBackend {
        let mut b = SoftwareBackend::new(Extent::new(width, height), BackendConfig::default());
        b.init().unwrap();
        b
    }

    fn two_quads() -> DrawList {
        let mut list = DrawList::new();
        list.push_quad(ZIndex(0), Rect::new(100.0, 100.0, 50.0, 50.0), Color::RED);
        list.push_quad(ZIndex(0), Rect::new(200.0, 100.0, 50.0, 50.0), Color::YELLOW);
        list
    }

    fn frame(b: &mut SoftwareBackend, size: Extent, list: &mut DrawList) -> FrameStats {
        b.before_render(size).unwrap();
        b.clear_backbuffer(Color::CORNFLOWER_BLUE, 1.0, 0, ClearMask::ALL).unwrap();
        let stats = b.render(list).unwrap();
        b.after_render().unwrap();
        stats
    }

    // ── lifecycle ────────────────────────────────────────────────────────

    #[test]
    fn init_moves_to_initialized() {
        let b = backend(64, 64);
        assert_eq!(b.state(), LifecycleState::Initialized);
        assert_eq!(b.output_size(), Extent::new(64, 64));
    }

    #[test]
    fn zero_size_init_fails_without_resources() {
        let mut b = SoftwareBackend::new(Extent::new(0, 0), BackendConfig::default());
        assert!(matches!(b.init(), Err(RenderError::Init(_))));
        assert_eq!(b.state(), LifecycleState::Uninitialized);
        assert!(b.swapchain().is_none());
    }

    #[test]
    fn render_requires_before_render() {
        let mut b = backend(64, 64);
        let err = b.render(&mut DrawList::new()).unwrap_err();
        assert!(matches!(err, RenderError::InvalidState { op: "render", .. }));
    }

    #[test]
    fn second_shutdown_is_rejected() {
        let mut b = backend(64, 64);
        b.shutdown().unwrap();
        assert_eq!(b.state(), LifecycleState::ShutDown);
        assert!(b.front_buffer().is_none());
        assert!(matches!(b.shutdown(), Err(RenderError::InvalidState { .. })));
        assert!(b.before_render(Extent::new(64, 64)).is_err());
    }

    // ── frames ───────────────────────────────────────────────────────────

    #[test]
    fn two_quads_at_1280x720_draw_once() {
        let size = Extent::new(1280, 720);
        let mut b = backend(size.width, size.height);
        let stats = frame(&mut b, size, &mut two_quads());

        assert_eq!(stats.quads, 2);
        assert_eq!(stats.vertices, 12);
        assert_eq!(stats.draw_calls, 1);
        assert!(b.batch().unwrap().is_empty());

        let t = b.transform();
        let ndc = t.to_ndc([0.0, 0.0]);
        assert!((ndc[0] + 1.0).abs() < 1e-5 && (ndc[1] - 1.0).abs() < 1e-5);
        let ndc = t.to_ndc([1280.0, 720.0]);
        assert!((ndc[0] - 1.0).abs() < 1e-5 && (ndc[1] + 1.0).abs() < 1e-5);
    }

    #[test]
    fn presented_pixels_match_the_draw_list() {
        let size = Extent::new(1280, 720);
        let mut b = backend(size.width, size.height);
        frame(&mut b, size, &mut two_quads());

        let fb = b.front_buffer().unwrap();
        assert_eq!(fb.pixel(125, 125), Some(Color::RED));
        assert_eq!(fb.pixel(225, 125), Some(Color::YELLOW));
        assert_eq!(fb.pixel(175, 125), Some(Color::CORNFLOWER_BLUE));
        assert_eq!(fb.pixel(0, 0), Some(Color::CORNFLOWER_BLUE));
    }

    #[test]
    fn resize_rebuilds_target_once() {
        let mut b = backend(1280, 720);
        let mut list = two_quads();
        frame(&mut b, Extent::new(1280, 720), &mut list);

        frame(&mut b, Extent::new(800, 600), &mut list);
        let sc = b.swapchain().unwrap();
        assert_eq!(sc.generation(), 1);
        assert_eq!(sc.surface().targets_created(), 2);
        assert_eq!(sc.surface().targets_released(), 1);
        assert_eq!(b.output_size(), Extent::new(800, 600));

        let ndc = b.transform().to_ndc([800.0, 600.0]);
        assert!((ndc[0] - 1.0).abs() < 1e-5 && (ndc[1] + 1.0).abs() < 1e-5);
        assert_eq!(b.front_buffer().unwrap().size(), Extent::new(800, 600));
        assert_eq!(b.front_buffer().unwrap().pixel(125, 125), Some(Color::RED));
    }

    #[test]
    fn unchanged_size_keeps_generation() {
        let size = Extent::new(320, 240);
        let mut b = backend(size.width, size.height);
        for _ in 0..3 {
            frame(&mut b, size, &mut DrawList::new());
        }
        let sc = b.swapchain().unwrap();
        assert_eq!(sc.generation(), 0);
        assert_eq!(sc.surface().configure_count(), 1);
        assert_eq!(sc.surface().present_count(), 3);
    }

    #[test]
    fn minimized_window_keeps_previous_target() {
        let mut b = backend(320, 240);
        frame(&mut b, Extent::new(0, 0), &mut two_quads());
        assert_eq!(b.output_size(), Extent::new(320, 240));
        assert_eq!(b.swapchain().unwrap().generation(), 0);
    }

    #[test]
    fn empty_frame_issues_no_draw() {
        let size = Extent::new(64, 64);
        let mut b = backend(size.width, size.height);
        let stats = frame(&mut b, size, &mut DrawList::new());
        assert_eq!(stats, FrameStats::default());
    }

    #[test]
    fn clear_without_color_bit_keeps_contents() {
        let size = Extent::new(8, 8);
        let mut b = backend(size.width, size.height);
        b.before_render(size).unwrap();
        b.clear_backbuffer(Color::RED, 1.0, 0, ClearMask::COLOR).unwrap();
        b.clear_backbuffer(Color::WHITE, 1.0, 0, ClearMask::DEPTH | ClearMask::STENCIL).unwrap();
        b.clear_backbuffer(Color::WHITE, 1.0, 0, ClearMask::NONE).unwrap();
        b.render(&mut DrawList::new()).unwrap();
        b.after_render().unwrap();
        assert_eq!(b.front_buffer().unwrap().pixel(3, 3), Some(Color::RED));
    }

    // ── failures ─────────────────────────────────────────────────────────

    #[test]
    fn overflow_drops_the_frame_batch() {
        let config = BackendConfig { batch_capacity: 6, ..BackendConfig::default() };
        let size = Extent::new(320, 240);
        let mut b = SoftwareBackend::new(size, config);
        b.init().unwrap();
        b.before_render(size).unwrap();

        let err = b.render(&mut two_quads()).unwrap_err();
        assert!(matches!(err, RenderError::CapacityExceeded { requested: 12, capacity: 6 }));
        assert!(!err.is_fatal());
        assert!(b.batch().unwrap().is_empty());
        b.after_render().unwrap();
    }

    #[test]
    fn device_loss_fails_present() {
        let size = Extent::new(64, 64);
        let mut b = backend(size.width, size.height);
        b.before_render(size).unwrap();
        b.mark_device_lost();
        b.render(&mut two_quads()).unwrap();
        assert!(matches!(b.after_render(), Err(RenderError::Present(_))));
        assert!(matches!(b.before_render(Extent::new(32, 32)), Err(RenderError::Resize(_))));
        assert!(b.swapchain().unwrap().is_stale());
    }
}
