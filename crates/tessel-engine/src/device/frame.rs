use wgpu::util::DeviceExt;

use crate::error::RenderResult;
use crate::paint::Color;
use crate::render::{BatchSink, Vertex};

use super::buffer::GpuVertexBuffer;
use super::pipeline::PipelineState;

fn color_attachment(
    view: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
) -> wgpu::RenderPassColorAttachment<'_> {
    wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load,
            store: wgpu::StoreOp::Store,
        },
        depth_slice: None,
    }
}

/// Records a pass that only clears `view` to `color`.
pub fn record_clear(encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, color: Color) {
    let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("tessel clear"),
        color_attachments: &[Some(color_attachment(view, wgpu::LoadOp::Clear(color.into())))],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });
}

/// Batch sink recording into the frame's command encoder.
///
/// Uploads go through a staging buffer copied on the encoder, so each flush reads
/// the vertices it uploaded even when a frame flushes more than once.
pub struct FramePass<'a> {
    pub device: &'a wgpu::Device,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub view: &'a wgpu::TextureView,
    pub pipeline: &'a PipelineState,
    pub draw_calls: u32,
}

impl BatchSink for FramePass<'_> {
    type Buffer = GpuVertexBuffer;

    fn upload(&mut self, buffer: &mut GpuVertexBuffer, vertices: &[Vertex]) -> RenderResult<()> {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        // Mapped at creation, filled, then unmapped before the copy is recorded.
        let staging = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tessel batch staging"),
            contents: bytes,
            usage: wgpu::BufferUsages::COPY_SRC,
        });
        self.encoder
            .copy_buffer_to_buffer(&staging, 0, buffer.raw(), 0, bytes.len() as u64);
        Ok(())
    }

    fn draw(&mut self, buffer: &GpuVertexBuffer, vertex_count: u32) -> RenderResult<()> {
        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tessel batch"),
            color_attachments: &[Some(color_attachment(self.view, wgpu::LoadOp::Load))],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        self.pipeline.bind(&mut pass);
        pass.set_vertex_buffer(0, buffer.raw().slice(..));
        pass.draw(0..vertex_count, 0..1);
        self.draw_calls += 1;
        Ok(())
    }
}
