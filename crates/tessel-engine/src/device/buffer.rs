use crate::render::{Vertex, VertexBuffer};

/// Fixed-capacity GPU vertex buffer backing the batch.
pub struct GpuVertexBuffer {
    buffer: wgpu::Buffer,
    capacity: usize,
}

impl GpuVertexBuffer {
    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessel batch vbo"),
            size: (capacity * Vertex::SIZE) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer, capacity }
    }

    #[inline]
    pub fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

impl VertexBuffer for GpuVertexBuffer {
    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }
}
