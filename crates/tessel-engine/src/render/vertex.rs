use bytemuck::{Pod, Zeroable};

use crate::coords::Rect;
use crate::error::{RenderError, RenderResult};
use crate::paint::Color;

/// Vertices emitted per quad: two triangles, no index buffer.
pub const QUAD_VERTEX_COUNT: usize = 6;

/// Mask written into every vertex until tint/multiply modes exist.
pub const DEFAULT_MASK: [f32; 4] = [0.0, 0.0, 255.0, 0.0];

/// Batched vertex as laid out in the GPU vertex buffer.
///
/// Field order is part of the pipeline contract: the input layout binds
/// locations 0..=3 positionally to `position`, `tex_coord`, `color`, `mask`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Pixel-space position.
    pub position: [f32; 2],
    /// Reserved for textured draws; always `(0, 0)` for now.
    pub tex_coord: [f32; 2],
    /// Straight-alpha RGBA.
    pub color: [f32; 4],
    /// Reserved for tint/multiply operations.
    pub mask: [f32; 4],
}

impl Vertex {
    pub const SIZE: usize = std::mem::size_of::<Vertex>();

    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2, // tex_coord
        2 => Float32x4, // color
        3 => Float32x4  // mask
    ];

    #[inline]
    pub fn colored(position: [f32; 2], color: Color) -> Self {
        Self {
            position,
            tex_coord: [0.0, 0.0],
            color: color.to_array(),
            mask: DEFAULT_MASK,
        }
    }

    /// Input layout descriptor for the batch vertex buffer (slot 0).
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Expands a rectangle into two triangles `(p1, p2, p3), (p2, p4, p3)`.
///
/// Every quad uses the same winding, so a single rasterizer state covers the batch.
#[inline]
pub fn quad_vertices(rect: Rect, color: Color) -> [Vertex; QUAD_VERTEX_COUNT] {
    let [p1, p2, p3, p4] = rect.corners();
    [
        Vertex::colored(p1, color),
        Vertex::colored(p2, color),
        Vertex::colored(p3, color),
        Vertex::colored(p2, color),
        Vertex::colored(p4, color),
        Vertex::colored(p3, color),
    ]
}

/// Checks that `layout` matches the memory layout of [`Vertex`].
///
/// Attributes must bind locations `0..n` in field order, each inside the stride,
/// with no overlap. Both backends run this before creating their pipeline.
pub fn validate_layout(layout: &wgpu::VertexBufferLayout<'_>) -> RenderResult<()> {
    if layout.array_stride != Vertex::SIZE as u64 {
        return Err(RenderError::Init(format!(
            "vertex layout stride {} does not match vertex size {}",
            layout.array_stride,
            Vertex::SIZE
        )));
    }
    if layout.step_mode != wgpu::VertexStepMode::Vertex {
        return Err(RenderError::Init("vertex layout must step per vertex".into()));
    }

    let mut next_offset = 0u64;
    for (i, attr) in layout.attributes.iter().enumerate() {
        if attr.shader_location != i as u32 {
            return Err(RenderError::Init(format!(
                "vertex attribute {i} is bound to location {}",
                attr.shader_location
            )));
        }
        if attr.offset < next_offset {
            return Err(RenderError::Init(format!(
                "vertex attribute {i} overlaps the previous attribute"
            )));
        }
        next_offset = attr.offset + attr.format.size();
        if next_offset > layout.array_stride {
            return Err(RenderError::Init(format!(
                "vertex attribute {i} ends past the vertex stride"
            )));
        }
    }
    Ok(())
}
