//! Quad batcher: CPU-side staging list + one fixed-capacity GPU vertex buffer.

use crate::coords::Rect;
use crate::error::{RenderError, RenderResult};
use crate::paint::Color;
use crate::scene::DrawList;

use super::vertex::{quad_vertices, Vertex, QUAD_VERTEX_COUNT};

/// GPU-visible vertex storage owned by a [`GeometryBatch`].
pub trait VertexBuffer {
    /// Maximum number of vertices the buffer holds.
    fn capacity(&self) -> usize;
}

/// Upload + draw seam between the batch and a backend's command stream.
pub trait BatchSink {
    type Buffer: VertexBuffer;

    /// Replaces the entire contents of `buffer` with `vertices`.
    ///
    /// Implementations open the buffer for writing, copy, and release it before
    /// returning, on every path.
    fn upload(&mut self, buffer: &mut Self::Buffer, vertices: &[Vertex]) -> RenderResult<()>;

    /// Issues one non-indexed triangle-list draw of `vertex_count` vertices from offset 0.
    fn draw(&mut self, buffer: &Self::Buffer, vertex_count: u32) -> RenderResult<()>;
}

/// Accumulates quads and flushes them as a single draw call.
///
/// Invariants:
/// - staged length is a multiple of [`QUAD_VERTEX_COUNT`]
/// - staged length never exceeds the buffer capacity
pub struct GeometryBatch<B> {
    vertices: Vec<Vertex>,
    buffer: B,
}

impl<B: VertexBuffer> GeometryBatch<B> {
    pub fn new(buffer: B) -> Self {
        Self {
            vertices: Vec::with_capacity(buffer.capacity()),
            buffer,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Number of staged vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Staged vertices in draw order.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Quads that still fit before the next flush.
    #[inline]
    pub fn remaining_quads(&self) -> usize {
        self.capacity().saturating_sub(self.vertices.len()) / QUAD_VERTEX_COUNT
    }

    #[inline]
    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Stages a quad with top-left `(x, y)`.
    ///
    /// Fails with [`RenderError::CapacityExceeded`] without staging anything if the
    /// quad does not fit; the batch never grows or flushes on its own.
    pub fn append_quad(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    ) -> RenderResult<()> {
        self.append_rect(Rect::new(x, y, width, height), color)
    }

    pub fn append_rect(&mut self, rect: Rect, color: Color) -> RenderResult<()> {
        let requested = self.vertices.len() + QUAD_VERTEX_COUNT;
        let capacity = self.capacity();
        if requested > capacity {
            return Err(RenderError::CapacityExceeded { requested, capacity });
        }
        self.vertices.extend_from_slice(&quad_vertices(rect, color));
        Ok(())
    }

    /// Stages every non-empty quad of `list` in paint order. Returns the number staged.
    ///
    /// On overflow the quads staged so far stay in the batch; callers usually
    /// [`discard`](Self::discard) them.
    pub fn append_draw_list(&mut self, list: &mut DrawList) -> RenderResult<usize> {
        let mut staged = 0;
        for item in list.iter_in_paint_order() {
            let rect = item.quad.rect.normalized();
            if rect.is_empty() || !rect.is_finite() {
                continue;
            }
            self.append_rect(rect, item.quad.color)?;
            staged += 1;
        }
        Ok(staged)
    }

    /// Uploads the staged vertices and draws them with one call.
    ///
    /// Empty batches are a no-op (no upload, no draw) and return 0. Otherwise the
    /// staged list is cleared whether or not the sink succeeded, and the number
    /// of drawn vertices is returned.
    pub fn flush<S>(&mut self, sink: &mut S) -> RenderResult<u32>
    where
        S: BatchSink<Buffer = B>,
    {
        if self.vertices.is_empty() {
            return Ok(0);
        }

        debug_assert_eq!(self.vertices.len() % QUAD_VERTEX_COUNT, 0);
        // Bounded by capacity, which the append path enforces.
        let count = self.vertices.len() as u32;

        let result = sink
            .upload(&mut self.buffer, &self.vertices)
            .and_then(|()| sink.draw(&self.buffer, count));

        self.vertices.clear();
        result.map(|()| count)
    }

    /// Drops staged vertices without drawing them.
    #[inline]
    pub fn discard(&mut self) {
        if !self.vertices.is_empty() {
            log::debug!("discarding {} staged vertices", self.vertices.len());
        }
        self.vertices.clear();
    }

    /// Releases the batch, returning its buffer.
    pub fn into_buffer(self) -> B {
        self.buffer
    }
}
