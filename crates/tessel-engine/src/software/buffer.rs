use bytemuck::Zeroable;

use crate::error::{RenderError, RenderResult};
use crate::render::{Vertex, VertexBuffer};

/// Fixed-capacity vertex storage for the software backend.
///
/// Writes go through [`MappedRange`], which unmaps on drop; draws refuse a
/// mapped buffer.
#[derive(Debug)]
pub struct CpuVertexBuffer {
    data: Box<[Vertex]>,
    len: usize,
    mapped: bool,
}

impl CpuVertexBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![Vertex::zeroed(); capacity].into_boxed_slice(),
            len: 0,
            mapped: false,
        }
    }

    /// Maps the whole buffer for writing. The previous contents are discarded.
    pub fn map_write(&mut self) -> RenderResult<MappedRange<'_>> {
        if self.mapped {
            return Err(RenderError::InvalidState {
                op: "map_write",
                reason: "buffer is already mapped",
            });
        }
        self.mapped = true;
        self.len = 0;
        Ok(MappedRange { buffer: self })
    }

    #[inline]
    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    /// Vertices written by the last upload.
    #[inline]
    pub fn contents(&self) -> &[Vertex] {
        &self.data[..self.len]
    }
}

impl VertexBuffer for CpuVertexBuffer {
    #[inline]
    fn capacity(&self) -> usize {
        self.data.len()
    }
}

/// Scoped write access to a [`CpuVertexBuffer`].
pub struct MappedRange<'a> {
    buffer: &'a mut CpuVertexBuffer,
}

impl MappedRange<'_> {
    /// Copies `vertices` to the start of the buffer.
    pub fn write(&mut self, vertices: &[Vertex]) -> RenderResult<()> {
        let capacity = self.buffer.data.len();
        if vertices.len() > capacity {
            return Err(RenderError::CapacityExceeded { requested: vertices.len(), capacity });
        }
        self.buffer.data[..vertices.len()].copy_from_slice(vertices);
        self.buffer.len = vertices.len();
        Ok(())
    }
}

impl Drop for MappedRange<'_> {
    fn drop(&mut self) {
        self.buffer.mapped = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Color;

    #[test]
    fn write_replaces_contents_and_unmaps() {
        let mut buf = CpuVertexBuffer::new(6);
        let v = Vertex::colored([1.0, 2.0], Color::RED);
        {
            let mut range = buf.map_write().unwrap();
            range.write(&[v, v, v]).unwrap();
        }
        assert!(!buf.is_mapped());
        assert_eq!(buf.contents(), &[v, v, v]);

        {
            let mut range = buf.map_write().unwrap();
            range.write(&[v]).unwrap();
        }
        assert_eq!(buf.contents().len(), 1);
    }

    #[test]
    fn failed_write_still_unmaps() {
        let mut buf = CpuVertexBuffer::new(2);
        let v = Vertex::colored([0.0, 0.0], Color::WHITE);
        {
            let mut range = buf.map_write().unwrap();
            assert!(range.write(&[v; 3]).is_err());
        }
        assert!(!buf.is_mapped());
        assert!(buf.contents().is_empty());
        assert_eq!(buf.capacity(), 2);
    }
}
