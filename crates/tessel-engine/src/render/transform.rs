use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::coords::Extent;

/// Depth range of the projection. Quads sit at `z = 0`, which maps to depth 0.
pub const Z_NEAR: f32 = 0.0;
pub const Z_FAR: f32 = 1.0;

/// Orthographic off-center projection (right-handed, depth in `[0, 1]`).
///
/// Column-major, matching WGSL `mat4x4<f32>` and the software rasterizer.
#[inline]
pub fn ortho_off_center(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    Mat4::orthographic_rh(left, right, bottom, top, near, far)
}

/// Pixel-to-NDC projection for the current output size.
///
/// Maps `(0, 0)` to `(-1, 1)` and `(width, height)` to `(1, -1)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTransform {
    size: Extent,
    matrix: Mat4,
}

impl FrameTransform {
    pub fn new(size: Extent) -> Self {
        Self {
            size,
            matrix: Self::projection(size),
        }
    }

    /// Recomputes the matrix if `size` changed. Returns `true` when it did.
    pub fn update(&mut self, size: Extent) -> bool {
        if size == self.size {
            return false;
        }
        self.size = size;
        self.matrix = Self::projection(size);
        true
    }

    #[inline]
    pub fn size(&self) -> Extent {
        self.size
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// Projects a pixel-space position (at `z = 0`) into normalized device space.
    #[inline]
    pub fn to_ndc(&self, position: [f32; 2]) -> [f32; 2] {
        let clip = self.matrix * Vec4::new(position[0], position[1], 0.0, 1.0);
        [clip.x / clip.w, clip.y / clip.w]
    }

    #[inline]
    pub fn to_uniform(&self) -> TransformUniform {
        TransformUniform {
            matrix: self.matrix.to_cols_array_2d(),
        }
    }

    fn projection(size: Extent) -> Mat4 {
        let (w, h) = size.to_f32_clamped();
        // Top-left origin: bottom edge is `h`, top edge is 0.
        ortho_off_center(0.0, w, h, 0.0, Z_NEAR, Z_FAR)
    }
}

/// Constant-buffer contents uploaded once per frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct TransformUniform {
    pub matrix: [[f32; 4]; 4],
}
