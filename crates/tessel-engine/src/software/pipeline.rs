use glam::{Mat4, Vec4};

use crate::coords::Viewport;
use crate::error::{RenderError, RenderResult};
use crate::paint::Color;
use crate::render::{validate_layout, TransformUniform, Vertex};

use super::framebuffer::Framebuffer;
use super::raster::{fill_triangle, ScreenVertex};

/// Vertex stage output: clip-space position plus the color to interpolate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClipVertex {
    pub clip: Vec4,
    pub color: [f32; 4],
}

pub type VertexProgram = fn(&Vertex, &Mat4) -> ClipVertex;
pub type FragmentProgram = fn([f32; 4]) -> Color;

/// Compiled program pair for the CPU pipeline.
#[derive(Debug, Copy, Clone)]
pub struct SoftwareProgram {
    pub label: &'static str,
    pub vertex: VertexProgram,
    pub fragment: FragmentProgram,
}

impl SoftwareProgram {
    /// Solid-color quad program, the CPU twin of `quad.wgsl`.
    pub fn quad() -> Self {
        Self {
            label: "tessel quad",
            vertex: quad_vs,
            fragment: quad_fs,
        }
    }
}

fn quad_vs(vertex: &Vertex, transform: &Mat4) -> ClipVertex {
    let [x, y] = vertex.position;
    ClipVertex {
        clip: *transform * Vec4::new(x, y, 0.0, 1.0),
        color: vertex.color,
    }
}

fn quad_fs(color: [f32; 4]) -> Color {
    Color::from(color)
}

/// Program, input layout, transform and viewport for the software backend.
#[derive(Debug)]
pub struct SoftwarePipeline {
    program: SoftwareProgram,
    transform: Mat4,
    viewport: Viewport,
}

impl SoftwarePipeline {
    pub fn new(
        program: SoftwareProgram,
        layout: &wgpu::VertexBufferLayout<'_>,
        viewport: Viewport,
    ) -> RenderResult<Self> {
        validate_layout(layout)?;
        if !viewport.is_valid() {
            return Err(RenderError::Init(format!("invalid viewport {viewport:?}")));
        }
        log::debug!("software pipeline '{}' created", program.label);
        Ok(Self {
            program,
            transform: Mat4::IDENTITY,
            viewport,
        })
    }

    pub fn upload_transform(&mut self, uniform: &TransformUniform) {
        self.transform = Mat4::from_cols_array_2d(&uniform.matrix);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Rasterizes `vertices` as a triangle list into `target`. Trailing vertices
    /// that do not form a triangle are ignored. Returns covered pixels.
    pub fn draw(&self, target: &mut Framebuffer, vertices: &[Vertex]) -> usize {
        let mut written = 0;
        for tri in vertices.chunks_exact(3) {
            let screen = [self.project(&tri[0]), self.project(&tri[1]), self.project(&tri[2])];
            let [Some(a), Some(b), Some(c)] = screen else {
                continue;
            };
            written += fill_triangle(target, [a, b, c], self.program.fragment);
        }
        written
    }

    fn project(&self, vertex: &Vertex) -> Option<ScreenVertex> {
        let out = (self.program.vertex)(vertex, &self.transform);
        if out.clip.w <= 0.0 {
            return None;
        }
        let ndc = [out.clip.x / out.clip.w, out.clip.y / out.clip.w];
        Some(ScreenVertex {
            position: self.viewport.ndc_to_pixel(ndc),
            color: out.color,
        })
    }
}
