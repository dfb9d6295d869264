//! CPU rendering backend.
//!
//! Implements the same lifecycle as the wgpu backend against an in-memory
//! surface. Used for headless runs and to check rendered output in tests.

mod backend;
mod buffer;
mod framebuffer;
mod pipeline;
mod raster;
mod surface;

pub use backend::SoftwareBackend;
pub use buffer::{CpuVertexBuffer, MappedRange};
pub use framebuffer::Framebuffer;
pub use pipeline::{ClipVertex, FragmentProgram, SoftwarePipeline, SoftwareProgram, VertexProgram};
pub use raster::{fill_triangle, ScreenVertex};
pub use surface::{SoftwareSurface, SoftwareTarget};
