//! wgpu rendering backend.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - configuring the window surface and acquiring backbuffers
//! - compiling the quad pipeline and recording batch draws

mod backend;
mod buffer;
mod frame;
mod gpu;
mod init;
mod pipeline;
mod surface;

pub use backend::WgpuBackend;
pub use buffer::GpuVertexBuffer;
pub use frame::{record_clear, FramePass};
pub use gpu::GpuDevice;
pub use init::{present_mode, GpuInit};
pub use pipeline::{PipelineState, ShaderSource};
pub use surface::{AcquiredFrame, SurfaceErrorAction, WgpuSurface, WgpuTarget};
