//! Backend-agnostic rendering core.
//!
//! Both backends build on the same pieces:
//! - [`GeometryBatch`]: quad staging + single-draw flush
//! - [`FrameTransform`]: pixel-to-NDC projection
//! - [`SwapChainManager`]: surface + color target with resize recovery
//! - [`RendererBackend`]: the lifecycle contract
//!
//! Convention: CPU geometry is in pixels (top-left origin, +Y down).

mod backend;
mod batch;
mod config;
mod factory;
mod swapchain;
mod transform;
mod vertex;

pub use backend::{BackendKind, ClearMask, FrameStats, LifecycleState, RendererBackend};
pub use batch::{BatchSink, GeometryBatch, VertexBuffer};
pub use config::{BackendConfig, DEFAULT_BATCH_CAPACITY};
pub use factory::try_make_renderer;
pub use swapchain::{PresentSurface, SwapChainManager};
pub use transform::{ortho_off_center, FrameTransform, TransformUniform, Z_FAR, Z_NEAR};
pub use vertex::{quad_vertices, validate_layout, Vertex, DEFAULT_MASK, QUAD_VERTEX_COUNT};
