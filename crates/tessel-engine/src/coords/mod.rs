//! Coordinate and geometry types shared by the batcher and the backends.
//!
//! Canonical CPU space:
//! - physical pixels
//! - origin top-left
//! - +X right, +Y down
//!
//! Backends convert to NDC with the per-frame projection in `render::transform`.

mod extent;
mod rect;
mod viewport;

pub use extent::Extent;
pub use rect::Rect;
pub use viewport::Viewport;
