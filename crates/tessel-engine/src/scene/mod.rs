//! Frame draw list.
//!
//! The application records colored quads here each frame; the renderer
//! consumes them in paint order (z-index, then insertion order).

mod list;
mod order;
mod quad;

pub use list::{DrawItem, DrawList};
pub use order::{SortKey, ZIndex};
pub use quad::Quad;
