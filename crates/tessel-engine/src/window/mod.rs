//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and wires them to a renderer backend.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
