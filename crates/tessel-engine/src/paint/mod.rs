//! Color model shared between the host and the backends.

mod color;

pub use color::Color;
