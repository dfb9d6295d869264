//! Tessel engine crate.
//!
//! A batched 2D quad renderer: applications record colored quads into a draw
//! list each frame and a backend (wgpu or the CPU rasterizer) draws them with a
//! single call per frame.

pub mod coords;
pub mod core;
pub mod device;
pub mod error;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
pub mod software;
pub mod window;
