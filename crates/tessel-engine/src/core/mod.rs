//! Contracts between the runtime (platform loop) and applications, plus the
//! per-frame driver both the windowed and headless paths use.

mod app;
mod ctx;
mod frame;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
pub use frame::{drive_frame, run_headless, FrameOutcome};
