use bitflags::bitflags;

use crate::coords::Extent;
use crate::error::{RenderError, RenderResult};
use crate::paint::Color;
use crate::scene::DrawList;

use super::FrameTransform;

/// Backend variants selectable through [`try_make_renderer`](super::try_make_renderer).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum BackendKind {
    /// No renderer; the factory returns nothing.
    None,
    /// Hardware-accelerated backend on top of wgpu.
    #[default]
    Wgpu,
    /// CPU rasterizer into an in-memory framebuffer.
    Software,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::None => "none",
            BackendKind::Wgpu => "wgpu",
            BackendKind::Software => "software",
        }
    }

    /// Parses a backend name (case-insensitive). Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" => Some(BackendKind::None),
            "wgpu" | "gpu" | "hardware" => Some(BackendKind::Wgpu),
            "software" | "cpu" => Some(BackendKind::Software),
            _ => None,
        }
    }
}

bitflags! {
    /// Which parts of the backbuffer `clear_backbuffer` should clear.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct ClearMask: u8 {
        const NONE = 0;
        const COLOR = 1;
        const DEPTH = 2;
        const STENCIL = 4;
        const ALL = Self::COLOR.bits() | Self::DEPTH.bits() | Self::STENCIL.bits();
    }
}

/// Backend lifecycle.
///
/// `Initialized` is "between frames"; `Rendering` is "a frame is open"
/// (after `before_render`, until `after_render`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Rendering,
    ShutDown,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "renderer is not initialized",
            LifecycleState::Initialized => "no frame in progress",
            LifecycleState::Rendering => "a frame is already in progress",
            LifecycleState::ShutDown => "renderer was shut down",
        }
    }

    /// Errors with [`RenderError::InvalidState`] unless `self` is one of `allowed`.
    pub fn require(self, op: &'static str, allowed: &[LifecycleState]) -> RenderResult<()> {
        if allowed.contains(&self) {
            Ok(())
        } else {
            Err(RenderError::InvalidState { op, reason: self.as_str() })
        }
    }
}

/// Per-frame draw statistics returned by [`RendererBackend::render`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    /// Quads staged from the draw list.
    pub quads: u32,
    /// Vertices uploaded and drawn.
    pub vertices: u32,
    pub draw_calls: u32,
    /// The backbuffer could not be acquired this frame; nothing was recorded.
    pub skipped: bool,
}

impl FrameStats {
    pub(crate) fn skipped() -> Self {
        Self { skipped: true, ..Self::default() }
    }
}

/// Renderer lifecycle contract shared by every backend.
///
/// Call order per frame: `before_render` → (`clear_backbuffer`) → `render` →
/// `after_render`. All calls must come from the thread that owns the window.
pub trait RendererBackend {
    fn kind(&self) -> BackendKind;

    fn state(&self) -> LifecycleState;

    /// Creates the device, swap chain, pipeline state and batch buffer.
    ///
    /// On failure nothing stays referenced by the backend; discard the instance.
    fn init(&mut self) -> RenderResult<()>;

    /// Per-tick hook independent of rendering.
    fn update(&mut self) {}

    /// Handles output-size changes and begins a frame.
    fn before_render(&mut self, output_size: Extent) -> RenderResult<()>;

    /// Clears the color target when `mask` contains [`ClearMask::COLOR`].
    ///
    /// There is no depth/stencil target: `depth`, `stencil` and the matching mask
    /// bits are accepted and ignored.
    fn clear_backbuffer(
        &mut self,
        color: Color,
        depth: f32,
        stencil: u8,
        mask: ClearMask,
    ) -> RenderResult<()>;

    /// Binds the pipeline, uploads the frame transform, batches `draw_list` and
    /// flushes it as one draw call.
    fn render(&mut self, draw_list: &mut DrawList) -> RenderResult<FrameStats>;

    /// Presents the frame.
    fn after_render(&mut self) -> RenderResult<()>;

    /// Releases everything in reverse acquisition order. Not idempotent.
    fn shutdown(&mut self) -> RenderResult<()>;

    /// Output size observed by the last `before_render` (or at init).
    fn output_size(&self) -> Extent;

    /// Projection used by the most recent `render`.
    fn transform(&self) -> &FrameTransform;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_backend_names() {
        assert_eq!(BackendKind::parse("WGPU"), Some(BackendKind::Wgpu));
        assert_eq!(BackendKind::parse(" software "), Some(BackendKind::Software));
        assert_eq!(BackendKind::parse("none"), Some(BackendKind::None));
        assert_eq!(BackendKind::parse("opengl"), None);
    }

    #[test]
    fn clear_mask_all_contains_color() {
        assert!(ClearMask::ALL.contains(ClearMask::COLOR));
        assert!(!ClearMask::DEPTH.contains(ClearMask::COLOR));
        assert!(ClearMask::empty().is_empty());
        assert_eq!(ClearMask::NONE, ClearMask::empty());
        assert!(!ClearMask::NONE.contains(ClearMask::COLOR));
    }

    #[test]
    fn require_reports_current_state() {
        let err = LifecycleState::ShutDown
            .require("render", &[LifecycleState::Rendering])
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidState { op: "render", reason: "renderer was shut down" }
        ));
        assert!(LifecycleState::Rendering
            .require("render", &[LifecycleState::Rendering])
            .is_ok());
    }
}
