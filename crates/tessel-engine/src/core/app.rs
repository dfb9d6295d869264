use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::paint::Color;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by hosts.
pub trait App {
    /// Backbuffer clear color for every frame.
    fn clear_color(&self) -> Color {
        Color::CORNFLOWER_BLUE
    }

    /// Called for window events before the runtime handles them.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Records the frame's quads into `ctx`.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;
}
