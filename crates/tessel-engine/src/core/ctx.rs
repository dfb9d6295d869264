use crate::coords::{Extent, Rect};
use crate::paint::Color;
use crate::scene::{DrawList, ZIndex};

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
pub struct FrameCtx<'a> {
    /// Output size in physical pixels.
    pub size: Extent,
    /// Zero-based index of this frame.
    pub frame_index: u64,
    /// Cleared at the start of every frame.
    pub draw_list: &'a mut DrawList,
}

impl FrameCtx<'_> {
    /// Records a quad on the default layer.
    #[inline]
    pub fn quad(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.draw_list
            .push_quad(ZIndex::default(), Rect::new(x, y, width, height), color);
    }
}
