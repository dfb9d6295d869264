use super::Extent;

/// Rasterizer viewport in physical pixels, with its depth range.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-surface viewport with the `[0, 1]` depth range.
    #[inline]
    pub fn from_extent(size: Extent) -> Self {
        let (width, height) = size.to_f32_clamped();
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Maps an NDC position to pixel coordinates inside this viewport (+Y down).
    #[inline]
    pub fn ndc_to_pixel(self, ndc: [f32; 2]) -> [f32; 2] {
        [
            self.x + (ndc[0] + 1.0) * 0.5 * self.width,
            self.y + (1.0 - ndc[1]) * 0.5 * self.height,
        ]
    }
}
