use crate::coords::Extent;
use crate::paint::Color;

/// CPU color buffer, row-major, top-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    size: Extent,
    pixels: Vec<Color>,
}

impl Framebuffer {
    /// Allocates a buffer filled with transparent black.
    pub fn new(size: Extent) -> Self {
        Self {
            size,
            pixels: vec![Color::TRANSPARENT; size.area()],
        }
    }

    #[inline]
    pub fn size(&self) -> Extent {
        self.size
    }

    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color.clamped());
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Source-over blend of a straight-alpha color, the same equation as
    /// `wgpu::BlendState::ALPHA_BLENDING`.
    pub fn blend(&mut self, x: u32, y: u32, src: Color) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        let src = src.clamped();
        let dst = self.pixels[i];
        let inv = 1.0 - src.a;
        self.pixels[i] = Color::new(
            src.r * src.a + dst.r * inv,
            src.g * src.a + dst.g * inv,
            src.b * src.a + dst.b * inv,
            src.a + dst.a * inv,
        );
    }

    /// Pixels as tightly packed RGBA8 rows.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| c.to_rgba8()).collect()
    }

    pub(crate) fn copy_from(&mut self, other: &Framebuffer) {
        if self.size != other.size {
            self.size = other.size;
            self.pixels.resize(other.pixels.len(), Color::TRANSPARENT);
        }
        self.pixels.copy_from_slice(&other.pixels);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.size.width && y < self.size.height)
            .then(|| y as usize * self.size.width as usize + x as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_then_read() {
        let mut fb = Framebuffer::new(Extent::new(4, 3));
        assert_eq!(fb.pixel(0, 0), Some(Color::TRANSPARENT));
        fb.clear(Color::RED);
        assert_eq!(fb.pixel(3, 2), Some(Color::RED));
        assert_eq!(fb.pixel(4, 0), None);
    }

    #[test]
    fn opaque_source_replaces_destination() {
        let mut fb = Framebuffer::new(Extent::new(1, 1));
        fb.clear(Color::CORNFLOWER_BLUE);
        fb.blend(0, 0, Color::YELLOW);
        assert_eq!(fb.pixel(0, 0), Some(Color::YELLOW));
    }

    #[test]
    fn half_alpha_mixes() {
        let mut fb = Framebuffer::new(Extent::new(1, 1));
        fb.clear(Color::BLACK);
        fb.blend(0, 0, Color::new(1.0, 1.0, 1.0, 0.5));
        let c = fb.pixel(0, 0).unwrap();
        assert!((c.r - 0.5).abs() < 1e-6);
        assert!((c.a - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rgba8_export_is_row_major() {
        let mut fb = Framebuffer::new(Extent::new(2, 1));
        fb.blend(1, 0, Color::WHITE);
        assert_eq!(fb.to_rgba8(), vec![0, 0, 0, 0, 255, 255, 255, 255]);
    }
}
