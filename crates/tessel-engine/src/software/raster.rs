//! Triangle scan conversion.
//!
//! Pixels are sampled at their centers. A center lying exactly on an edge belongs
//! to the triangle only for top and left edges, so two triangles sharing an edge
//! never both cover a pixel.

use crate::paint::Color;

use super::framebuffer::Framebuffer;

/// Vertex after projection and viewport mapping.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenVertex {
    /// Pixel coordinates, +Y down.
    pub position: [f32; 2],
    pub color: [f32; 4],
}

#[inline]
fn edge(a: [f32; 2], b: [f32; 2], p: [f32; 2]) -> f32 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

/// Top-left rule for positively wound triangles in a +Y-down space.
#[inline]
fn owns_edge(a: [f32; 2], b: [f32; 2]) -> bool {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    dy < 0.0 || (dy == 0.0 && dx > 0.0)
}

#[inline]
fn covers(w: f32, owned: bool) -> bool {
    w > 0.0 || (w == 0.0 && owned)
}

/// Fills one triangle, shading each covered pixel with `shade` and blending the
/// result into `target`. Degenerate triangles cover nothing. Returns the number
/// of pixels written.
pub fn fill_triangle<F>(target: &mut Framebuffer, tri: [ScreenVertex; 3], mut shade: F) -> usize
where
    F: FnMut([f32; 4]) -> Color,
{
    let [v0, mut v1, mut v2] = tri;
    let mut area = edge(v0.position, v1.position, v2.position);
    if area == 0.0 || !area.is_finite() {
        return 0;
    }
    // No culling: flip negatively wound triangles.
    if area < 0.0 {
        std::mem::swap(&mut v1, &mut v2);
        area = -area;
    }

    let (p0, p1, p2) = (v0.position, v1.position, v2.position);
    let size = target.size();
    let min_x = p0[0].min(p1[0]).min(p2[0]).floor().max(0.0) as u32;
    let min_y = p0[1].min(p1[1]).min(p2[1]).floor().max(0.0) as u32;
    let max_x = (p0[0].max(p1[0]).max(p2[0]).ceil().max(0.0) as u32).min(size.width);
    let max_y = (p0[1].max(p1[1]).max(p2[1]).ceil().max(0.0) as u32).min(size.height);

    let own0 = owns_edge(p1, p2);
    let own1 = owns_edge(p2, p0);
    let own2 = owns_edge(p0, p1);

    let flat = v0.color == v1.color && v1.color == v2.color;

    let mut written = 0;
    for y in min_y..max_y {
        for x in min_x..max_x {
            let p = [x as f32 + 0.5, y as f32 + 0.5];
            let w0 = edge(p1, p2, p);
            let w1 = edge(p2, p0, p);
            let w2 = edge(p0, p1, p);
            if !(covers(w0, own0) && covers(w1, own1) && covers(w2, own2)) {
                continue;
            }

            let color = if flat {
                v0.color
            } else {
                let (l0, l1, l2) = (w0 / area, w1 / area, w2 / area);
                std::array::from_fn(|c| v0.color[c] * l0 + v1.color[c] * l1 + v2.color[c] * l2)
            };
            target.blend(x, y, shade(color));
            written += 1;
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Extent;

    fn sv(x: f32, y: f32) -> ScreenVertex {
        ScreenVertex { position: [x, y], color: Color::WHITE.to_array() }
    }

    fn opaque(c: [f32; 4]) -> Color {
        Color::from(c)
    }

    // ── coverage ─────────────────────────────────────────────────────────

    #[test]
    fn quad_split_into_two_triangles_covers_each_pixel_once() {
        let mut fb = Framebuffer::new(Extent::new(8, 8));
        let (tl, tr, bl, br) = (sv(2.0, 2.0), sv(6.0, 2.0), sv(2.0, 6.0), sv(6.0, 6.0));

        let a = fill_triangle(&mut fb, [tl, tr, bl], opaque);
        let b = fill_triangle(&mut fb, [tr, br, bl], opaque);

        assert_eq!(a + b, 16);
        assert_eq!(fb.pixel(2, 2), Some(Color::WHITE));
        assert_eq!(fb.pixel(5, 5), Some(Color::WHITE));
        assert_eq!(fb.pixel(6, 6), Some(Color::TRANSPARENT));
        assert_eq!(fb.pixel(1, 2), Some(Color::TRANSPARENT));
    }

    #[test]
    fn winding_does_not_matter() {
        let mut cw = Framebuffer::new(Extent::new(8, 8));
        let mut ccw = Framebuffer::new(Extent::new(8, 8));
        let n1 = fill_triangle(&mut cw, [sv(0.0, 0.0), sv(8.0, 0.0), sv(0.0, 8.0)], opaque);
        let n2 = fill_triangle(&mut ccw, [sv(0.0, 0.0), sv(0.0, 8.0), sv(8.0, 0.0)], opaque);
        assert_eq!(n1, n2);
        assert_eq!(cw, ccw);
    }

    #[test]
    fn degenerate_triangle_writes_nothing() {
        let mut fb = Framebuffer::new(Extent::new(4, 4));
        assert_eq!(fill_triangle(&mut fb, [sv(0.0, 0.0), sv(2.0, 2.0), sv(4.0, 4.0)], opaque), 0);
    }

    #[test]
    fn off_screen_parts_are_clipped() {
        let mut fb = Framebuffer::new(Extent::new(4, 4));
        let tri = [sv(-10.0, -10.0), sv(20.0, -10.0), sv(-10.0, 20.0)];
        let n = fill_triangle(&mut fb, tri, opaque);
        assert_eq!(n, 16);
    }

    // ── shading ──────────────────────────────────────────────────────────

    #[test]
    fn shade_callback_sees_interpolated_color() {
        let mut fb = Framebuffer::new(Extent::new(4, 4));
        let red = ScreenVertex { position: [0.0, 0.0], color: Color::RED.to_array() };
        let tri = [
            red,
            ScreenVertex { position: [4.0, 0.0], ..red },
            ScreenVertex { position: [0.0, 4.0], ..red },
        ];
        fill_triangle(&mut fb, tri, |c| {
            assert!((c[0] - 1.0).abs() < 1e-5 && c[1].abs() < 1e-5);
            Color::from(c)
        });
        assert_eq!(fb.pixel(0, 0), Some(Color::RED));
    }
}
