use std::cell::Cell;
use std::rc::Rc;

use crate::coords::Extent;
use crate::error::{RenderError, RenderResult};
use crate::render::PresentSurface;

use super::framebuffer::Framebuffer;

/// Color target bound to the current backbuffer of a [`SoftwareSurface`].
#[derive(Debug)]
pub struct SoftwareTarget {
    id: u64,
    size: Extent,
    released: Rc<Cell<u64>>,
}

impl SoftwareTarget {
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn size(&self) -> Extent {
        self.size
    }
}

impl Drop for SoftwareTarget {
    fn drop(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}

/// Double-buffered in-memory surface. Presenting copies the back buffer to the
/// front buffer, which callers read back.
#[derive(Debug)]
pub struct SoftwareSurface {
    back: Framebuffer,
    front: Framebuffer,
    configured: bool,
    lost: bool,

    targets_created: u64,
    targets_released: Rc<Cell<u64>>,
    configure_count: u64,
    present_count: u64,
}

impl SoftwareSurface {
    pub fn new() -> Self {
        Self {
            back: Framebuffer::new(Extent::default()),
            front: Framebuffer::new(Extent::default()),
            configured: false,
            lost: false,
            targets_created: 0,
            targets_released: Rc::new(Cell::new(0)),
            configure_count: 0,
            present_count: 0,
        }
    }

    #[inline]
    pub fn back_buffer_mut(&mut self) -> &mut Framebuffer {
        &mut self.back
    }

    /// Contents of the last presented frame.
    #[inline]
    pub fn front_buffer(&self) -> &Framebuffer {
        &self.front
    }

    /// Makes every following surface operation fail, like a removed device.
    pub fn mark_device_lost(&mut self) {
        self.lost = true;
    }

    #[inline]
    pub fn configure_count(&self) -> u64 {
        self.configure_count
    }

    #[inline]
    pub fn present_count(&self) -> u64 {
        self.present_count
    }

    #[inline]
    pub fn targets_created(&self) -> u64 {
        self.targets_created
    }

    #[inline]
    pub fn targets_released(&self) -> u64 {
        self.targets_released.get()
    }

    pub(crate) fn check_target(&self, target: &SoftwareTarget) -> RenderResult<()> {
        if target.size != self.back.size() {
            return Err(RenderError::InvalidState {
                op: "target",
                reason: "color target does not match the backbuffer",
            });
        }
        Ok(())
    }
}

impl Default for SoftwareSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl PresentSurface for SoftwareSurface {
    type Target = SoftwareTarget;

    fn configure(&mut self, size: Extent) -> RenderResult<()> {
        if self.lost {
            return Err(RenderError::Resize("device lost".into()));
        }
        if size.is_zero_area() {
            return Err(RenderError::Resize(format!("cannot configure surface at {size}")));
        }
        self.back = Framebuffer::new(size);
        self.configured = true;
        self.configure_count += 1;
        Ok(())
    }

    fn create_target(&mut self) -> RenderResult<SoftwareTarget> {
        if self.lost {
            return Err(RenderError::Resize("device lost".into()));
        }
        if !self.configured {
            return Err(RenderError::InvalidState {
                op: "create_target",
                reason: "surface is not configured",
            });
        }
        self.targets_created += 1;
        Ok(SoftwareTarget {
            id: self.targets_created,
            size: self.back.size(),
            released: Rc::clone(&self.targets_released),
        })
    }

    fn present(&mut self, target: &mut SoftwareTarget, _vsync: bool) -> RenderResult<()> {
        if self.lost {
            return Err(RenderError::Present("device lost".into()));
        }
        self.check_target(target).map_err(|e| RenderError::Present(e.to_string()))?;
        self.front.copy_from(&self.back);
        self.present_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Color;

    #[test]
    fn present_copies_back_to_front() {
        let mut surface = SoftwareSurface::new();
        surface.configure(Extent::new(2, 2)).unwrap();
        let mut target = surface.create_target().unwrap();
        surface.back_buffer_mut().clear(Color::RED);
        assert_eq!(surface.front_buffer().pixel(0, 0), None);

        surface.present(&mut target, false).unwrap();
        assert_eq!(surface.front_buffer().pixel(1, 1), Some(Color::RED));
        assert_eq!(surface.present_count(), 1);
    }

    #[test]
    fn stale_target_cannot_present() {
        let mut surface = SoftwareSurface::new();
        surface.configure(Extent::new(2, 2)).unwrap();
        let mut target = surface.create_target().unwrap();
        surface.configure(Extent::new(3, 3)).unwrap();
        assert!(matches!(surface.present(&mut target, false), Err(RenderError::Present(_))));
    }

    #[test]
    fn lost_device_fails_every_operation() {
        let mut surface = SoftwareSurface::new();
        surface.configure(Extent::new(2, 2)).unwrap();
        let mut target = surface.create_target().unwrap();
        surface.mark_device_lost();
        assert!(matches!(surface.present(&mut target, true), Err(RenderError::Present(_))));
        assert!(matches!(surface.configure(Extent::new(4, 4)), Err(RenderError::Resize(_))));
    }

    #[test]
    fn dropping_a_target_counts_a_release() {
        let mut surface = SoftwareSurface::new();
        surface.configure(Extent::new(2, 2)).unwrap();
        let target = surface.create_target().unwrap();
        assert_eq!(target.id(), 1);
        drop(target);
        assert_eq!(surface.targets_created(), 1);
        assert_eq!(surface.targets_released(), 1);
    }
}
