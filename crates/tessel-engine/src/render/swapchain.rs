//! Presentable surface + color target bookkeeping.

use crate::coords::Extent;
use crate::error::{RenderError, RenderResult};

/// A presentable surface owned by a [`SwapChainManager`].
///
/// The surface is created once and resized in place; only its target is
/// recreated when the output size changes.
pub trait PresentSurface {
    /// Color target bound to the surface's current backbuffer.
    type Target;

    /// Resizes the surface's backbuffers in place. No target may be alive.
    fn configure(&mut self, size: Extent) -> RenderResult<()>;

    /// Creates a color target for the current backbuffer.
    fn create_target(&mut self) -> RenderResult<Self::Target>;

    /// Presents the frame rendered into `target`.
    fn present(&mut self, target: &mut Self::Target, vsync: bool) -> RenderResult<()>;
}

/// Owns the surface and its color target, and rebuilds the target on resize.
///
/// Invariant: a target is only handed out while it matches the last observed size.
pub struct SwapChainManager<S: PresentSurface> {
    target: Option<S::Target>,
    surface: S,
    size: Extent,
    generation: u64,
}

impl<S: PresentSurface> SwapChainManager<S> {
    /// Configures `surface` to `initial_size` and creates the first target.
    pub fn init(mut surface: S, initial_size: Extent) -> RenderResult<Self> {
        if initial_size.is_zero_area() {
            return Err(RenderError::Init(format!(
                "cannot create a swap chain with size {initial_size}"
            )));
        }

        surface
            .configure(initial_size)
            .map_err(|e| RenderError::Init(e.to_string()))?;
        let target = surface
            .create_target()
            .map_err(|e| RenderError::Init(e.to_string()))?;

        log::debug!("swap chain created at {initial_size}");

        Ok(Self {
            target: Some(target),
            surface,
            size: initial_size,
            generation: 0,
        })
    }

    /// Applies the resize protocol if `current_size` differs from the last known size,
    /// or if a previous rebuild failed and left no target.
    ///
    /// Order: release target, resize surface, create target, record size. Zero-area
    /// sizes (minimized windows) are ignored and keep the current target.
    ///
    /// Returns `true` if the target was rebuilt. On failure no target remains.
    pub fn on_before_render(&mut self, current_size: Extent) -> RenderResult<bool> {
        if current_size == self.size && self.target.is_some() {
            return Ok(false);
        }
        if current_size.is_zero_area() {
            log::debug!("ignoring zero-area output size {current_size}");
            return Ok(false);
        }

        log::debug!("output resized {} -> {current_size}; rebuilding target", self.size);

        // The surface cannot resize while a target still references its backbuffer.
        drop(self.target.take());

        self.surface.configure(current_size).map_err(into_resize_error)?;
        let target = self.surface.create_target().map_err(into_resize_error)?;

        self.target = Some(target);
        self.size = current_size;
        self.generation += 1;
        Ok(true)
    }

    /// Returns the live target, or an error if the last rebuild failed.
    pub fn target_mut(&mut self) -> RenderResult<&mut S::Target> {
        self.target.as_mut().ok_or(RenderError::InvalidState {
            op: "target",
            reason: "color target is stale after a failed resize",
        })
    }

    /// Surface and live target, borrowed together.
    pub fn parts_mut(&mut self) -> RenderResult<(&mut S, &mut S::Target)> {
        match self.target.as_mut() {
            Some(target) => Ok((&mut self.surface, target)),
            None => Err(RenderError::InvalidState {
                op: "target",
                reason: "color target is stale after a failed resize",
            }),
        }
    }

    /// Presents the current frame. Failures are reported, never retried.
    pub fn present(&mut self, vsync: bool) -> RenderResult<()> {
        let (surface, target) = self.parts_mut()?;
        surface.present(target, vsync)
    }

    #[inline]
    pub fn target(&self) -> Option<&S::Target> {
        self.target.as_ref()
    }

    #[inline]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[inline]
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Last size the target was built for.
    #[inline]
    pub fn size(&self) -> Extent {
        self.size
    }

    /// Incremented on every target rebuild.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn is_stale(&self) -> bool {
        self.target.is_none()
    }

    /// Releases the target, then the surface.
    pub fn shutdown(mut self) {
        drop(self.target.take());
        drop(self.surface);
        log::debug!("swap chain released");
    }
}

fn into_resize_error(err: RenderError) -> RenderError {
    match err {
        RenderError::Resize(_) => err,
        other => RenderError::Resize(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Configure(Extent),
        Create(u32),
        Release(u32),
        Present(u32),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    struct FakeTarget {
        id: u32,
        log: Log,
        live: Rc<Cell<u32>>,
    }

    impl Drop for FakeTarget {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
            self.log.borrow_mut().push(Event::Release(self.id));
        }
    }

    struct FakeSurface {
        log: Log,
        next_id: u32,
        live: Rc<Cell<u32>>,
        fail_configure: bool,
    }

    impl FakeSurface {
        fn new(log: Log) -> Self {
            Self {
                log,
                next_id: 0,
                live: Rc::default(),
                fail_configure: false,
            }
        }
    }

    impl PresentSurface for FakeSurface {
        type Target = FakeTarget;

        fn configure(&mut self, size: Extent) -> RenderResult<()> {
            // Mirrors the native rule: no resize while a view references the backbuffer.
            assert_eq!(self.live.get(), 0, "configure called while a target is alive");

            if self.fail_configure {
                return Err(RenderError::Resize("out of memory".into()));
            }
            self.log.borrow_mut().push(Event::Configure(size));
            Ok(())
        }

        fn create_target(&mut self) -> RenderResult<FakeTarget> {
            let id = self.next_id;
            self.next_id += 1;
            self.live.set(self.live.get() + 1);
            self.log.borrow_mut().push(Event::Create(id));
            Ok(FakeTarget { id, log: self.log.clone(), live: self.live.clone() })
        }

        fn present(&mut self, target: &mut FakeTarget, _vsync: bool) -> RenderResult<()> {
            self.log.borrow_mut().push(Event::Present(target.id));
            Ok(())
        }
    }

    fn manager(size: Extent) -> (SwapChainManager<FakeSurface>, Log) {
        let log: Log = Rc::default();
        let sc = SwapChainManager::init(FakeSurface::new(log.clone()), size).unwrap();
        log.borrow_mut().clear();
        (sc, log)
    }

    // ── init ──────────────────────────────────────────────────────────────

    #[test]
    fn init_configures_then_creates() {
        let log: Log = Rc::default();
        let sc = SwapChainManager::init(FakeSurface::new(log.clone()), Extent::new(1280, 720))
            .unwrap();
        assert_eq!(
            *log.borrow(),
            vec![Event::Configure(Extent::new(1280, 720)), Event::Create(0)]
        );
        assert_eq!(sc.generation(), 0);
        assert!(!sc.is_stale());
    }

    #[test]
    fn init_rejects_zero_size() {
        let log: Log = Rc::default();
        let err = SwapChainManager::init(FakeSurface::new(log), Extent::new(0, 720));
        assert!(matches!(err, Err(RenderError::Init(_))));
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn unchanged_size_is_idempotent() {
        let (mut sc, log) = manager(Extent::new(1280, 720));
        for _ in 0..5 {
            assert!(!sc.on_before_render(Extent::new(1280, 720)).unwrap());
        }
        assert_eq!(sc.generation(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn resize_releases_before_configuring() {
        let (mut sc, log) = manager(Extent::new(1280, 720));
        assert!(sc.on_before_render(Extent::new(800, 600)).unwrap());
        assert_eq!(
            *log.borrow(),
            vec![
                Event::Release(0),
                Event::Configure(Extent::new(800, 600)),
                Event::Create(1),
            ]
        );
        assert_eq!(sc.generation(), 1);
        assert_eq!(sc.size(), Extent::new(800, 600));
    }

    #[test]
    fn size_round_trip_keeps_a_valid_target() {
        let (mut sc, _log) = manager(Extent::new(1280, 720));
        let sizes = [Extent::new(1024, 768), Extent::new(1280, 720)];
        for (i, size) in sizes.into_iter().enumerate() {
            sc.on_before_render(size).unwrap();
            assert_eq!(sc.generation(), i as u64 + 1);
            assert_eq!(sc.target_mut().unwrap().id, i as u32 + 1);
            sc.present(false).unwrap();
        }
    }

    #[test]
    fn zero_area_size_keeps_current_target() {
        let (mut sc, log) = manager(Extent::new(640, 480));
        assert!(!sc.on_before_render(Extent::new(0, 0)).unwrap());
        assert_eq!(sc.size(), Extent::new(640, 480));
        assert!(log.borrow().is_empty());

        // Returning to the recorded size is not a change.
        assert!(!sc.on_before_render(Extent::new(640, 480)).unwrap());
    }

    #[test]
    fn failed_resize_leaves_target_stale() {
        let (mut sc, _log) = manager(Extent::new(640, 480));
        sc.surface_mut().fail_configure = true;

        let err = sc.on_before_render(Extent::new(320, 240)).unwrap_err();
        assert!(matches!(err, RenderError::Resize(_)));
        assert!(sc.is_stale());
        assert!(matches!(sc.target_mut(), Err(RenderError::InvalidState { .. })));
        assert!(sc.present(false).is_err());
    }

    #[test]
    fn stale_target_is_rebuilt_at_the_recorded_size() {
        let (mut sc, log) = manager(Extent::new(640, 480));
        sc.surface_mut().fail_configure = true;
        assert!(sc.on_before_render(Extent::new(320, 240)).is_err());
        assert_eq!(sc.size(), Extent::new(640, 480));

        // The window went back to its old size before the next frame.
        sc.surface_mut().fail_configure = false;
        log.borrow_mut().clear();
        assert!(sc.on_before_render(Extent::new(640, 480)).unwrap());
        assert_eq!(
            *log.borrow(),
            vec![Event::Configure(Extent::new(640, 480)), Event::Create(1)]
        );
        assert!(!sc.is_stale());
        assert_eq!(sc.generation(), 1);
        sc.present(false).unwrap();
    }

    // ── shutdown ──────────────────────────────────────────────────────────

    #[test]
    fn shutdown_releases_target() {
        let (sc, log) = manager(Extent::new(640, 480));
        sc.shutdown();
        assert_eq!(*log.borrow(), vec![Event::Release(0)]);
    }
}
