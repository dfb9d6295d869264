use crate::coords::Extent;
use crate::error::RenderResult;
use crate::render::{ClearMask, FrameStats, RendererBackend};
use crate::scene::DrawList;

use super::{App, AppControl, FrameCtx};

/// Result of one driven frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameOutcome {
    pub control: AppControl,
    pub stats: FrameStats,
}

/// Runs one frame: `update`, `before_render`, clear, app recording, `render`,
/// `after_render`.
///
/// A capacity overflow only loses the frame's quads and is logged; any other
/// error is returned and ends the caller's loop.
pub fn drive_frame<R, A>(
    backend: &mut R,
    app: &mut A,
    draw_list: &mut DrawList,
    frame_index: u64,
    output_size: Extent,
) -> RenderResult<FrameOutcome>
where
    R: RendererBackend + ?Sized,
    A: App + ?Sized,
{
    draw_list.clear();

    backend.update();
    backend.before_render(output_size)?;
    backend.clear_backbuffer(app.clear_color(), 1.0, 0, ClearMask::ALL)?;

    let control = {
        let mut ctx = FrameCtx {
            size: backend.output_size(),
            frame_index,
            draw_list: &mut *draw_list,
        };
        app.on_frame(&mut ctx)
    };

    let stats = match backend.render(draw_list) {
        Ok(stats) => stats,
        Err(err) if !err.is_fatal() => {
            log::warn!("frame {frame_index}: {err}; batch dropped");
            FrameStats::default()
        }
        Err(err) => return Err(err),
    };

    backend.after_render()?;

    Ok(FrameOutcome { control, stats })
}

/// Drives up to `max_frames` frames at the backend's current output size,
/// stopping early when the app asks to exit. Returns the number of frames run.
pub fn run_headless<R, A>(backend: &mut R, app: &mut A, max_frames: u64) -> RenderResult<u64>
where
    R: RendererBackend + ?Sized,
    A: App + ?Sized,
{
    let mut draw_list = DrawList::new();
    let mut frames = 0;
    while frames < max_frames {
        let size = backend.output_size();
        let outcome = drive_frame(backend, app, &mut draw_list, frames, size)?;
        frames += 1;
        log::trace!("frame {frames}: {:?}", outcome.stats);
        if outcome.control == AppControl::Exit {
            break;
        }
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::paint::Color;
    use crate::render::{BackendConfig, LifecycleState};
    use crate::software::SoftwareBackend;

    struct Squares {
        count: usize,
        exit_after: Option<u64>,
    }

    impl App for Squares {
        fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
            for i in 0..self.count {
                ctx.quad(10.0 * i as f32, 0.0, 5.0, 5.0, Color::WHITE);
            }
            match self.exit_after {
                Some(n) if ctx.frame_index + 1 >= n => AppControl::Exit,
                _ => AppControl::Continue,
            }
        }
    }

    fn software(config: BackendConfig) -> SoftwareBackend {
        let mut b = SoftwareBackend::new(Extent::new(64, 32), config);
        b.init().unwrap();
        b
    }

    // ── drive_frame ──────────────────────────────────────────────────────

    #[test]
    fn frame_runs_full_lifecycle() {
        let mut backend = software(BackendConfig::default());
        let mut app = Squares { count: 3, exit_after: None };
        let mut list = DrawList::new();

        let out = drive_frame(&mut backend, &mut app, &mut list, 0, Extent::new(64, 32)).unwrap();
        assert_eq!(out.control, AppControl::Continue);
        assert_eq!(out.stats.vertices, 18);
        assert_eq!(out.stats.draw_calls, 1);
        assert_eq!(backend.state(), LifecycleState::Initialized);

        let fb = backend.front_buffer().unwrap();
        assert_eq!(fb.pixel(2, 2), Some(Color::WHITE));
        assert_eq!(fb.pixel(7, 2), Some(Color::CORNFLOWER_BLUE));
    }

    #[test]
    fn overflow_is_logged_and_frame_still_presents() {
        let config = BackendConfig { batch_capacity: 12, ..BackendConfig::default() };
        let mut backend = software(config);
        let mut app = Squares { count: 3, exit_after: None };
        let mut list = DrawList::new();

        let out = drive_frame(&mut backend, &mut app, &mut list, 0, Extent::new(64, 32)).unwrap();
        assert_eq!(out.stats, FrameStats::default());
        assert_eq!(backend.swapchain().unwrap().surface().present_count(), 1);
    }

    #[test]
    fn fatal_errors_propagate() {
        let mut backend = software(BackendConfig::default());
        backend.shutdown().unwrap();
        let mut app = Squares { count: 1, exit_after: None };
        let err = drive_frame(&mut backend, &mut app, &mut DrawList::new(), 0, Extent::new(64, 32))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidState { op: "before_render", .. }));
    }

    // ── run_headless ─────────────────────────────────────────────────────

    #[test]
    fn headless_stops_on_exit() {
        let mut backend = software(BackendConfig::default());
        let mut app = Squares { count: 1, exit_after: Some(2) };
        assert_eq!(run_headless(&mut backend, &mut app, 10).unwrap(), 2);
    }

    #[test]
    fn headless_runs_requested_frames_through_trait_object() {
        let mut backend: Box<dyn RendererBackend> = Box::new(software(BackendConfig::default()));
        let mut app = Squares { count: 2, exit_after: None };
        assert_eq!(run_headless(backend.as_mut(), &mut app, 4).unwrap(), 4);
    }
}
