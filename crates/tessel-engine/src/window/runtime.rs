use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{drive_frame, App, AppControl};
use crate::render::{try_make_renderer, BackendConfig, BackendKind, RendererBackend};
use crate::scene::DrawList;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub backend: BackendKind,
    pub backend_config: BackendConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "tessel".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            backend: BackendKind::default(),
            backend_config: BackendConfig::default(),
        }
    }
}

/// Entry point for the windowed runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window, renders `app` into it until the window closes or the
    /// app exits, then shuts the renderer down.
    pub fn run<A>(config: RuntimeConfig, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    draw_list: DrawList,
    frame_index: u64,

    window: Window,

    #[borrows(window)]
    #[not_covariant]
    renderer: Box<dyn RendererBackend + 'this>,
}

impl WindowEntry {
    fn shutdown(&mut self) {
        self.with_renderer_mut(|renderer| {
            if let Err(e) = renderer.shutdown() {
                log::warn!("renderer shutdown: {e}");
            }
        });
    }
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    app: A,

    window: Option<(WindowId, WindowEntry)>,
    exit_requested: bool,
    failure: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, app: A) -> Self {
        Self {
            config,
            app,
            window: None,
            exit_requested: false,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure.get_or_insert(err);
        self.close(event_loop);
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        if let Some((_, mut entry)) = self.window.take() {
            entry.shutdown();
        }
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowId> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let id = window.id();
        let kind = self.config.backend;
        let backend_config = &self.config.backend_config;

        let entry = WindowEntryTryBuilder {
            draw_list: DrawList::new(),
            frame_index: 0,
            window,
            renderer_builder: |w| {
                let mut renderer = try_make_renderer(kind, Some(w), backend_config)
                    .with_context(|| format!("no renderer available for '{}'", kind.as_str()))?;
                renderer.init().context("renderer initialization failed")?;
                Ok::<_, anyhow::Error>(renderer)
            },
        }
        .try_build()?;

        self.window = Some((id, entry));
        Ok(id)
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some((_, entry)) = self.window.as_mut() else {
            return;
        };
        let app = &mut self.app;

        let result = entry.with_mut(|fields| {
            let size = fields.window.inner_size().into();
            let outcome = drive_frame(
                fields.renderer.as_mut(),
                app,
                fields.draw_list,
                *fields.frame_index,
                size,
            );
            *fields.frame_index += 1;
            outcome
        });

        match result {
            Ok(outcome) if outcome.control == AppControl::Exit => self.close(event_loop),
            Ok(_) => {}
            Err(err) => self.fail(event_loop, anyhow::Error::new(err).context("frame failed")),
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.exit_requested {
            return;
        }

        match self.create_window_entry(event_loop) {
            Ok(_) => {
                if let Some((_, entry)) = &self.window {
                    entry.with_window(|w| w.request_redraw());
                }
            }
            Err(e) => self.fail(event_loop, e.context("failed to create initial window")),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some((_, entry)) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        if !matches!(&self.window, Some((id, _)) if *id == window_id) {
            return;
        }

        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.close(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.close(event_loop),

            // The swap chain picks up the new size in `before_render`.
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if let Some((_, entry)) = &self.window {
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some((_, mut entry)) = self.window.take() {
            entry.shutdown();
        }
    }
}
