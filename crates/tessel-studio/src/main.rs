use anyhow::{bail, Context, Result};

use tessel_engine::coords::Extent;
use tessel_engine::core::{run_headless, App, AppControl, FrameCtx};
use tessel_engine::logging::{init_logging, LoggingConfig};
use tessel_engine::paint::Color;
use tessel_engine::render::{BackendConfig, BackendKind, RendererBackend};
use tessel_engine::software::SoftwareBackend;
use tessel_engine::window::{Runtime, RuntimeConfig};

/// Three 50×50 quads on a cornflower-blue background.
struct Demo;

impl Demo {
    const QUADS: [(f32, f32, Color); 3] = [
        (100.0, 100.0, Color::RED),
        (200.0, 100.0, Color::YELLOW),
        (300.0, 100.0, Color::WHITE),
    ];
}

impl App for Demo {
    fn clear_color(&self) -> Color {
        Color::CORNFLOWER_BLUE
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        for (x, y, color) in Self::QUADS {
            ctx.quad(x, y, 50.0, 50.0, color);
        }
        AppControl::Continue
    }
}

struct Args {
    backend: BackendKind,
    frames: u64,
}

fn parse_args() -> Result<Args> {
    let backend = match std::env::var("TESSEL_BACKEND") {
        Ok(name) => BackendKind::parse(&name).with_context(|| {
            format!("unknown TESSEL_BACKEND '{name}' (expected wgpu or software)")
        })?,
        Err(_) => BackendKind::default(),
    };

    let mut frames = 3;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--frames" => {
                let value = args.next().context("--frames needs a value")?;
                frames = value
                    .parse()
                    .with_context(|| format!("invalid frame count '{value}'"))?;
            }
            other => bail!("unexpected argument '{other}'"),
        }
    }

    Ok(Args { backend, frames })
}

/// Renders a few frames on the CPU and reports what landed in the framebuffer.
fn run_software(frames: u64) -> Result<()> {
    let config = BackendConfig::default();
    let mut backend = SoftwareBackend::new(config.headless_size, config);
    backend.init().context("software renderer initialization failed")?;

    let run = run_headless(&mut backend, &mut Demo, frames).context("headless run failed");
    if let Ok(n) = &run {
        log::info!("rendered {n} frame(s) at {}", backend.output_size());
        if let Some(fb) = backend.front_buffer() {
            for (x, y, _) in Demo::QUADS {
                let (px, py) = (x as u32 + 25, y as u32 + 25);
                log::info!("pixel ({px}, {py}) = {:?}", fb.pixel(px, py).map(Color::to_rgba8));
            }
        }
    }

    backend.shutdown().context("software renderer shutdown failed")?;
    run.map(|_| ())
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let args = parse_args()?;
    log::info!("tessel studio starting with '{}' backend", args.backend.as_str());

    match args.backend {
        BackendKind::None => {
            log::warn!("no renderer selected; nothing to do");
            Ok(())
        }
        BackendKind::Software => run_software(args.frames),
        BackendKind::Wgpu => {
            let size = Extent::new(1280, 720);
            Runtime::run(
                RuntimeConfig {
                    title: "tessel studio".to_string(),
                    initial_size: (size.width as f64, size.height as f64).into(),
                    ..RuntimeConfig::default()
                },
                Demo,
            )
        }
    }
}
