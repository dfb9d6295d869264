use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::coords::Extent;
use crate::error::{RenderError, RenderResult};
use crate::render::PresentSurface;

use super::init::present_mode;
use super::GpuInit;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface must be reconfigured; rendering resumes next frame.
    Reconfigure,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM).
    Fatal,
}

impl SurfaceErrorAction {
    pub fn classify(err: &wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Self::Reconfigure,
            wgpu::SurfaceError::OutOfMemory => Self::Fatal,
            wgpu::SurfaceError::Timeout => Self::SkipFrame,
            wgpu::SurfaceError::Other => Self::SkipFrame,
        }
    }
}

/// Backbuffer acquired for the current frame.
pub struct AcquiredFrame {
    pub texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

/// Color target for the configured surface.
///
/// Holds at most one acquired backbuffer; dropping the target releases it.
pub struct WgpuTarget {
    size: Extent,
    format: wgpu::TextureFormat,
    frame: Option<AcquiredFrame>,
}

impl WgpuTarget {
    #[inline]
    pub fn size(&self) -> Extent {
        self.size
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// View of the acquired backbuffer, if this frame has one.
    #[inline]
    pub fn view(&self) -> Option<&wgpu::TextureView> {
        self.frame.as_ref().map(|f| &f.view)
    }
}

/// Window surface plus its configuration.
pub struct WgpuSurface<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    config: wgpu::SurfaceConfiguration,
    lost: Arc<AtomicBool>,
}

impl<'w> WgpuSurface<'w> {
    /// Picks format and alpha mode for `surface` without configuring it yet.
    pub fn new(
        surface: wgpu::Surface<'w>,
        adapter: &wgpu::Adapter,
        device: wgpu::Device,
        lost: Arc<AtomicBool>,
        init: &GpuInit,
        vsync: bool,
    ) -> RenderResult<Self> {
        let caps = surface.get_capabilities(adapter);
        let format = choose_surface_format(&caps, init.prefer_srgb)
            .ok_or_else(|| RenderError::Init("no supported surface formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: 1,
            height: 1,
            present_mode: present_mode(vsync),
            alpha_mode: choose_alpha_mode(&caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        log::debug!("surface format {format:?}, alpha {:?}", config.alpha_mode);

        Ok(Self { surface, device, config, lost })
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn check_device(&self, fail: fn(String) -> RenderError) -> RenderResult<()> {
        if self.lost.load(Ordering::Acquire) {
            return Err(fail("device lost".into()));
        }
        Ok(())
    }

    /// Acquires the next backbuffer into `target`.
    ///
    /// Returns `Ok(false)` when the frame must be skipped (timeout, outdated or
    /// lost surface); the surface is reconfigured where that helps.
    pub fn acquire(&mut self, target: &mut WgpuTarget) -> RenderResult<bool> {
        self.check_device(RenderError::Present)?;
        if target.frame.is_some() {
            return Ok(true);
        }

        match self.surface.get_current_texture() {
            Ok(texture) => {
                let view = texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                target.frame = Some(AcquiredFrame { texture, view });
                Ok(true)
            }
            Err(err) => match SurfaceErrorAction::classify(&err) {
                SurfaceErrorAction::Reconfigure => {
                    log::debug!("surface {err}; reconfiguring and skipping frame");
                    self.surface.configure(&self.device, &self.config);
                    Ok(false)
                }
                SurfaceErrorAction::SkipFrame => {
                    log::debug!("surface {err}; skipping frame");
                    Ok(false)
                }
                SurfaceErrorAction::Fatal => Err(RenderError::Present(err.to_string())),
            },
        }
    }
}

impl PresentSurface for WgpuSurface<'_> {
    type Target = WgpuTarget;

    fn configure(&mut self, size: Extent) -> RenderResult<()> {
        self.check_device(RenderError::Resize)?;
        if size.is_zero_area() {
            return Err(RenderError::Resize(format!("cannot configure surface at {size}")));
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        Ok(())
    }

    fn create_target(&mut self) -> RenderResult<WgpuTarget> {
        self.check_device(RenderError::Resize)?;
        Ok(WgpuTarget {
            size: Extent::new(self.config.width, self.config.height),
            format: self.config.format,
            frame: None,
        })
    }

    fn present(&mut self, target: &mut WgpuTarget, vsync: bool) -> RenderResult<()> {
        self.check_device(RenderError::Present)?;
        let Some(frame) = target.frame.take() else {
            // Nothing was acquired this frame.
            return Ok(());
        };
        drop(frame.view);
        frame.texture.present();

        let mode = present_mode(vsync);
        if self.config.present_mode != mode {
            log::debug!("switching present mode to {mode:?}");
            self.config.present_mode = mode;
            self.surface.configure(&self.device, &self.config);
        }
        Ok(())
    }
}

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = *caps.formats.first()?;
    let preferred = caps.formats.iter().copied().find(|f| f.is_srgb() == prefer_srgb);
    Some(preferred.unwrap_or(first))
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}
