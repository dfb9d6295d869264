/// Initialization parameters for the wgpu backend.
///
/// Presentation mode is not set here; it follows
/// [`BackendConfig::vsync`](crate::render::BackendConfig).
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Debug label attached to the device.
    pub label: &'static str,

    /// Prefer an sRGB surface format when available.
    ///
    /// Off by default so colors are stored unencoded, as the software
    /// framebuffer stores them.
    pub prefer_srgb: bool,

    pub power_preference: wgpu::PowerPreference,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Favor an empty set for portability.
    pub required_features: wgpu::Features,

    pub required_limits: wgpu::Limits,

    /// Hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            label: "tessel device",
            prefer_srgb: false,
            power_preference: wgpu::PowerPreference::HighPerformance,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}

/// Present mode for the requested sync behavior.
#[inline]
pub fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}
