use winit::window::Window;

use crate::device::WgpuBackend;
use crate::software::SoftwareBackend;

use super::{BackendConfig, BackendKind, RendererBackend};

/// Creates an uninitialized backend of the requested kind.
///
/// Returns `None` for [`BackendKind::None`] and for backends that cannot run
/// with what was supplied (the wgpu backend needs a window). Call
/// [`RendererBackend::init`] on the result before rendering.
pub fn try_make_renderer<'w>(
    kind: BackendKind,
    window: Option<&'w Window>,
    config: &BackendConfig,
) -> Option<Box<dyn RendererBackend + 'w>> {
    match kind {
        BackendKind::None => None,
        BackendKind::Wgpu => match window {
            Some(window) => Some(Box::new(WgpuBackend::new(window, config.clone()))),
            None => {
                log::warn!("wgpu backend requested without a window");
                None
            }
        },
        BackendKind::Software => {
            let size = window
                .map(|w| w.inner_size().into())
                .unwrap_or(config.headless_size);
            Some(Box::new(SoftwareBackend::new(size, config.clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::LifecycleState;

    #[test]
    fn none_kind_yields_nothing() {
        assert!(try_make_renderer(BackendKind::None, None, &BackendConfig::default()).is_none());
    }

    #[test]
    fn wgpu_without_window_yields_nothing() {
        assert!(try_make_renderer(BackendKind::Wgpu, None, &BackendConfig::default()).is_none());
    }

    #[test]
    fn software_backend_starts_uninitialized() {
        let backend =
            try_make_renderer(BackendKind::Software, None, &BackendConfig::default()).unwrap();
        assert_eq!(backend.kind(), BackendKind::Software);
        assert_eq!(backend.state(), LifecycleState::Uninitialized);
    }
}
