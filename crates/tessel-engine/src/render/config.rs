use crate::coords::Extent;
use crate::device::GpuInit;
use crate::error::{RenderError, RenderResult};

use super::vertex::QUAD_VERTEX_COUNT;

/// Default batch capacity: 1024 quads.
pub const DEFAULT_BATCH_CAPACITY: usize = 1024 * QUAD_VERTEX_COUNT;

/// Backend configuration shared by all variants.
///
/// Keep this small. GPU-specific knobs live in [`GpuInit`].
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Fixed vertex capacity of the batch buffer. Must cover the largest frame.
    pub batch_capacity: usize,

    /// Synchronize presentation to the display refresh.
    pub vsync: bool,

    /// Output size used by the software backend when no window is attached.
    pub headless_size: Extent,

    /// Hardware backend parameters.
    pub gpu: GpuInit,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            batch_capacity: DEFAULT_BATCH_CAPACITY,
            vsync: false,
            headless_size: Extent::new(1280, 720),
            gpu: GpuInit::default(),
        }
    }
}

impl BackendConfig {
    /// Rejects batch capacities that cannot hold whole quads.
    pub fn validate(&self) -> RenderResult<()> {
        if self.batch_capacity < QUAD_VERTEX_COUNT || self.batch_capacity % QUAD_VERTEX_COUNT != 0 {
            return Err(RenderError::Init(format!(
                "batch capacity {} is not a positive multiple of {QUAD_VERTEX_COUNT}",
                self.batch_capacity
            )));
        }
        Ok(())
    }
}
