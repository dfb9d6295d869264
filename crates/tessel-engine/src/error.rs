use thiserror::Error;

/// Result alias used across the renderer.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors reported by renderer backends.
///
/// Nothing here is retried internally. Each variant is produced at the failing
/// native call and handed straight to the caller.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Device, surface, shader or input-layout creation failed.
    #[error("renderer initialization failed: {0}")]
    Init(String),

    /// The surface could not be resized or its target could not be recreated.
    #[error("surface resize failed: {0}")]
    Resize(String),

    /// The device was lost or reset while presenting.
    #[error("present failed: {0}")]
    Present(String),

    /// A batch append would overflow the fixed GPU vertex buffer.
    #[error("batch capacity exceeded: {requested} vertices requested, capacity is {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },

    /// A lifecycle operation was called out of order.
    #[error("`{op}` called out of order: {reason}")]
    InvalidState {
        op: &'static str,
        reason: &'static str,
    },
}

impl RenderError {
    /// Returns `true` if the backend instance cannot keep rendering after this error.
    ///
    /// `CapacityExceeded` only loses the current batch; everything else requires
    /// tearing the backend down.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RenderError::CapacityExceeded { .. })
    }
}
