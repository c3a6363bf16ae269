//! Error types for the Pennant pipeline.
//!
//! All crates return `PennantResult<T>` from fallible operations.

use thiserror::Error;

/// Unified error type for the Pennant pipeline.
#[derive(Debug, Error)]
pub enum PennantError {
    /// Grid dimensions below the 2×2 minimum.
    #[error("Invalid grid dimension: {width}x{height} (both must be >= 2)")]
    InvalidDimension {
        width: u32,
        height: u32,
    },

    /// A named kernel could not be resolved from the kernel library.
    #[error("Kernel not found: '{0}'")]
    KernelNotFound(String),

    /// The device could not provide a buffer.
    #[error("Buffer allocation failed ({requested} bytes): {reason}")]
    BufferAllocationFailure {
        requested: usize,
        reason: String,
    },

    /// The render mesh buffer cannot be written this tick.
    #[error("Render mesh unavailable: {0}")]
    RenderMeshUnavailable(String),

    /// The device or its queue failed. No automatic recovery.
    #[error("Device lost: {0}")]
    DeviceLost(String),

    /// A buffer handle or byte range does not refer to valid device memory.
    #[error("Invalid buffer access: {0}")]
    InvalidBufferAccess(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PennantError {
    /// Returns true if the caller may simply retry on the next tick.
    ///
    /// Only a busy render mesh is recoverable; everything else is fatal
    /// to the instance or the whole subsystem.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PennantError::RenderMeshUnavailable(_))
    }
}

/// Convenience alias for `Result<T, PennantError>`.
pub type PennantResult<T> = Result<T, PennantError>;
