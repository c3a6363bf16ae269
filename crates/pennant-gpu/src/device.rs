//! The device resource provider contract.
//!
//! Everything the pipeline does to device memory goes through
//! [`ComputeDevice`]. Submissions are fire-and-forget: `dispatch` and
//! `copy` only enqueue work. Whether enqueued work completes in submission
//! order is declared by [`ComputeDevice::ordering`]; callers that chain
//! data-dependent work on an [`QueueOrdering::Unordered`] device must fence
//! it with [`ComputeDevice::barrier`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use pennant_types::PennantResult;

use crate::buffers::{AccessHint, BufferHandle};
use crate::kernels::Kernel;

/// Completion-order guarantee of a device queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueOrdering {
    /// Work submitted to the queue completes in submission order.
    InOrder,
    /// Work between two barriers may complete in any order.
    Unordered,
}

impl QueueOrdering {
    /// Returns true if dependent submissions need an explicit barrier.
    #[inline]
    pub fn requires_barriers(self) -> bool {
        matches!(self, QueueOrdering::Unordered)
    }
}

/// One-dimensional dispatch grid: `groups` work groups of `width` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSize {
    pub groups: u32,
    pub width: u32,
}

impl DispatchSize {
    /// Covers `elements` items with groups of `width`, rounding up.
    ///
    /// A zero width is treated as 1.
    pub fn for_elements(elements: usize, width: u32) -> Self {
        let width = width.max(1);
        let groups = elements.div_ceil(width as usize) as u32;
        Self { groups, width }
    }

    /// Total number of parallel invocations launched.
    #[inline]
    pub fn invocations(&self) -> usize {
        self.groups as usize * self.width as usize
    }
}

/// Trait for GPU-like compute devices.
///
/// # Implementations
/// - [`CpuDevice`](crate::cpu::CpuDevice) — Host reference device (always available)
pub trait ComputeDevice: Send {
    /// Returns the device name (e.g., "cpu_reference").
    fn name(&self) -> &str;

    /// The completion-order guarantee of this device's queue.
    fn ordering(&self) -> QueueOrdering;

    /// Allocates a fixed-size buffer. Contents are zeroed.
    fn allocate(&mut self, size_bytes: usize, hint: AccessHint) -> PennantResult<BufferHandle>;

    /// Allocates a buffer and uploads `bytes` into it.
    fn allocate_with_data(&mut self, bytes: &[u8], hint: AccessHint) -> PennantResult<BufferHandle> {
        let handle = self.allocate(bytes.len(), hint)?;
        if let Err(e) = self.write(handle, 0, bytes) {
            let _ = self.release(handle);
            return Err(e);
        }
        Ok(handle)
    }

    /// Host upload. Ordered before any work submitted afterwards.
    fn write(&mut self, buffer: BufferHandle, offset: usize, bytes: &[u8]) -> PennantResult<()>;

    /// Blocking host readback of completed contents. Diagnostics and
    /// export only; never part of the per-tick path.
    fn read(&mut self, buffer: BufferHandle, offset: usize, size: usize) -> PennantResult<Vec<u8>>;

    /// Enqueues one kernel launch over `size`.
    fn dispatch(
        &mut self,
        kernel: &Arc<dyn Kernel>,
        bindings: &[BufferHandle],
        params: &[u8],
        size: DispatchSize,
    ) -> PennantResult<()>;

    /// Enqueues a device-side copy of `size` bytes.
    fn copy(
        &mut self,
        src: BufferHandle,
        src_offset: usize,
        dst: BufferHandle,
        dst_offset: usize,
        size: usize,
    ) -> PennantResult<()>;

    /// Everything submitted before the barrier completes before anything
    /// submitted after it starts.
    fn barrier(&mut self) -> PennantResult<()>;

    /// Blocks until the queue has drained.
    fn wait_idle(&mut self) -> PennantResult<()>;

    /// Frees a buffer. The caller must have drained any work referencing it.
    fn release(&mut self, buffer: BufferHandle) -> PennantResult<()>;
}
