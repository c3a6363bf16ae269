//! CPU reference device — executes kernels on the host.
//!
//! Always available, used for:
//! - Platforms without a GPU
//! - Deterministic tests of the pipeline's ordering and ownership rules
//! - Fault injection (memory pressure, device loss)
//!
//! Submitted work is queued and executed lazily, when the host fences the
//! queue (`barrier`, `wait_idle`, `read`, `write`) or once
//! [`MAX_PENDING_COMMANDS`] commands are waiting. An
//! [`QueueOrdering::Unordered`] device runs each batch between two fences
//! in reverse submission order, the worst ordering such a queue may legally
//! pick, so a missing barrier shows up as stale data instead of passing by
//! luck.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use pennant_types::{BufferId, PennantError, PennantResult};

use crate::buffers::{AccessHint, BufferHandle, ComputeBuffer};
use crate::device::{ComputeDevice, DispatchSize, QueueOrdering};
use crate::kernels::{Kernel, KernelInvocation};

/// Queue depth at which submission drains the queue on its own.
pub const MAX_PENDING_COMMANDS: usize = 64;

/// Counters describing what the device has been asked to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStats {
    pub allocations: u64,
    pub releases: u64,
    pub dispatches: u64,
    pub copies: u64,
    pub barriers: u64,
    /// Bytes currently allocated.
    pub bytes_allocated: usize,
}

enum Command {
    Dispatch {
        kernel: Arc<dyn Kernel>,
        bindings: Vec<BufferHandle>,
        params: Vec<u8>,
        size: DispatchSize,
    },
    Copy {
        src: BufferHandle,
        src_offset: usize,
        dst: BufferHandle,
        dst_offset: usize,
        size: usize,
    },
}

impl Command {
    fn references(&self, id: BufferId) -> bool {
        match self {
            Command::Dispatch { bindings, .. } => bindings.iter().any(|b| b.id() == id),
            Command::Copy { src, dst, .. } => src.id() == id || dst.id() == id,
        }
    }
}

/// Host-memory reference implementation of [`ComputeDevice`].
pub struct CpuDevice {
    ordering: QueueOrdering,
    buffers: HashMap<BufferId, ComputeBuffer>,
    next_id: u32,
    memory_budget: Option<usize>,
    pending: Vec<Command>,
    fail_after_dispatches: Option<u64>,
    lost: Option<String>,
    stats: DeviceStats,
}

impl CpuDevice {
    /// Creates an in-order device with unlimited memory.
    pub fn new() -> Self {
        Self {
            ordering: QueueOrdering::InOrder,
            buffers: HashMap::new(),
            next_id: 0,
            memory_budget: None,
            pending: Vec::new(),
            fail_after_dispatches: None,
            lost: None,
            stats: DeviceStats::default(),
        }
    }

    /// Creates a device whose queue gives no ordering guarantee.
    pub fn unordered() -> Self {
        Self::new().with_ordering(QueueOrdering::Unordered)
    }

    pub fn with_ordering(mut self, ordering: QueueOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Caps the total bytes the device will hand out.
    pub fn with_memory_budget(mut self, bytes: usize) -> Self {
        self.memory_budget = Some(bytes);
        self
    }

    /// Makes the device report loss on the dispatch after the first `count`.
    pub fn fail_after_dispatches(mut self, count: u64) -> Self {
        self.fail_after_dispatches = Some(count);
        self
    }

    pub fn stats(&self) -> &DeviceStats {
        &self.stats
    }

    /// Number of commands submitted but not yet executed.
    pub fn pending_commands(&self) -> usize {
        self.pending.len()
    }

    /// Number of live buffers.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_lost(&self) -> bool {
        self.lost.is_some()
    }

    fn ensure_alive(&self) -> PennantResult<()> {
        match &self.lost {
            Some(reason) => Err(PennantError::DeviceLost(reason.clone())),
            None => Ok(()),
        }
    }

    fn lose(&mut self, reason: String) -> PennantError {
        tracing::error!(device = self.name(), %reason, "device lost");
        self.pending.clear();
        self.lost = Some(reason.clone());
        PennantError::DeviceLost(reason)
    }

    fn lookup(&self, handle: BufferHandle) -> PennantResult<&ComputeBuffer> {
        self.buffers.get(&handle.id()).ok_or_else(|| {
            PennantError::InvalidBufferAccess(format!("unknown buffer {}", handle.id().0))
        })
    }

    fn lookup_mut(&mut self, handle: BufferHandle) -> PennantResult<&mut ComputeBuffer> {
        self.buffers.get_mut(&handle.id()).ok_or_else(|| {
            PennantError::InvalidBufferAccess(format!("unknown buffer {}", handle.id().0))
        })
    }

    /// Executes every pending command, honoring the queue ordering.
    fn flush(&mut self) -> PennantResult<()> {
        self.ensure_alive()?;
        let mut batch = std::mem::take(&mut self.pending);
        if self.ordering == QueueOrdering::Unordered {
            batch.reverse();
        }
        for command in batch {
            if let Err(e) = self.execute(command) {
                let reason = match e {
                    PennantError::DeviceLost(reason) => reason,
                    other => other.to_string(),
                };
                return Err(self.lose(reason));
            }
        }
        Ok(())
    }

    fn enqueue(&mut self, command: Command) -> PennantResult<()> {
        self.pending.push(command);
        if self.pending.len() >= MAX_PENDING_COMMANDS {
            self.flush()?;
        }
        Ok(())
    }

    fn execute(&mut self, command: Command) -> PennantResult<()> {
        match command {
            Command::Dispatch {
                kernel,
                bindings,
                params,
                size,
            } => {
                let mut slots = bindings
                    .iter()
                    .map(|&b| self.lookup(b).map(|buf| buf.as_bytes().to_vec()))
                    .collect::<PennantResult<Vec<_>>>()?;

                let mut invocation = KernelInvocation::new(&mut slots, &params, size);
                kernel.execute(&mut invocation).map_err(|e| {
                    PennantError::DeviceLost(format!("kernel '{}' failed: {e}", kernel.name()))
                })?;

                for (handle, bytes) in bindings.iter().zip(slots) {
                    self.lookup_mut(*handle)?.write_range(0, &bytes)?;
                }
                Ok(())
            }
            Command::Copy {
                src,
                src_offset,
                dst,
                dst_offset,
                size,
            } => {
                let bytes = self.lookup(src)?.read_range(src_offset, size)?.to_vec();
                self.lookup_mut(dst)?.write_range(dst_offset, &bytes)
            }
        }
    }
}

impl Default for CpuDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeDevice for CpuDevice {
    fn name(&self) -> &str {
        "cpu_reference"
    }

    fn ordering(&self) -> QueueOrdering {
        self.ordering
    }

    fn allocate(&mut self, size_bytes: usize, hint: AccessHint) -> PennantResult<BufferHandle> {
        self.ensure_alive()?;
        if size_bytes == 0 {
            return Err(PennantError::BufferAllocationFailure {
                requested: 0,
                reason: "zero-sized buffer".into(),
            });
        }
        if let Some(budget) = self.memory_budget {
            let remaining = budget.saturating_sub(self.stats.bytes_allocated);
            if size_bytes > remaining {
                return Err(PennantError::BufferAllocationFailure {
                    requested: size_bytes,
                    reason: format!("out of device memory ({remaining} of {budget} bytes free)"),
                });
            }
        }

        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.buffers.insert(id, ComputeBuffer::zeroed(size_bytes, hint));
        self.stats.allocations += 1;
        self.stats.bytes_allocated += size_bytes;
        tracing::trace!(buffer = id.0, size_bytes, ?hint, "allocated buffer");
        Ok(BufferHandle::new(id, size_bytes))
    }

    fn write(&mut self, buffer: BufferHandle, offset: usize, bytes: &[u8]) -> PennantResult<()> {
        self.flush()?;
        buffer.check_range(offset, bytes.len())?;
        self.lookup_mut(buffer)?.write_range(offset, bytes)
    }

    fn read(&mut self, buffer: BufferHandle, offset: usize, size: usize) -> PennantResult<Vec<u8>> {
        self.flush()?;
        buffer.check_range(offset, size)?;
        Ok(self.lookup(buffer)?.read_range(offset, size)?.to_vec())
    }

    fn dispatch(
        &mut self,
        kernel: &Arc<dyn Kernel>,
        bindings: &[BufferHandle],
        params: &[u8],
        size: DispatchSize,
    ) -> PennantResult<()> {
        self.ensure_alive()?;
        if let Some(limit) = self.fail_after_dispatches {
            if self.stats.dispatches >= limit {
                return Err(self.lose(format!(
                    "queue failure while dispatching '{}' (injected after {limit} dispatches)",
                    kernel.name()
                )));
            }
        }

        if bindings.len() != kernel.binding_count() {
            return Err(PennantError::InvalidBufferAccess(format!(
                "kernel '{}' binds {} buffers, {} given",
                kernel.name(),
                kernel.binding_count(),
                bindings.len()
            )));
        }
        for (i, b) in bindings.iter().enumerate() {
            self.lookup(*b)?;
            if bindings[..i].iter().any(|other| other.id() == b.id()) {
                return Err(PennantError::InvalidBufferAccess(format!(
                    "buffer {} bound twice to kernel '{}'",
                    b.id().0,
                    kernel.name()
                )));
            }
        }

        self.stats.dispatches += 1;
        self.enqueue(Command::Dispatch {
            kernel: Arc::clone(kernel),
            bindings: bindings.to_vec(),
            params: params.to_vec(),
            size,
        })
    }

    fn copy(
        &mut self,
        src: BufferHandle,
        src_offset: usize,
        dst: BufferHandle,
        dst_offset: usize,
        size: usize,
    ) -> PennantResult<()> {
        self.ensure_alive()?;
        self.lookup(src)?;
        self.lookup(dst)?;
        src.check_range(src_offset, size)?;
        dst.check_range(dst_offset, size)?;
        if src.id() == dst.id() && src_offset < dst_offset + size && dst_offset < src_offset + size {
            return Err(PennantError::InvalidBufferAccess(format!(
                "overlapping copy within buffer {}",
                src.id().0
            )));
        }

        self.stats.copies += 1;
        self.enqueue(Command::Copy {
            src,
            src_offset,
            dst,
            dst_offset,
            size,
        })
    }

    fn barrier(&mut self) -> PennantResult<()> {
        self.flush()?;
        self.stats.barriers += 1;
        Ok(())
    }

    fn wait_idle(&mut self) -> PennantResult<()> {
        self.flush()
    }

    fn release(&mut self, buffer: BufferHandle) -> PennantResult<()> {
        if self.pending.iter().any(|c| c.references(buffer.id())) {
            return Err(PennantError::InvalidBufferAccess(format!(
                "buffer {} released while referenced by queued work",
                buffer.id().0
            )));
        }
        let freed = self.buffers.remove(&buffer.id()).ok_or_else(|| {
            PennantError::InvalidBufferAccess(format!("unknown buffer {}", buffer.id().0))
        })?;
        self.stats.releases += 1;
        self.stats.bytes_allocated -= freed.len();
        Ok(())
    }
}
