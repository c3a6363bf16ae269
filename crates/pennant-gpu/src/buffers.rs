//! Device buffer handles and host-side buffer storage.
//!
//! A [`BufferHandle`] is all the pipeline ever holds; the bytes behind it
//! live inside the device. [`ComputeBuffer`] is the storage the reference
//! CPU device keeps per handle.

use std::mem::size_of;

use bytemuck::Pod;
use serde::{Deserialize, Serialize};

use pennant_types::{BufferId, PennantError, PennantResult};

/// Placement hint passed to the device at allocation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessHint {
    /// Visible to both host and device (initial data uploads, readback).
    Shared,
    /// Device-only scratch memory, written by kernels every tick.
    DevicePrivate,
}

/// Opaque reference to a device-resident buffer of fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    id: BufferId,
    size: usize,
}

impl BufferHandle {
    pub fn new(id: BufferId, size: usize) -> Self {
        Self { id, size }
    }

    #[inline]
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Size in bytes, fixed at allocation.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Checks that `[offset, offset + len)` lies inside the buffer.
    pub fn check_range(&self, offset: usize, len: usize) -> PennantResult<()> {
        match offset.checked_add(len) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(PennantError::InvalidBufferAccess(format!(
                "range {}..{} exceeds buffer {} of {} bytes",
                offset,
                offset.saturating_add(len),
                self.id.0,
                self.size
            ))),
        }
    }
}

/// Host-side backing store of one device buffer.
#[derive(Debug, Clone)]
pub struct ComputeBuffer {
    data: Vec<u8>,
    hint: AccessHint,
}

impl ComputeBuffer {
    /// Creates a buffer filled with zeros.
    pub fn zeroed(len: usize, hint: AccessHint) -> Self {
        Self {
            data: vec![0; len],
            hint,
        }
    }

    /// Creates a buffer from existing bytes.
    pub fn from_bytes(bytes: &[u8], hint: AccessHint) -> Self {
        Self {
            data: bytes.to_vec(),
            hint,
        }
    }

    /// Returns the number of bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn hint(&self) -> AccessHint {
        self.hint
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Copies `bytes` into the buffer at `offset`.
    pub fn write_range(&mut self, offset: usize, bytes: &[u8]) -> PennantResult<()> {
        let end = offset
            .checked_add(bytes.len())
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                PennantError::InvalidBufferAccess(format!(
                    "write of {} bytes at {} overflows {}-byte buffer",
                    bytes.len(),
                    offset,
                    self.data.len()
                ))
            })?;
        self.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Borrows `len` bytes starting at `offset`.
    pub fn read_range(&self, offset: usize, len: usize) -> PennantResult<&[u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or_else(|| {
                PennantError::InvalidBufferAccess(format!(
                    "read of {} bytes at {} overflows {}-byte buffer",
                    len,
                    offset,
                    self.data.len()
                ))
            })
    }

    /// Decodes the whole buffer as a typed array. Trailing bytes that do
    /// not fill a whole element are ignored.
    pub fn to_vec<T: Pod>(&self) -> Vec<T> {
        decode_slice(&self.data)
    }
}

/// Decodes packed bytes into `T` values without requiring alignment.
pub fn decode_slice<T: Pod>(bytes: &[u8]) -> Vec<T> {
    let stride = size_of::<T>().max(1);
    bytes
        .chunks_exact(stride)
        .map(bytemuck::pod_read_unaligned)
        .collect()
}
