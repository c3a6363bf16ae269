//! # pennant-gpu
//!
//! Device abstraction layer for the Pennant cloth pipeline.
//!
//! - [`ComputeDevice`] — allocate / write / dispatch / copy / barrier
//!   contract every device must satisfy, including its [`QueueOrdering`].
//! - [`Kernel`] / [`KernelLibrary`] — opaque, named data-parallel transforms
//!   resolved by string identifier.
//! - [`CpuDevice`] — reference device executing kernels on the host
//!   (always available; can simulate unordered queues, memory pressure
//!   and device loss).
//! - [`reference`] — reference kernels registered under the default names.

pub mod buffers;
pub mod cpu;
pub mod device;
pub mod kernels;
pub mod params;
pub mod reference;

pub use buffers::{AccessHint, BufferHandle, ComputeBuffer};
pub use cpu::{CpuDevice, DeviceStats, MAX_PENDING_COMMANDS};
pub use device::{ComputeDevice, DispatchSize, QueueOrdering};
pub use kernels::{Kernel, KernelInvocation, KernelLibrary, KernelNames, KernelRegistry, KernelSet};
pub use params::ExternalParameters;
