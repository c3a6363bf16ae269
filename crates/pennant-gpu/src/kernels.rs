//! Kernel interface and kernel library.
//!
//! A kernel is an opaque, named data-parallel transform. The pipeline only
//! knows each kernel's binding contract (which buffer goes in which slot),
//! never its formula. Kernels are looked up by string identifier from a
//! [`KernelLibrary`] once at startup.

use std::collections::HashMap;
use std::fmt;
use std::mem::size_of;
use std::sync::Arc;

use bytemuck::Pod;
use serde::{Deserialize, Serialize};

use pennant_types::constants::{INTEGRATE_KERNEL, NORMALS_KERNEL, SMOOTH_KERNEL};
use pennant_types::{PennantError, PennantResult};

use crate::buffers::decode_slice;
use crate::device::DispatchSize;

/// Preferred work-group width of the reference kernels.
pub const DEFAULT_OPTIMAL_WIDTH: u32 = 32;

/// Trait for device kernels.
///
/// `execute` is the host-side body used by devices that run kernels on the
/// CPU. Invocations past the end of the data must be ignored, exactly as a
/// GPU kernel guards `thread_id < n`.
pub trait Kernel: Send + Sync {
    /// Identifier the kernel is registered under.
    fn name(&self) -> &str;

    /// Work-group width that keeps the device fully occupied.
    fn optimal_width(&self) -> u32 {
        DEFAULT_OPTIMAL_WIDTH
    }

    /// Number of buffer slots the kernel binds.
    fn binding_count(&self) -> usize;

    /// Runs the whole dispatch.
    fn execute(&self, invocation: &mut KernelInvocation<'_>) -> PennantResult<()>;
}

/// The bound buffers and parameters of one kernel launch.
pub struct KernelInvocation<'a> {
    bindings: &'a mut [Vec<u8>],
    params: &'a [u8],
    size: DispatchSize,
}

impl<'a> KernelInvocation<'a> {
    pub fn new(bindings: &'a mut [Vec<u8>], params: &'a [u8], size: DispatchSize) -> Self {
        Self {
            bindings,
            params,
            size,
        }
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn size(&self) -> DispatchSize {
        self.size
    }

    /// Number of elements actually processed: the launched invocation
    /// count, clamped to `elements`.
    pub fn active_len(&self, elements: usize) -> usize {
        elements.min(self.size.invocations())
    }

    fn slot(&self, slot: usize) -> PennantResult<&Vec<u8>> {
        self.bindings.get(slot).ok_or_else(|| {
            PennantError::InvalidBufferAccess(format!(
                "binding slot {} not bound ({} bindings)",
                slot,
                self.bindings.len()
            ))
        })
    }

    /// Decodes binding `slot` as an array of `T`.
    pub fn read<T: Pod>(&self, slot: usize) -> PennantResult<Vec<T>> {
        Ok(decode_slice(self.slot(slot)?))
    }

    /// Overwrites the start of binding `slot` with `values`.
    pub fn write<T: Pod>(&mut self, slot: usize, values: &[T]) -> PennantResult<()> {
        let bytes: &[u8] = bytemuck::cast_slice(values);
        let available = self.slot(slot)?.len();
        if bytes.len() > available {
            return Err(PennantError::InvalidBufferAccess(format!(
                "kernel wrote {} bytes into {}-byte binding {}",
                bytes.len(),
                available,
                slot
            )));
        }
        self.bindings[slot][..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Decodes the parameter block as `T`.
    pub fn params<T: Pod>(&self) -> PennantResult<T> {
        if self.params.len() < size_of::<T>() {
            return Err(PennantError::InvalidBufferAccess(format!(
                "parameter block is {} bytes, kernel expects {}",
                self.params.len(),
                size_of::<T>()
            )));
        }
        Ok(bytemuck::pod_read_unaligned(&self.params[..size_of::<T>()]))
    }
}

/// A source of named kernels.
pub trait KernelLibrary {
    /// Looks up a kernel by identifier.
    fn resolve(&self, name: &str) -> Option<Arc<dyn Kernel>>;

    /// Identifiers of every kernel the library provides.
    fn kernel_names(&self) -> Vec<String>;
}

/// In-memory kernel library.
#[derive(Default)]
pub struct KernelRegistry {
    kernels: HashMap<String, Arc<dyn Kernel>>,
}

impl KernelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the three reference kernels under the
    /// default identifiers.
    pub fn with_reference_kernels() -> Self {
        use crate::reference::{ReferenceIntegrator, ReferenceNormals, ReferenceSmoothing};

        let mut registry = Self::new();
        registry.register(Arc::new(ReferenceIntegrator::default()));
        registry.register(Arc::new(ReferenceNormals));
        registry.register(Arc::new(ReferenceSmoothing));
        registry
    }

    /// Registers a kernel under its own name, replacing any previous one.
    pub fn register(&mut self, kernel: Arc<dyn Kernel>) {
        let name = kernel.name().to_string();
        self.register_as(&name, kernel);
    }

    /// Registers a kernel under an explicit identifier.
    pub fn register_as(&mut self, name: &str, kernel: Arc<dyn Kernel>) {
        self.kernels.insert(name.to_string(), kernel);
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }
}

impl KernelLibrary for KernelRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Kernel>> {
        self.kernels.get(name).cloned()
    }

    fn kernel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.kernels.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Identifiers of the three pipeline kernels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelNames {
    pub integrate: String,
    pub normals: String,
    pub smooth: String,
}

impl Default for KernelNames {
    fn default() -> Self {
        Self {
            integrate: INTEGRATE_KERNEL.to_string(),
            normals: NORMALS_KERNEL.to_string(),
            smooth: SMOOTH_KERNEL.to_string(),
        }
    }
}

/// The three resolved pipeline kernels.
#[derive(Clone)]
pub struct KernelSet {
    pub integrate: Arc<dyn Kernel>,
    pub normals: Arc<dyn Kernel>,
    pub smooth: Arc<dyn Kernel>,
}

impl KernelSet {
    /// Resolves all three kernels.
    ///
    /// # Errors
    /// [`PennantError::KernelNotFound`] naming the first missing kernel.
    pub fn resolve(library: &dyn KernelLibrary, names: &KernelNames) -> PennantResult<Self> {
        let lookup = |name: &str| {
            library
                .resolve(name)
                .ok_or_else(|| PennantError::KernelNotFound(name.to_string()))
        };

        Ok(Self {
            integrate: lookup(&names.integrate)?,
            normals: lookup(&names.normals)?,
            smooth: lookup(&names.smooth)?,
        })
    }
}

impl fmt::Debug for KernelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelSet")
            .field("integrate", &self.integrate.name())
            .field("normals", &self.normals.name())
            .field("smooth", &self.smooth.name())
            .finish()
    }
}
