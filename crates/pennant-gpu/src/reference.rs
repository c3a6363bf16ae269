//! Reference kernels.
//!
//! Simple, deterministic stand-ins for the production kernels, registered
//! under the default identifiers. They honor the binding contracts exactly
//! but make no claim to physical accuracy.
//!
//! | Kernel | Bindings |
//! |---|---|
//! | [`ReferenceIntegrator`] | 0 reference positions, 1 output positions, 2 previous velocity, 3 next velocity |
//! | [`ReferenceNormals`] | 0 output positions, 1 reference positions, 2 normal work |
//! | [`ReferenceSmoothing`] | 0 normal work, 1 normal output |

use glam::Vec3;

use pennant_mesh::GpuVec3;
use pennant_types::constants::{INTEGRATE_KERNEL, NORMALS_KERNEL, SMOOTH_KERNEL};
use pennant_types::PennantResult;

use crate::kernels::{Kernel, KernelInvocation};
use crate::params::ExternalParameters;

/// Wind-driven flutter integrator.
///
/// Velocity relaxes towards the (rippled) wind vector; each vertex is then
/// displaced from its rest position in proportion to its distance from the
/// hoist edge (`x = 0`), which therefore stays pinned.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceIntegrator {
    /// Integration step (seconds).
    pub dt: f32,
    /// Pull of the velocity back towards zero.
    pub stiffness: f32,
    /// Displacement per unit velocity per unit distance from the hoist.
    pub deflection: f32,
    /// Relative amplitude of the per-vertex wind ripple.
    pub flutter: f32,
}

impl Default for ReferenceIntegrator {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            stiffness: 4.0,
            deflection: 0.05,
            flutter: 0.25,
        }
    }
}

impl Kernel for ReferenceIntegrator {
    fn name(&self) -> &str {
        INTEGRATE_KERNEL
    }

    fn binding_count(&self) -> usize {
        4
    }

    fn execute(&self, invocation: &mut KernelInvocation<'_>) -> PennantResult<()> {
        let params: ExternalParameters = invocation.params()?;
        let wind = params.wind();
        let reference: Vec<GpuVec3> = invocation.read(0)?;
        let prev_velocity: Vec<GpuVec3> = invocation.read(2)?;
        let mut positions: Vec<GpuVec3> = invocation.read(1)?;
        let mut next_velocity: Vec<GpuVec3> = invocation.read(3)?;

        let n = invocation.active_len(reference.len());
        for i in 0..n {
            let r = reference[i].to_vec3();
            let v = prev_velocity[i].to_vec3();

            let ripple = 1.0 + self.flutter * (0.7 * r.x + 0.3 * r.z + 4.0 * v.length()).sin();
            let accel = wind * ripple - self.stiffness * v;
            let v_next = v + self.dt * accel;

            next_velocity[i] = v_next.into();
            positions[i] = (r + v_next * (r.x * self.deflection)).into();
        }

        invocation.write(1, &positions)?;
        invocation.write(3, &next_velocity)
    }
}

/// Finite-difference vertex normals.
///
/// The grid width is recovered from the reference pose: it is the length
/// of the leading run of vertices sharing vertex 0's Z coordinate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceNormals;

impl Kernel for ReferenceNormals {
    fn name(&self) -> &str {
        NORMALS_KERNEL
    }

    fn binding_count(&self) -> usize {
        3
    }

    fn execute(&self, invocation: &mut KernelInvocation<'_>) -> PennantResult<()> {
        let positions: Vec<GpuVec3> = invocation.read(0)?;
        let reference: Vec<GpuVec3> = invocation.read(1)?;
        let mut normals: Vec<GpuVec3> = invocation.read(2)?;

        let count = positions.len().min(reference.len());
        let width = row_width(&reference[..count]);
        let height = count / width;
        let p = |i: usize| positions[i].to_vec3();

        let n = invocation.active_len(count).min(normals.len());
        for i in 0..n {
            let (x, y) = (i % width, i / width);
            let left = if x > 0 { i - 1 } else { i };
            let right = if x + 1 < width { i + 1 } else { i };
            let up = if y > 0 { i - width } else { i };
            let down = if y + 1 < height { i + width } else { i };

            let along_x = p(right) - p(left);
            let along_z = p(down) - p(up);
            normals[i] = along_z.cross(along_x).try_normalize().unwrap_or(Vec3::Y).into();
        }

        invocation.write(2, &normals)
    }
}

fn row_width(reference: &[GpuVec3]) -> usize {
    let Some(first) = reference.first() else {
        return 1;
    };
    let width = reference.iter().take_while(|v| v.z == first.z).count();
    if width == 0 || reference.len() % width != 0 {
        reference.len().max(1)
    } else {
        width
    }
}

/// `[1, 2, 1]` smoothing of the working normals along the buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceSmoothing;

impl Kernel for ReferenceSmoothing {
    fn name(&self) -> &str {
        SMOOTH_KERNEL
    }

    fn binding_count(&self) -> usize {
        2
    }

    fn execute(&self, invocation: &mut KernelInvocation<'_>) -> PennantResult<()> {
        let work: Vec<GpuVec3> = invocation.read(0)?;
        let mut output: Vec<GpuVec3> = invocation.read(1)?;

        let count = work.len().min(output.len());
        let n = invocation.active_len(count);
        for i in 0..n {
            let prev = work[i.saturating_sub(1)].to_vec3();
            let here = work[i].to_vec3();
            let next = work[(i + 1).min(count - 1)].to_vec3();
            let blended = prev + 2.0 * here + next;
            output[i] = blended.try_normalize().unwrap_or(here).into();
        }

        invocation.write(1, &output)
    }
}
