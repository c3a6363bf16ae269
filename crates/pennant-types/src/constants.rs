//! Pipeline constants and simulation defaults.

/// Smallest legal grid dimension along either axis.
pub const MIN_GRID_DIMENSION: u32 = 2;

/// Default grid resolution along X (vertices).
pub const DEFAULT_GRID_WIDTH: u32 = 32;

/// Default grid resolution along Z (vertices).
pub const DEFAULT_GRID_HEIGHT: u32 = 20;

/// Default wind vector fed to the integrate stage every tick.
pub const DEFAULT_WIND: [f32; 3] = [1.8, 0.0, 0.0];

/// Byte size of one device-side vector (three floats padded to 16 bytes).
pub const VEC3_STRIDE: usize = 16;

/// Byte size of one device-side texture coordinate.
pub const VEC2_STRIDE: usize = 8;

/// Half-thickness of the rest-pose bounding box along Y.
pub const REST_BOUNDS_THICKNESS: f32 = 0.1;

/// Kernel identifier of the position/velocity integrator.
pub const INTEGRATE_KERNEL: &str = "update_vertex";

/// Kernel identifier of the per-vertex normal pass.
pub const NORMALS_KERNEL: &str = "update_normal";

/// Kernel identifier of the normal smoothing pass.
pub const SMOOTH_KERNEL: &str = "smooth_normal";
