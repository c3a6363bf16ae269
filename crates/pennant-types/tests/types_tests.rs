//! Integration tests for pennant-types.

use pennant_types::{BufferId, ClothId, PennantError, RenderMeshId};

// ─── ID Tests ──────────────────────────────────────────────────

#[test]
fn cloth_id_index() {
    let id = ClothId(42);
    assert_eq!(id.index(), 42);
}

#[test]
fn buffer_id_from_u32() {
    let id: BufferId = 7.into();
    assert_eq!(id, BufferId(7));
    assert_eq!(id.index(), 7);
}

#[test]
fn cloth_id_display() {
    assert_eq!(ClothId(3).to_string(), "cloth#3");
}

#[test]
fn ids_are_serializable() {
    let id = RenderMeshId(100);
    let json = serde_json::to_string(&id).unwrap();
    let deserialized: RenderMeshId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, deserialized);
}

// ─── Error Tests ──────────────────────────────────────────────

#[test]
fn invalid_dimension_display() {
    let err = PennantError::InvalidDimension { width: 1, height: 5 };
    let msg = err.to_string();
    assert!(msg.contains("1x5"));
}

#[test]
fn kernel_not_found_display() {
    let err = PennantError::KernelNotFound("update_vertex".into());
    assert!(err.to_string().contains("update_vertex"));
}

#[test]
fn only_render_mesh_unavailable_is_recoverable() {
    assert!(PennantError::RenderMeshUnavailable("resizing".into()).is_recoverable());
    assert!(!PennantError::DeviceLost("queue timeout".into()).is_recoverable());
    assert!(!PennantError::BufferAllocationFailure {
        requested: 1024,
        reason: "out of memory".into(),
    }
    .is_recoverable());
    assert!(!PennantError::KernelNotFound("x".into()).is_recoverable());
}

#[test]
fn io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err: PennantError = io.into();
    assert!(matches!(err, PennantError::Io(_)));
}
