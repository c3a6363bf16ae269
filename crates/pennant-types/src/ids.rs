//! Strongly-typed identifiers for pipeline resources.
//!
//! Newtype wrappers prevent accidental mixing of cloth instances
//! with device buffers or render meshes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one simulated cloth instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClothId(pub u32);

/// Identifies one device-resident buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BufferId(pub u32);

/// Identifies one render mesh owned by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RenderMeshId(pub u32);

impl ClothId {
    /// Returns the raw index as `usize`.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl BufferId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl RenderMeshId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for ClothId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<u32> for BufferId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<u32> for RenderMeshId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl fmt::Display for ClothId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cloth#{}", self.0)
    }
}
