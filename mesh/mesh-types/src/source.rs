//! Read-only mesh buffer access.

use std::sync::Arc;

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::IndexedMesh;

/// Stable identity of a mesh asset.
///
/// Used as the key for memoized per-mesh quantities. Two sources that report
/// the same id must describe the same geometry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshId(Arc<str>);

impl MeshId {
    /// Create an id from an asset name or path.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MeshId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MeshId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Read-only access to a mesh's vertex and triangle buffers.
///
/// Positions are in the mesh's local frame; callers supply the placement.
pub trait MeshSource {
    /// Stable identity of the geometry.
    fn mesh_id(&self) -> MeshId;

    /// Vertex positions.
    fn positions(&self) -> &[Point3<f64>];

    /// Triangle faces as vertex indices.
    fn faces(&self) -> &[[u32; 3]];
}

/// An [`IndexedMesh`] tagged with its identity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NamedMesh {
    /// Identity used for caching.
    pub id: MeshId,
    /// Geometry.
    pub mesh: IndexedMesh,
}

impl NamedMesh {
    /// Pair a mesh with an id.
    #[must_use]
    pub fn new(id: impl Into<MeshId>, mesh: IndexedMesh) -> Self {
        Self {
            id: id.into(),
            mesh,
        }
    }
}

impl MeshSource for NamedMesh {
    fn mesh_id(&self) -> MeshId {
        self.id.clone()
    }

    fn positions(&self) -> &[Point3<f64>] {
        &self.mesh.vertices
    }

    fn faces(&self) -> &[[u32; 3]] {
        &self.mesh.faces
    }
}
