//! Error types for volumetric slicing.

use thiserror::Error;

/// Result type alias for volumetric slicing operations.
pub type VolumeResult<T> = Result<T, VolumeError>;

/// Errors that can occur while slicing a mesh by volume.
#[derive(Debug, Error)]
pub enum VolumeError {
    /// The mesh has no vertices.
    #[error("mesh '{mesh}' has no vertices")]
    EmptyMesh {
        /// Mesh identity.
        mesh: String,
    },

    /// The mesh has vertices but no usable triangles.
    #[error("mesh '{mesh}' has no non-degenerate faces")]
    NoFaces {
        /// Mesh identity.
        mesh: String,
    },

    /// A face refers to a vertex that does not exist.
    #[error("face {face} references vertex {index}, mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        /// Face index.
        face: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// Fill fraction outside `[0, 1]`.
    #[error("fill fraction must be in [0, 1], got {0}")]
    InvalidAlpha(f64),

    /// Plane normal is zero-length or not finite.
    #[error("plane normal is degenerate: ({x}, {y}, {z})")]
    DegenerateNormal {
        /// X component.
        x: f64,
        /// Y component.
        y: f64,
        /// Z component.
        z: f64,
    },

    /// Invalid search parameters.
    #[error("invalid search parameters: {0}")]
    InvalidParams(String),
}

impl VolumeError {
    /// Create an empty mesh error.
    #[must_use]
    pub fn empty_mesh(mesh: impl Into<String>) -> Self {
        Self::EmptyMesh { mesh: mesh.into() }
    }

    /// Create a no-faces error.
    #[must_use]
    pub fn no_faces(mesh: impl Into<String>) -> Self {
        Self::NoFaces { mesh: mesh.into() }
    }

    /// Create an invalid params error.
    #[must_use]
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::InvalidParams(details.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VolumeError::empty_mesh("hull");
        assert!(format!("{err}").contains("hull"));

        let err = VolumeError::InvalidAlpha(1.5);
        assert!(format!("{err}").contains("1.5"));

        let err = VolumeError::IndexOutOfRange {
            face: 3,
            index: 42,
            vertex_count: 8,
        };
        let msg = format!("{err}");
        assert!(msg.contains("42"));
        assert!(msg.contains('8'));

        let err = VolumeError::invalid_params("iterations must be positive");
        assert!(format!("{err}").contains("iterations"));
    }
}
