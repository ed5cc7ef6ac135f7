//! Indexed triangle mesh.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh.
///
/// Stores vertex positions and faces separately, with faces referencing
/// vertices by index. Faces use counter-clockwise winding when viewed from
/// outside, so the right-hand rule gives outward normals.
///
/// # Example
///
/// ```
/// use mesh_types::IndexedMesh;
/// use nalgebra::Point3;
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Point3::new(0.0, 0.0, 0.0));
/// mesh.vertices.push(Point3::new(1.0, 0.0, 0.0));
/// mesh.vertices.push(Point3::new(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,

    /// Triangle faces as indices into the vertex array.
    pub faces: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Create a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh from vertices and faces.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Point3<f64>>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangle faces.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// A mesh with no vertices or no faces encloses nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Iterate over triangles with resolved positions.
    ///
    /// Faces with out-of-range indices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.faces.iter().filter_map(|&[i0, i1, i2]| {
            Some([
                *self.vertices.get(i0 as usize)?,
                *self.vertices.get(i1 as usize)?,
                *self.vertices.get(i2 as usize)?,
            ])
        })
    }

    /// Reverse the winding of every face.
    pub fn flip_winding(&mut self) {
        for face in &mut self.faces {
            face.swap(1, 2);
        }
    }

    /// Compute the signed enclosed volume (divergence theorem).
    ///
    /// Sums the signed tetrahedra formed by each face and the origin. A
    /// closed mesh with outward winding gives a positive value, an
    /// inside-out mesh a negative one.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        self.triangles()
            .map(|[v0, v1, v2]| v0.coords.dot(&v1.coords.cross(&v2.coords)))
            .sum::<f64>()
            / 6.0
    }

    /// Absolute enclosed volume.
    #[inline]
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }
}

/// Create an axis-aligned box mesh spanning `min`..`max`.
///
/// 8 vertices, 12 triangles, outward CCW winding.
///
/// # Example
///
/// ```
/// use mesh_types::cuboid;
/// use nalgebra::Point3;
///
/// let slab = cuboid(Point3::origin(), Point3::new(10.0, 10.0, 10.0));
/// assert!((slab.volume() - 1000.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn cuboid(min: Point3<f64>, max: Point3<f64>) -> IndexedMesh {
    let (x0, y0, z0) = (min.x, min.y, min.z);
    let (x1, y1, z1) = (max.x, max.y, max.z);

    let vertices = vec![
        Point3::new(x0, y0, z0), // 0
        Point3::new(x1, y0, z0), // 1
        Point3::new(x1, y1, z0), // 2
        Point3::new(x0, y1, z0), // 3
        Point3::new(x0, y0, z1), // 4
        Point3::new(x1, y0, z1), // 5
        Point3::new(x1, y1, z1), // 6
        Point3::new(x0, y1, z1), // 7
    ];

    let faces = vec![
        // Bottom (-Z)
        [0, 2, 1],
        [0, 3, 2],
        // Top (+Z)
        [4, 5, 6],
        [4, 6, 7],
        // Front (-Y)
        [0, 1, 5],
        [0, 5, 4],
        // Back (+Y)
        [3, 7, 6],
        [3, 6, 2],
        // Left (-X)
        [0, 4, 7],
        [0, 7, 3],
        // Right (+X)
        [1, 2, 6],
        [1, 6, 5],
    ];

    IndexedMesh::from_parts(vertices, faces)
}

/// Unit cube from (0,0,0) to (1,1,1).
#[must_use]
pub fn unit_cube() -> IndexedMesh {
    cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mesh_is_empty() {
        let mut mesh = IndexedMesh::new();
        assert!(mesh.is_empty());

        mesh.vertices.push(Point3::origin());
        assert!(mesh.is_empty()); // no faces

        mesh.faces.push([0, 0, 0]);
        assert!(!mesh.is_empty());
    }

    #[test]
    fn unit_cube_volume() {
        assert_relative_eq!(unit_cube().signed_volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn flipped_cube_is_negative() {
        let mut cube = unit_cube();
        cube.flip_winding();
        assert!(cube.signed_volume() < 0.0);
        assert_relative_eq!(cube.volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn out_of_range_faces_are_skipped() {
        let mut mesh = unit_cube();
        mesh.faces.push([0, 1, 99]);
        assert_eq!(mesh.triangles().count(), 12);
    }
}
