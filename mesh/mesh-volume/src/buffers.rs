//! Mesh buffers rotated into the slicing frame and sorted by height.

// Face counts fit comfortably in f64 / u32
#![allow(clippy::cast_precision_loss)]

use hashbrown::HashSet;
use mesh_types::MeshSource;
use nalgebra::{Isometry3, Point3, Vector3};
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{VolumeError, VolumeResult};
use crate::frame::SlicingFrame;

/// A triangle with its vertices ordered by height.
///
/// `a.z <= b.z <= c.z` always holds. The original winding is lost by the
/// sort, so the outward face normal is kept alongside.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SortedTriangle {
    /// Lowest vertex.
    pub a: Point3<f64>,
    /// Middle vertex.
    pub b: Point3<f64>,
    /// Highest vertex.
    pub c: Point3<f64>,
    /// Unit outward normal.
    pub normal: Vector3<f64>,
}

impl SortedTriangle {
    /// Sort three wound vertices by height, keeping the winding's normal.
    ///
    /// Returns `None` for a zero-area triangle.
    #[must_use]
    pub fn from_wound(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Option<Self> {
        let normal = (v1 - v0).cross(&(v2 - v0)).try_normalize(f64::EPSILON)?;

        let mut sorted = [v0, v1, v2];
        sorted.sort_by(|p, q| p.z.total_cmp(&q.z));
        let [a, b, c] = sorted;

        Some(Self { a, b, c, normal })
    }

    /// Vertical extent of the triangle.
    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.c.z - self.a.z
    }

    fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// A mesh expressed in a [`SlicingFrame`].
///
/// Vertices are deduplicated and sorted ascending by Z; triangles are sorted
/// ascending by their lowest vertex so band queries can stop early.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SlicedMesh {
    /// Unique vertices, ascending by height.
    pub vertices: Vec<Point3<f64>>,
    /// Triangles, ascending by lowest vertex height.
    pub triangles: Vec<SortedTriangle>,
    /// Lowest and highest vertex height.
    pub z_bounds: (f64, f64),
    /// Mean of the unique vertices.
    pub centroid: Point3<f64>,
    /// The frame the buffers are expressed in.
    pub frame: SlicingFrame,
}

impl SlicedMesh {
    /// Read a mesh's buffers, place them and rotate them into `frame`.
    ///
    /// Zero-area faces are dropped. If the faces are wound inside-out the
    /// stored normals are flipped so they point outward.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh has no vertices, no usable faces, or a
    /// face index out of range.
    pub fn extract<S: MeshSource + ?Sized>(
        source: &S,
        placement: &Isometry3<f64>,
        frame: SlicingFrame,
    ) -> VolumeResult<Self> {
        let positions = source.positions();
        if positions.is_empty() {
            return Err(VolumeError::empty_mesh(source.mesh_id().as_str()));
        }

        let placed: Vec<Point3<f64>> = positions
            .iter()
            .map(|p| frame.to_sliced(&(placement * p)))
            .collect();

        let mut triangles = Vec::with_capacity(source.faces().len());
        let mut signed_volume = 0.0;
        let mut degenerate = 0usize;

        for (face_index, face) in source.faces().iter().enumerate() {
            let mut corners = [Point3::origin(); 3];
            for (corner, &index) in corners.iter_mut().zip(face) {
                *corner = *placed.get(index as usize).ok_or(VolumeError::IndexOutOfRange {
                    face: face_index,
                    index,
                    vertex_count: placed.len(),
                })?;
            }
            let [v0, v1, v2] = corners;

            match SortedTriangle::from_wound(v0, v1, v2) {
                Some(tri) => {
                    signed_volume += v0.coords.dot(&v1.coords.cross(&v2.coords)) / 6.0;
                    triangles.push(tri);
                }
                None => degenerate += 1,
            }
        }

        if triangles.is_empty() {
            return Err(VolumeError::no_faces(source.mesh_id().as_str()));
        }
        if degenerate > 0 {
            debug!(
                mesh = %source.mesh_id(),
                degenerate,
                "Dropped zero-area faces"
            );
        }
        if signed_volume < 0.0 {
            warn!(
                mesh = %source.mesh_id(),
                "Faces are wound inside-out, flipping normals"
            );
            for tri in &mut triangles {
                *tri = tri.flipped();
            }
        }

        triangles.sort_by(|s, t| s.a.z.total_cmp(&t.a.z));

        let mut seen = HashSet::with_capacity(placed.len());
        let mut vertices: Vec<Point3<f64>> = placed
            .into_iter()
            .filter(|p| seen.insert([p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]))
            .collect();
        vertices.sort_by(|p, q| p.z.total_cmp(&q.z));

        let z_bounds = match (vertices.first(), vertices.last()) {
            (Some(lo), Some(hi)) => (lo.z, hi.z),
            _ => (0.0, 0.0),
        };

        let centroid = Point3::from(
            vertices.iter().map(|p| p.coords).sum::<Vector3<f64>>() / vertices.len() as f64,
        );

        Ok(Self {
            vertices,
            triangles,
            z_bounds,
            centroid,
            frame,
        })
    }

    /// Total vertical extent.
    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.z_bounds.1 - self.z_bounds.0
    }
}
