//! Vertical cross-section area below a slicing plane.

use mesh_types::MeshSource;
use nalgebra::{Isometry3, Point3, Vector3};
use tracing::debug;

use crate::buffers::SlicedMesh;
use crate::error::VolumeResult;
use crate::frame::SlicingFrame;
use crate::section::HEIGHT_EPSILON;

/// Widest chord of the mesh's horizontal section at `height`.
///
/// Collects every point where the section plane meets a triangle, including
/// vertices and edges lying on the plane, then returns the farthest pair.
/// Returns `None` when fewer than two points are found.
#[must_use]
pub fn slice_span(mesh: &SlicedMesh, height: f64) -> Option<(Point3<f64>, Point3<f64>)> {
    let mut points = Vec::new();

    for tri in &mesh.triangles {
        if tri.a.z > height + HEIGHT_EPSILON {
            break;
        }
        if tri.c.z < height - HEIGHT_EPSILON {
            continue;
        }

        if tri.height() <= HEIGHT_EPSILON {
            points.extend([tri.a, tri.b, tri.c]);
            continue;
        }

        points.push(lerp_at(&tri.a, &tri.c, height));
        if height > tri.b.z {
            points.push(lerp_at(&tri.b, &tri.c, height));
        } else {
            points.push(lerp_at(&tri.a, &tri.b, height));
        }
    }

    if points.len() < 2 {
        return None;
    }

    let a = farthest_from(&points, &points[0]);
    let b = farthest_from(&points, &a);
    Some((a, b))
}

/// Area of the vertical section through the mesh, from its base up to the
/// plane through `plane_point` with normal `plane_normal`.
///
/// Sums trapezoids between the slice spans at consecutive vertex heights,
/// each as tall as the height step between them. Sideways drift of the
/// spans does not add area.
///
/// # Errors
///
/// Returns an error for a degenerate normal or an unusable mesh.
///
/// # Example
///
/// ```
/// use mesh_types::{cuboid, NamedMesh};
/// use mesh_volume::sliced_exit_area;
/// use nalgebra::{Isometry3, Point3, Vector3};
///
/// let tank = NamedMesh::new("tank", cuboid(Point3::origin(), Point3::new(10.0, 10.0, 10.0)));
/// let area = sliced_exit_area(
///     &tank,
///     &Isometry3::identity(),
///     &Point3::new(5.0, 5.0, 5.0),
///     &Vector3::z(),
/// )
/// .unwrap();
///
/// // Diagonal section: 10 * sqrt(2) wide, 5 tall
/// assert!((area - 50.0 * 2f64.sqrt()).abs() < 1e-9);
/// ```
pub fn sliced_exit_area<S: MeshSource + ?Sized>(
    source: &S,
    placement: &Isometry3<f64>,
    plane_point: &Point3<f64>,
    plane_normal: &Vector3<f64>,
) -> VolumeResult<f64> {
    let frame = SlicingFrame::for_placement(placement, plane_normal)?;
    let mesh = SlicedMesh::extract(source, placement, frame)?;
    let plane_height = frame.to_sliced(plane_point).z;

    let area = exit_area(&mesh, plane_height);
    debug!(mesh = %source.mesh_id(), plane_height, area, "Computed exit area");
    Ok(area)
}

/// [`sliced_exit_area`] on buffers that are already in the slicing frame.
#[must_use]
pub fn exit_area(mesh: &SlicedMesh, plane_height: f64) -> f64 {
    let mut heights: Vec<f64> = Vec::with_capacity(mesh.vertices.len() + 1);
    for vertex in &mesh.vertices {
        if vertex.z > plane_height {
            heights.push(plane_height);
            break;
        }
        heights.push(vertex.z);
    }
    heights.dedup_by(|a, b| (*a - *b).abs() <= HEIGHT_EPSILON);

    let mut area = 0.0;
    let mut previous: Option<(f64, f64)> = None;

    for height in heights {
        let Some((a, b)) = slice_span(mesh, height) else {
            continue;
        };
        let length = (b - a).norm();

        if let Some((previous_length, previous_height)) = previous {
            area += (previous_length + length) / 2.0 * (height - previous_height);
        }
        previous = Some((length, height));
    }

    area
}

fn lerp_at(p: &Point3<f64>, q: &Point3<f64>, height: f64) -> Point3<f64> {
    let dz = q.z - p.z;
    if dz.abs() <= HEIGHT_EPSILON {
        return *q;
    }
    p + (q - p) * ((height - p.z) / dz)
}

fn farthest_from(points: &[Point3<f64>], origin: &Point3<f64>) -> Point3<f64> {
    points
        .iter()
        .copied()
        .max_by(|p, q| (p - origin).norm_squared().total_cmp(&(q - origin).norm_squared()))
        .unwrap_or(*origin)
}
