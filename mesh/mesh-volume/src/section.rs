//! Volume enclosed between two heights by pyramid decomposition.
//!
//! The part of the mesh between `bottom` and `top` is closed off by two
//! horizontal caps. Every face of that closed band is the base of a pyramid
//! whose apex lies on the top cap, so the top cap contributes nothing and the
//! band volume is the signed sum over the clipped side faces plus the bottom
//! cap.
//!
//! The bottom cap is assembled from the bottom edges of the clipped side
//! faces rather than from an angular sort of its corners. For convex
//! sections the two agree; the edge form also handles non-convex and
//! multi-loop sections.

use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

use crate::buffers::{SlicedMesh, SortedTriangle};

/// Heights closer than this are treated as equal.
pub const HEIGHT_EPSILON: f64 = 1e-9;

/// A triangle clipped to a band has at most five corners.
type Polygon = SmallVec<[Point3<f64>; 5]>;

/// Volume of `mesh` between the heights `bottom` and `top`.
///
/// Returns 0 for a zero-height band. Bands may extend past the mesh; only
/// the enclosed part counts.
///
/// # Example
///
/// ```
/// use mesh_types::{cuboid, NamedMesh};
/// use mesh_volume::{section_volume, SlicedMesh, SlicingFrame};
/// use nalgebra::{Isometry3, Point3};
///
/// let cube = NamedMesh::new("cube", cuboid(Point3::origin(), Point3::new(10.0, 10.0, 10.0)));
/// let sliced = SlicedMesh::extract(
///     &cube,
///     &Isometry3::identity(),
///     SlicingFrame::upright(Point3::origin()),
/// )
/// .unwrap();
///
/// assert!((section_volume(&sliced, 2.0, 5.0) - 300.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn section_volume(mesh: &SlicedMesh, bottom: f64, top: f64) -> f64 {
    if (top - bottom).abs() <= HEIGHT_EPSILON {
        return 0.0;
    }
    let (bottom, top) = if bottom <= top {
        (bottom, top)
    } else {
        (top, bottom)
    };

    let apex = Point3::new(mesh.centroid.x, mesh.centroid.y, top);
    let mut side_volume = 0.0;
    let mut cap_twice_area = 0.0;

    for tri in &mesh.triangles {
        if tri.a.z >= top - HEIGHT_EPSILON {
            break;
        }
        if tri.c.z <= bottom + HEIGHT_EPSILON {
            continue;
        }

        let polygon = clip_to_band(tri, bottom, top);
        if polygon.len() < 3 {
            continue;
        }

        let area = vector_area(&polygon);
        // Sorting the corners may have reversed the winding
        let orientation = if area.dot(&tri.normal) >= 0.0 { 1.0 } else { -1.0 };

        side_volume += orientation * area.dot(&(polygon[0] - apex)) / 3.0;
        cap_twice_area += orientation * bottom_edge_cross(&polygon, bottom, &mesh.centroid);
    }

    // Side faces run around the bottom loop counter-clockwise seen from
    // above; the cap closes it the other way, facing down.
    let cap_area = cap_twice_area / 2.0;
    let cap_volume = cap_area * (top - bottom) / 3.0;

    side_volume + cap_volume
}

/// Volume of each band between consecutive distinct vertex heights.
///
/// The sum over all bands is the enclosed volume of the mesh.
#[must_use]
pub fn vertex_band_volumes(mesh: &SlicedMesh) -> Vec<f64> {
    mesh.vertices
        .windows(2)
        .map(|w| section_volume(mesh, w[0].z, w[1].z))
        .collect()
}

/// Clip a triangle to `bottom <= z <= top`, preserving its corner order.
fn clip_to_band(tri: &SortedTriangle, bottom: f64, top: f64) -> Polygon {
    let triangle: Polygon = SmallVec::from_slice(&[tri.a, tri.b, tri.c]);
    let above = clip_half_space(&triangle, bottom, true);
    clip_half_space(&above, top, false)
}

/// Sutherland-Hodgman against one horizontal plane.
///
/// Keeps `z >= height` when `keep_above`, else `z <= height`. Points on the
/// plane are kept and crossing points are snapped onto it.
fn clip_half_space(polygon: &Polygon, height: f64, keep_above: bool) -> Polygon {
    let inside = |p: &Point3<f64>| {
        if keep_above {
            p.z >= height - HEIGHT_EPSILON
        } else {
            p.z <= height + HEIGHT_EPSILON
        }
    };

    let mut out = Polygon::new();
    for (i, current) in polygon.iter().enumerate() {
        let next = &polygon[(i + 1) % polygon.len()];
        let current_in = inside(current);

        if current_in {
            out.push(*current);
        }
        if current_in != inside(next) {
            out.push(crossing(current, next, height));
        }
    }
    out
}

/// Point where segment `p`-`q` crosses the plane `z = height`.
fn crossing(p: &Point3<f64>, q: &Point3<f64>, height: f64) -> Point3<f64> {
    let dz = q.z - p.z;
    let t = if dz.abs() <= f64::EPSILON {
        0.0
    } else {
        ((height - p.z) / dz).clamp(0.0, 1.0)
    };
    let mut point = p + (q - p) * t;
    point.z = height;
    point
}

/// Vector area of a planar polygon (half the sum of edge cross products).
fn vector_area(polygon: &Polygon) -> Vector3<f64> {
    let origin = polygon[0];
    let mut sum = Vector3::zeros();
    for i in 1..polygon.len() - 1 {
        sum += (polygon[i] - origin).cross(&(polygon[i + 1] - origin));
    }
    sum / 2.0
}

/// Twice the signed area swept by the polygon's edges lying on `z = height`,
/// measured about `center` in the XY plane.
fn bottom_edge_cross(polygon: &Polygon, height: f64, center: &Point3<f64>) -> f64 {
    let on_plane = |p: &Point3<f64>| (p.z - height).abs() <= HEIGHT_EPSILON;

    let mut sum = 0.0;
    for (i, p) in polygon.iter().enumerate() {
        let q = &polygon[(i + 1) % polygon.len()];
        if on_plane(p) && on_plane(q) {
            let (px, py) = (p.x - center.x, p.y - center.y);
            let (qx, qy) = (q.x - center.x, q.y - center.y);
            sum += px * qy - py * qx;
        }
    }
    sum
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::frame::SlicingFrame;
    use approx::assert_relative_eq;
    use mesh_types::{cuboid, IndexedMesh, NamedMesh};
    use nalgebra::Isometry3;

    fn sliced(mesh: IndexedMesh) -> SlicedMesh {
        SlicedMesh::extract(
            &NamedMesh::new("test", mesh),
            &Isometry3::identity(),
            SlicingFrame::upright(Point3::origin()),
        )
        .unwrap()
    }

    fn cube10() -> SlicedMesh {
        sliced(cuboid(Point3::origin(), Point3::new(10.0, 10.0, 10.0)))
    }

    fn tetrahedron() -> IndexedMesh {
        IndexedMesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(3.0, 0.0, 0.0),
                Point3::new(0.0, 3.0, 0.0),
                Point3::new(0.0, 0.0, 3.0),
            ],
            vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        )
    }

    #[test]
    fn zero_height_band_is_empty() {
        let mesh = cube10();
        assert_relative_eq!(section_volume(&mesh, 4.0, 4.0), 0.0);
    }

    #[test]
    fn full_cube() {
        assert_relative_eq!(section_volume(&cube10(), 0.0, 10.0), 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn cube_bands_are_linear() {
        let mesh = cube10();
        assert_relative_eq!(section_volume(&mesh, 0.0, 5.0), 500.0, epsilon = 1e-9);
        assert_relative_eq!(section_volume(&mesh, 2.5, 7.5), 500.0, epsilon = 1e-9);
        assert_relative_eq!(section_volume(&mesh, 9.0, 10.0), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn band_order_does_not_matter() {
        let mesh = cube10();
        assert_relative_eq!(
            section_volume(&mesh, 7.0, 3.0),
            section_volume(&mesh, 3.0, 7.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn band_past_mesh_is_clamped() {
        let mesh = cube10();
        assert_relative_eq!(section_volume(&mesh, -5.0, 20.0), 1000.0, epsilon = 1e-9);
        assert_relative_eq!(section_volume(&mesh, 11.0, 20.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn tetrahedron_bands() {
        let mesh = sliced(tetrahedron());
        // Full volume 3^3 / 6 = 4.5; below half height 4.5 * (1 - 1/8)
        assert_relative_eq!(section_volume(&mesh, 0.0, 3.0), 4.5, epsilon = 1e-9);
        assert_relative_eq!(section_volume(&mesh, 0.0, 1.5), 4.5 * 7.0 / 8.0, epsilon = 1e-9);
    }

    #[test]
    fn vertex_bands_sum_to_volume() {
        let mesh = sliced(tetrahedron());
        let total: f64 = vertex_band_volumes(&mesh).iter().sum();
        assert_relative_eq!(total, 4.5, epsilon = 1e-9);
    }

    #[test]
    fn non_convex_section() {
        // Two disjoint boxes side by side: each horizontal section has two loops
        let mut mesh = cuboid(Point3::origin(), Point3::new(1.0, 1.0, 4.0));
        let other = cuboid(Point3::new(3.0, 0.0, 1.0), Point3::new(5.0, 1.0, 3.0));
        let offset = u32::try_from(mesh.vertices.len()).unwrap();
        mesh.vertices.extend(other.vertices);
        mesh.faces
            .extend(other.faces.iter().map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]));

        let mesh = sliced(mesh);
        assert_relative_eq!(section_volume(&mesh, 0.0, 4.0), 8.0, epsilon = 1e-9);
        // z in [1.5, 2.5]: 1 from the tall box + 2 from the wide one
        assert_relative_eq!(section_volume(&mesh, 1.5, 2.5), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn clip_middle_vertex_inside_band() {
        let tri = SortedTriangle::from_wound(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 2.0),
            Point3::new(0.0, 0.0, 4.0),
        )
        .unwrap();
        let polygon = clip_to_band(&tri, 1.0, 3.0);
        assert_eq!(polygon.len(), 5);
        assert!(polygon.iter().all(|p| p.z >= 1.0 - HEIGHT_EPSILON && p.z <= 3.0 + HEIGHT_EPSILON));
    }
}
