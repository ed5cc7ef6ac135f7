//! End-to-end slicing scenarios on hand-built meshes.

use mesh_types::{cuboid, IndexedMesh, MeshId, MeshSource, NamedMesh};
use mesh_volume::{
    section_volume, sliced_exit_area, volumetric_slicing_plane, volumetric_slicing_plane_global,
    SearchParams, SlicedMesh, SlicingFrame, VolumeCache,
};
use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};

/// A mesh source that lives in a host engine's own buffers.
struct EngineMesh {
    name: &'static str,
    positions: Vec<Point3<f64>>,
    indices: Vec<[u32; 3]>,
}

impl MeshSource for EngineMesh {
    fn mesh_id(&self) -> MeshId {
        MeshId::new(self.name)
    }

    fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    fn faces(&self) -> &[[u32; 3]] {
        &self.indices
    }
}

/// Triangular prism: right triangle (legs 4, 3) in XZ, extruded 2 along Y.
fn wedge() -> IndexedMesh {
    IndexedMesh::from_parts(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(4.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 3.0),
        ],
        vec![
            // Front (-Y) and back (+Y)
            [0, 1, 2],
            [3, 5, 4],
            // Bottom (-Z)
            [0, 3, 4],
            [0, 4, 1],
            // Left (-X)
            [0, 2, 5],
            [0, 5, 3],
            // Slope
            [1, 4, 5],
            [1, 5, 2],
        ],
    )
}

#[test]
fn wedge_volume_and_half_height() {
    let mesh = NamedMesh::new("wedge", wedge());
    assert!(mesh.mesh.signed_volume() > 0.0);

    let mut cache = VolumeCache::new();
    let slice = volumetric_slicing_plane(
        &mesh,
        &Isometry3::identity(),
        0.5,
        &Vector3::z(),
        &SearchParams::precise(),
        &mut cache,
    )
    .unwrap();

    assert!((slice.total_volume - 12.0).abs() < 1e-9);
    // Section area shrinks linearly: V(h) = 12 (1 - (1 - h/3)^2)
    let expected = 3.0 * (1.0 - (0.5f64).sqrt());
    assert!((slice.depth - expected).abs() < 1e-4);
}

#[test]
fn wedge_sections_match_analytic() {
    let sliced = SlicedMesh::extract(
        &NamedMesh::new("wedge", wedge()),
        &Isometry3::identity(),
        SlicingFrame::upright(Point3::origin()),
    )
    .unwrap();

    let below = |h: f64| 12.0 * (1.0 - (1.0 - h / 3.0).powi(2));
    for (lo, hi) in [(0.0, 1.0), (0.5, 2.5), (1.0, 3.0)] {
        let v = section_volume(&sliced, lo, hi);
        assert!((v - (below(hi) - below(lo))).abs() < 1e-9, "band {lo}..{hi}: {v}");
    }
}

#[test]
fn host_buffers_are_sliced() {
    let cube = cuboid(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    let engine = EngineMesh {
        name: "engine/cube",
        positions: cube.vertices,
        indices: cube.faces,
    };

    let mut cache = VolumeCache::new();
    let slice = volumetric_slicing_plane(
        &engine,
        &Isometry3::identity(),
        0.75,
        &Vector3::z(),
        &SearchParams::precise(),
        &mut cache,
    )
    .unwrap();

    assert!((slice.total_volume - 8.0).abs() < 1e-9);
    assert!((slice.height - 0.5).abs() < 1e-6);
    assert!(cache.get(&MeshId::new("engine/cube")).is_some());
}

#[test]
fn rotated_body_keeps_volume() {
    let tank = NamedMesh::new("tilted-tank", cuboid(Point3::origin(), Point3::new(2.0, 3.0, 4.0)));
    let placement = Isometry3::from_parts(
        Vector3::new(5.0, 5.0, 5.0).into(),
        UnitQuaternion::from_euler_angles(0.4, -0.3, 1.1),
    );

    let mut cache = VolumeCache::new();
    let slice = volumetric_slicing_plane(
        &tank,
        &placement,
        0.5,
        &Vector3::z(),
        &SearchParams::precise(),
        &mut cache,
    )
    .unwrap();

    assert!((slice.total_volume - 24.0).abs() < 1e-6);
    // A box is point-symmetric, so half the volume sits below its center
    let center = placement * Point3::new(1.0, 1.5, 2.0);
    assert!((slice.point.z - center.z).abs() < 1e-4);
}

#[test]
fn exit_area_tilted_plane() {
    let tank = NamedMesh::new("tank", cuboid(Point3::origin(), Point3::new(10.0, 10.0, 10.0)));
    // Plane normal +X: sections are taken across X, spans lie in YZ
    let area = sliced_exit_area(
        &tank,
        &Isometry3::identity(),
        &Point3::new(4.0, 0.0, 0.0),
        &Vector3::x(),
    )
    .unwrap();
    assert!((area - 40.0 * 2f64.sqrt()).abs() < 1e-9);
}

#[test]
fn sheared_column_exit_area() {
    // 2 x 2 x 4 column leaning 10 units along +X over its height
    let mut column = cuboid(Point3::origin(), Point3::new(2.0, 2.0, 4.0));
    for vertex in &mut column.vertices {
        vertex.x += vertex.z * 2.5;
    }
    let column = NamedMesh::new("sheared-column", column);

    let area = sliced_exit_area(
        &column,
        &Isometry3::identity(),
        &Point3::new(0.0, 0.0, 4.0),
        &Vector3::z(),
    )
    .unwrap();
    // Every section is the same 2 x 2 square, only shifted
    assert!((area - 8.0 * 2f64.sqrt()).abs() < 1e-9, "area {area}");
}

#[test]
fn nearly_level_cube_fills_to_the_top() {
    let tank = NamedMesh::new("level-tank", cuboid(Point3::origin(), Point3::new(10.0, 10.0, 10.0)));
    // The tilt splits each face into a band thinner than the default min_band
    let placement = Isometry3::rotation(Vector3::x() * 5e-5);
    let params = SearchParams::default();

    let mut cache = VolumeCache::new();
    let slice = volumetric_slicing_plane(&tank, &placement, 1.0, &Vector3::z(), &params, &mut cache)
        .unwrap();

    assert!(slice.is_found());
    assert!((slice.total_volume - 1000.0).abs() < 1e-6);
    assert!(
        (slice.volume_below - 1000.0).abs() <= params.tolerance,
        "volume below {}",
        slice.volume_below
    );
}

#[test]
fn global_cache_is_shared() {
    let tank = NamedMesh::new(
        "slicing-tests/global-tank",
        cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0)),
    );

    for _ in 0..2 {
        let slice = volumetric_slicing_plane_global(
            &tank,
            &Isometry3::identity(),
            0.5,
            &Vector3::z(),
            &SearchParams::default(),
        )
        .unwrap();
        assert!(slice.is_found());
    }

    let cache = VolumeCache::global().lock().unwrap();
    let volume = cache.get(&tank.mesh_id()).unwrap();
    assert!((volume - 1.0).abs() < 1e-9);
}
