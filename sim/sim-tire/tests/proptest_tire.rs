//! Property-based tests for the tire force model.
//!
//! Run with: cargo test -p sim-tire -- proptest

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use nalgebra::{Point3, Vector3};
use proptest::prelude::*;
use sim_tire::{
    clamp_magnitude, compression_curve, ema_blend, grip_strength, DebugCounter, NullDebugSink,
    QueryFilter, QueryShape, RecordingBody, SubstepInfo, SweepHit, TireParams, Wheel,
    WheelBinding, WorldQuery,
};
use sim_types::{BodyId, Pose, RigidBodyState, Twist};

/// Ground plane at `z = 0`.
struct FlatGround;

impl WorldQuery for FlatGround {
    fn sweep(
        &self,
        shape: &QueryShape,
        start: &Point3<f64>,
        end: &Point3<f64>,
        _filter: &QueryFilter,
    ) -> Option<SweepHit> {
        let r = shape.radius();
        if start.z <= r {
            return Some(SweepHit {
                distance: 0.0,
                point: Point3::new(start.x, start.y, 0.0),
                normal: Vector3::z(),
            });
        }
        if end.z > r {
            return None;
        }
        let t = (start.z - r) / (start.z - end.z);
        let center = start + (end - start) * t;
        Some(SweepHit {
            distance: (center - start).norm(),
            point: Point3::new(center.x, center.y, 0.0),
            normal: Vector3::z(),
        })
    }

    fn overlap_any(&self, shape: &QueryShape, origin: &Point3<f64>, _filter: &QueryFilter) -> bool {
        origin.z - shape.radius() <= 0.0
    }
}

// =============================================================================
// Strategies
// =============================================================================

fn arb_vector(range: f64) -> impl Strategy<Value = Vector3<f64>> {
    prop::array::uniform3(-range..range).prop_map(|[x, y, z]| Vector3::new(x, y, z))
}

/// Small wheel tilt about x and y.
fn arb_pose(height: f64) -> impl Strategy<Value = Pose> {
    (-0.3..0.3f64, -0.3..0.3f64).prop_map(move |(roll, pitch)| {
        Pose::from_position_rotation(
            Point3::new(0.0, 0.0, height),
            nalgebra::UnitQuaternion::from_euler_angles(roll, pitch, 0.0),
        )
    })
}

// =============================================================================
// Curves and filters
// =============================================================================

proptest! {
    #[test]
    fn grip_is_monotone_and_bounded(a in 0.0..=1.0f64, b in 0.0..=1.0f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(grip_strength(lo) <= grip_strength(hi));
        prop_assert!(grip_strength(lo) >= 0.2 - 1e-12);
        prop_assert!(grip_strength(hi) <= 1.0 + 1e-12);
    }

    #[test]
    fn curve_spans_preload_to_one(
        c in 0.0..=1.0f64,
        power in 0.5..4.0f64,
        preload in 0.0..0.9f64,
    ) {
        let v = compression_curve(c, power, preload);
        prop_assert!(v >= preload - 1e-12);
        prop_assert!(v <= 1.0 + 1e-12);
    }

    #[test]
    fn clamp_never_exceeds_cap(force in arb_vector(1e5), cap in 0.0..1e4f64) {
        let clamped = clamp_magnitude(force, cap);
        prop_assert!(clamped.norm() <= cap * (1.0 + 1e-12) + 1e-12);
        // Direction is preserved
        prop_assert!(clamped.dot(&force) >= 0.0);
    }

    #[test]
    fn blend_stays_between(
        prev in arb_vector(1e3),
        raw in arb_vector(1e3),
        weight in 0.01..=1.0f64,
    ) {
        let out = ema_blend(&prev, &raw, weight);
        for i in 0..3 {
            let (lo, hi) = if prev[i] <= raw[i] { (prev[i], raw[i]) } else { (raw[i], prev[i]) };
            prop_assert!(out[i] >= lo - 1e-9 && out[i] <= hi + 1e-9);
        }
    }
}

// =============================================================================
// Wheel substeps
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn substep_state_stays_valid(
        height in 0.2..0.4f64,
        velocity in arb_vector(10.0),
        pose_seed in arb_pose(0.0),
    ) {
        let params = TireParams::coarse();
        let mut wheel =
            Wheel::initialize("Prop", params, WheelBinding::new(BodyId::new(1), "mesh")).unwrap();
        let mut pose = pose_seed;
        pose.position.z = height;
        let mut body = RecordingBody::new(RigidBodyState::new(pose, Twist::linear(velocity)));

        for index in 0..3 {
            let report = wheel.on_physics_substep(
                &SubstepInfo::new(1.0 / 240.0, index),
                &FlatGround,
                &mut body,
                &mut NullDebugSink,
            );
            prop_assert!(report.spring_total.is_finite());
            prop_assert!(report.friction_total.is_finite());
        }

        for impact in wheel.probes().iter() {
            prop_assert!((0.0..=1.0).contains(&impact.compression));
            prop_assert!(impact.hit || impact.compression == 0.0);
        }
        for (force, point) in &body.forces {
            prop_assert!(force.iter().all(|x| x.is_finite()));
            prop_assert!(point.coords.iter().all(|x| x.is_finite()));
        }
        prop_assert_eq!(wheel.debug_data().get(DebugCounter::Substeps), 3);
    }

    #[test]
    fn airborne_is_force_free(height in 0.4..100.0f64, velocity in arb_vector(50.0)) {
        let mut wheel = Wheel::initialize(
            "Prop",
            TireParams::coarse(),
            WheelBinding::new(BodyId::new(1), "mesh"),
        )
        .unwrap();
        let mut body = RecordingBody::new(RigidBodyState::new(
            Pose::from_position(Point3::new(0.0, 0.0, height)),
            Twist::linear(velocity),
        ));

        let report = wheel.on_physics_substep(
            &SubstepInfo::new(1.0 / 240.0, 0),
            &FlatGround,
            &mut body,
            &mut NullDebugSink,
        );

        prop_assert_eq!(report.total_hits, 0);
        prop_assert!(body.forces.is_empty());
        prop_assert_eq!(wheel.debug_data().get(DebugCounter::TotalHits), 0);
    }
}
