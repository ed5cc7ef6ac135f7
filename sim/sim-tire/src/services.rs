//! Host engine services consumed by the tire model.
//!
//! The tire model never talks to an engine directly. The host implements
//! [`WorldQuery`] for sweeps and overlaps and [`RigidBody`] for the wheel
//! body; the wheel only reads from the world and only adds forces to the
//! body.

use nalgebra::{Point3, Vector3};
use sim_types::{BodyId, Pose, RigidBodyState};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shape swept or tested against the world.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum QueryShape {
    /// Sphere of the given radius. Radius 0 is a ray.
    Sphere {
        /// Radius (m).
        radius: f64,
    },
}

impl QueryShape {
    /// Sphere shorthand.
    #[must_use]
    pub const fn sphere(radius: f64) -> Self {
        Self::Sphere { radius }
    }

    /// Radius of the shape.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        match *self {
            Self::Sphere { radius } => radius,
        }
    }
}

/// Which bodies a query ignores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QueryFilter {
    /// Body excluded from results, typically the wheel itself.
    pub ignore: Option<BodyId>,
}

impl QueryFilter {
    /// Filter excluding one body.
    #[must_use]
    pub const fn ignoring(body: BodyId) -> Self {
        Self { ignore: Some(body) }
    }

    /// Whether `body` passes the filter.
    #[must_use]
    pub fn accepts(&self, body: BodyId) -> bool {
        self.ignore != Some(body)
    }
}

/// First blocking hit of a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SweepHit {
    /// Distance travelled from the sweep start (m).
    pub distance: f64,
    /// Contact location on the hit surface.
    pub point: Point3<f64>,
    /// Surface normal at the contact, pointing out of the hit surface.
    pub normal: Vector3<f64>,
}

/// Blocking geometry queries against the world.
///
/// Implementations must be callable from the physics substep and may be
/// shared by several wheels.
pub trait WorldQuery {
    /// Sweep `shape` from `start` to `end` and return the first hit.
    fn sweep(
        &self,
        shape: &QueryShape,
        start: &Point3<f64>,
        end: &Point3<f64>,
        filter: &QueryFilter,
    ) -> Option<SweepHit>;

    /// Whether `shape` placed at `origin` overlaps anything.
    fn overlap_any(&self, shape: &QueryShape, origin: &Point3<f64>, filter: &QueryFilter) -> bool;
}

/// The rigid body a wheel pushes on.
///
/// Forces are accumulated by the engine, so several wheels may add to the
/// same body in any order.
pub trait RigidBody {
    /// Current world pose.
    fn pose(&self) -> Pose;

    /// Velocity of a world-space point attached to the body.
    fn linear_velocity_at_point(&self, point: &Point3<f64>) -> Vector3<f64>;

    /// Angular velocity (rad/s, world frame).
    fn angular_velocity(&self) -> Vector3<f64>;

    /// Add a force (N) at a world-space point for this substep.
    fn add_force_at_point(&mut self, force: &Vector3<f64>, point: &Point3<f64>);

    /// Add a torque (N·m) for this substep.
    fn add_torque(&mut self, torque: &Vector3<f64>);
}

/// Kinematic body that records everything pushed onto it.
///
/// Useful for offline tuning and tests: forces are summed, never integrated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingBody {
    /// Pose and velocity reported to the wheel.
    pub state: RigidBodyState,
    /// Every force added, with its application point.
    pub forces: Vec<(Vector3<f64>, Point3<f64>)>,
    /// Every torque added.
    pub torques: Vec<Vector3<f64>>,
}

impl RecordingBody {
    /// Body at the given state with nothing recorded.
    #[must_use]
    pub fn new(state: RigidBodyState) -> Self {
        Self {
            state,
            forces: Vec::new(),
            torques: Vec::new(),
        }
    }

    /// Sum of recorded forces.
    #[must_use]
    pub fn net_force(&self) -> Vector3<f64> {
        self.forces.iter().map(|(f, _)| f).sum()
    }

    /// Sum of recorded torques plus the moments of recorded forces about
    /// the body position.
    #[must_use]
    pub fn net_torque(&self) -> Vector3<f64> {
        let origin = self.state.pose.position;
        let moments: Vector3<f64> = self
            .forces
            .iter()
            .map(|(f, p)| (p - origin).cross(f))
            .sum();
        moments + self.torques.iter().sum::<Vector3<f64>>()
    }

    /// Forget recorded forces and torques.
    pub fn clear(&mut self) {
        self.forces.clear();
        self.torques.clear();
    }
}

impl RigidBody for RecordingBody {
    fn pose(&self) -> Pose {
        self.state.pose
    }

    fn linear_velocity_at_point(&self, point: &Point3<f64>) -> Vector3<f64> {
        self.state.velocity_at_point(point)
    }

    fn angular_velocity(&self) -> Vector3<f64> {
        self.state.twist.angular
    }

    fn add_force_at_point(&mut self, force: &Vector3<f64>, point: &Point3<f64>) {
        self.forces.push((*force, *point));
    }

    fn add_torque(&mut self, torque: &Vector3<f64>) {
        self.torques.push(*torque);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sim_types::Twist;

    #[test]
    fn filter_ignores_own_body() {
        let filter = QueryFilter::ignoring(BodyId::new(3));
        assert!(!filter.accepts(BodyId::new(3)));
        assert!(filter.accepts(BodyId::new(4)));
        assert!(QueryFilter::default().accepts(BodyId::new(3)));
    }

    #[test]
    fn shape_radius() {
        assert_relative_eq!(QueryShape::sphere(0.2).radius(), 0.2);
        assert_relative_eq!(QueryShape::sphere(0.0).radius(), 0.0);
    }

    #[test]
    fn recording_body_sums() {
        let state = RigidBodyState::new(
            Pose::from_position(Point3::new(0.0, 0.0, 1.0)),
            Twist::linear(Vector3::new(2.0, 0.0, 0.0)),
        );
        let mut body = RecordingBody::new(state);
        body.add_force_at_point(&Vector3::new(0.0, 0.0, 10.0), &Point3::new(1.0, 0.0, 1.0));
        body.add_force_at_point(&Vector3::new(0.0, 0.0, 5.0), &Point3::new(-1.0, 0.0, 1.0));
        body.add_torque(&Vector3::new(0.0, 0.0, 1.0));

        assert_relative_eq!(body.net_force(), Vector3::new(0.0, 0.0, 15.0));
        // (1,0,0) × (0,0,10) + (-1,0,0) × (0,0,5) = (0,-10,0) + (0,5,0)
        assert_relative_eq!(body.net_torque(), Vector3::new(0.0, -5.0, 1.0));
        assert_relative_eq!(
            body.linear_velocity_at_point(&Point3::origin()),
            Vector3::new(2.0, 0.0, 0.0)
        );

        body.clear();
        assert!(body.forces.is_empty());
    }
}
