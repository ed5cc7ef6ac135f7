//! Rigid body identity, pose and velocity types.

use nalgebra::{Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// World up direction (+Z).
pub const WORLD_UP: Vector3<f64> = Vector3::new(0.0, 0.0, 1.0);

/// Unique identifier for a rigid body in the host engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub u64);

impl BodyId {
    /// Create a new body ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl From<u64> for BodyId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// Position and orientation of a rigid body.
///
/// # Example
///
/// ```
/// use sim_types::Pose;
/// use nalgebra::{Point3, UnitQuaternion, Vector3};
///
/// let pose = Pose::from_position_rotation(
///     Point3::new(1.0, 0.0, 0.0),
///     UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2),
/// );
///
/// // Local +X (right) now points along world +Y
/// assert!((pose.right() - Vector3::y()).norm() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position in world coordinates.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Create an identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position only (identity rotation).
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position and rotation.
    #[must_use]
    pub const fn from_position_rotation(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self { position, rotation }
    }

    /// Transform a vector from local to world coordinates (rotation only).
    #[must_use]
    pub fn transform_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * local
    }

    /// Local +X (right) in world coordinates.
    #[must_use]
    pub fn right(&self) -> Vector3<f64> {
        self.transform_vector(&Vector3::x())
    }

    /// Local +Y (forward) in world coordinates.
    #[must_use]
    pub fn forward(&self) -> Vector3<f64> {
        self.transform_vector(&Vector3::y())
    }

    /// Local +Z (up) in world coordinates.
    #[must_use]
    pub fn up(&self) -> Vector3<f64> {
        self.transform_vector(&Vector3::z())
    }

    /// Check if the pose contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }
}

/// Linear and angular velocity of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Twist {
    /// Linear velocity of the center of mass (world frame).
    pub linear: Vector3<f64>,
    /// Angular velocity (world frame, rad/s).
    pub angular: Vector3<f64>,
}

impl Default for Twist {
    fn default() -> Self {
        Self::zero()
    }
}

impl Twist {
    /// Create a twist with specified linear and angular velocity.
    #[must_use]
    pub const fn new(linear: Vector3<f64>, angular: Vector3<f64>) -> Self {
        Self { linear, angular }
    }

    /// Create a zero twist (at rest).
    #[must_use]
    pub fn zero() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    /// Create a twist with linear velocity only.
    #[must_use]
    pub fn linear(v: Vector3<f64>) -> Self {
        Self::new(v, Vector3::zeros())
    }

    /// Create a twist with angular velocity only.
    #[must_use]
    pub fn angular(omega: Vector3<f64>) -> Self {
        Self::new(Vector3::zeros(), omega)
    }

    /// Velocity of a point at `offset` from the center of mass.
    ///
    /// `v_point = v_linear + omega × r`
    #[must_use]
    pub fn velocity_at_point(&self, offset: &Vector3<f64>) -> Vector3<f64> {
        self.linear + self.angular.cross(offset)
    }

    /// Check if the twist contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.linear.iter().all(|x| x.is_finite()) && self.angular.iter().all(|x| x.is_finite())
    }
}

/// Pose and velocity of a body, with the center of mass in world space.
///
/// Host engines that keep their own body representation only need this at
/// the seam; it is also convenient for offline tools and tests.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidBodyState {
    /// Body pose.
    pub pose: Pose,
    /// Body velocity.
    pub twist: Twist,
}

impl RigidBodyState {
    /// Create a state from pose and twist.
    #[must_use]
    pub const fn new(pose: Pose, twist: Twist) -> Self {
        Self { pose, twist }
    }

    /// Velocity of a world-space point rigidly attached to the body.
    #[must_use]
    pub fn velocity_at_point(&self, point: &Point3<f64>) -> Vector3<f64> {
        self.twist.velocity_at_point(&(point - self.pose.position))
    }

    /// Check that both pose and twist are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.pose.is_finite() && self.twist.is_finite()
    }
}
