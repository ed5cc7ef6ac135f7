//! Core types for the vehicle simulation crates.
//!
//! This crate provides the small vocabulary the tire contact model shares
//! with whatever physics engine hosts it:
//!
//! - [`BodyId`] - Opaque identity of a rigid body in the host engine
//! - [`Pose`] - Position and orientation, with body-axis accessors
//! - [`Twist`] - Linear and angular velocity
//! - [`RigidBodyState`] - Pose and twist together
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no behavior tied to a particular
//! engine; the host converts its own transforms into [`Pose`] at the seam.
//!
//! # Coordinate System
//!
//! - X: right
//! - Y: forward
//! - Z: up
//! - Right-handed
//!
//! # Example
//!
//! ```
//! use sim_types::{Pose, Twist, RigidBodyState};
//! use nalgebra::{Point3, Vector3};
//!
//! let state = RigidBodyState::new(
//!     Pose::from_position(Point3::new(0.0, 0.0, 0.3)),
//!     Twist::linear(Vector3::new(0.0, 10.0, 0.0)),
//! );
//!
//! let v = state.velocity_at_point(&Point3::new(0.0, 0.0, 0.0));
//! assert!((v.y - 10.0).abs() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn)]

mod body;

pub use body::{BodyId, Pose, RigidBodyState, Twist, WORLD_UP};

// Re-export math types for convenience
pub use nalgebra::{Point3, UnitQuaternion, Vector3};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_axes_are_orthonormal() {
        let pose = Pose::from_position_rotation(
            Point3::origin(),
            UnitQuaternion::from_euler_angles(0.3, -0.2, 1.1),
        );

        let (r, f, u) = (pose.right(), pose.forward(), pose.up());
        assert!((r.norm() - 1.0).abs() < 1e-12);
        assert!(r.dot(&f).abs() < 1e-12);
        assert!((r.cross(&f) - u).norm() < 1e-12);
    }
}
