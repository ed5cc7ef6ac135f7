//! Per-substep wheel contact frame.

use nalgebra::{Point3, Vector3};
use sim_types::{Pose, WORLD_UP};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{TireError, TireResult};
use crate::params::FrameMode;

/// Axes shorter than this are degenerate.
pub const FRAME_EPSILON: f64 = 1e-6;

/// How a [`WheelFrame`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrameStatus {
    /// Axle as right, world up projected off it.
    Projected,
    /// The axle was vertical; the vehicle body's axes were used instead.
    DegenerateFallback,
    /// Vehicle body axes by configuration.
    VehicleBody,
}

/// Orthonormal wheel frame at the hub.
///
/// Right-handed: `forward = up × right`. Recomputed every substep.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WheelFrame {
    /// Hub position.
    pub position: Point3<f64>,
    /// Axle direction.
    pub right: Vector3<f64>,
    /// Up, orthogonal to the axle.
    pub up: Vector3<f64>,
    /// Rolling direction.
    pub forward: Vector3<f64>,
}

impl WheelFrame {
    /// Build the frame for a wheel body.
    ///
    /// `chassis` is the vehicle body pose. It is required for
    /// [`FrameMode::VehicleBody`] and serves as the fallback when the axle
    /// points straight up; without it [`FrameMode::VehicleBody`] behaves like
    /// [`FrameMode::ProjectedWorldUp`].
    ///
    /// # Errors
    ///
    /// Returns [`TireError::DegenerateFrame`] when an axis is not finite or
    /// zero-length and no usable fallback exists.
    ///
    /// # Example
    ///
    /// ```
    /// use sim_tire::{FrameMode, FrameStatus, WheelFrame};
    /// use sim_types::Pose;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let pose = Pose::from_position(Point3::new(0.0, 0.0, 0.3));
    /// let (frame, status) = WheelFrame::build(&pose, None, FrameMode::ProjectedWorldUp).unwrap();
    ///
    /// assert_eq!(status, FrameStatus::Projected);
    /// assert!((frame.forward - Vector3::y()).norm() < 1e-12);
    /// ```
    pub fn build(
        wheel: &Pose,
        chassis: Option<&Pose>,
        mode: FrameMode,
    ) -> TireResult<(Self, FrameStatus)> {
        if !wheel.position.coords.iter().all(|x| x.is_finite()) {
            return Err(TireError::degenerate_frame("position"));
        }

        if mode == FrameMode::VehicleBody {
            if let Some(chassis) = chassis {
                let frame = Self::from_body_axes(wheel.position, chassis)?;
                return Ok((frame, FrameStatus::VehicleBody));
            }
        }

        let right = unit_axis(wheel.right(), "right")?;
        let projected = WORLD_UP - right * WORLD_UP.dot(&right);

        match projected.try_normalize(FRAME_EPSILON) {
            Some(up) => {
                let forward = unit_axis(up.cross(&right), "forward")?;
                Ok((
                    Self {
                        position: wheel.position,
                        right,
                        up,
                        forward,
                    },
                    FrameStatus::Projected,
                ))
            }
            None => {
                let chassis = chassis.ok_or(TireError::degenerate_frame("up"))?;
                debug!("Wheel axle is vertical, using vehicle body axes");
                let frame = Self::from_body_axes(wheel.position, chassis)?;
                Ok((frame, FrameStatus::DegenerateFallback))
            }
        }
    }

    /// Frame at `position` with a body's axes.
    ///
    /// # Errors
    ///
    /// Returns [`TireError::DegenerateFrame`] for non-finite or zero axes.
    pub fn from_body_axes(position: Point3<f64>, body: &Pose) -> TireResult<Self> {
        Ok(Self {
            position,
            right: unit_axis(body.right(), "right")?,
            up: unit_axis(body.up(), "up")?,
            forward: unit_axis(body.forward(), "forward")?,
        })
    }

    /// Check that all axes are unit length and mutually orthogonal.
    #[must_use]
    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        let unit = |v: &Vector3<f64>| (v.norm() - 1.0).abs() <= tolerance;
        unit(&self.right)
            && unit(&self.up)
            && unit(&self.forward)
            && self.right.dot(&self.up).abs() <= tolerance
            && self.right.dot(&self.forward).abs() <= tolerance
            && self.up.dot(&self.forward).abs() <= tolerance
    }
}

fn unit_axis(axis: Vector3<f64>, name: &'static str) -> TireResult<Vector3<f64>> {
    if !axis.iter().all(|x| x.is_finite()) {
        return Err(TireError::degenerate_frame(name));
    }
    axis.try_normalize(FRAME_EPSILON)
        .ok_or(TireError::degenerate_frame(name))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn upright_wheel() {
        let pose = Pose::from_position(Point3::new(1.0, 2.0, 0.3));
        let (frame, status) = WheelFrame::build(&pose, None, FrameMode::ProjectedWorldUp).unwrap();

        assert_eq!(status, FrameStatus::Projected);
        assert_relative_eq!(frame.right, Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(frame.up, Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(frame.forward, Vector3::y(), epsilon = 1e-12);
        assert_eq!(frame.position, pose.position);
    }

    #[test]
    fn spinning_wheel_keeps_frame() {
        // Rolling about the axle must not tilt the contact frame
        let pose = Pose::from_position_rotation(
            Point3::origin(),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 1.234),
        );
        let (frame, _) = WheelFrame::build(&pose, None, FrameMode::ProjectedWorldUp).unwrap();
        assert_relative_eq!(frame.up, Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(frame.forward, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn cambered_wheel_is_orthonormal() {
        let pose = Pose::from_position_rotation(
            Point3::origin(),
            UnitQuaternion::from_euler_angles(0.3, 0.2, 0.7),
        );
        let (frame, _) = WheelFrame::build(&pose, None, FrameMode::ProjectedWorldUp).unwrap();
        assert!(frame.is_orthonormal(1e-12));
        assert!(frame.up.z > 0.0);
        assert_relative_eq!(frame.up.cross(&frame.right), frame.forward, epsilon = 1e-12);
    }

    #[test]
    fn vertical_axle_falls_back_to_chassis() {
        // Wheel lying flat: local +X points up
        let wheel = Pose::from_position_rotation(
            Point3::new(0.0, 0.0, 1.0),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -FRAC_PI_2),
        );
        assert_relative_eq!(wheel.right(), Vector3::z(), epsilon = 1e-12);

        let chassis = Pose::identity();
        let (frame, status) =
            WheelFrame::build(&wheel, Some(&chassis), FrameMode::ProjectedWorldUp).unwrap();
        assert_eq!(status, FrameStatus::DegenerateFallback);
        assert_relative_eq!(frame.right, Vector3::x(), epsilon = 1e-12);
        assert_eq!(frame.position, wheel.position);

        let err = WheelFrame::build(&wheel, None, FrameMode::ProjectedWorldUp).unwrap_err();
        assert_eq!(err, TireError::degenerate_frame("up"));
    }

    #[test]
    fn vehicle_body_mode() {
        let wheel = Pose::from_position_rotation(
            Point3::new(1.0, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.5),
        );
        let chassis = Pose::from_position_rotation(
            Point3::origin(),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
        );
        let (frame, status) =
            WheelFrame::build(&wheel, Some(&chassis), FrameMode::VehicleBody).unwrap();
        assert_eq!(status, FrameStatus::VehicleBody);
        assert_relative_eq!(frame.right, Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(frame.forward, -Vector3::x(), epsilon = 1e-12);

        let (_, status) = WheelFrame::build(&wheel, None, FrameMode::VehicleBody).unwrap();
        assert_eq!(status, FrameStatus::Projected);
    }

    #[test]
    fn non_finite_rejected() {
        let mut pose = Pose::identity();
        pose.position.y = f64::NAN;
        assert!(WheelFrame::build(&pose, None, FrameMode::ProjectedWorldUp).is_err());

        assert!(unit_axis(Vector3::zeros(), "right").is_err());
        assert!(unit_axis(Vector3::new(f64::INFINITY, 0.0, 0.0), "right").is_err());
    }
}
