//! Plane-aligned slicing frame.

use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{VolumeError, VolumeResult};

/// Below this length a plane normal is rejected.
const MIN_NORMAL_LENGTH: f64 = 1e-12;

/// Frame in which the slicing plane normal is +Z.
///
/// Points are rotated about `pivot` (usually the mesh placement origin) so
/// that heights along the plane normal become plain Z coordinates. The
/// mapping is rigid, so volumes and areas are preserved.
///
/// # Example
///
/// ```
/// use mesh_volume::SlicingFrame;
/// use nalgebra::{Point3, Vector3};
///
/// let frame = SlicingFrame::new(Point3::origin(), &Vector3::x()).unwrap();
/// let p = frame.to_sliced(&Point3::new(2.0, 0.0, 0.0));
/// assert!((p.z - 2.0).abs() < 1e-12);
///
/// let back = frame.to_world(&p);
/// assert!((back - Point3::new(2.0, 0.0, 0.0)).norm() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SlicingFrame {
    /// Rotation pivot in world space.
    pub pivot: Point3<f64>,
    /// Rotation taking the plane normal onto +Z.
    pub rotation: UnitQuaternion<f64>,
}

impl SlicingFrame {
    /// Build the frame for a plane normal, rotating about `pivot`.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::DegenerateNormal`] if the normal is zero-length
    /// or contains non-finite components.
    pub fn new(pivot: Point3<f64>, plane_normal: &Vector3<f64>) -> VolumeResult<Self> {
        let length = plane_normal.norm();
        if !length.is_finite() || length < MIN_NORMAL_LENGTH {
            return Err(VolumeError::DegenerateNormal {
                x: plane_normal.x,
                y: plane_normal.y,
                z: plane_normal.z,
            });
        }

        let normal = plane_normal / length;
        let rotation = UnitQuaternion::rotation_between(&normal, &Vector3::z()).unwrap_or_else(
            // Only fails for a normal pointing straight down
            || UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI),
        );

        Ok(Self { pivot, rotation })
    }

    /// Frame for an upright plane (normal +Z) about `pivot`.
    #[must_use]
    pub fn upright(pivot: Point3<f64>) -> Self {
        Self {
            pivot,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Frame for a mesh placed at `placement`, pivoting on its origin.
    ///
    /// # Errors
    ///
    /// See [`SlicingFrame::new`].
    pub fn for_placement(
        placement: &Isometry3<f64>,
        plane_normal: &Vector3<f64>,
    ) -> VolumeResult<Self> {
        Self::new(Point3::from(placement.translation.vector), plane_normal)
    }

    /// Map a world-space point into the slicing frame.
    #[must_use]
    pub fn to_sliced(&self, world: &Point3<f64>) -> Point3<f64> {
        self.pivot + self.rotation * (world - self.pivot)
    }

    /// Map a slicing-frame point back to world space.
    #[must_use]
    pub fn to_world(&self, sliced: &Point3<f64>) -> Point3<f64> {
        self.pivot + self.rotation.inverse_transform_vector(&(sliced - self.pivot))
    }

    /// The plane normal this frame was built for, in world space.
    #[must_use]
    pub fn plane_normal(&self) -> Vector3<f64> {
        self.rotation.inverse_transform_vector(&Vector3::z())
    }
}
