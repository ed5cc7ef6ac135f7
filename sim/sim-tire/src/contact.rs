//! Contact patch evaluation for a single probe.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::frame::WheelFrame;
use crate::grid::ProbeGrid;
use crate::params::PatchNormalMethod;
use crate::probe::TireImpact;
use crate::services::RigidBody;

/// Vectors shorter than this cannot be normalized.
pub const NORMAL_EPSILON: f64 = 1e-9;

/// Grip available at a given compression.
///
/// Rises steeply from 0.2 at first touch to 1.0 when bottomed out.
///
/// ```
/// use sim_tire::grip_strength;
///
/// assert!((grip_strength(0.0) - 0.2).abs() < 1e-12);
/// assert!((grip_strength(1.0) - 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn grip_strength(compression: f64) -> f64 {
    let c = compression.clamp(0.0, 1.0);
    (1.0 - (1.0 - c).powi(5)) * 0.8 + 0.2
}

/// Local contact basis and velocity at one probe.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactPatch {
    /// Where forces act.
    pub point: Point3<f64>,
    /// Unit normal pointing from the tire into the ground.
    pub normal: Vector3<f64>,
    /// Unit axle direction within the contact plane.
    pub lateral: Vector3<f64>,
    /// Unit rolling direction within the contact plane.
    pub forward: Vector3<f64>,
    /// Body velocity at the contact point.
    pub velocity: Vector3<f64>,
    /// Lateral part of `velocity`.
    pub lateral_velocity: Vector3<f64>,
    /// Forward part of `velocity`.
    pub forward_velocity: Vector3<f64>,
    /// Probe compression.
    pub compression: f64,
    /// Grip at that compression.
    pub grip: f64,
}

impl ContactPatch {
    /// Velocity within the contact plane.
    #[must_use]
    pub fn tangential_velocity(&self) -> Vector3<f64> {
        self.lateral_velocity + self.forward_velocity
    }
}

/// Patch normal of probe `(t, p)`.
///
/// Returns `None` when the estimate is degenerate. The neighbor method falls
/// back to the radius vector when its neighbors are coincident.
#[must_use]
pub fn patch_normal(
    grid: &ProbeGrid<TireImpact>,
    t: usize,
    p: usize,
    method: PatchNormalMethod,
) -> Option<Vector3<f64>> {
    let impact = grid.get(t, p)?;
    let radius = (impact.end - impact.start).try_normalize(NORMAL_EPSILON);

    match method {
        PatchNormalMethod::RadiusVector => radius,
        PatchNormalMethod::SurfaceNormal => impact
            .hit_result
            .and_then(|hit| (-hit.normal).try_normalize(NORMAL_EPSILON))
            .or(radius),
        PatchNormalMethod::NeighborDerivative => {
            let radius = radius?;
            neighbor_normal(grid, t, p)
                .map(|n| if n.dot(&radius) < 0.0 { -n } else { n })
                .or(Some(radius))
        }
    }
}

// Cross product of the toroidal and poloidal end point derivatives.
#[allow(clippy::cast_possible_wrap)]
fn neighbor_normal(grid: &ProbeGrid<TireImpact>, t: usize, p: usize) -> Option<Vector3<f64>> {
    let (t, p) = (t as isize, p as isize);
    let along_ring = grid.wrapped(t + 1, p).end - grid.wrapped(t - 1, p).end;
    let across_tread = grid.wrapped(t, p + 1).end - grid.wrapped(t, p - 1).end;
    along_ring.cross(&across_tread).try_normalize(NORMAL_EPSILON)
}

/// Evaluate the contact patch of probe `(t, p)`.
///
/// Returns `None` for probes out of contact and for degenerate normals.
#[must_use]
pub fn evaluate_contact<B: RigidBody + ?Sized>(
    grid: &ProbeGrid<TireImpact>,
    t: usize,
    p: usize,
    frame: &WheelFrame,
    method: PatchNormalMethod,
    body: &B,
) -> Option<ContactPatch> {
    let impact = grid.get(t, p)?;
    if !impact.hit {
        return None;
    }

    let normal = patch_normal(grid, t, p, method)?;
    let (lateral, forward) = contact_axes(&normal, frame)?;

    let point = impact.end;
    let velocity = body.linear_velocity_at_point(&point);
    let lateral_velocity = lateral * velocity.dot(&lateral);
    let forward_velocity = forward * velocity.dot(&forward);

    Some(ContactPatch {
        point,
        normal,
        lateral,
        forward,
        velocity,
        lateral_velocity,
        forward_velocity,
        compression: impact.compression,
        grip: grip_strength(impact.compression),
    })
}

/// Lateral and forward unit axes in the plane orthogonal to `normal`.
///
/// Lateral is the wheel axle projected onto the plane; when the axle is
/// parallel to the normal, `normal × forward` is used instead.
#[must_use]
pub fn contact_axes(
    normal: &Vector3<f64>,
    frame: &WheelFrame,
) -> Option<(Vector3<f64>, Vector3<f64>)> {
    let lateral = (frame.right - normal * frame.right.dot(normal))
        .try_normalize(NORMAL_EPSILON)
        .or_else(|| normal.cross(&frame.forward).try_normalize(NORMAL_EPSILON))?;
    let forward = lateral.cross(normal);
    Some((lateral, forward))
}
