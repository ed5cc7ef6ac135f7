//! Per-probe contact state persisted across substeps.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::services::SweepHit;

/// State of one probe.
///
/// Written by the tracer every substep; the `last_*` filter memory and the
/// pinned point survive between substeps while the probe stays in contact.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TireImpact {
    /// Probe start on the inner ring.
    pub start: Point3<f64>,
    /// Contact point, shrunk end, or full-length end on a miss.
    pub end: Point3<f64>,
    /// Unit probe direction.
    pub direction: Vector3<f64>,
    /// Whether the probe touched anything this substep.
    pub hit: bool,
    /// Penetration in `[0, 1]`.
    pub compression: f64,
    /// Raw sweep result.
    pub hit_result: Option<SweepHit>,
    /// Filtered spring force from the previous substep.
    pub last_spring: Vector3<f64>,
    /// Filtered damping force from the previous substep.
    pub last_damp: Vector3<f64>,
    /// Filtered friction force from the previous substep.
    pub last_friction: Vector3<f64>,
    /// Ground point pinned by the locked-point friction mode.
    pub lock_point: Option<Point3<f64>>,
}

impl Default for TireImpact {
    fn default() -> Self {
        Self {
            start: Point3::origin(),
            end: Point3::origin(),
            direction: Vector3::zeros(),
            hit: false,
            compression: 0.0,
            hit_result: None,
            last_spring: Vector3::zeros(),
            last_damp: Vector3::zeros(),
            last_friction: Vector3::zeros(),
            lock_point: None,
        }
    }
}

impl TireImpact {
    /// Record the probe segment for this substep.
    pub fn set_segment(&mut self, start: Point3<f64>, direction: Vector3<f64>, end: Point3<f64>) {
        self.start = start;
        self.direction = direction;
        self.end = end;
    }

    /// Mark the probe as out of contact and forget all force memory.
    pub fn clear_contact(&mut self) {
        self.hit = false;
        self.compression = 0.0;
        self.hit_result = None;
        self.forget_forces();
    }

    /// Drop the filtered forces and the pinned point, keeping the hit.
    pub fn forget_forces(&mut self) {
        self.last_spring = Vector3::zeros();
        self.last_damp = Vector3::zeros();
        self.last_friction = Vector3::zeros();
        self.lock_point = None;
    }

    /// Record a contact.
    pub fn set_contact(&mut self, end: Point3<f64>, compression: f64, hit: SweepHit) {
        self.hit = true;
        self.end = end;
        self.compression = compression.clamp(0.0, 1.0);
        self.hit_result = Some(hit);
    }

    /// Current segment length.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_contact_forgets_memory() {
        let mut impact = TireImpact::default();
        impact.set_contact(
            Point3::new(0.0, 0.0, -0.1),
            0.4,
            SweepHit {
                distance: 0.1,
                point: Point3::new(0.0, 0.0, -0.1),
                normal: Vector3::z(),
            },
        );
        impact.last_spring = Vector3::new(0.0, 0.0, 10.0);
        impact.last_damp = Vector3::new(0.0, 0.0, 1.0);
        impact.last_friction = Vector3::new(1.0, 0.0, 0.0);
        impact.lock_point = Some(Point3::origin());

        impact.clear_contact();

        assert!(!impact.hit);
        assert!(impact.hit_result.is_none());
        assert!(impact.lock_point.is_none());
        assert_eq!(impact.last_spring, Vector3::zeros());
        assert_eq!(impact.last_damp, Vector3::zeros());
        assert_eq!(impact.last_friction, Vector3::zeros());
    }

    #[test]
    fn forget_forces_keeps_contact() {
        let mut impact = TireImpact::default();
        let hit = SweepHit {
            distance: 0.1,
            point: Point3::new(0.0, 0.0, -0.1),
            normal: Vector3::z(),
        };
        impact.set_contact(hit.point, 0.3, hit);
        impact.last_friction = Vector3::new(0.0, 2.0, 0.0);
        impact.lock_point = Some(Point3::new(1.0, 0.0, 0.0));

        impact.forget_forces();

        assert!(impact.hit);
        assert!((impact.compression - 0.3).abs() < f64::EPSILON);
        assert!(impact.lock_point.is_none());
        assert_eq!(impact.last_friction, Vector3::zeros());
    }

    #[test]
    fn compression_is_clamped() {
        let mut impact = TireImpact::default();
        let hit = SweepHit {
            distance: 0.0,
            point: Point3::origin(),
            normal: Vector3::z(),
        };
        impact.set_contact(Point3::origin(), 1.7, hit);
        assert!((impact.compression - 1.0).abs() < f64::EPSILON);
        impact.set_contact(Point3::origin(), -0.2, hit);
        assert!(impact.compression.abs() < f64::EPSILON);
    }
}
