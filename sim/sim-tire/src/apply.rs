//! Pushes accumulated probe forces onto the wheel body.
//!
//! This is the only place the tire model mutates anything outside itself.

// Contact counts are far below 2^52
#![allow(clippy::cast_precision_loss)]

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::force::ForceStacks;
use crate::frame::WheelFrame;
use crate::params::TractionParams;
use crate::services::RigidBody;

/// Net effect of one application.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AppliedForces {
    /// Sum of normal forces applied.
    pub normal_total: Vector3<f64>,
    /// Sum of friction forces applied, after the per-contact division.
    pub friction_total: Vector3<f64>,
    /// Spin damping torque applied.
    pub torque: Vector3<f64>,
    /// Probes in contact.
    pub contacts: usize,
}

impl AppliedForces {
    /// Whether anything was applied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contacts == 0
    }
}

/// Apply the stacked forces to `body`.
///
/// Normal forces go on at full magnitude; friction forces are shared by the
/// contacts, so each is divided by the contact count. Nothing is applied
/// when no probe is in contact.
pub fn apply_forces<B: RigidBody + ?Sized>(
    stacks: &ForceStacks,
    frame: &WheelFrame,
    traction: &TractionParams,
    body: &mut B,
) -> AppliedForces {
    let contacts = stacks.contact_count();
    if contacts == 0 {
        return AppliedForces::default();
    }

    let mut applied = AppliedForces {
        contacts,
        ..Default::default()
    };

    for (force, point) in &stacks.normal {
        body.add_force_at_point(force, point);
        applied.normal_total += force;
    }

    let share = 1.0 / contacts as f64;
    for (force, point) in &stacks.friction {
        let force = force * share;
        body.add_force_at_point(&force, point);
        applied.friction_total += force;
    }

    if traction.spin_damping > 0.0 {
        let spin = body.angular_velocity().dot(&frame.right);
        let torque = frame.right * (-spin * traction.spin_damping);
        body.add_torque(&torque);
        applied.torque = torque;
    }

    applied
}
