//! Per-probe spring, damping and friction forces.
//!
//! Every force is capped, then blended with the probe's previous filtered
//! value. The filtered values are written back into the probe so the next
//! substep blends against them.

// Probe counts are far below 2^52
#![allow(clippy::cast_precision_loss)]

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::contact::ContactPatch;
use crate::params::{FrictionMode, LockedPointParams, TireParams, TractionParams};
use crate::probe::TireImpact;

/// Force multiplier at a given compression.
///
/// Starts at `preload` on first contact and reaches 1 when bottomed out.
#[must_use]
pub fn compression_curve(compression: f64, power: f64, preload: f64) -> f64 {
    let c = compression.clamp(0.0, 1.0);
    (1.0 - (1.0 - c).powf(power)) * (1.0 - preload) + preload
}

/// Scale `force` down to at most `cap` in magnitude.
#[must_use]
pub fn clamp_magnitude(force: Vector3<f64>, cap: f64) -> Vector3<f64> {
    let magnitude = force.norm();
    if magnitude > cap && magnitude > 0.0 {
        force * (cap / magnitude)
    } else {
        force
    }
}

/// Exponential moving average step: `previous + (raw - previous) * weight`.
#[must_use]
pub fn ema_blend(previous: &Vector3<f64>, raw: &Vector3<f64>, weight: f64) -> Vector3<f64> {
    previous + (raw - previous) * weight
}

/// Filtered forces of one probe for this substep.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProbeForces {
    /// Spring force along the patch normal.
    pub spring: Vector3<f64>,
    /// Damping force along the patch normal.
    pub damp: Vector3<f64>,
    /// Tangential force.
    pub friction: Vector3<f64>,
}

impl ProbeForces {
    /// Spring plus damping.
    #[must_use]
    pub fn normal(&self) -> Vector3<f64> {
        self.spring + self.damp
    }
}

/// Per-probe `(force, point)` pairs waiting to be applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForceStacks {
    /// Spring and damping forces.
    pub normal: Vec<(Vector3<f64>, Point3<f64>)>,
    /// Friction forces.
    pub friction: Vec<(Vector3<f64>, Point3<f64>)>,
}

impl ForceStacks {
    /// Stacks with room for `probes` entries each.
    #[must_use]
    pub fn with_capacity(probes: usize) -> Self {
        Self {
            normal: Vec::with_capacity(probes),
            friction: Vec::with_capacity(probes),
        }
    }

    /// Empty both stacks, keeping their allocations.
    pub fn clear(&mut self) {
        self.normal.clear();
        self.friction.clear();
    }

    /// Push one probe's forces at its contact point.
    pub fn push(&mut self, forces: &ProbeForces, point: Point3<f64>) {
        self.normal.push((forces.normal(), point));
        self.friction.push((forces.friction, point));
    }

    /// Number of contacts pushed.
    #[must_use]
    pub fn contact_count(&self) -> usize {
        self.normal.len()
    }

    /// Whether nothing was pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.normal.is_empty()
    }
}

/// Compute, cap and filter the forces of one probe in contact.
///
/// `probe_count` is the total number of probes on the wheel; the tire gains
/// are shared across all of them.
pub fn probe_forces(
    impact: &mut TireImpact,
    patch: &ContactPatch,
    params: &TireParams,
    probe_count: usize,
) -> ProbeForces {
    let share = 1.0 / probe_count.max(1) as f64;
    let n = &params.normal;
    let curve = compression_curve(patch.compression, n.pressure_power, n.preload);

    let raw_spring = patch.normal * (-n.kp * share) * curve;
    let normal_speed = patch.velocity.dot(&patch.normal);
    let raw_damp = patch.normal * normal_speed * (-n.kd * share) * curve;

    let spring = ema_blend(
        &impact.last_spring,
        &clamp_magnitude(raw_spring, params.caps.spring),
        params.filter.normal,
    );
    let damp = ema_blend(
        &impact.last_damp,
        &clamp_magnitude(raw_damp, params.caps.damp),
        params.filter.normal,
    );

    let raw_friction = match &params.friction_mode {
        FrictionMode::VelocityDecomposition => velocity_friction(patch, &params.traction),
        FrictionMode::LockedPoint(lock) => locked_friction(impact, patch, &params.traction, lock),
    };
    let friction = ema_blend(
        &impact.last_friction,
        &clamp_magnitude(raw_friction, params.caps.friction),
        params.filter.friction,
    );

    impact.last_spring = spring;
    impact.last_damp = damp;
    impact.last_friction = friction;

    ProbeForces {
        spring,
        damp,
        friction,
    }
}

/// Tangential force opposing lateral slip, plus drive and braking.
#[must_use]
pub fn velocity_friction(patch: &ContactPatch, traction: &TractionParams) -> Vector3<f64> {
    patch.lateral_velocity * -traction.velocity_multiplier
        + patch.forward * traction.engine_power
        - patch.forward_velocity * (traction.brake_power + traction.rolling_drag)
}

/// Tangential force pulling the contact back toward a pinned ground point.
///
/// The pin is placed on first contact and moved to the current contact
/// point when compression drops below the release threshold or the drift
/// exceeds the break distance.
pub fn locked_friction(
    impact: &mut TireImpact,
    patch: &ContactPatch,
    traction: &TractionParams,
    lock: &LockedPointParams,
) -> Vector3<f64> {
    let tangential = |v: Vector3<f64>| v - patch.normal * v.dot(&patch.normal);

    let pin = *impact.lock_point.get_or_insert(patch.point);
    let mut drift = tangential(patch.point - pin);

    if patch.compression < lock.release_compression || drift.norm() > lock.break_distance {
        impact.lock_point = Some(patch.point);
        drift = Vector3::zeros();
    }

    drift * -lock.stiffness - patch.tangential_velocity() * lock.damping
        + patch.forward * traction.engine_power
        - patch.forward_velocity * traction.brake_power
}
