//! Probe-grid tire contact model for vehicle simulation.
//!
//! Each wheel is modeled as a torus of probes around its hub. Every physics
//! substep the wheel:
//!
//! 1. builds an orthonormal contact frame from the wheel pose ([`WheelFrame`])
//! 2. sweeps a small sphere along every probe ([`trace_probes`])
//! 3. turns each hit into a contact patch with a normal, lateral and forward
//!    axis and the body velocity at the contact ([`evaluate_contact`])
//! 4. computes capped, filtered spring, damping and friction forces per probe
//!    ([`probe_forces`])
//! 5. pushes the accumulated forces onto the wheel body ([`apply_forces`])
//!
//! # Force Model
//!
//! With `c` the probe compression in `[0, 1]` and `N` the probe count:
//!
//! ```text
//! curve    = (1 - (1 - c)^power) * (1 - preload) + preload
//! spring   = n * (-kp / N) * curve
//! damping  = (v · n) n * (-kd / N) * curve
//! friction = v_lat * -multiplier + forward * engine - v_fwd * (brake + drag)
//! ```
//!
//! Each force is capped, then blended with the probe's previous value:
//! `filtered = previous + (raw - previous) * weight`.
//!
//! # Host Services
//!
//! The model never touches an engine. The host provides a [`WorldQuery`] for
//! sweeps, a [`RigidBody`] for the wheel and optionally a [`DebugSink`].
//!
//! # Example
//!
//! ```
//! use sim_tire::{grip_strength, TireParams};
//!
//! let params = TireParams::coarse().with_drive(1_500.0, 0.0);
//! assert!(params.validate().is_ok());
//!
//! // Grip rises from 0.2 at first touch to 1.0 when bottomed out
//! assert!(grip_strength(0.5) > 0.2);
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero engine dependencies**. It can be used
//! with any physics engine that can sweep a sphere and add a force at a point.

#![doc(html_root_url = "https://docs.rs/sim-tire/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn)]

mod apply;
mod contact;
mod debug;
mod error;
mod force;
mod frame;
mod grid;
mod params;
mod probe;
mod services;
mod tracer;
mod wheel;

pub use apply::{apply_forces, AppliedForces};
pub use contact::{
    contact_axes, evaluate_contact, grip_strength, patch_normal, ContactPatch, NORMAL_EPSILON,
};
pub use debug::{
    compose_hud, probe_line_thickness, DebugColor, DebugCounter, DebugData, DebugSink,
    NullDebugSink,
};
pub use error::{TireError, TireResult};
pub use force::{
    clamp_magnitude, compression_curve, ema_blend, locked_friction, probe_forces,
    velocity_friction, ForceStacks, ProbeForces,
};
pub use frame::{FrameStatus, WheelFrame, FRAME_EPSILON};
pub use grid::ProbeGrid;
pub use params::{
    FilterWeights, ForceCaps, FrameMode, FrictionMode, LockedPointParams, NormalForceParams,
    PatchNormalMethod, ProbeGeometry, TireParams, TireToggles, TractionParams, MAX_PROBE_COUNT,
};
pub use probe::TireImpact;
pub use services::{QueryFilter, QueryShape, RecordingBody, RigidBody, SweepHit, WorldQuery};
pub use tracer::{
    poloidal_direction, toroidal_direction, trace_probes, TraceStats, BOTTOM_OUT_MARGIN,
    CONTACT_EPSILON,
};
pub use wheel::{SubstepInfo, SubstepReport, SubstepStatus, Wheel, WheelBinding};

// Re-export types that appear in the public API
pub use sim_types::{BodyId, Pose, RigidBodyState, Twist};
