//! The per-wheel substep driver.

// Counters are far below 2^52
#![allow(clippy::cast_precision_loss)]

use nalgebra::{Point3, Vector3};
use sim_types::{BodyId, Pose};
use tracing::{debug, error, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::apply::{apply_forces, AppliedForces};
use crate::contact::evaluate_contact;
use crate::debug::{
    compose_hud, probe_line_thickness, DebugColor, DebugCounter, DebugData, DebugSink,
};
use crate::error::{TireError, TireResult};
use crate::force::{probe_forces, ForceStacks};
use crate::frame::{FrameStatus, WheelFrame};
use crate::grid::ProbeGrid;
use crate::params::TireParams;
use crate::probe::TireImpact;
use crate::services::{QueryFilter, RigidBody, WorldQuery};
use crate::tracer::trace_probes;

/// What a wheel is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WheelBinding {
    /// The wheel's rigid body; also excluded from the wheel's own queries.
    pub body: Option<BodyId>,
    /// Name of the wheel's visual mesh.
    pub wheel_mesh: Option<String>,
}

impl WheelBinding {
    /// Binding with both collaborators present.
    #[must_use]
    pub fn new(body: BodyId, wheel_mesh: impl Into<String>) -> Self {
        Self {
            body: Some(body),
            wheel_mesh: Some(wheel_mesh.into()),
        }
    }
}

/// Per-substep input from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubstepInfo {
    /// Substep duration (s).
    pub dt: f64,
    /// Substep index within the tick; 0 resets the debug counters.
    pub index: u32,
    /// Vehicle body pose, used for [`crate::FrameMode::VehicleBody`] and as
    /// the fallback frame when the axle is vertical.
    pub chassis_pose: Option<Pose>,
}

impl SubstepInfo {
    /// Substep without a chassis pose.
    #[must_use]
    pub const fn new(dt: f64, index: u32) -> Self {
        Self {
            dt,
            index,
            chassis_pose: None,
        }
    }

    /// Attach the vehicle body pose.
    #[must_use]
    pub const fn with_chassis(mut self, pose: Pose) -> Self {
        self.chassis_pose = Some(pose);
        self
    }
}

/// Outcome of one substep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SubstepStatus {
    /// Forces were applied.
    Applied,
    /// No probe touched anything.
    Airborne,
    /// The wheel is missing a collaborator and never runs.
    Inert,
    /// The body pose was non-finite; this substep was skipped.
    Crashed,
    /// No usable contact frame this substep.
    DegenerateFrame,
}

/// Aggregates from one substep.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubstepReport {
    /// Sweeps issued.
    pub total_traces: u32,
    /// Probes in contact.
    pub total_hits: u32,
    /// Sum of filtered spring force magnitudes (N).
    pub spring_total: f64,
    /// Sum of filtered damping force magnitudes (N).
    pub damp_total: f64,
    /// Sum of filtered friction force magnitudes before sharing (N).
    pub friction_total: f64,
    /// Sum of grip over contacting probes.
    pub total_grip: f64,
    /// Contact points averaged with grip as weight.
    pub average_contact_point: Option<Point3<f64>>,
    /// What reached the body.
    pub applied: AppliedForces,
    /// How the frame was built, if it was.
    pub frame_status: Option<FrameStatus>,
    /// Outcome.
    pub status: SubstepStatus,
}

impl SubstepReport {
    fn skipped(status: SubstepStatus) -> Self {
        Self {
            total_traces: 0,
            total_hits: 0,
            spring_total: 0.0,
            damp_total: 0.0,
            friction_total: 0.0,
            total_grip: 0.0,
            average_contact_point: None,
            applied: AppliedForces::default(),
            frame_status: None,
            status,
        }
    }
}

/// A probed tire on one wheel body.
///
/// Owns its probe grid and filter memory. Call
/// [`on_physics_substep`](Self::on_physics_substep) once per physics substep.
///
/// # Example
///
/// ```
/// use sim_tire::{NullDebugSink, RecordingBody, SubstepInfo, TireParams, Wheel, WheelBinding};
/// use sim_tire::{QueryFilter, QueryShape, SweepHit, WorldQuery};
/// use sim_types::BodyId;
/// use nalgebra::Point3;
///
/// struct Void;
///
/// impl WorldQuery for Void {
///     fn sweep(&self, _: &QueryShape, _: &Point3<f64>, _: &Point3<f64>, _: &QueryFilter) -> Option<SweepHit> {
///         None
///     }
///     fn overlap_any(&self, _: &QueryShape, _: &Point3<f64>, _: &QueryFilter) -> bool {
///         false
///     }
/// }
///
/// let mut wheel = Wheel::initialize(
///     "FrontLeft",
///     TireParams::coarse(),
///     WheelBinding::new(BodyId::new(1), "wheel_fl"),
/// )
/// .unwrap();
///
/// let mut body = RecordingBody::default();
/// let report = wheel.on_physics_substep(&SubstepInfo::new(1.0 / 240.0, 0), &Void, &mut body, &mut NullDebugSink);
///
/// assert_eq!(report.total_hits, 0);
/// assert!(body.forces.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Wheel {
    name: String,
    params: TireParams,
    binding: WheelBinding,
    filter: QueryFilter,
    grid: ProbeGrid<TireImpact>,
    stacks: ForceStacks,
    debug: DebugData,
    hud: String,
    crashed: bool,
    inert: bool,
}

impl Wheel {
    /// Validate the parameters and allocate the probe grid.
    ///
    /// A wheel missing its body or mesh is still created, but stays inert
    /// for its whole life.
    ///
    /// # Errors
    ///
    /// Returns [`TireError::InvalidConfig`] for invalid parameters.
    pub fn initialize(
        name: impl Into<String>,
        params: TireParams,
        binding: WheelBinding,
    ) -> TireResult<Self> {
        let name = name.into();
        params.validate()?;

        let inert = if binding.body.is_none() {
            Some(TireError::missing_body(&name))
        } else if binding.wheel_mesh.is_none() {
            Some(TireError::missing_wheel_mesh(&name))
        } else {
            None
        };
        if let Some(err) = &inert {
            error!(wheel = %name, error = %err, "Wheel disabled");
        }

        let (toroidal, poloidal) = params.geometry.resolved_density();
        let grid = ProbeGrid::new(toroidal as usize, poloidal as usize);
        debug!(
            wheel = %name,
            toroidal,
            poloidal,
            probes = grid.len(),
            "Wheel initialized"
        );

        Ok(Self {
            filter: binding
                .body
                .map_or_else(QueryFilter::default, QueryFilter::ignoring),
            stacks: ForceStacks::with_capacity(grid.len()),
            name,
            params,
            binding,
            grid,
            debug: DebugData::new(),
            hud: String::new(),
            crashed: false,
            inert: inert.as_ref().is_some_and(TireError::is_missing_collaborator),
        })
    }

    /// Wheel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current parameters.
    #[must_use]
    pub fn params(&self) -> &TireParams {
        &self.params
    }

    /// Attached collaborators.
    #[must_use]
    pub fn binding(&self) -> &WheelBinding {
        &self.binding
    }

    /// Probe state from the last substep.
    #[must_use]
    pub fn probes(&self) -> &ProbeGrid<TireImpact> {
        &self.grid
    }

    /// Counters for the current tick.
    #[must_use]
    pub fn debug_data(&self) -> &DebugData {
        &self.debug
    }

    /// HUD text from the last substep that ran.
    #[must_use]
    pub fn hud_text(&self) -> &str {
        &self.hud
    }

    /// Whether the wheel lacks a collaborator.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.inert
    }

    /// Whether the wheel has ever seen a non-finite pose.
    #[must_use]
    pub fn is_crashed(&self) -> bool {
        self.crashed
    }

    /// Replace the parameters.
    ///
    /// The probe grid, and with it all filter memory, is reallocated only
    /// when the probe density changes.
    ///
    /// # Errors
    ///
    /// Returns [`TireError::InvalidConfig`] and keeps the old parameters if
    /// the new ones are invalid.
    pub fn set_params(&mut self, params: TireParams) -> TireResult<()> {
        params.validate()?;
        let (toroidal, poloidal) = params.geometry.resolved_density();
        let (toroidal, poloidal) = (toroidal as usize, poloidal as usize);
        if toroidal != self.grid.toroidal_density() || poloidal != self.grid.poloidal_density() {
            debug!(wheel = %self.name, toroidal, poloidal, "Probe density changed");
            self.grid = ProbeGrid::new(toroidal, poloidal);
            self.stacks = ForceStacks::with_capacity(self.grid.len());
        }
        self.params = params;
        Ok(())
    }

    /// Set throttle and brake for the following substeps.
    pub fn set_drive_inputs(&mut self, engine_power: f64, brake_power: f64) {
        self.params.traction.engine_power = engine_power;
        self.params.traction.brake_power = brake_power.max(0.0);
    }

    /// Run one physics substep: trace, evaluate, filter and apply.
    pub fn on_physics_substep<W, B, D>(
        &mut self,
        step: &SubstepInfo,
        world: &W,
        body: &mut B,
        sink: &mut D,
    ) -> SubstepReport
    where
        W: WorldQuery + ?Sized,
        B: RigidBody + ?Sized,
        D: DebugSink + ?Sized,
    {
        if self.inert {
            return SubstepReport::skipped(SubstepStatus::Inert);
        }

        if step.index == 0 {
            self.debug.reset();
        }
        self.debug.add(DebugCounter::Substeps, 1);

        let pose = body.pose();
        if !pose.is_finite() {
            // Logged once; later non-finite substeps are skipped quietly
            if !self.crashed {
                let err = TireError::NonFinitePose {
                    wheel: self.name.clone(),
                };
                error!(wheel = %self.name, error = %err, "Skipping non-finite substeps");
            }
            self.crashed = true;
            self.grid.reset();
            return SubstepReport::skipped(SubstepStatus::Crashed);
        }

        let (frame, frame_status) =
            match WheelFrame::build(&pose, step.chassis_pose.as_ref(), self.params.frame_mode) {
                Ok(built) => built,
                Err(err) => {
                    warn!(wheel = %self.name, error = %err, "Skipping substep");
                    return SubstepReport::skipped(SubstepStatus::DegenerateFrame);
                }
            };

        let stats = trace_probes(
            &mut self.grid,
            &frame,
            &self.params.geometry,
            &self.params.toggles,
            world,
            &self.filter,
        );
        self.debug
            .add(DebugCounter::TotalTraces, i64::from(stats.traces));
        self.debug.add(DebugCounter::TotalHits, i64::from(stats.hits));
        self.debug
            .add(DebugCounter::SkippedRings, i64::from(stats.skipped_rings));

        let mut report = SubstepReport {
            total_traces: stats.traces,
            total_hits: stats.hits,
            frame_status: Some(frame_status),
            ..SubstepReport::skipped(SubstepStatus::Airborne)
        };

        self.stacks.clear();
        let probe_count = self.grid.len();
        let mut weighted_point = Vector3::zeros();

        for t in 0..self.grid.toroidal_density() {
            for p in 0..self.grid.poloidal_density() {
                let patch = evaluate_contact(
                    &self.grid,
                    t,
                    p,
                    &frame,
                    self.params.patch_normal,
                    &*body,
                );
                let Some(impact) = self.grid.get_mut(t, p) else {
                    continue;
                };
                let Some(patch) = patch else {
                    if impact.hit {
                        impact.forget_forces();
                        self.debug.add(DebugCounter::DegenerateContacts, 1);
                        debug!(wheel = %self.name, t, p, "Degenerate contact skipped");
                    }
                    continue;
                };

                let forces = probe_forces(impact, &patch, &self.params, probe_count);
                self.stacks.push(&forces, patch.point);

                report.spring_total += forces.spring.norm();
                report.damp_total += forces.damp.norm();
                report.friction_total += forces.friction.norm();
                report.total_grip += patch.grip;
                weighted_point += patch.point.coords * patch.grip;
            }
        }

        if report.total_grip > 0.0 {
            report.average_contact_point = Some(Point3::from(weighted_point / report.total_grip));
        }

        if self.params.toggles.debug_draw {
            self.draw(sink, report.average_contact_point.as_ref());
        }

        report.applied = apply_forces(&self.stacks, &frame, &self.params.traction, body);
        if !report.applied.is_empty() {
            report.status = SubstepStatus::Applied;
        }

        self.hud = compose_hud(
            &self.name,
            i64::from(report.total_hits),
            report.spring_total,
            report.damp_total,
            report.friction_total / self.stacks.contact_count().max(1) as f64,
        );
        sink.set_hud_text(&self.hud);

        if self.params.toggles.debug_log {
            debug!(
                wheel = %self.name,
                substep = step.index,
                dt = step.dt,
                hits = report.total_hits,
                spring = report.spring_total,
                damp = report.damp_total,
                friction = report.friction_total,
                grip = report.total_grip,
                "Tire substep"
            );
        }

        report
    }

    fn draw<D: DebugSink + ?Sized>(&self, sink: &mut D, average: Option<&Point3<f64>>) {
        let probe_radius = self.params.geometry.probe_radius;
        for impact in self.grid.iter() {
            let color = DebugColor::from_compression(impact.compression);
            sink.draw_line(
                &impact.start,
                &impact.end,
                color,
                probe_line_thickness(impact.compression),
            );
            if impact.hit {
                sink.draw_sphere(&impact.end, probe_radius, color);
            }
        }
        if let Some(point) = average {
            sink.draw_point(point, 10.0, DebugColor::CYAN);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::services::{QueryShape, RecordingBody, SweepHit};
    use sim_types::{RigidBodyState, Twist};

    struct Void;

    impl WorldQuery for Void {
        fn sweep(
            &self,
            _shape: &QueryShape,
            _start: &Point3<f64>,
            _end: &Point3<f64>,
            _filter: &QueryFilter,
        ) -> Option<SweepHit> {
            None
        }

        fn overlap_any(&self, _: &QueryShape, _: &Point3<f64>, _: &QueryFilter) -> bool {
            false
        }
    }

    fn wheel() -> Wheel {
        Wheel::initialize(
            "Test",
            TireParams::coarse(),
            WheelBinding::new(BodyId::new(7), "mesh"),
        )
        .unwrap()
    }

    #[test]
    fn initialize_allocates_grid() {
        let w = wheel();
        assert_eq!(w.probes().len(), 72);
        assert_eq!(w.name(), "Test");
        assert!(!w.is_inert());
        assert_eq!(w.filter, QueryFilter::ignoring(BodyId::new(7)));
    }

    #[test]
    fn invalid_params_rejected() {
        let err = Wheel::initialize(
            "Bad",
            TireParams::default().with_density(0, 1),
            WheelBinding::new(BodyId::new(1), "mesh"),
        )
        .unwrap_err();
        assert!(err.is_config_error());

        // A spacing this fine would allocate millions of probes
        let err = Wheel::initialize(
            "Dense",
            TireParams::default().with_target_spacing(1e-6),
            WheelBinding::new(BodyId::new(1), "mesh"),
        )
        .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn missing_collaborators_make_wheel_inert() {
        let no_body = Wheel::initialize(
            "NoBody",
            TireParams::coarse(),
            WheelBinding {
                body: None,
                wheel_mesh: Some("mesh".into()),
            },
        )
        .unwrap();
        assert!(no_body.is_inert());

        let mut no_mesh = Wheel::initialize(
            "NoMesh",
            TireParams::coarse(),
            WheelBinding {
                body: Some(BodyId::new(1)),
                wheel_mesh: None,
            },
        )
        .unwrap();
        assert!(no_mesh.is_inert());

        let mut body = RecordingBody::default();
        let report = no_mesh.on_physics_substep(
            &SubstepInfo::new(0.01, 0),
            &Void,
            &mut body,
            &mut crate::NullDebugSink,
        );
        assert_eq!(report.status, SubstepStatus::Inert);
        assert_eq!(no_mesh.debug_data().get(DebugCounter::Substeps), 0);
    }

    #[test]
    fn set_params_keeps_grid_unless_density_changes() {
        let mut w = wheel();
        w.grid.get_mut(0, 0).unwrap().compression = 0.5;

        w.set_params(TireParams::coarse().with_normal_gains(1e5, 1e3))
            .unwrap();
        assert_eq!(w.probes().get(0, 0).unwrap().compression, 0.5);

        w.set_params(TireParams::coarse().with_density(12, 2)).unwrap();
        assert_eq!(w.probes().len(), 24);
        assert_eq!(w.probes().get(0, 0).unwrap().compression, 0.0);

        assert!(w.set_params(TireParams::default().with_density(0, 0)).is_err());
        assert_eq!(w.probes().len(), 24);
    }

    #[test]
    fn drive_inputs() {
        let mut w = wheel();
        w.set_drive_inputs(800.0, -3.0);
        assert_eq!(w.params().traction.engine_power, 800.0);
        assert_eq!(w.params().traction.brake_power, 0.0);
    }

    #[test]
    fn nan_pose_skips_only_bad_substeps() {
        let mut w = wheel();
        let mut state = RigidBodyState::new(Pose::identity(), Twist::zero());
        state.pose.position.x = f64::NAN;
        let mut body = RecordingBody::new(state);

        for index in 0..2 {
            let report = w.on_physics_substep(
                &SubstepInfo::new(0.01, index),
                &Void,
                &mut body,
                &mut crate::NullDebugSink,
            );
            assert_eq!(report.status, SubstepStatus::Crashed);
        }
        assert!(w.is_crashed());

        // A finite pose runs the pipeline again
        body.state.pose = Pose::identity();
        let report =
            w.on_physics_substep(&SubstepInfo::new(0.01, 2), &Void, &mut body, &mut crate::NullDebugSink);
        assert_eq!(report.status, SubstepStatus::Airborne);
        assert!(report.frame_status.is_some());
        assert_eq!(w.debug_data().get(DebugCounter::Substeps), 3);
    }
}
