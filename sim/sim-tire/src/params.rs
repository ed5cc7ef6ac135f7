//! Tire tuning parameters and presets.
//!
//! All quantities are SI: meters, newtons, seconds. Angles are in degrees
//! because they are tuned by hand.

// Probe densities are small integers
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{TireError, TireResult};

/// Largest probe grid a wheel may allocate.
pub const MAX_PROBE_COUNT: usize = 1 << 16;

/// Shape and sampling of the probe torus.
///
/// The tire is modeled as a torus around the hub. Probes start on the inner
/// ring (`inner_radius` from the hub) and reach `tire_radius` outward.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProbeGeometry {
    /// Distance from the hub to the probe start ring (m).
    pub inner_radius: f64,

    /// Probe length, the tire section radius (m).
    pub tire_radius: f64,

    /// Probes around the rolling direction.
    pub toroidal_density: u32,

    /// Probes across the tread.
    pub poloidal_density: u32,

    /// Angle of the first toroidal ring (degrees).
    pub start_angle: f64,

    /// Arc covered by the toroidal rings (degrees).
    pub toroidal_span: f64,

    /// Arc covered across the tread (degrees).
    pub poloidal_span: f64,

    /// Radius of the swept sphere (m).
    pub probe_radius: f64,

    /// When set, densities are derived from this probe spacing (m) instead
    /// of the explicit densities.
    pub target_spacing: Option<f64>,
}

impl Default for ProbeGeometry {
    fn default() -> Self {
        Self {
            inner_radius: 0.25,
            tire_radius: 0.08,
            toroidal_density: 72,
            poloidal_density: 7,
            start_angle: 0.0,
            toroidal_span: 360.0,
            poloidal_span: 180.0,
            probe_radius: 0.005,
            target_spacing: None,
        }
    }
}

impl ProbeGeometry {
    /// Toroidal and poloidal probe counts actually used.
    ///
    /// With a target spacing, the toroidal count covers the outer arc and the
    /// poloidal count includes both tread edges.
    #[must_use]
    pub fn resolved_density(&self) -> (u32, u32) {
        match self.target_spacing {
            Some(spacing) if spacing > 0.0 && spacing.is_finite() => {
                let outer = self.inner_radius + self.tire_radius;
                let toroidal_arc = self.toroidal_span.to_radians().abs() * outer;
                let poloidal_arc = self.poloidal_span.to_radians().abs() * self.tire_radius;

                let toroidal = (toroidal_arc / spacing).ceil().max(1.0);
                let poloidal = ((poloidal_arc / spacing).ceil() + 1.0).max(1.0);
                (
                    toroidal.min(f64::from(u32::MAX)) as u32,
                    poloidal.min(f64::from(u32::MAX)) as u32,
                )
            }
            _ => (self.toroidal_density, self.poloidal_density),
        }
    }

    /// Total number of probes, saturating on overflow.
    #[must_use]
    pub fn probe_count(&self) -> usize {
        let (toroidal, poloidal) = self.resolved_density();
        (toroidal as usize).saturating_mul(poloidal as usize)
    }

    /// Outer radius of the tire (m).
    #[must_use]
    pub fn outer_radius(&self) -> f64 {
        self.inner_radius + self.tire_radius
    }
}

/// Spring-damper gains along the patch normal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NormalForceParams {
    /// Tire stiffness (N), shared across all probes.
    pub kp: f64,

    /// Tire damping (N·s/m), shared across all probes.
    pub kd: f64,

    /// Exponent of the compression curve.
    pub pressure_power: f64,

    /// Fraction of the force present at first contact, in `[0, 1)`.
    pub preload: f64,
}

impl Default for NormalForceParams {
    fn default() -> Self {
        Self {
            kp: 500_000.0,
            kd: 5_000.0,
            pressure_power: 1.0,
            preload: 0.2,
        }
    }
}

/// Tangential force gains.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TractionParams {
    /// Lateral slip resistance (N·s/m).
    pub velocity_multiplier: f64,

    /// Drive force along the rolling direction (N).
    pub engine_power: f64,

    /// Braking resistance against forward velocity (N·s/m).
    pub brake_power: f64,

    /// Always-on rolling resistance added to braking (N·s/m).
    pub rolling_drag: f64,

    /// Torque damping on wheel spin about its axle (N·m·s). 0 disables it.
    pub spin_damping: f64,
}

impl Default for TractionParams {
    fn default() -> Self {
        Self {
            velocity_multiplier: 2_000.0,
            engine_power: 0.0,
            brake_power: 0.0,
            rolling_drag: 5.0,
            spin_damping: 0.0,
        }
    }
}

/// Per-probe force ceilings (N), applied before filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ForceCaps {
    /// Spring force ceiling.
    pub spring: f64,
    /// Damping force ceiling.
    pub damp: f64,
    /// Friction force ceiling.
    pub friction: f64,
}

impl Default for ForceCaps {
    fn default() -> Self {
        Self {
            spring: 2_500.0,
            damp: 1_500.0,
            friction: 4_000.0,
        }
    }
}

/// Weights of the new value in each probe's exponential moving average.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FilterWeights {
    /// Spring and damping forces.
    pub normal: f64,
    /// Friction force.
    pub friction: f64,
}

impl Default for FilterWeights {
    fn default() -> Self {
        Self {
            normal: 0.5,
            friction: 0.2,
        }
    }
}

/// Gains for the pinned contact point friction mode.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LockedPointParams {
    /// Restoring force per meter of drift (N/m).
    pub stiffness: f64,
    /// Resistance to tangential velocity (N·s/m).
    pub damping: f64,
    /// Drift beyond which the pin is released (m).
    pub break_distance: f64,
    /// Compression below which the pin is released.
    pub release_compression: f64,
}

impl Default for LockedPointParams {
    fn default() -> Self {
        Self {
            stiffness: 50_000.0,
            damping: 1_000.0,
            break_distance: 0.02,
            release_compression: 0.02,
        }
    }
}

/// How tangential force is derived.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrictionMode {
    /// Oppose lateral and forward contact velocity directly.
    #[default]
    VelocityDecomposition,
    /// Pin a ground point on contact and pull back toward it.
    LockedPoint(LockedPointParams),
}

/// Where the wheel's contact frame comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrameMode {
    /// Wheel axle as right, world up projected off it as up.
    #[default]
    ProjectedWorldUp,
    /// Vehicle body axes, decoupled from wheel spin.
    VehicleBody,
}

/// How a probe's patch normal is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PatchNormalMethod {
    /// Direction from probe start to contact point.
    #[default]
    RadiusVector,
    /// Surface normal reported by the sweep.
    SurfaceNormal,
    /// Cross product of neighboring probe contact differences.
    NeighborDerivative,
}

/// Feature switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TireToggles {
    /// Skip whole rings whose start point overlaps nothing.
    pub broad_phase_skip: bool,
    /// Send probe lines and contact points to the debug sink.
    pub debug_draw: bool,
    /// Log a per-substep summary at debug level.
    pub debug_log: bool,
}

impl Default for TireToggles {
    fn default() -> Self {
        Self {
            broad_phase_skip: true,
            debug_draw: false,
            debug_log: false,
        }
    }
}

/// Complete tire configuration.
///
/// # Example
///
/// ```
/// use sim_tire::{FrictionMode, TireParams};
///
/// let params = TireParams::default()
///     .with_density(48, 5)
///     .with_normal_gains(400_000.0, 4_000.0)
///     .with_friction_mode(FrictionMode::VelocityDecomposition);
///
/// assert!(params.validate().is_ok());
/// assert_eq!(params.probe_count(), 240);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TireParams {
    /// Probe torus shape and sampling.
    pub geometry: ProbeGeometry,
    /// Normal force gains.
    pub normal: NormalForceParams,
    /// Tangential force gains.
    pub traction: TractionParams,
    /// Per-probe force ceilings.
    pub caps: ForceCaps,
    /// Filter weights.
    pub filter: FilterWeights,
    /// Tangential force model.
    pub friction_mode: FrictionMode,
    /// Contact frame source.
    pub frame_mode: FrameMode,
    /// Patch normal estimate.
    pub patch_normal: PatchNormalMethod,
    /// Feature switches.
    pub toggles: TireToggles,
}

impl TireParams {
    /// Low probe count for distant or background vehicles.
    #[must_use]
    pub fn coarse() -> Self {
        Self::default().with_density(24, 3)
    }

    /// Dense sampling for a hero vehicle on rough terrain.
    #[must_use]
    pub fn detailed() -> Self {
        Self::default().with_density(180, 9)
    }

    /// Set explicit probe densities and clear any target spacing.
    #[must_use]
    pub const fn with_density(mut self, toroidal: u32, poloidal: u32) -> Self {
        self.geometry.toroidal_density = toroidal;
        self.geometry.poloidal_density = poloidal;
        self.geometry.target_spacing = None;
        self
    }

    /// Derive densities from a probe spacing (m).
    #[must_use]
    pub const fn with_target_spacing(mut self, spacing: f64) -> Self {
        self.geometry.target_spacing = Some(spacing);
        self
    }

    /// Set the tire dimensions (m).
    #[must_use]
    pub const fn with_radii(mut self, inner_radius: f64, tire_radius: f64) -> Self {
        self.geometry.inner_radius = inner_radius;
        self.geometry.tire_radius = tire_radius;
        self
    }

    /// Set stiffness and damping.
    #[must_use]
    pub const fn with_normal_gains(mut self, kp: f64, kd: f64) -> Self {
        self.normal.kp = kp;
        self.normal.kd = kd;
        self
    }

    /// Set the compression curve shape.
    #[must_use]
    pub const fn with_pressure_curve(mut self, power: f64, preload: f64) -> Self {
        self.normal.pressure_power = power;
        self.normal.preload = preload;
        self
    }

    /// Set the drive inputs.
    #[must_use]
    pub const fn with_drive(mut self, engine_power: f64, brake_power: f64) -> Self {
        self.traction.engine_power = engine_power;
        self.traction.brake_power = brake_power;
        self
    }

    /// Set all tangential gains.
    #[must_use]
    pub const fn with_traction(mut self, traction: TractionParams) -> Self {
        self.traction = traction;
        self
    }

    /// Set the force ceilings.
    #[must_use]
    pub const fn with_caps(mut self, caps: ForceCaps) -> Self {
        self.caps = caps;
        self
    }

    /// Set the filter weights.
    #[must_use]
    pub const fn with_filter_weights(mut self, normal: f64, friction: f64) -> Self {
        self.filter = FilterWeights { normal, friction };
        self
    }

    /// Set the friction model.
    #[must_use]
    pub const fn with_friction_mode(mut self, mode: FrictionMode) -> Self {
        self.friction_mode = mode;
        self
    }

    /// Set the contact frame source.
    #[must_use]
    pub const fn with_frame_mode(mut self, mode: FrameMode) -> Self {
        self.frame_mode = mode;
        self
    }

    /// Set the patch normal estimate.
    #[must_use]
    pub const fn with_patch_normal(mut self, method: PatchNormalMethod) -> Self {
        self.patch_normal = method;
        self
    }

    /// Set the feature switches.
    #[must_use]
    pub const fn with_toggles(mut self, toggles: TireToggles) -> Self {
        self.toggles = toggles;
        self
    }

    /// Enable or disable debug drawing.
    #[must_use]
    pub const fn with_debug_draw(mut self, enabled: bool) -> Self {
        self.toggles.debug_draw = enabled;
        self
    }

    /// Total number of probes.
    #[must_use]
    pub fn probe_count(&self) -> usize {
        self.geometry.probe_count()
    }

    /// Validate the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TireError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> TireResult<()> {
        let g = &self.geometry;
        check_positive("inner_radius", g.inner_radius)?;
        check_positive("tire_radius", g.tire_radius)?;
        check_non_negative("probe_radius", g.probe_radius)?;
        check_finite("start_angle", g.start_angle)?;
        check_finite("toroidal_span", g.toroidal_span)?;
        check_finite("poloidal_span", g.poloidal_span)?;
        if let Some(spacing) = g.target_spacing {
            check_positive("target_spacing", spacing)?;
        }
        let (toroidal, poloidal) = g.resolved_density();
        if toroidal == 0 || poloidal == 0 {
            return Err(TireError::invalid_config(
                "probe densities must be at least 1",
            ));
        }
        let probes = g.probe_count();
        if probes > MAX_PROBE_COUNT {
            return Err(TireError::invalid_config(format!(
                "{probes} probes ({toroidal} x {poloidal}) exceed the limit of {MAX_PROBE_COUNT}"
            )));
        }

        let n = &self.normal;
        check_positive("kp", n.kp)?;
        check_non_negative("kd", n.kd)?;
        check_positive("pressure_power", n.pressure_power)?;
        if !(0.0..1.0).contains(&n.preload) {
            return Err(TireError::invalid_config("preload must be in [0, 1)"));
        }

        let t = &self.traction;
        check_non_negative("velocity_multiplier", t.velocity_multiplier)?;
        check_finite("engine_power", t.engine_power)?;
        check_non_negative("brake_power", t.brake_power)?;
        check_non_negative("rolling_drag", t.rolling_drag)?;
        check_non_negative("spin_damping", t.spin_damping)?;

        check_non_negative("spring cap", self.caps.spring)?;
        check_non_negative("damp cap", self.caps.damp)?;
        check_non_negative("friction cap", self.caps.friction)?;

        for (name, weight) in [
            ("normal filter weight", self.filter.normal),
            ("friction filter weight", self.filter.friction),
        ] {
            if !(weight > 0.0 && weight <= 1.0) {
                return Err(TireError::invalid_config(format!(
                    "{name} must be in (0, 1], got {weight}"
                )));
            }
        }

        if let FrictionMode::LockedPoint(lock) = &self.friction_mode {
            check_non_negative("lock stiffness", lock.stiffness)?;
            check_non_negative("lock damping", lock.damping)?;
            check_positive("lock break_distance", lock.break_distance)?;
            if !(0.0..=1.0).contains(&lock.release_compression) {
                return Err(TireError::invalid_config(
                    "lock release_compression must be in [0, 1]",
                ));
            }
        }

        Ok(())
    }
}

fn check_finite(name: &str, value: f64) -> TireResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TireError::invalid_config(format!("{name} must be finite")))
    }
}

fn check_positive(name: &str, value: f64) -> TireResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TireError::invalid_config(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

fn check_non_negative(name: &str, value: f64) -> TireResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TireError::invalid_config(format!(
            "{name} cannot be negative, got {value}"
        )))
    }
}
