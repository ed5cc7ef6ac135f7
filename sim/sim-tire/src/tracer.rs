//! Probe tracing around the tire torus.

// Probe indices are small
#![allow(clippy::cast_precision_loss)]

use nalgebra::{Unit, UnitQuaternion, Vector3};
use tracing::trace;

use crate::frame::WheelFrame;
use crate::grid::ProbeGrid;
use crate::params::{ProbeGeometry, TireToggles};
use crate::probe::TireImpact;
use crate::services::{QueryFilter, QueryShape, WorldQuery};

/// Hits closer than this to the probe start are treated as bottomed out.
pub const CONTACT_EPSILON: f64 = 1e-4;

/// A bottomed-out probe reports compression `1 - BOTTOM_OUT_MARGIN` and keeps
/// this fraction of its length, so the segment never collapses to a point.
pub const BOTTOM_OUT_MARGIN: f64 = 1e-3;

/// Counts from one tracing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraceStats {
    /// Sweeps issued.
    pub traces: u32,
    /// Sweeps that hit.
    pub hits: u32,
    /// Rings skipped by the broad phase.
    pub skipped_rings: u32,
}

/// Direction of toroidal ring `index`: forward rotated about right.
#[must_use]
pub fn toroidal_direction(
    frame: &WheelFrame,
    geometry: &ProbeGeometry,
    index: usize,
    density: usize,
) -> Vector3<f64> {
    let fraction = index as f64 / density.max(1) as f64;
    let angle = (fraction * geometry.toroidal_span + geometry.start_angle).to_radians();
    let axis = Unit::new_normalize(frame.right);
    UnitQuaternion::from_axis_angle(&axis, angle) * frame.forward
}

/// Direction of poloidal probe `index` within a ring.
///
/// Rotates the ring direction across the tread, about
/// `normalize(toroidal × right)`, spreading probes evenly over
/// `poloidal_span` centered on the ring direction.
#[must_use]
pub fn poloidal_direction(
    toroidal: &Vector3<f64>,
    right: &Vector3<f64>,
    index: usize,
    density: usize,
    poloidal_span: f64,
) -> Vector3<f64> {
    let offset = if density > 1 {
        index as f64 / (density - 1) as f64 - 0.5
    } else {
        0.0
    };

    match toroidal.cross(right).try_normalize(f64::EPSILON) {
        Some(axis) => {
            let axis = Unit::new_unchecked(axis);
            UnitQuaternion::from_axis_angle(&axis, (offset * poloidal_span).to_radians()) * toroidal
        }
        None => *toroidal,
    }
}

/// Trace every probe and update the grid in place.
///
/// Misses, including whole rings skipped by the broad phase, clear the
/// probe's contact and force memory.
pub fn trace_probes<W: WorldQuery + ?Sized>(
    grid: &mut ProbeGrid<TireImpact>,
    frame: &WheelFrame,
    geometry: &ProbeGeometry,
    toggles: &TireToggles,
    world: &W,
    filter: &QueryFilter,
) -> TraceStats {
    let toroidal_density = grid.toroidal_density();
    let poloidal_density = grid.poloidal_density();
    let probe_shape = QueryShape::sphere(geometry.probe_radius);
    let broad_shape = QueryShape::sphere(geometry.tire_radius);
    let length = geometry.tire_radius;

    let mut stats = TraceStats::default();

    for t in 0..toroidal_density {
        let toroidal = toroidal_direction(frame, geometry, t, toroidal_density);
        let start = frame.position + toroidal * geometry.inner_radius;

        let skip_ring =
            toggles.broad_phase_skip && !world.overlap_any(&broad_shape, &start, filter);

        for (p, impact) in grid.ring_mut(t).iter_mut().enumerate() {
            let direction = poloidal_direction(
                &toroidal,
                &frame.right,
                p,
                poloidal_density,
                geometry.poloidal_span,
            );
            let full_end = start + direction * length;
            impact.set_segment(start, direction, full_end);

            if skip_ring {
                impact.clear_contact();
                continue;
            }

            stats.traces += 1;
            match world.sweep(&probe_shape, &start, &full_end, filter) {
                Some(hit) if hit.distance < CONTACT_EPSILON => {
                    let end = start + direction * (length * BOTTOM_OUT_MARGIN);
                    impact.set_contact(end, 1.0 - BOTTOM_OUT_MARGIN, hit);
                    stats.hits += 1;
                }
                Some(hit) => {
                    let compression = 1.0 - (hit.point - start).norm() / length;
                    impact.set_contact(hit.point, compression, hit);
                    stats.hits += 1;
                }
                None => impact.clear_contact(),
            }
        }

        if skip_ring {
            stats.skipped_rings += 1;
            trace!(ring = t, "Broad phase skipped ring");
        }
    }

    stats
}
