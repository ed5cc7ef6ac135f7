//! Debug counters, HUD text and the debug drawing seam.

use std::fmt::Write as _;

use hashbrown::HashMap;
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Named per-tick counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DebugCounter {
    /// Sweeps issued.
    TotalTraces,
    /// Sweeps that hit.
    TotalHits,
    /// Rings skipped by the broad phase.
    SkippedRings,
    /// Hits dropped for a degenerate patch normal or contact basis.
    DegenerateContacts,
    /// Substeps run.
    Substeps,
}

impl DebugCounter {
    /// Every counter.
    pub const ALL: [Self; 5] = [
        Self::TotalTraces,
        Self::TotalHits,
        Self::SkippedRings,
        Self::DegenerateContacts,
        Self::Substeps,
    ];

    /// Display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TotalTraces => "TotalTraces",
            Self::TotalHits => "TotalHits",
            Self::SkippedRings => "SkippedRings",
            Self::DegenerateContacts => "DegenerateContacts",
            Self::Substeps => "Substeps",
        }
    }
}

/// Counter name → count, accumulated across the substeps of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugData {
    counters: HashMap<&'static str, i64>,
}

impl DebugData {
    /// Empty counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every counter.
    pub fn reset(&mut self) {
        self.counters.clear();
    }

    /// Add `amount` to a counter.
    pub fn add(&mut self, counter: DebugCounter, amount: i64) {
        *self.counters.entry(counter.as_str()).or_insert(0) += amount;
    }

    /// Current value of a counter, 0 if never touched.
    #[must_use]
    pub fn get(&self, counter: DebugCounter) -> i64 {
        self.get_named(counter.as_str())
    }

    /// Current value by name, 0 if unknown.
    #[must_use]
    pub fn get_named(&self, name: &str) -> i64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// Iterate over `(name, count)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, i64)> + '_ {
        self.counters.iter().map(|(name, count)| (*name, *count))
    }
}

/// Linear RGB color in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DebugColor {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
}

impl DebugColor {
    /// Pure red.
    pub const RED: Self = Self::new(1.0, 0.0, 0.0);
    /// Pure green.
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0);
    /// Pure blue.
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0);
    /// Cyan, used for the average contact point.
    pub const CYAN: Self = Self::new(0.0, 1.0, 1.0);

    /// Color from components.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Red for an untouched probe, green for a bottomed-out one.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_compression(compression: f64) -> Self {
        let c = compression.clamp(0.0, 1.0) as f32;
        Self::new(1.0 - c, c, 0.0)
    }
}

/// Line thickness for a probe at a given compression.
#[must_use]
pub fn probe_line_thickness(compression: f64) -> f64 {
    compression.clamp(0.0, 1.0) + 0.1
}

/// HUD block for one wheel.
///
/// ```
/// use sim_tire::compose_hud;
///
/// let text = compose_hud("FrontLeft", 12, 1500.0, 20.0, 310.0);
/// assert_eq!(text, "FrontLeft\nHITS : 12\nSPRNG : 1500\nDAMP : 20\nFRIC : 310");
/// ```
#[must_use]
pub fn compose_hud(name: &str, hits: i64, spring: f64, damp: f64, friction: f64) -> String {
    let mut text = String::with_capacity(64);
    text.push_str(name);
    // Writing to a String cannot fail
    let _ = write!(
        text,
        "\nHITS : {hits}\nSPRNG : {spring:.0}\nDAMP : {damp:.0}\nFRIC : {friction:.0}"
    );
    text
}

/// Where debug geometry and text go.
///
/// Every method has a no-op default, so hosts implement only what they can
/// display.
pub trait DebugSink {
    /// Draw a line segment.
    fn draw_line(
        &mut self,
        _start: &Point3<f64>,
        _end: &Point3<f64>,
        _color: DebugColor,
        _thickness: f64,
    ) {
    }

    /// Draw a point marker.
    fn draw_point(&mut self, _point: &Point3<f64>, _size: f64, _color: DebugColor) {}

    /// Draw a wire sphere.
    fn draw_sphere(&mut self, _center: &Point3<f64>, _radius: f64, _color: DebugColor) {}

    /// Replace the on-screen text for this wheel.
    fn set_hud_text(&mut self, _text: &str) {}
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDebugSink;

impl DebugSink for NullDebugSink {}
