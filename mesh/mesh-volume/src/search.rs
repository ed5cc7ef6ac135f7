//! Fill-level search: the height at which a fraction of the volume lies below.

use std::sync::{Mutex, OnceLock, PoisonError};

use hashbrown::HashMap;
use mesh_types::{MeshId, MeshSource};
use nalgebra::{Isometry3, Point3, Vector3};
use tracing::{debug, error, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::buffers::SlicedMesh;
use crate::error::{VolumeError, VolumeResult};
use crate::frame::SlicingFrame;
use crate::section::section_volume;

/// Parameters for the fill-level search.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchParams {
    /// Accepted absolute error on the volume below the plane.
    pub tolerance: f64,

    /// Bisection steps inside the bracketing band.
    pub iterations: u32,

    /// Bands thinner than this are merged into the band above during the scan.
    pub min_band: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            iterations: 10,
            min_band: 0.001,
        }
    }
}

impl SearchParams {
    /// Tighter search for offline measurement.
    #[must_use]
    pub fn precise() -> Self {
        Self {
            tolerance: 1e-6,
            iterations: 60,
            min_band: 1e-9,
        }
    }

    /// Set the volume tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the number of bisection steps.
    #[must_use]
    pub const fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the thinnest band considered.
    #[must_use]
    pub const fn with_min_band(mut self, min_band: f64) -> Self {
        self.min_band = min_band;
        self
    }

    /// Validate the parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the tolerance or band threshold is negative or
    /// not finite.
    pub fn validate(&self) -> VolumeResult<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(VolumeError::invalid_params(
                "tolerance must be finite and non-negative",
            ));
        }
        if !self.min_band.is_finite() || self.min_band < 0.0 {
            return Err(VolumeError::invalid_params(
                "min_band must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Memoized whole-mesh volumes keyed by mesh identity.
///
/// Entries are never invalidated implicitly. Call [`VolumeCache::invalidate`]
/// when a mesh's geometry changes under the same id.
#[derive(Debug, Default)]
pub struct VolumeCache {
    volumes: HashMap<MeshId, f64>,
    hits: u64,
    misses: u64,
}

/// Lookup statistics of a [`VolumeCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that computed the volume.
    pub misses: u64,
    /// Meshes currently cached.
    pub entries: usize,
}

impl VolumeCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> &'static Mutex<Self> {
        static GLOBAL: OnceLock<Mutex<VolumeCache>> = OnceLock::new();
        GLOBAL.get_or_init(|| Mutex::new(Self::new()))
    }

    /// Cached volume for `id`, if any. Does not touch the statistics.
    #[must_use]
    pub fn get(&self, id: &MeshId) -> Option<f64> {
        self.volumes.get(id).copied()
    }

    /// Cached volume for `id`, computing and storing it on a miss.
    pub fn get_or_compute(&mut self, id: &MeshId, compute: impl FnOnce() -> f64) -> f64 {
        if let Some(&volume) = self.volumes.get(id) {
            self.hits += 1;
            return volume;
        }

        self.misses += 1;
        let volume = compute();
        info!(mesh = %id, volume, "Computed mesh volume");
        self.volumes.insert(id.clone(), volume);
        volume
    }

    /// Forget the volume of one mesh.
    pub fn invalidate(&mut self, id: &MeshId) -> Option<f64> {
        self.volumes.remove(id)
    }

    /// Forget everything, including statistics.
    pub fn clear(&mut self) {
        self.volumes.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Number of cached meshes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Lookup statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.volumes.len(),
        }
    }
}

/// Outcome of a fill-level search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SearchStatus {
    /// The plane encloses the target volume within tolerance.
    Found,
    /// The scan ran past the top of the mesh without reaching the target.
    /// The reported height is a best effort and should not be trusted.
    Exhausted,
}

/// Result of [`volumetric_slicing_plane`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SliceSearch {
    /// A point on the slicing plane, in world space.
    pub point: Point3<f64>,
    /// Plane height in the slicing frame.
    pub height: f64,
    /// Plane height above the lowest point of the mesh.
    pub depth: f64,
    /// Volume below the plane.
    pub volume_below: f64,
    /// Whole-mesh volume.
    pub total_volume: f64,
    /// Whether the target was reached.
    pub status: SearchStatus,
}

impl SliceSearch {
    /// Whether the search reached its target.
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.status == SearchStatus::Found
    }
}

/// Find the plane, orthogonal to `plane_normal`, below which `alpha` of the
/// mesh volume lies.
///
/// The mesh is placed by `placement` and rotated about the placement origin
/// so the normal becomes +Z. The whole-mesh volume is memoized in `cache`
/// under the mesh's id.
///
/// # Errors
///
/// Returns an error for `alpha` outside `[0, 1]`, a degenerate normal,
/// invalid parameters or an unusable mesh.
///
/// # Example
///
/// ```
/// use mesh_types::{cuboid, NamedMesh};
/// use mesh_volume::{volumetric_slicing_plane, SearchParams, VolumeCache};
/// use nalgebra::{Isometry3, Point3, Vector3};
///
/// let tank = NamedMesh::new("tank", cuboid(Point3::origin(), Point3::new(10.0, 10.0, 10.0)));
/// let mut cache = VolumeCache::new();
///
/// let slice = volumetric_slicing_plane(
///     &tank,
///     &Isometry3::identity(),
///     0.5,
///     &Vector3::z(),
///     &SearchParams::default(),
///     &mut cache,
/// )
/// .unwrap();
///
/// assert!(slice.is_found());
/// assert!((slice.depth - 5.0).abs() < 1e-6);
/// ```
pub fn volumetric_slicing_plane<S: MeshSource + ?Sized>(
    source: &S,
    placement: &Isometry3<f64>,
    alpha: f64,
    plane_normal: &Vector3<f64>,
    params: &SearchParams,
    cache: &mut VolumeCache,
) -> VolumeResult<SliceSearch> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(VolumeError::InvalidAlpha(alpha));
    }
    params.validate()?;

    let frame = SlicingFrame::for_placement(placement, plane_normal)?;
    let mesh = SlicedMesh::extract(source, placement, frame)?;

    let id = source.mesh_id();
    let total_volume = cache.get_or_compute(&id, || total_volume(&mesh));

    let mut search = search_sliced(&mesh, total_volume, alpha, params);
    if search.status == SearchStatus::Exhausted {
        error!(
            mesh = %id,
            alpha,
            target = total_volume * alpha,
            reached = search.volume_below,
            "Slicing plane search overflowed the mesh"
        );
    }

    let on_plane = Point3::new(mesh.centroid.x, mesh.centroid.y, search.height);
    search.point = frame.to_world(&on_plane);
    Ok(search)
}

/// [`volumetric_slicing_plane`] against [`VolumeCache::global`].
///
/// # Errors
///
/// See [`volumetric_slicing_plane`].
pub fn volumetric_slicing_plane_global<S: MeshSource + ?Sized>(
    source: &S,
    placement: &Isometry3<f64>,
    alpha: f64,
    plane_normal: &Vector3<f64>,
    params: &SearchParams,
) -> VolumeResult<SliceSearch> {
    let mut cache = VolumeCache::global()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    volumetric_slicing_plane(source, placement, alpha, plane_normal, params, &mut cache)
}

/// Sum of the volumes between consecutive vertex heights.
#[must_use]
pub fn total_volume(mesh: &SlicedMesh) -> f64 {
    mesh.vertices
        .windows(2)
        .map(|w| section_volume(mesh, w[0].z, w[1].z))
        .sum()
}

/// Scan the height-sorted vertices, then bisect the bracketing band.
///
/// The returned `point` is left in the slicing frame.
fn search_sliced(
    mesh: &SlicedMesh,
    total_volume: f64,
    alpha: f64,
    params: &SearchParams,
) -> SliceSearch {
    let target = total_volume * alpha;
    let base = mesh.z_bounds.0;
    let result = |height: f64, volume_below: f64, status| SliceSearch {
        point: Point3::new(mesh.centroid.x, mesh.centroid.y, height),
        height,
        depth: height - base,
        volume_below,
        total_volume,
        status,
    };

    let mut accumulated = 0.0;
    // Height up to which `accumulated` has been measured
    let mut lower = base;

    for vertex in mesh.vertices.iter().skip(1) {
        let upper = vertex.z;

        if accumulated >= target - params.tolerance {
            return result(lower, accumulated, SearchStatus::Found);
        }

        if upper - lower < params.min_band {
            continue;
        }

        let band = section_volume(mesh, lower, upper);
        if accumulated + band <= target + params.tolerance {
            accumulated += band;
            lower = upper;
            continue;
        }

        let (mut lo, mut hi) = (lower, upper);
        let mut mid = (lo + hi) / 2.0;
        let mut partial = section_volume(mesh, lower, mid);

        for iteration in 0..params.iterations {
            let below = accumulated + partial;
            if (below - target).abs() <= params.tolerance {
                debug!(iteration, height = mid, "Slicing plane converged");
                break;
            }
            if below > target {
                hi = mid;
            } else {
                lo = mid;
            }
            mid = (lo + hi) / 2.0;
            partial = section_volume(mesh, lower, mid);
        }

        return result(mid, accumulated + partial, SearchStatus::Found);
    }

    let top = mesh.z_bounds.1;
    // Thin bands left at the top
    accumulated += section_volume(mesh, lower, top);
    if accumulated >= target - params.tolerance {
        result(top, accumulated, SearchStatus::Found)
    } else {
        result(top, accumulated, SearchStatus::Exhausted)
    }
}
