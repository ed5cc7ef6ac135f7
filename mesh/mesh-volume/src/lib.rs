//! Plane-aligned volumetric slicing for buoyancy and fill levels.
//!
//! Given a closed triangle mesh, a placement and a plane normal, this crate
//! answers three questions:
//!
//! - How much volume lies between two heights along the normal
//!   ([`section_volume`])
//! - At what height does a given fraction of the volume lie below the plane
//!   ([`volumetric_slicing_plane`])
//! - How large is the vertical cross-section below a plane
//!   ([`sliced_exit_area`])
//!
//! All queries work in a [`SlicingFrame`] where the plane normal is +Z. The
//! mesh buffers are read once per query through [`mesh_types::MeshSource`],
//! rotated into that frame and sorted by height ([`SlicedMesh`]).
//!
//! Whole-mesh volumes are memoized per [`mesh_types::MeshId`] in a
//! [`VolumeCache`]. Pass your own cache, or use [`VolumeCache::global`].
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero engine dependencies**.
//!
//! # Example
//!
//! ```
//! use mesh_types::{cuboid, NamedMesh};
//! use mesh_volume::{volumetric_slicing_plane, SearchParams, VolumeCache};
//! use nalgebra::{Isometry3, Point3, Vector3};
//!
//! let hull = NamedMesh::new("hull", cuboid(Point3::origin(), Point3::new(4.0, 2.0, 1.0)));
//! let mut cache = VolumeCache::new();
//!
//! // Where does the waterline sit when 30% of the hull is submerged?
//! let slice = volumetric_slicing_plane(
//!     &hull,
//!     &Isometry3::identity(),
//!     0.3,
//!     &Vector3::z(),
//!     &SearchParams::default(),
//!     &mut cache,
//! )
//! .unwrap();
//!
//! assert!(slice.is_found());
//! assert!((slice.total_volume - 8.0).abs() < 1e-9);
//! ```

#![doc(html_root_url = "https://docs.rs/mesh-volume/0.1.0")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod buffers;
mod error;
mod exit_area;
mod frame;
mod search;
mod section;

pub use buffers::{SlicedMesh, SortedTriangle};
pub use error::{VolumeError, VolumeResult};
pub use exit_area::{exit_area, slice_span, sliced_exit_area};
pub use frame::SlicingFrame;
pub use search::{
    total_volume, volumetric_slicing_plane, volumetric_slicing_plane_global, CacheStats,
    SearchParams, SearchStatus, SliceSearch, VolumeCache,
};
pub use section::{section_volume, vertex_band_volumes, HEIGHT_EPSILON};
