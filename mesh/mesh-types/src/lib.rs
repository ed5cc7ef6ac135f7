//! Core mesh types for volumetric queries.
//!
//! This crate provides the read-only mesh vocabulary consumed by
//! `mesh-volume`:
//!
//! - [`IndexedMesh`] - A triangle mesh with indexed vertices
//! - [`MeshId`] - Stable identity of a mesh asset, used as a memoization key
//! - [`MeshSource`] - Read-only access to vertex positions and faces
//! - [`NamedMesh`] - An [`IndexedMesh`] paired with its [`MeshId`]
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero engine dependencies**. A host engine
//! exposes its render/collision buffers by implementing [`MeshSource`].
//!
//! # Coordinate System
//!
//! Uses a **right-handed coordinate system** with Z up. Face winding is
//! **counter-clockwise (CCW) when viewed from outside**.
//!
//! # Example
//!
//! ```
//! use mesh_types::{cuboid, MeshSource, NamedMesh};
//! use nalgebra::Point3;
//!
//! let crate_box = NamedMesh::new(
//!     "props/crate",
//!     cuboid(Point3::origin(), Point3::new(2.0, 1.0, 1.0)),
//! );
//!
//! assert_eq!(crate_box.mesh_id().as_str(), "props/crate");
//! assert_eq!(crate_box.faces().len(), 12);
//! ```

#![doc(html_root_url = "https://docs.rs/mesh-types/0.1.0")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod mesh;
mod source;

pub use mesh::{cuboid, unit_cube, IndexedMesh};
pub use source::{MeshId, MeshSource, NamedMesh};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
