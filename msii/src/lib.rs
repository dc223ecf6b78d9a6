//! `msii` computes multi-scale integral invariant descriptors on triangle
//! meshes.
//!
//! For every vertex of a mesh and every radius in an ascending list, a sphere
//! is centered on the vertex and intersected with the surface.  The curves
//! where the sphere crosses the surface are assembled into an
//! [intersection graph](crate::graph::Graph), and a handful of scalar
//! features are read from that graph:
//!
//! - the **surface descriptor**: total length of the intersection curves,
//!   divided by the radius
//! - the **volume descriptor**: area of the sphere patch bounded by those
//!   curves on the solid side of the surface, divided by the radius squared
//!
//! The per-vertex **patch normal** is the area-weighted normal of the
//! triangles within the largest sphere.
//!
//! Both descriptors are invariant to uniform scaling of the mesh and radii.
//! Queries where the curves do not close (near a mesh boundary, or because
//! the surface is open inside the sphere) produce `NaN`.
//!
//! # Computing descriptors
//! ```
//! use msii::descriptor::{Settings, ThreadCount};
//!
//! let mesh = msii::shapes::disc(10.0, 8, 32);
//! let settings = Settings {
//!     threads: ThreadCount::One,
//!     ..Settings::linear(4.0, 2)
//! };
//! let out = msii::descriptor::compute(&mesh, &settings)?;
//!
//! // Vertex 0 is the disc's center: the sphere cuts a full circle
//! let surface = out.surface(0);
//! assert!((surface[1] - 2.0 * std::f64::consts::PI).abs() < 1e-6);
//! # Ok::<(), msii::Error>(())
//! ```
//!
//! # Working with a single query
//! The pieces used by [`descriptor::compute`] are public, so a single
//! (vertex, radius) query can be inspected directly:
//! ```
//! use msii::{filter::SpatialFilter, graph::{algorithm, GraphBuilder}};
//!
//! let mesh = msii::shapes::disc(10.0, 8, 32);
//! let filter = SpatialFilter::build(&mesh, 16)?;
//! let mut builder = GraphBuilder::new();
//!
//! let mut graph = builder.build(&mesh, &filter, 0, 4.5)?;
//! let length = algorithm::sphere_surface_length(&graph);
//! let volume = algorithm::sphere_volume_area(&mut graph);
//! assert!(volume.is_finite());
//! assert!(graph.is_empty()); // the volume computation consumes the graph
//! # let _ = length;
//! # Ok::<(), msii::Error>(())
//! ```
#![warn(missing_docs)]

mod error;
pub use error::Error;

pub mod descriptor;
pub mod filter;
pub mod geometry;
pub mod graph;
pub mod mesh;
pub mod shapes;

pub use mesh::Mesh;
