//! Module containing the universal error type
use std::collections::TryReserveError;
use thiserror::Error;

/// Universal error type for descriptor computation
#[derive(Error, Debug)]
pub enum Error {
    /// Triangle refers to a vertex that is not in the mesh
    #[error("triangle {triangle} refers to missing vertex {vertex}")]
    BadTriangle {
        /// Index of the offending triangle
        triangle: usize,
        /// Vertex index that is out of range
        vertex: usize,
    },

    /// Vertex is out of range or has a non-finite position
    #[error("vertex {0} is missing or has a non-finite position")]
    BadVertex(usize),

    /// Spatial filter grid resolution must be at least 1
    #[error("grid resolution must be at least 1")]
    EmptyGrid,

    /// Spatial filter grid resolution is too large to index
    #[error("grid resolution {0} is too large")]
    GridTooLarge(usize),

    /// No scale radii were provided
    #[error("scale radii are empty")]
    EmptyRadii,

    /// Radius is not a positive, finite value
    #[error("radius {0} is not positive and finite")]
    BadRadius(f64),

    /// Relative radius is outside of the range `(0, 1]`
    #[error("relative radius {0} is not in (0, 1]")]
    BadRelativeRadius(f64),

    /// Scale radii are not in ascending order
    #[error("scale radii are not ascending ({0} follows {1})")]
    UnsortedRadii(f64, f64),

    /// A worker thread could not reserve its scratch buffers
    #[error("thread {thread} could not reserve scratch memory")]
    Allocation {
        /// Index of the worker thread
        thread: usize,
        /// Underlying allocation failure
        #[source]
        source: TryReserveError,
    },

    /// A worker thread panicked before finishing its batch
    #[error("worker thread {0} panicked")]
    WorkerPanicked(usize),
}
