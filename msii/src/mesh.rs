//! Indexed triangle meshes used as descriptor input
use crate::Error;
use std::collections::HashMap;

use nalgebra::Vector3;

/// Index of an undirected mesh edge, see [`Mesh::edge`]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct EdgeIndex(pub usize);

/// An immutable indexed triangle mesh
///
/// In addition to vertices and triangles, the mesh stores a table of
/// undirected edges.  Each edge is stored once as a `(lo, hi)` vertex pair
/// with `lo < hi`, so triangles on either side of an edge agree on its
/// identity and direction.
#[derive(Clone, Debug)]
pub struct Mesh {
    vertices: Vec<Vector3<f64>>,
    triangles: Vec<Vector3<usize>>,

    /// Canonical `(lo, hi)` vertex pairs
    edges: Vec<[usize; 2]>,

    /// Edges for sides `v0-v1`, `v1-v2`, `v2-v0` of each triangle
    ///
    /// A side whose vertices coincide has no edge.
    triangle_edges: Vec<[Option<EdgeIndex>; 3]>,
}

impl Mesh {
    /// Builds a new mesh, checking that its indices and positions are valid
    pub fn new(
        vertices: Vec<Vector3<f64>>,
        triangles: Vec<Vector3<usize>>,
    ) -> Result<Self, Error> {
        if let Some(i) = vertices
            .iter()
            .position(|v| !v.iter().all(|c| c.is_finite()))
        {
            return Err(Error::BadVertex(i));
        }

        for (t, tri) in triangles.iter().enumerate() {
            if let Some(&vertex) = tri.iter().find(|&&v| v >= vertices.len()) {
                return Err(Error::BadTriangle {
                    triangle: t,
                    vertex,
                });
            }
        }
        Ok(Self::from_valid(vertices, triangles))
    }

    /// Builds a mesh whose triangle indices are known to be in range
    pub(crate) fn from_valid(
        vertices: Vec<Vector3<f64>>,
        triangles: Vec<Vector3<usize>>,
    ) -> Self {
        let mut edges = vec![];
        let mut edge_map: HashMap<[usize; 2], EdgeIndex> = HashMap::new();
        let mut triangle_edges = Vec::with_capacity(triangles.len());
        for tri in &triangles {
            let mut sides = [None; 3];
            for (j, side) in sides.iter_mut().enumerate() {
                let (a, b) = (tri[j], tri[(j + 1) % 3]);
                if a == b {
                    continue;
                }
                let key = [a.min(b), a.max(b)];
                *side = Some(*edge_map.entry(key).or_insert_with(|| {
                    edges.push(key);
                    EdgeIndex(edges.len() - 1)
                }));
            }
            triangle_edges.push(sides);
        }

        Self {
            vertices,
            triangles,
            edges,
            triangle_edges,
        }
    }

    /// Returns a copy of this mesh with every position scaled by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| v * factor).collect(),
            ..self.clone()
        }
    }

    /// Vertex positions
    pub fn vertices(&self) -> &[Vector3<f64>] {
        &self.vertices
    }

    /// Triangles, as indexes into [`vertices`](Self::vertices)
    pub fn triangles(&self) -> &[Vector3<usize>] {
        &self.triangles
    }

    /// Returns the canonical `(lo, hi)` vertex pair of the given edge
    pub fn edge(&self, e: EdgeIndex) -> [usize; 2] {
        self.edges[e.0]
    }

    /// Returns the number of distinct edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the edges along the three sides of a triangle
    ///
    /// Side `j` runs from corner `j` to corner `(j + 1) % 3`.
    pub fn triangle_edges(&self, t: usize) -> [Option<EdgeIndex>; 3] {
        self.triangle_edges[t]
    }

    /// Returns the corner positions of a triangle
    pub fn corners(&self, t: usize) -> [Vector3<f64>; 3] {
        let tri = self.triangles[t];
        [
            self.vertices[tri[0]],
            self.vertices[tri[1]],
            self.vertices[tri[2]],
        ]
    }

    /// Returns the axis-aligned bounding box of all vertices
    ///
    /// Returns `None` if the mesh has no vertices.
    pub fn bounds(&self) -> Option<(Vector3<f64>, Vector3<f64>)> {
        let mut iter = self.vertices.iter();
        let first = *iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.inf(v), hi.sup(v))))
    }
}

static_assertions::assert_impl_all!(Mesh: Send, Sync);
