use super::{Arc, ArcIndex, Graph, Node, NodeIndex};
use crate::{
    Error, Mesh,
    filter::SpatialFilter,
    geometry::{
        Crossing, CrossingKind, Primitive, Sphere, Triangle, edge_crossings,
        pair_chords,
    },
    mesh::EdgeIndex,
};
use arrayvec::ArrayVec;
use std::collections::{HashMap, TryReserveError};

/// Builds intersection graphs, reusing scratch memory between queries
///
/// Crossings are computed once per mesh edge, walking the edge from its
/// lower to its higher vertex index, so the two triangles sharing an edge
/// see exactly the same points.  Nodes are keyed by edge and crossing
/// number, which is how chords from neighboring triangles are joined.
#[derive(Default)]
pub struct GraphBuilder {
    /// Candidate triangles returned by the spatial filter
    candidates: Vec<usize>,

    /// Triangles that touch the most recent query's ball
    touched: Vec<usize>,

    /// Crossings for each edge, in its canonical direction
    crossings: HashMap<EdgeIndex, ArrayVec<Crossing, 2>>,

    /// Graph node for each `(edge, crossing)` pair
    nodes: HashMap<(EdgeIndex, usize), NodeIndex>,

    /// Scratch data for orientation repair
    stitch: Stitch,
}

#[derive(Default)]
struct Stitch {
    seen: Vec<bool>,
    stack: Vec<NodeIndex>,
    component: Vec<NodeIndex>,
    arcs: Vec<ArcIndex>,
    flip: HashMap<ArcIndex, bool>,
}

impl GraphBuilder {
    /// Builds a new graph builder with empty scratch buffers
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves scratch space for queries touching `triangles` triangles
    pub fn try_reserve(
        &mut self,
        triangles: usize,
    ) -> Result<(), TryReserveError> {
        self.candidates.try_reserve(triangles)?;
        self.touched.try_reserve(triangles)?;
        self.crossings.try_reserve(triangles)?;
        self.nodes.try_reserve(triangles)?;
        Ok(())
    }

    /// Triangles touching the ball of the most recent query, in order
    pub fn touched(&self) -> &[usize] {
        &self.touched
    }

    /// Builds the intersection graph for a sphere centered on `vertex`
    pub fn build(
        &mut self,
        mesh: &Mesh,
        filter: &SpatialFilter,
        vertex: usize,
        radius: f64,
    ) -> Result<Graph, Error> {
        let center = *mesh
            .vertices()
            .get(vertex)
            .ok_or(Error::BadVertex(vertex))?;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(Error::BadRadius(radius));
        }
        let sphere = Sphere::new(center, radius);
        let mut graph = Graph::new(vertex, sphere);

        filter.query_into(&center, radius, &mut self.candidates);
        let ball = Primitive::Sphere(sphere);
        self.touched.clear();
        self.touched.extend(self.candidates.iter().copied().filter(|&t| {
            ball.intersects(&Primitive::Triangle(Triangle(mesh.corners(t))))
        }));

        self.crossings.clear();
        self.nodes.clear();
        let vertices = mesh.vertices();
        for &t in &self.touched {
            // Triangles without an area have no orientation to give chords
            let Some(normal) = Triangle(mesh.corners(t)).normal() else {
                continue;
            };
            let tri = mesh.triangles()[t];
            let mut boundary = ArrayVec::<(NodeIndex, CrossingKind), 6>::new();
            let edges = mesh.triangle_edges(t);
            for (side, edge) in edges.into_iter().enumerate() {
                let Some(edge) = edge else { continue };
                let [lo, hi] = mesh.edge(edge);
                let (p, q) = (&vertices[lo], &vertices[hi]);
                let crossings = self
                    .crossings
                    .entry(edge)
                    .or_insert_with(|| edge_crossings(p, q, &sphere))
                    .clone();

                let forward = tri[side] == lo;
                let n = crossings.len();
                for k in 0..n {
                    let i = if forward { k } else { n - 1 - k };
                    let c = crossings[i];
                    let node =
                        *self.nodes.entry((edge, i)).or_insert_with(|| {
                            let pos = c.position(p, q);
                            graph.add_node(Node::new(pos, edge, i))
                        });
                    let kind = if forward { c.kind } else { c.kind.flip() };
                    boundary.push((node, kind));
                }
            }
            for (start, end) in pair_chords(&boundary) {
                graph.add_arc(Arc::new(start, end, t, normal));
            }
        }

        self.stitch.run(&mut graph);
        Ok(graph)
    }
}

impl Stitch {
    /// Makes arc directions agree within each simple component
    ///
    /// Neighboring triangles with opposite winding produce chords that meet
    /// head-to-head.  In components where every node joins at most two arcs,
    /// the minority direction is flipped to agree with the majority; ties go
    /// to the component's lowest arc.  Branching components are left alone,
    /// since there is no single direction to agree on.
    fn run(&mut self, graph: &mut Graph) {
        self.seen.clear();
        self.seen.resize(graph.node_slots(), false);

        let roots: Vec<NodeIndex> = graph.nodes().map(|(i, _)| i).collect();
        for root in roots {
            if self.seen[root.get()] {
                continue;
            }
            self.collect(graph, root);
            let simple = self
                .component
                .iter()
                .filter_map(|&n| graph.node(n))
                .all(|n| n.degree() <= 2);
            if !simple || self.arcs.is_empty() {
                continue;
            }
            self.orient(graph);

            let mut flipped: Vec<ArcIndex> = self
                .flip
                .iter()
                .filter(|&(_, &f)| f)
                .map(|(&a, _)| a)
                .collect();
            flipped.sort_unstable();
            for a in flipped {
                let Some(arc) = graph.remove_arc(a) else { continue };
                let Some(r) = graph.add_arc(arc.reversed()) else { continue };
                log::debug!(
                    "reversed arc {} on triangle {} (now {})",
                    a.get(),
                    arc.triangle(),
                    r.get()
                );
            }
        }
    }

    /// Collects the nodes and arcs connected to `root`
    fn collect(&mut self, graph: &Graph, root: NodeIndex) {
        self.component.clear();
        self.arcs.clear();
        self.stack.clear();
        self.stack.push(root);
        self.seen[root.get()] = true;
        while let Some(n) = self.stack.pop() {
            self.component.push(n);
            let Some(node) = graph.node(n) else { continue };
            for &a in node.incoming().iter().chain(node.outgoing()) {
                self.arcs.push(a);
                let Some(arc) = graph.arc(a) else { continue };
                for m in [arc.start(), arc.end()] {
                    if !self.seen[m.get()] {
                        self.seen[m.get()] = true;
                        self.stack.push(m);
                    }
                }
            }
        }
        self.arcs.sort_unstable();
        self.arcs.dedup();
    }

    /// Decides which arcs to flip
    ///
    /// Directions are propagated from the lowest arc, then inverted if most
    /// arcs disagree with it, so that a single badly wound triangle cannot
    /// turn the rest of the component around.
    fn orient(&mut self, graph: &Graph) {
        self.flip.clear();
        let first = self.arcs[0];
        self.flip.insert(first, false);
        let mut queue = vec![first];
        while let Some(a) = queue.pop() {
            let Some(arc) = graph.arc(a) else { continue };
            let (start, end) = if self.flip[&a] {
                (arc.end(), arc.start())
            } else {
                (arc.start(), arc.end())
            };

            // The next arc leaves `end`, the previous one reaches `start`
            for (n, leaves) in [(end, true), (start, false)] {
                let Some(node) = graph.node(n) else { continue };
                for &b in node.incoming().iter().chain(node.outgoing()) {
                    if b == a || self.flip.contains_key(&b) {
                        continue;
                    }
                    let Some(other) = graph.arc(b) else { continue };
                    let flip = if leaves {
                        other.start() != n
                    } else {
                        other.end() != n
                    };
                    self.flip.insert(b, flip);
                    queue.push(b);
                }
            }
        }

        let flipped = self.flip.values().filter(|&&f| f).count();
        if 2 * flipped > self.flip.len() {
            self.flip.values_mut().for_each(|f| *f = !*f);
        }
    }
}
