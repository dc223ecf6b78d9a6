//! Intersection graphs between a query sphere and a mesh
//!
//! Nodes are the points where the sphere crosses mesh edges; arcs are the
//! pieces of circle that join them across each triangle.  Both live in
//! arenas and are addressed by [`NodeIndex`] and [`ArcIndex`].  Removing an
//! item frees its slot without disturbing other indices; slots are only
//! recycled when the whole graph is cleared.
//!
//! Graphs are usually built with a [`GraphBuilder`] and then handed to the
//! functions in [`algorithm`], some of which consume the graph.
use crate::{geometry::Sphere, mesh::EdgeIndex};
use nalgebra::Vector3;

pub mod algorithm;
mod builder;
mod curve;

pub use builder::GraphBuilder;
pub use curve::ArcCurve;

/// Index of a node within a [`Graph`]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// Returns the raw index
    pub fn get(self) -> usize {
        self.0
    }
}

/// Index of an arc within a [`Graph`]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ArcIndex(usize);

impl ArcIndex {
    /// Returns the raw index
    pub fn get(self) -> usize {
        self.0
    }
}

/// Direction of an arc, relative to its triangle's winding
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    /// Runs clockwise around the triangle's winding normal
    Winding,
    /// Runs the opposite way
    Reversed,
}

/// How an arc came to be in the graph
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ArcOrigin {
    /// Built directly from a triangle chord
    Chord,
    /// Added while repairing orientation, replacing a chord arc
    Stitched,
}

/// A point where the sphere crosses a mesh edge
#[derive(Clone, Debug)]
pub struct Node {
    /// Position, on the sphere's surface
    pub position: Vector3<f64>,
    /// Mesh edge on which the crossing lies
    pub edge: EdgeIndex,
    /// Which crossing along the edge this is (`0` or `1`)
    pub crossing: usize,

    incoming: Vec<ArcIndex>,
    outgoing: Vec<ArcIndex>,
}

impl Node {
    /// Builds a new node without any attached arcs
    pub fn new(
        position: Vector3<f64>,
        edge: EdgeIndex,
        crossing: usize,
    ) -> Self {
        Self {
            position,
            edge,
            crossing,
            incoming: vec![],
            outgoing: vec![],
        }
    }

    /// Arcs ending at this node
    pub fn incoming(&self) -> &[ArcIndex] {
        &self.incoming
    }

    /// Arcs starting at this node
    pub fn outgoing(&self) -> &[ArcIndex] {
        &self.outgoing
    }

    /// Number of attached arcs, counting each end of a loop separately
    pub fn degree(&self) -> usize {
        self.incoming.len() + self.outgoing.len()
    }
}

/// A directed piece of circle between two nodes, within a single triangle
#[derive(Copy, Clone, Debug)]
pub struct Arc {
    start: NodeIndex,
    end: NodeIndex,
    triangle: usize,
    normal: Vector3<f64>,
    direction: Direction,
    origin: ArcOrigin,
}

impl Arc {
    /// Builds an arc from a triangle chord, running in winding order
    ///
    /// `normal` is the triangle's unit normal.
    pub fn new(
        start: NodeIndex,
        end: NodeIndex,
        triangle: usize,
        normal: Vector3<f64>,
    ) -> Self {
        Self {
            start,
            end,
            triangle,
            normal,
            direction: Direction::Winding,
            origin: ArcOrigin::Chord,
        }
    }

    /// Returns a stitched arc covering the same curve in the other direction
    pub fn reversed(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
            direction: match self.direction {
                Direction::Winding => Direction::Reversed,
                Direction::Reversed => Direction::Winding,
            },
            origin: ArcOrigin::Stitched,
            ..*self
        }
    }

    /// Node at which the arc starts
    pub fn start(&self) -> NodeIndex {
        self.start
    }

    /// Node at which the arc ends
    pub fn end(&self) -> NodeIndex {
        self.end
    }

    /// Mesh triangle containing the arc
    pub fn triangle(&self) -> usize {
        self.triangle
    }

    /// Direction of the arc relative to its triangle's winding
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// How the arc was created
    pub fn origin(&self) -> ArcOrigin {
        self.origin
    }

    /// Returns the normal around which the arc runs clockwise
    pub fn plane_normal(&self) -> Vector3<f64> {
        match self.direction {
            Direction::Winding => self.normal,
            Direction::Reversed => -self.normal,
        }
    }
}

/// Graph of arcs where a sphere intersects a mesh
#[derive(Clone, Debug)]
pub struct Graph {
    sphere: Sphere,
    seed: usize,

    nodes: Vec<Option<Node>>,
    arcs: Vec<Option<Arc>>,
    node_count: usize,
    arc_count: usize,
}

impl Graph {
    /// Builds an empty graph for a sphere centered on vertex `seed`
    pub fn new(seed: usize, sphere: Sphere) -> Self {
        Self {
            sphere,
            seed,
            nodes: vec![],
            arcs: vec![],
            node_count: 0,
            arc_count: 0,
        }
    }

    /// Returns the query sphere
    pub fn sphere(&self) -> &Sphere {
        &self.sphere
    }

    /// Returns the mesh vertex at the sphere's center
    pub fn seed(&self) -> usize {
        self.seed
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of live arcs
    pub fn arc_count(&self) -> usize {
        self.arc_count
    }

    /// Checks whether the graph has no nodes and no arcs
    pub fn is_empty(&self) -> bool {
        self.node_count == 0 && self.arc_count == 0
    }

    /// Removes every node and arc
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.arcs.clear();
        self.node_count = 0;
        self.arc_count = 0;
    }

    /// Adds a node, returning its index
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        let mut node = node;
        node.incoming.clear();
        node.outgoing.clear();
        self.nodes.push(Some(node));
        self.node_count += 1;
        NodeIndex(self.nodes.len() - 1)
    }

    /// Adds an arc, linking it to its start and end nodes
    ///
    /// Returns `None` and leaves the graph unchanged if either node is not
    /// in the graph.
    pub fn add_arc(&mut self, arc: Arc) -> Option<ArcIndex> {
        if self.node(arc.start).is_none() || self.node(arc.end).is_none() {
            return None;
        }
        let i = ArcIndex(self.arcs.len());
        self.nodes[arc.start.0].as_mut()?.outgoing.push(i);
        self.nodes[arc.end.0].as_mut()?.incoming.push(i);
        self.arcs.push(Some(arc));
        self.arc_count += 1;
        Some(i)
    }

    /// Removes an arc, unlinking it from its nodes
    ///
    /// Returns `None` if the arc was not in the graph.
    pub fn remove_arc(&mut self, a: ArcIndex) -> Option<Arc> {
        let arc = self.arcs.get_mut(a.0)?.take()?;
        self.arc_count -= 1;
        if let Some(n) = self.nodes[arc.start.0].as_mut() {
            n.outgoing.retain(|&o| o != a);
        }
        if let Some(n) = self.nodes[arc.end.0].as_mut() {
            n.incoming.retain(|&o| o != a);
        }
        Some(arc)
    }

    /// Removes a node along with every arc attached to it
    ///
    /// Returns `None` if the node was not in the graph.
    pub fn remove_node(&mut self, n: NodeIndex) -> Option<Node> {
        let node = self.nodes.get(n.0)?.as_ref()?;
        let attached: Vec<ArcIndex> =
            node.incoming.iter().chain(&node.outgoing).copied().collect();
        for a in attached {
            self.remove_arc(a);
        }
        let node = self.nodes[n.0].take()?;
        self.node_count -= 1;
        Some(node)
    }

    /// Looks up a node
    pub fn node(&self, n: NodeIndex) -> Option<&Node> {
        self.nodes.get(n.0)?.as_ref()
    }

    /// Looks up an arc
    pub fn arc(&self, a: ArcIndex) -> Option<&Arc> {
        self.arcs.get(a.0)?.as_ref()
    }

    /// Iterates over live nodes in index order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeIndex(i), n)))
    }

    /// Iterates over live arcs in index order
    pub fn arcs(&self) -> impl Iterator<Item = (ArcIndex, &Arc)> {
        self.arcs
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.as_ref().map(|a| (ArcIndex(i), a)))
    }

    /// Returns the live arc with the lowest index
    pub fn first_arc(&self) -> Option<ArcIndex> {
        self.arcs().next().map(|(i, _)| i)
    }

    /// Returns the live node with the lowest index
    pub fn first_node(&self) -> Option<NodeIndex> {
        self.nodes().next().map(|(i, _)| i)
    }

    /// Returns the circular curve followed by an arc
    pub fn curve(&self, a: ArcIndex) -> Option<ArcCurve> {
        let arc = self.arc(a)?;
        let start = self.node(arc.start)?.position;
        let end = self.node(arc.end)?.position;
        Some(ArcCurve::new(&self.sphere, start, end, arc.plane_normal()))
    }

    /// Upper bound on node indices, including removed nodes
    pub(crate) fn node_slots(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn node(x: f64) -> Node {
        Node::new(Vector3::new(x, 0.0, 0.0), EdgeIndex(0), 0)
    }

    fn triangle_graph() -> (Graph, [NodeIndex; 3], [ArcIndex; 3]) {
        let mut g = Graph::new(0, Sphere::new(Vector3::zeros(), 1.0));
        let n = [0.0, 1.0, 2.0].map(|x| g.add_node(node(x)));
        let a = [0, 1, 2].map(|i| {
            g.add_arc(Arc::new(n[i], n[(i + 1) % 3], i, Vector3::z()))
                .unwrap()
        });
        (g, n, a)
    }

    #[test]
    fn links() {
        let (g, n, a) = triangle_graph();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.arc_count(), 3);
        assert_eq!(g.node(n[1]).unwrap().incoming(), &[a[0]]);
        assert_eq!(g.node(n[1]).unwrap().outgoing(), &[a[1]]);
        assert_eq!(g.arc(a[2]).unwrap().end(), n[0]);
        assert_eq!(g.first_arc(), Some(a[0]));
    }

    #[test]
    fn remove() {
        let (mut g, n, a) = triangle_graph();
        let arc = g.remove_arc(a[0]).unwrap();
        assert_eq!(arc.triangle(), 0);
        assert!(g.remove_arc(a[0]).is_none());
        assert!(g.node(n[0]).unwrap().outgoing().is_empty());
        assert_eq!(g.first_arc(), Some(a[1]));

        // Removing a node takes its remaining arcs with it
        g.remove_node(n[2]).unwrap();
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.arc_count(), 0);
        assert!(g.node(n[1]).unwrap().outgoing().is_empty());
        assert!(g.remove_node(n[2]).is_none());

        // Indices are stable and never reused
        let m = g.add_node(node(3.0));
        assert_eq!(m.get(), 3);
        assert_eq!(g.first_node(), Some(n[0]));

        g.clear();
        assert!(g.is_empty());
        assert!(g.node(n[0]).is_none());
        assert!(g.first_arc().is_none());
    }

    #[test]
    fn dangling_arc() {
        let (mut g, n, _) = triangle_graph();
        g.remove_node(n[2]).unwrap();
        let arc = Arc::new(n[0], n[2], 0, Vector3::z());
        assert!(g.add_arc(arc).is_none());
        let arc = Arc::new(n[0], NodeIndex(17), 0, Vector3::z());
        assert!(g.add_arc(arc).is_none());

        // Nothing was linked by the failed additions
        assert_eq!(g.arc_count(), 1);
        assert_eq!(g.node(n[0]).unwrap().outgoing().len(), 1);
        assert!(g.first_arc().is_some());
    }

    #[test]
    fn reversed() {
        let (g, n, a) = triangle_graph();
        let arc = g.arc(a[0]).unwrap().reversed();
        assert_eq!(arc.start(), n[1]);
        assert_eq!(arc.end(), n[0]);
        assert_eq!(arc.direction(), Direction::Reversed);
        assert_eq!(arc.origin(), ArcOrigin::Stitched);
        assert_eq!(arc.plane_normal(), -Vector3::z());
        assert_eq!(arc.reversed().direction(), Direction::Winding);
    }
}
