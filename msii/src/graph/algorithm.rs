//! Algorithms that extract descriptors from an intersection graph
//!
//! [`component_count`] and [`sphere_volume_area`] consume the graph: they
//! leave it empty, so any later call on the same graph sees no nodes or arcs
//! and returns the empty result.  Capture [`sphere_surface_length`] or
//! [`sphere_intersections`] first if they are also needed.
use super::{ArcCurve, ArcIndex, Graph, NodeIndex, curve::turning_angle};
use nalgebra::Vector3;
use std::f64::consts::PI;

/// A point where the sphere crosses the mesh, for diagnostics
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntersectionRecord {
    /// Mesh vertex at the center of the query sphere
    pub vertex: usize,
    /// Position of this record within the graph's live nodes
    pub index: usize,
    /// Intersection position
    pub position: Vector3<f64>,
}

/// Counts connected components, ignoring arc directions
///
/// This empties the graph.
pub fn component_count(graph: &mut Graph) -> usize {
    let mut count = 0;
    let mut stack = vec![];
    while let Some(root) = graph.first_node() {
        count += 1;
        stack.push(root);
        while let Some(n) = stack.pop() {
            let Some(node) = graph.node(n) else { continue };
            let neighbors: Vec<NodeIndex> = node
                .incoming()
                .iter()
                .chain(node.outgoing())
                .filter_map(|&a| graph.arc(a))
                .flat_map(|a| [a.start(), a.end()])
                .filter(|&m| m != n)
                .collect();
            graph.remove_node(n);
            stack.extend(neighbors);
        }
    }
    graph.clear();
    count
}

/// Total length of all arcs, divided by the sphere's radius
///
/// Returns 0 for a graph without arcs.
pub fn sphere_surface_length(graph: &Graph) -> f64 {
    let length: f64 = graph
        .arcs()
        .filter_map(|(a, _)| graph.curve(a))
        .map(|c| c.length())
        .sum();
    if length == 0.0 {
        0.0
    } else {
        length / graph.sphere().radius
    }
}

/// Area of the sphere bounded by closed loops of arcs, on the solid side
/// of the surface, divided by the sphere's radius squared
///
/// Arcs run with the solid side on their left (seen from outside the
/// sphere), so each closed loop bounds the region to its left.  Its area
/// follows from the Gauss-Bonnet theorem: on a unit sphere, a region's area
/// is `2π` minus the total geodesic curvature of its boundary and the turning
/// angles at the boundary's corners.  Areas of separate loops are summed,
/// then wrapped into `[0, 4π)`.
///
/// Returns `NaN` if no closed loop exists, e.g. because the surface is open
/// within the sphere.  This empties the graph.
pub fn sphere_volume_area(graph: &mut Graph) -> f64 {
    let mut total = None;
    while graph.arc_count() > 0 {
        if let Some(area) = extract_cycle(graph) {
            total = Some(total.unwrap_or(0.0) + area);
        }
    }
    graph.clear();
    total.map_or(f64::NAN, |a: f64| a.rem_euclid(4.0 * PI))
}

/// Lists every live node as an intersection record
pub fn sphere_intersections(graph: &Graph) -> Vec<IntersectionRecord> {
    graph
        .nodes()
        .enumerate()
        .map(|(index, (_, n))| IntersectionRecord {
            vertex: graph.seed(),
            index,
            position: n.position,
        })
        .collect()
}

/// Walks forward from the lowest arc until a node repeats, then removes the
/// resulting cycle and returns its normalized area
///
/// Dead ends are removed while backtracking.  Returns `None` (having removed
/// at least one arc) if the walk runs out of arcs without closing a cycle.
fn extract_cycle(graph: &mut Graph) -> Option<f64> {
    let first = graph.first_arc()?;
    let mut arcs = vec![first];
    let mut nodes = vec![graph.arc(first)?.start()];
    let mut current = graph.arc(first)?.end();

    loop {
        if let Some(k) = nodes.iter().position(|&n| n == current) {
            let cycle = &arcs[k..];
            let area = cycle_area(graph, cycle);
            for &a in cycle {
                graph.remove_arc(a);
            }
            return Some(area);
        }
        let next = graph.node(current).and_then(|n| {
            n.outgoing().iter().copied().find(|a| !arcs.contains(a))
        });
        match next.and_then(|a| graph.arc(a).map(|arc| (a, arc.end()))) {
            Some((a, end)) => {
                nodes.push(current);
                arcs.push(a);
                current = end;
            }
            None => {
                let dead = arcs.pop()?;
                graph.remove_arc(dead);
                current = nodes.pop()?;
                if arcs.is_empty() {
                    return None;
                }
            }
        }
    }
}

/// Normalized area to the left of a closed loop of arcs
fn cycle_area(graph: &Graph, cycle: &[ArcIndex]) -> f64 {
    let curves: Vec<ArcCurve> =
        cycle.iter().filter_map(|&a| graph.curve(a)).collect();
    let sphere = graph.sphere();
    let mut turning = 0.0;
    for (i, c) in curves.iter().enumerate() {
        let prev = &curves[(i + curves.len() - 1) % curves.len()];
        let up = (c.start - sphere.center) / sphere.radius;
        turning += turning_angle(&prev.end_tangent(), &c.start_tangent(), &up);
        turning += c.geodesic_curvature();
    }
    2.0 * PI - turning
}
