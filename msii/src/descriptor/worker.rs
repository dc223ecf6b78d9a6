use super::ThreadReport;
use crate::{
    Error, Mesh,
    filter::SpatialFilter,
    geometry::Triangle,
    graph::{GraphBuilder, algorithm},
};
use nalgebra::Vector3;
use std::{ops::Range, time::Instant};

/// Number of triangles for which each worker reserves scratch space
const SCRATCH_TRIANGLES: usize = 4096;

/// A contiguous range of vertices, along with the output slots it owns
///
/// `volume` and `surface` hold one row of `radii.len()` values per vertex;
/// `normals` holds one value per vertex.  Slots start out as `NaN` and are
/// only written for vertices that produce at least one usable radius.
pub(crate) struct Job<'a> {
    pub thread: usize,
    pub vertices: Range<usize>,

    pub mesh: &'a Mesh,
    pub filter: &'a SpatialFilter,
    pub radii: &'a [f64],

    pub normals: &'a mut [Vector3<f64>],
    pub volume: &'a mut [f64],
    pub surface: &'a mut [f64],
}

impl Job<'_> {
    /// Computes descriptors for every vertex in the job's range
    pub fn run(self) -> Result<ThreadReport, Error> {
        let start = Instant::now();
        let mut builder = GraphBuilder::new();
        builder
            .try_reserve(self.mesh.triangles().len().min(SCRATCH_TRIANGLES))
            .map_err(|source| Error::Allocation {
                thread: self.thread,
                source,
            })?;

        let k = self.radii.len();
        let mut processed = 0;
        let mut ignored = 0;
        let rows = self
            .volume
            .chunks_exact_mut(k)
            .zip(self.surface.chunks_exact_mut(k));
        for ((v, normal), (volume, surface)) in
            self.vertices.clone().zip(self.normals.iter_mut()).zip(rows)
        {
            let kept = describe(
                &mut builder,
                self.mesh,
                self.filter,
                self.radii,
                v,
                volume,
                surface,
            )?;
            if kept {
                *normal = patch_normal(self.mesh, builder.touched());
                processed += 1;
            } else {
                volume.fill(f64::NAN);
                surface.fill(f64::NAN);
                ignored += 1;
            }
        }

        let report = ThreadReport {
            thread: self.thread,
            vertices: self.vertices,
            processed,
            ignored,
            elapsed: start.elapsed(),
        };
        log::info!(
            "thread {}: {:?} done in {:?} ({} processed, {} ignored)",
            report.thread,
            report.vertices,
            report.elapsed,
            report.processed,
            report.ignored
        );
        Ok(report)
    }
}

/// Fills one vertex's descriptor rows, returning `false` if every radius
/// was degenerate
///
/// A radius is degenerate if the sphere crosses no mesh edges, or if the
/// crossings never close into a loop.  Degenerate radii get a `NaN` volume;
/// their surface length is kept if any arcs exist.  The builder is left
/// holding the query for the largest radius.
fn describe(
    builder: &mut GraphBuilder,
    mesh: &Mesh,
    filter: &SpatialFilter,
    radii: &[f64],
    vertex: usize,
    volume: &mut [f64],
    surface: &mut [f64],
) -> Result<bool, Error> {
    let mut kept = false;
    for ((&r, vol), surf) in radii.iter().zip(volume).zip(surface) {
        let mut graph = builder.build(mesh, filter, vertex, r)?;
        if graph.arc_count() == 0 {
            *vol = f64::NAN;
            *surf = f64::NAN;
            continue;
        }
        *surf = algorithm::sphere_surface_length(&graph);
        *vol = algorithm::sphere_volume_area(&mut graph);
        kept |= !vol.is_nan();
    }
    Ok(kept)
}

/// Normalized sum of area-weighted triangle normals
///
/// Returns a `NaN` vector if the normals cancel out.
fn patch_normal(mesh: &Mesh, triangles: &[usize]) -> Vector3<f64> {
    let sum: Vector3<f64> = triangles
        .iter()
        .map(|&t| Triangle(mesh.corners(t)).area_normal())
        .sum();
    sum.try_normalize(0.0)
        .unwrap_or_else(|| Vector3::repeat(f64::NAN))
}
