//! Uniform voxel grid for finding triangles near a sphere
use crate::{Error, Mesh, geometry::tolerance};
use nalgebra::Vector3;
use std::ops::Range;

/// A uniform grid of voxels, each listing the triangles that overlap it
///
/// The grid spans the mesh's bounding box with the same number of voxels
/// along each axis.  A triangle is registered in every voxel touched by its
/// bounding box, so queries are conservative: they may return triangles that
/// are not actually near the sphere, but never miss one that is.
///
/// The filter is immutable once built and may be shared between threads.
pub struct SpatialFilter {
    origin: Vector3<f64>,
    cell: Vector3<f64>,
    resolution: usize,

    /// Start of each voxel's slice in `items`, plus a final end marker
    offsets: Vec<usize>,

    /// Triangle indices, grouped by voxel and ascending within each voxel
    items: Vec<usize>,
}

impl SpatialFilter {
    /// Builds a filter with `resolution` voxels along each axis
    pub fn build(mesh: &Mesh, resolution: usize) -> Result<Self, Error> {
        if resolution == 0 {
            return Err(Error::EmptyGrid);
        }
        let voxels = resolution
            .checked_pow(3)
            .and_then(|v| v.checked_add(1).map(|_| v))
            .ok_or(Error::GridTooLarge(resolution))?;

        let (lo, hi) = mesh
            .bounds()
            .unwrap_or((Vector3::zeros(), Vector3::zeros()));
        let cell = (hi - lo).map(|s| {
            if s > 0.0 { s / resolution as f64 } else { 1.0 }
        });

        let mut filter = Self {
            origin: lo,
            cell,
            resolution,
            offsets: vec![0; voxels + 1],
            items: vec![],
        };

        // Count triangles per voxel, then convert counts into offsets
        let mut ranges = Vec::with_capacity(mesh.triangles().len());
        for t in 0..mesh.triangles().len() {
            let [a, b, c] = mesh.corners(t);
            let range = filter.voxels(&a.inf(&b).inf(&c), &a.sup(&b).sup(&c));
            if let Some(r) = &range {
                for v in filter.indices(r) {
                    filter.offsets[v + 1] += 1;
                }
            }
            ranges.push(range);
        }
        for i in 1..filter.offsets.len() {
            filter.offsets[i] += filter.offsets[i - 1];
        }

        filter.items = vec![0; filter.offsets[voxels]];
        let mut fill = filter.offsets.clone();
        for (t, range) in ranges.iter().enumerate() {
            let Some(r) = range else { continue };
            for v in filter.indices(r) {
                filter.items[fill[v]] = t;
                fill[v] += 1;
            }
        }

        log::trace!(
            "built {resolution}³ spatial filter with {} entries",
            filter.items.len()
        );
        Ok(filter)
    }

    /// Returns the number of voxels along each axis
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Returns every triangle that may touch the given ball
    ///
    /// Triangles are sorted by index, without duplicates.
    pub fn query(&self, center: &Vector3<f64>, radius: f64) -> Vec<usize> {
        let mut out = vec![];
        self.query_into(center, radius, &mut out);
        out
    }

    /// Same as [`query`](Self::query), but reusing an output buffer
    pub fn query_into(
        &self,
        center: &Vector3<f64>,
        radius: f64,
        out: &mut Vec<usize>,
    ) {
        out.clear();
        let r = Vector3::repeat(radius + tolerance(radius));
        let Some(range) = self.voxels(&(center - r), &(center + r)) else {
            return;
        };
        for v in self.indices(&range) {
            let (start, end) = (self.offsets[v], self.offsets[v + 1]);
            out.extend_from_slice(&self.items[start..end]);
        }
        out.sort_unstable();
        out.dedup();
    }

    /// Finds the voxels overlapped by a bounding box, clamped to the grid
    ///
    /// Returns `None` if the box misses the grid entirely.
    fn voxels(
        &self,
        lo: &Vector3<f64>,
        hi: &Vector3<f64>,
    ) -> Option<[Range<usize>; 3]> {
        let max = (self.resolution - 1) as f64;
        let mut out = [0..0, 0..0, 0..0];
        for (axis, range) in out.iter_mut().enumerate() {
            let a = (lo[axis] - self.origin[axis]) / self.cell[axis];
            let b = (hi[axis] - self.origin[axis]) / self.cell[axis];
            if !(b >= 0.0 && a <= max + 1.0) {
                return None;
            }
            let a = a.floor().clamp(0.0, max) as usize;
            let b = b.floor().clamp(0.0, max) as usize;
            *range = a..b + 1;
        }
        Some(out)
    }

    /// Iterates over flat voxel indices within a range
    fn indices(
        &self,
        [x, y, z]: &[Range<usize>; 3],
    ) -> impl Iterator<Item = usize> + use<> {
        let n = self.resolution;
        let (x, y) = (x.clone(), y.clone());
        z.clone().flat_map(move |k| {
            let x = x.clone();
            y.clone().flat_map(move |j| {
                x.clone().map(move |i| (k * n + j) * n + i)
            })
        })
    }
}

static_assertions::assert_impl_all!(SpatialFilter: Send, Sync);

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        geometry::{Sphere, Triangle},
        shapes,
    };

    /// Checks that the filter returns every triangle touching the ball
    fn check_complete(mesh: &Mesh, filter: &SpatialFilter, s: Sphere) {
        let found = filter.query(&s.center, s.radius);
        assert!(found.windows(2).all(|w| w[0] < w[1]));
        for t in 0..mesh.triangles().len() {
            let tri = Triangle(mesh.corners(t));
            if s.touches(&tri) {
                assert!(found.binary_search(&t).is_ok(), "missing {t}");
            }
        }
    }

    #[test]
    fn sphere_queries() {
        let mesh = shapes::uv_sphere(3.0, 12, 24);
        for res in [1, 3, 8, 17] {
            let filter = SpatialFilter::build(&mesh, res).unwrap();
            assert_eq!(filter.resolution(), res);
            for (i, v) in mesh.vertices().iter().enumerate().step_by(7) {
                let r = 0.2 + (i % 5) as f64 * 0.6;
                check_complete(&mesh, &filter, Sphere::new(*v, r));
            }
        }
    }

    #[test]
    fn flat_mesh() {
        let mesh = shapes::disc(10.0, 6, 24);
        let filter = SpatialFilter::build(&mesh, 8).unwrap();
        for v in mesh.vertices().iter().step_by(5) {
            check_complete(&mesh, &filter, Sphere::new(*v, 2.5));
        }

        // Slightly above the plane, which has zero thickness
        let above = Vector3::new(1.0, 1.0, 0.5);
        check_complete(&mesh, &filter, Sphere::new(above, 1.0));
    }

    #[test]
    fn outside() {
        let mesh = shapes::disc(1.0, 2, 8);
        let filter = SpatialFilter::build(&mesh, 4).unwrap();
        assert!(filter.query(&Vector3::new(5.0, 0.0, 0.0), 1.0).is_empty());
        assert!(filter.query(&Vector3::zeros(), f64::NAN).is_empty());
        assert_eq!(
            filter.query(&Vector3::zeros(), 100.0).len(),
            mesh.triangles().len()
        );
    }

    #[test]
    fn bad_resolution() {
        let mesh = shapes::disc(1.0, 2, 8);
        assert!(matches!(
            SpatialFilter::build(&mesh, 0),
            Err(Error::EmptyGrid)
        ));
        assert!(matches!(
            SpatialFilter::build(&mesh, usize::MAX),
            Err(Error::GridTooLarge(_))
        ));
    }
}
