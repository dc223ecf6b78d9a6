//! Multi-scale descriptor computation over a whole mesh
//!
//! [`compute`] runs one query per (vertex, radius) pair, splitting vertices
//! into contiguous ranges with one range per thread.  Each thread writes
//! only to the output slots for its own range, and no query depends on any
//! other, so results are identical for every thread count.
use crate::{Error, Mesh, filter::SpatialFilter};
use nalgebra::Vector3;
use std::{ops::Range, time::Duration};

mod config;
mod worker;

pub use config::{Settings, ThreadCount};
use worker::Job;

/// Statistics from a single worker thread
#[derive(Clone, Debug)]
pub struct ThreadReport {
    /// Index of the worker thread
    pub thread: usize,
    /// Vertices handled by this thread
    pub vertices: Range<usize>,
    /// Number of vertices with at least one usable radius
    pub processed: usize,
    /// Number of vertices where every radius was degenerate
    pub ignored: usize,
    /// Wall-clock time spent by the thread
    pub elapsed: Duration,
}

/// Descriptors for every vertex of a mesh
///
/// Per-radius values are stored vertex-major: the value for vertex `v` and
/// radius `i` lives at `v * radii.len() + i`.  Ignored vertices hold `NaN`
/// in every slot, including their normal.
#[derive(Clone, Debug)]
pub struct Descriptors {
    radii: Vec<f64>,
    normals: Vec<Vector3<f64>>,
    volume: Vec<f64>,
    surface: Vec<f64>,
    threads: Vec<ThreadReport>,
}

impl Descriptors {
    /// Radii used for each column of the descriptor rows
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// Patch normals, one per vertex
    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    /// Returns the patch normal of a single vertex
    pub fn normal(&self, vertex: usize) -> Vector3<f64> {
        self.normals[vertex]
    }

    /// Volume descriptors for every vertex, as a flat array
    pub fn volumes(&self) -> &[f64] {
        &self.volume
    }

    /// Returns the volume descriptors of a single vertex, one per radius
    pub fn volume(&self, vertex: usize) -> &[f64] {
        let k = self.radii.len();
        &self.volume[vertex * k..(vertex + 1) * k]
    }

    /// Surface descriptors for every vertex, as a flat array
    pub fn surfaces(&self) -> &[f64] {
        &self.surface
    }

    /// Returns the surface descriptors of a single vertex, one per radius
    pub fn surface(&self, vertex: usize) -> &[f64] {
        let k = self.radii.len();
        &self.surface[vertex * k..(vertex + 1) * k]
    }

    /// Number of vertices with at least one usable radius
    pub fn processed(&self) -> usize {
        self.threads.iter().map(|t| t.processed).sum()
    }

    /// Number of vertices where every radius was degenerate
    pub fn ignored(&self) -> usize {
        self.threads.iter().map(|t| t.ignored).sum()
    }

    /// Per-thread statistics, in thread order
    pub fn threads(&self) -> &[ThreadReport] {
        &self.threads
    }
}

/// Computes descriptors for every vertex of the mesh
pub fn compute(mesh: &Mesh, settings: &Settings) -> Result<Descriptors, Error> {
    settings.validate()?;
    let filter = SpatialFilter::build(mesh, settings.grid_resolution)?;

    let n = mesh.vertices().len();
    let k = settings.radii.len();
    let mut normals = vec![Vector3::repeat(f64::NAN); n];
    let mut volume = vec![f64::NAN; n * k];
    let mut surface = vec![f64::NAN; n * k];

    // Hand out disjoint output slices, one set per vertex range
    let mut jobs = vec![];
    let mut normals_rest = normals.as_mut_slice();
    let mut volume_rest = volume.as_mut_slice();
    let mut surface_rest = surface.as_mut_slice();
    let ranges = partition(n, settings.threads);
    for (thread, vertices) in ranges.into_iter().enumerate() {
        let len = vertices.len();
        let (normals, rest) =
            std::mem::take(&mut normals_rest).split_at_mut(len);
        normals_rest = rest;
        let (volume, rest) =
            std::mem::take(&mut volume_rest).split_at_mut(len * k);
        volume_rest = rest;
        let (surface, rest) =
            std::mem::take(&mut surface_rest).split_at_mut(len * k);
        surface_rest = rest;
        jobs.push(Job {
            thread,
            vertices,
            mesh,
            filter: &filter,
            radii: &settings.radii,
            normals,
            volume,
            surface,
        });
    }

    let threads = dispatch(jobs, settings.threads, |_, job| job.run())?;

    let out = Descriptors {
        radii: settings.radii.clone(),
        normals,
        volume,
        surface,
        threads,
    };
    log::info!(
        "computed descriptors for {n} vertices at {k} radii on {} thread(s): \
         {} processed, {} ignored",
        out.threads.len(),
        out.processed(),
        out.ignored()
    );
    Ok(out)
}

/// Runs each job, on the calling thread or one scoped thread per job
///
/// Every thread is joined before any result is inspected.  The first
/// failure in job order is returned; a job that panics is reported as
/// [`Error::WorkerPanicked`] with its index.
fn dispatch<J, F>(
    jobs: Vec<J>,
    threads: ThreadCount,
    run: F,
) -> Result<Vec<ThreadReport>, Error>
where
    J: Send,
    F: Fn(usize, J) -> Result<ThreadReport, Error> + Sync,
{
    match threads {
        ThreadCount::One => jobs
            .into_iter()
            .enumerate()
            .map(|(i, job)| run(i, job))
            .collect(),
        ThreadCount::Many(..) => std::thread::scope(|s| {
            let run = &run;
            let handles: Vec<_> = jobs
                .into_iter()
                .enumerate()
                .map(|(i, job)| s.spawn(move || run(i, job)))
                .collect();

            let results: Vec<_> = handles
                .into_iter()
                .enumerate()
                .map(|(i, h)| {
                    h.join()
                        .map_err(|_| Error::WorkerPanicked(i))
                        .and_then(|r| r)
                })
                .collect();
            results.into_iter().collect()
        }),
    }
}

/// Splits `n` vertices into contiguous ranges, one per thread
///
/// Every range has `n / t` vertices, except the last, which also takes the
/// remainder.  There is always at least one range.
fn partition(n: usize, threads: ThreadCount) -> Vec<Range<usize>> {
    let requested = threads.get().unwrap_or(1);
    let t = requested.min(n).max(1);
    if t < requested {
        log::warn!("only using {t} of {requested} threads for {n} vertices");
    }
    let chunk = n / t;
    (0..t)
        .map(|i| {
            let end = if i + 1 == t { n } else { (i + 1) * chunk };
            i * chunk..end
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shapes;
    use approx::assert_relative_eq;
    use std::{
        f64::consts::PI,
        num::NonZeroUsize,
        sync::atomic::{AtomicUsize, Ordering},
    };

    fn threads(n: usize) -> ThreadCount {
        ThreadCount::Many(NonZeroUsize::new(n).unwrap())
    }

    #[test]
    fn partitions() {
        assert_eq!(partition(10, ThreadCount::One), vec![0..10]);
        assert_eq!(partition(10, threads(3)), vec![0..3, 3..6, 6..10]);
        assert_eq!(partition(2, threads(4)), vec![0..1, 1..2]);
        assert_eq!(partition(0, threads(4)), vec![0..0]);
    }

    fn report(thread: usize) -> Result<ThreadReport, Error> {
        Ok(ThreadReport {
            thread,
            vertices: thread..thread + 1,
            processed: 1,
            ignored: 0,
            elapsed: Duration::ZERO,
        })
    }

    #[test]
    fn dispatch_reports() {
        for t in [ThreadCount::One, threads(3)] {
            let out = dispatch(vec![(); 3], t, |i, ()| report(i)).unwrap();
            let order: Vec<_> = out.iter().map(|r| r.thread).collect();
            assert_eq!(order, vec![0, 1, 2]);
        }
    }

    #[test]
    fn dispatch_panic() {
        let finished = AtomicUsize::new(0);
        let out = dispatch(vec![(); 4], threads(4), |i, ()| {
            if i == 2 {
                panic!("job {i} failed");
            }
            finished.fetch_add(1, Ordering::SeqCst);
            report(i)
        });
        assert!(matches!(out, Err(Error::WorkerPanicked(2))));
        assert_eq!(finished.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn dispatch_allocation_failure() {
        fn fail(thread: usize) -> Result<ThreadReport, Error> {
            let source = Vec::<u8>::new().try_reserve(usize::MAX).unwrap_err();
            Err(Error::Allocation { thread, source })
        }
        for t in [ThreadCount::One, threads(4)] {
            let out = dispatch(vec![(); 4], t, |i, ()| {
                if i % 2 == 1 { fail(i) } else { report(i) }
            });
            assert!(
                matches!(out, Err(Error::Allocation { thread: 1, .. })),
                "{out:?}"
            );
        }
    }

    #[test]
    fn disc_center() {
        let mesh = shapes::disc(10.0, 7, 32);
        let settings = Settings {
            radii: vec![5.0],
            grid_resolution: 16,
            threads: ThreadCount::One,
        };
        let out = compute(&mesh, &settings).unwrap();
        assert_relative_eq!(out.surface(0)[0], 2.0 * PI, epsilon = 1e-9);
        assert_relative_eq!(out.volume(0)[0], 2.0 * PI, epsilon = 1e-9);
        assert_eq!(out.normal(0), Vector3::z());
        assert_eq!(out.radii(), &[5.0]);
    }

    #[test]
    fn rim_is_ignored() {
        let mesh = shapes::disc(10.0, 7, 32);
        let settings = Settings {
            radii: vec![0.5, 1.0],
            grid_resolution: 16,
            threads: ThreadCount::One,
        };
        let out = compute(&mesh, &settings).unwrap();
        assert_eq!(out.processed(), 1 + 6 * 32);
        assert_eq!(out.ignored(), 32);
        assert_eq!(out.processed() + out.ignored(), mesh.vertices().len());

        let rim = mesh.vertices().len() - 1;
        assert!(out.volume(rim).iter().all(|v| v.is_nan()));
        assert!(out.surface(rim).iter().all(|v| v.is_nan()));
        assert!(out.normal(rim).iter().all(|v| v.is_nan()));
        for v in 0..mesh.vertices().len() - 32 {
            assert!(out.volume(v).iter().all(|v| v.is_finite()), "{v}");
            assert_eq!(out.normal(v), Vector3::z());
        }
    }

    #[test]
    fn partition_invariance() {
        let mesh = shapes::disc(10.0, 5, 24);
        let run = |t: ThreadCount| {
            let settings = Settings {
                threads: t,
                grid_resolution: 12,
                ..Settings::linear(3.3, 3)
            };
            compute(&mesh, &settings).unwrap()
        };
        let bits = |d: &Descriptors| {
            let to_bits = |s: &[f64]| -> Vec<u64> {
                s.iter().map(|c| c.to_bits()).collect()
            };
            let normals: Vec<f64> =
                d.normals().iter().flat_map(|n| n.iter().copied()).collect();
            [
                to_bits(&normals),
                to_bits(d.volumes()),
                to_bits(d.surfaces()),
            ]
        };

        let one = run(ThreadCount::One);
        assert_eq!(one.threads().len(), 1);
        for t in [1, 2, 3, 7, 1000] {
            let many = run(threads(t));
            assert_eq!(bits(&one), bits(&many), "mismatch with {t} threads");
            assert_eq!(one.processed(), many.processed());
            assert_eq!(one.ignored(), many.ignored());
            assert_eq!(many.threads().len(), t.min(mesh.vertices().len()));
        }
    }

    #[test]
    fn sphere_descriptors() {
        let mesh = shapes::uv_sphere(10.0, 16, 32);
        let settings = Settings {
            threads: threads(4),
            grid_resolution: 16,
            ..Settings::linear(2.0, 2)
        };
        let out = compute(&mesh, &settings).unwrap();
        assert_eq!(out.ignored(), 0);
        for v in 0..mesh.vertices().len() {
            let n = out.normal(v);
            let p = mesh.vertices()[v].normalize();
            assert!(n.dot(&p) > 0.99, "bad normal at {v}");
            for &a in out.volume(v) {
                assert!(a > 0.0 && a < 2.0 * PI, "bad volume {a} at {v}");
            }
        }
    }

    #[test]
    fn bad_settings() {
        let mesh = shapes::disc(1.0, 2, 8);
        let settings = Settings {
            radii: vec![],
            ..Settings::default()
        };
        assert!(matches!(compute(&mesh, &settings), Err(Error::EmptyRadii)));
    }
}
