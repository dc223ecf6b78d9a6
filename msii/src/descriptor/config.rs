use crate::Error;
use std::num::NonZeroUsize;

/// How vertex ranges are mapped onto threads
///
/// Each worker owns one contiguous range of vertices, so the thread count is
/// also the number of ranges that [`compute`](super::compute) splits the
/// mesh into.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ThreadCount {
    /// Describe every vertex on the calling thread
    One,

    /// Split the vertices into this many ranges, each on a scoped thread
    ///
    /// The count is clamped to the number of vertices.
    Many(NonZeroUsize),
}

/// A count of `1` runs on the calling thread, without spawning a worker
impl From<NonZeroUsize> for ThreadCount {
    fn from(v: NonZeroUsize) -> Self {
        if v.get() == 1 {
            ThreadCount::One
        } else {
            ThreadCount::Many(v)
        }
    }
}

/// The calling thread is shown as `-`; otherwise, the number of workers
impl std::fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreadCount::One => write!(f, "-"),
            ThreadCount::Many(n) => write!(f, "{n}"),
        }
    }
}

impl ThreadCount {
    /// Number of worker threads to spawn, or `None` for the calling thread
    pub fn get(&self) -> Option<usize> {
        match self {
            ThreadCount::One => None,
            ThreadCount::Many(v) => Some(v.get()),
        }
    }
}

impl Default for ThreadCount {
    fn default() -> Self {
        std::thread::available_parallelism()
            .map(ThreadCount::from)
            .unwrap_or(ThreadCount::One)
    }
}

/// Settings for descriptor computation
#[derive(Clone, Debug)]
pub struct Settings {
    /// Sphere radii, in ascending order
    pub radii: Vec<f64>,

    /// Number of spatial filter voxels along each axis
    pub grid_resolution: usize,

    /// Number of threads to use
    pub threads: ThreadCount,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            radii: vec![1.0],
            grid_resolution: 32,
            threads: ThreadCount::default(),
        }
    }
}

impl Settings {
    /// Builds settings with `count` radii evenly spaced up to `radius`
    ///
    /// The radii are `radius * i / count` for `i` in `1..=count`.
    pub fn linear(radius: f64, count: usize) -> Self {
        Self {
            radii: (1..=count)
                .map(|i| radius * i as f64 / count as f64)
                .collect(),
            ..Self::default()
        }
    }

    /// Builds settings from radii given as fractions of a base radius
    ///
    /// Every fraction must be in `(0, 1]`; the largest possible sphere has
    /// radius `base`.
    pub fn relative(base: f64, scales: &[f64]) -> Result<Self, Error> {
        if !(base.is_finite() && base > 0.0) {
            return Err(Error::BadRadius(base));
        }
        if let Some(&r) = scales.iter().find(|r| !(**r > 0.0 && **r <= 1.0)) {
            return Err(Error::BadRelativeRadius(r));
        }
        let out = Self {
            radii: scales.iter().map(|r| r * base).collect(),
            ..Self::default()
        };
        out.validate()?;
        Ok(out)
    }

    /// Checks that radii and grid resolution are usable
    pub fn validate(&self) -> Result<(), Error> {
        if self.radii.is_empty() {
            return Err(Error::EmptyRadii);
        }
        let bad = |r: &&f64| !(r.is_finite() && **r > 0.0);
        if let Some(&r) = self.radii.iter().find(bad) {
            return Err(Error::BadRadius(r));
        }
        if let Some(w) = self.radii.windows(2).find(|w| w[1] < w[0]) {
            return Err(Error::UnsortedRadii(w[1], w[0]));
        }
        if self.grid_resolution == 0 {
            return Err(Error::EmptyGrid);
        }
        Ok(())
    }
}
