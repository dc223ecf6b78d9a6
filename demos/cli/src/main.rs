use std::io::Write;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::info;

use msii::{
    Mesh,
    descriptor::{Descriptors, Settings},
    filter::SpatialFilter,
    graph::{GraphBuilder, algorithm},
};

/// Computes multi-scale descriptors on procedural meshes
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    cmd: Command,

    #[clap(flatten)]
    shape: ShapeSettings,

    /// Number of spatial filter voxels along each axis
    #[clap(short, long, default_value_t = 32)]
    grid: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Computes descriptors for every vertex
    Describe {
        #[clap(flatten)]
        settings: DescribeSettings,
    },

    /// Inspects a single (vertex, radius) query
    Inspect {
        /// Vertex at the sphere's center
        #[clap(short, long, default_value_t = 0)]
        vertex: usize,

        /// Sphere radius
        #[clap(short, long, default_value_t = 2.0)]
        radius: f64,

        /// Print every intersection point
        #[clap(long)]
        points: bool,
    },
}

#[derive(ValueEnum, Clone, Copy)]
enum Shape {
    Disc,
    Sphere,
}

#[derive(Parser)]
struct ShapeSettings {
    /// Procedural shape to build
    #[clap(short, long, value_enum, default_value_t = Shape::Sphere)]
    shape: Shape,

    /// Radius of the shape
    #[clap(long, default_value_t = 10.0)]
    size: f64,

    /// Disc rings or sphere stacks; there are twice as many segments
    #[clap(long, default_value_t = 32)]
    subdivisions: usize,
}

#[derive(Parser)]
struct DescribeSettings {
    /// Largest sphere radius
    #[clap(short, long, default_value_t = 2.0)]
    radius: f64,

    /// Number of evenly spaced radii
    #[clap(short = 'k', long, default_value_t = 4)]
    scales: usize,

    /// Comma-separated radii relative to `radius`, each in (0, 1]
    ///
    /// When given, this replaces the evenly spaced radii.
    #[clap(long, value_delimiter = ',', conflicts_with = "scales")]
    relative: Vec<f64>,

    /// Name of a text file to write, with one line per vertex
    #[clap(short, long)]
    out: Option<PathBuf>,

    /// Number of threads to use
    #[clap(short, long)]
    threads: Option<NonZeroUsize>,

    /// Number of times to run (for benchmarking)
    #[clap(short = 'N', default_value_t = 1)]
    n: usize,
}

////////////////////////////////////////////////////////////////////////////////

fn build_shape(settings: &ShapeSettings) -> Result<Mesh> {
    let s = settings.subdivisions;
    if !(settings.size.is_finite() && settings.size > 0.0) {
        bail!("shape size must be positive, not {}", settings.size);
    }
    Ok(match settings.shape {
        Shape::Disc if s >= 1 => {
            msii::shapes::disc(settings.size, s, 2 * s.max(2))
        }
        Shape::Sphere if s >= 2 => {
            msii::shapes::uv_sphere(settings.size, s, 2 * s)
        }
        _ => bail!("too few subdivisions ({s})"),
    })
}

fn run_describe(
    mesh: &Mesh,
    settings: &DescribeSettings,
    grid: usize,
) -> Result<Descriptors> {
    let radii = if settings.relative.is_empty() {
        Settings::linear(settings.radius, settings.scales)
    } else {
        Settings::relative(settings.radius, &settings.relative)?
    };
    let cfg = Settings {
        grid_resolution: grid,
        threads: settings.threads.map(Into::into).unwrap_or_default(),
        ..radii
    };
    info!("using radii {:?} on {} threads", cfg.radii, cfg.threads);

    let mut out = None;
    for _ in 0..settings.n.max(1) {
        out = Some(msii::descriptor::compute(mesh, &cfg)?);
    }
    match out {
        Some(out) => Ok(out),
        None => bail!("no runs were performed"),
    }
}

fn write_descriptors(out: &Descriptors, f: &mut impl Write) -> Result<()> {
    writeln!(f, "# radii {:?}", out.radii())?;
    writeln!(f, "# vertex nx ny nz volume... surface...")?;
    for v in 0..out.normals().len() {
        let n = out.normal(v);
        write!(f, "{v} {} {} {}", n.x, n.y, n.z)?;
        for x in out.volume(v).iter().chain(out.surface(v)) {
            write!(f, " {x}")?;
        }
        writeln!(f)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();
    let args = Args::parse();

    let now = Instant::now();
    let mesh = build_shape(&args.shape)?;
    info!(
        "Built mesh with {} vertices and {} triangles in {:?}",
        mesh.vertices().len(),
        mesh.triangles().len(),
        now.elapsed()
    );

    match args.cmd {
        Command::Describe { settings } => {
            let start = Instant::now();
            let out = run_describe(&mesh, &settings, args.grid)?;
            info!(
                "Computed {}x at {:?} ms/iter",
                settings.n,
                start.elapsed().as_micros() as f64
                    / 1000.0
                    / (settings.n.max(1) as f64)
            );
            info!(
                "{} vertices processed, {} ignored",
                out.processed(),
                out.ignored()
            );
            for t in out.threads() {
                info!(
                    "  thread {}: vertices {:?} in {:?}",
                    t.thread, t.vertices, t.elapsed
                );
            }
            if let Some(path) = settings.out {
                info!("Writing descriptors to {path:?}");
                let mut f =
                    std::io::BufWriter::new(std::fs::File::create(path)?);
                write_descriptors(&out, &mut f)?;
            }
        }
        Command::Inspect {
            vertex,
            radius,
            points,
        } => {
            let filter = SpatialFilter::build(&mesh, args.grid)?;
            let mut builder = GraphBuilder::new();
            let graph = builder.build(&mesh, &filter, vertex, radius)?;
            info!(
                "{} candidate triangles touch the sphere; {} nodes, {} arcs",
                builder.touched().len(),
                graph.node_count(),
                graph.arc_count()
            );

            let length = algorithm::sphere_surface_length(&graph);
            let records = algorithm::sphere_intersections(&graph);
            let components = algorithm::component_count(&mut graph.clone());
            let mut graph = graph;
            let area = algorithm::sphere_volume_area(&mut graph);

            println!("components: {components}");
            println!("surface:    {length}");
            println!("volume:     {area}");
            if points {
                for r in records {
                    let p = r.position;
                    println!(
                        "{} {} {} {} {}",
                        r.vertex, r.index, p.x, p.y, p.z
                    );
                }
            }
        }
    }

    Ok(())
}
