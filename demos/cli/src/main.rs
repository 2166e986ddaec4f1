use std::fmt::Write;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::info;
use nalgebra::Point2;

use locus::{
    ImplicitCurve,
    trace::{
        CurvatureTracer, FloodTracer, Locus, TraceConfig, TracerKind,
        UniformTracer, Viewport,
    },
};

/// Traces and manipulates implicit curves
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    cmd: Command,

    /// Curve as an expression or equation in `x` and `y`
    #[clap(short, long, conflicts_with = "coeffs")]
    expr: Option<String>,

    /// Curve as a coefficient grid, e.g. `[[-1,0,1],[0],[1]]`
    #[clap(short, long)]
    coeffs: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Traces the curve, optionally writing an SVG
    Trace {
        #[clap(flatten)]
        view: ViewSettings,

        /// Tracing algorithm
        #[clap(short, long, value_enum, default_value_t = TracerChoice::Flood)]
        tracer: TracerChoice,

        /// Name of an `.svg` file to write
        #[clap(short, long)]
        out: Option<PathBuf>,

        /// Number of times to trace (for benchmarking)
        #[clap(short = 'N', default_value_t = 1)]
        n: usize,
    },

    /// Fits a curve through points given as `x,y`
    Fit {
        #[clap(required = true, value_parser = parse_point)]
        points: Vec<Point2<f64>>,
    },

    /// Moves a point onto the curve
    Snap {
        #[clap(flatten)]
        view: ViewSettings,

        /// Point to move, as `x,y`
        #[clap(value_parser = parse_point)]
        point: Point2<f64>,
    },

    /// Finds candidate intersections with a second curve
    Seeds {
        #[clap(flatten)]
        view: ViewSettings,

        /// Second curve, as an expression or equation
        other: String,

        /// Maximum number of points
        #[clap(short, default_value_t = 16)]
        n: usize,
    },
}

#[derive(ValueEnum, Copy, Clone)]
enum TracerChoice {
    Flood,
    Uniform,
    Curvature,
}

impl From<TracerChoice> for TracerKind {
    fn from(t: TracerChoice) -> Self {
        match t {
            TracerChoice::Flood => TracerKind::Flood(FloodTracer::default()),
            TracerChoice::Uniform => {
                TracerKind::Uniform(UniformTracer::default())
            }
            TracerChoice::Curvature => {
                TracerKind::Curvature(CurvatureTracer::default())
            }
        }
    }
}

#[derive(ClapArgs)]
struct ViewSettings {
    /// Region to trace, as `xmin,xmax,ymin,ymax`
    #[clap(
        short,
        long,
        value_delimiter = ',',
        num_args = 4,
        allow_negative_numbers = true,
        default_values_t = [-10.0, 10.0, -10.0, 10.0]
    )]
    bounds: Vec<f64>,

    /// Pixels per unit
    #[clap(short, long, default_value_t = 50.0)]
    scale: f64,
}

impl ViewSettings {
    fn viewport(&self) -> Viewport {
        let b = &self.bounds;
        Viewport::from_bounds([b[0], b[1], b[2], b[3], self.scale, self.scale])
    }
}

fn parse_point(s: &str) -> Result<Point2<f64>, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let f = |v: &str| v.trim().parse::<f64>().map_err(|e| e.to_string());
    Ok(Point2::new(f(x)?, f(y)?))
}

fn curve_from_expr(expr: &str) -> Result<ImplicitCurve> {
    let tree = locus::rhai::eval_equation(expr)
        .with_context(|| format!("could not evaluate `{expr}`"))?;
    Ok(ImplicitCurve::from_tree(tree))
}

fn load_curve(args: &Args) -> Result<ImplicitCurve> {
    match (&args.expr, &args.coeffs) {
        (Some(e), _) => curve_from_expr(e),
        (None, Some(c)) => {
            let poly = c.parse().context("could not parse coefficients")?;
            Ok(ImplicitCurve::from_poly(poly))
        }
        (None, None) => bail!("one of --expr or --coeffs is required"),
    }
}

fn to_svg(locus: &Locus, view: &Viewport) -> String {
    let max = view.max();
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
        view.origin.x, -max.y, view.width, view.height
    );
    let stroke = view.width.max(view.height) / 500.0;
    let _ = writeln!(
        out,
        r#"<g stroke="black" stroke-width="{stroke}" fill="none">"#
    );
    for [a, b] in locus.segments() {
        let _ = writeln!(
            out,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}"/>"#,
            a.x, -a.y, b.x, -b.y
        );
    }
    out += "</g>\n</svg>\n";
    out
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();

    let args = Args::parse();
    match &args.cmd {
        Command::Trace {
            view,
            tracer,
            out,
            n,
        } => {
            let config = TraceConfig {
                tracer: (*tracer).into(),
            };
            let mut curve = load_curve(&args)?.with_config(config);
            let view = view.viewport();

            let start = Instant::now();
            let mut stats = Default::default();
            for _ in 0..*n {
                stats = curve.update_path(&view);
            }
            info!(
                "Traced {n}x at {:?} ms/trace",
                start.elapsed().as_micros() as f64 / 1000.0 / (*n).max(1) as f64
            );
            info!("{stats:?}");
            if let Some(out) = out {
                std::fs::write(out, to_svg(curve.locus(), &view))?;
            }
        }
        Command::Fit { points } => {
            let curve = ImplicitCurve::through_points(points)?;
            if let Some(p) = curve.coeff() {
                println!("{p}");
            }
            if let Some(d) = curve.degree() {
                info!("fitted a curve of degree {d}");
            }
        }
        Command::Snap { view, point } => {
            let mut curve = load_curve(&args)?;
            curve.update_path(&view.viewport());
            match curve.polish_point(*point) {
                Some(p) => println!("{},{}", p.x, p.y),
                None => bail!("no crossing found near {},{}", point.x, point.y),
            }
        }
        Command::Seeds { view, other, n } => {
            let view = view.viewport();
            let mut a = load_curve(&args)?;
            let mut b = curve_from_expr(other)?;
            a.update_path(&view);
            b.update_path(&view);
            for p in a.probable_points(&b, *n) {
                println!("{},{}", p.x, p.y);
            }
        }
    }
    Ok(())
}
