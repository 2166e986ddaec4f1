use approx::assert_relative_eq;
use locus::{
    Error, ImplicitCurve,
    context::Tree,
    poly::{AffineInverse, Poly},
    trace::{
        CurvatureTracer, TraceConfig, TracerKind, UniformTracer, Viewport,
    },
};
use nalgebra::{Point2, Vector2};
use rand::{Rng, SeedableRng, rngs::StdRng};

fn view() -> Viewport {
    Viewport::from_bounds([-4.0, 4.0, -4.0, 4.0, 40.0, 40.0])
}

/// Folium of Descartes, `x³ + y³ - 3xy`
fn folium() -> ImplicitCurve {
    ImplicitCurve::from_coeffs(vec![
        vec![0.0, 0.0, 0.0, 1.0],
        vec![0.0, -3.0],
        vec![],
        vec![1.0],
    ])
    .unwrap()
}

fn assert_views_agree(c: &ImplicitCurve, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..100 {
        let x = rng.gen_range(-3.0..3.0);
        let y = rng.gen_range(-3.0..3.0);
        let a = c.eval(x, y);
        let b = c.eval_poly(x, y);
        assert!((a - b).abs() <= 1e-9 * (1.0 + a.abs()), "{a} != {b}");
    }
}

#[test]
fn transforms_keep_views_in_sync() {
    let mut c = folium();
    c.update_path(&view());
    assert_views_agree(&c, 0);

    c.rotate(0.7, Point2::new(1.0, 2.0)).unwrap();
    assert_views_agree(&c, 1);
    c.dilate(1.5, Point2::new(-1.0, 0.0)).unwrap();
    assert_views_agree(&c, 2);
    c.mirror_line(1.0, 2.0, -0.5).unwrap();
    assert_views_agree(&c, 3);
    c.translate(Vector2::new(0.25, -0.5)).unwrap();
    assert_views_agree(&c, 4);
    assert_eq!(c.degree(), Some(3));
    assert!(c.is_on_screen());
}

#[test]
fn dependent_points_follow_the_curve() {
    let mut c = folium();
    // (3/2, 3/2) lies on the folium
    let mut p = Point2::new(1.5, 1.5);
    assert!(c.is_on_path(p));

    type Step = Box<dyn Fn(&mut ImplicitCurve) -> Option<AffineInverse>>;
    let steps: [Step; 4] = [
        Box::new(|c| c.rotate(1.2, Point2::new(0.5, -0.5))),
        Box::new(|c| c.dilate(-0.5, Point2::new(2.0, 1.0))),
        Box::new(|c| c.mirror_point(Point2::new(-1.0, 1.0))),
        Box::new(|c| c.translate(Vector2::new(3.0, 0.0))),
    ];
    for step in steps {
        let inv = step(&mut c).unwrap();
        p = inv.apply(p);
        assert!(c.is_on_path(p), "{p}");
    }
}

#[test]
fn six_point_fit() {
    let pts: Vec<Point2<f64>> = (0..6)
        .map(|i| {
            let t = i as f64 * std::f64::consts::TAU / 6.0 + 0.1;
            Point2::new(t.cos(), t.sin())
        })
        .collect();
    let mut c = ImplicitCurve::through_points(&pts).unwrap();
    for p in &pts {
        assert!(c.is_on_path(*p));
    }
    let k = c.coeff().unwrap().get(0, 0);
    let poly = c.coeff().unwrap();
    assert_relative_eq!(poly.get(2, 0) / k, -1.0, epsilon = 1e-9);
    assert_relative_eq!(poly.get(0, 2) / k, -1.0, epsilon = 1e-9);

    c.update_path(&view());
    assert!(c.is_on_screen());

    // Four points cannot be fitted
    let err = c.fit(&pts[..4]).unwrap_err();
    assert!(matches!(err, Error::BadPointCount(4)));
    assert!(!c.is_defined());
    assert!(!c.is_on_screen());
    assert!(!c.is_on_path(pts[0]));
}

#[test]
fn circle_inversion_maps_points() {
    // Circle of radius 1 about (2, 0)
    let mut c = ImplicitCurve::from_tree(
        (Tree::x() - 2.0).square() + Tree::y().square() - 1.0,
    );
    assert!(c.coeff().is_some());
    c.update_path(&view());
    c.mirror_circle(Point2::origin(), 1.0);
    assert!(c.is_defined());
    assert!(c.is_on_path(Point2::new(1.0, 0.0)));
    assert!(c.is_on_path(Point2::new(1.0 / 3.0, 0.0)));
    assert!(!c.is_on_path(Point2::new(3.0, 0.0)));
    assert!(c.is_on_screen());
}

#[test]
fn constant_curves_are_empty() {
    for k in [1.0, -2.0] {
        let mut c = ImplicitCurve::from_tree(Tree::constant(k));
        c.update_path(&view());
        assert!(c.locus().is_empty());
        assert!(!c.is_on_screen());
    }
}

#[test]
fn tracers_agree() {
    let configs = [
        TraceConfig::default(),
        TraceConfig {
            tracer: TracerKind::Uniform(UniformTracer::default()),
        },
        TraceConfig {
            tracer: TracerKind::Curvature(CurvatureTracer::default()),
        },
    ];
    for config in configs {
        let mut c = folium().with_config(config);
        let stats = c.update_path(&view());
        assert!(stats.segments > 0);
        for p in c.locus().points() {
            // First-order distance estimate; no leaf cell is wider than 0.25
            let (x, y) = (p.pos.x, p.pos.y);
            let g = Vector2::new(c.eval_diff_x(x, y), c.eval_diff_y(x, y));
            let v = c.eval(x, y).abs();
            assert!(v <= 0.5 * g.norm() + 1e-9, "{config:?}: {v}");
        }
    }
}

#[test]
fn degenerate_bounds_use_defaults() {
    let mut c = folium();
    c.update_path_from_bounds([1.0, 1.0, f64::NAN, 2.0, 10.0, 10.0]);
    assert_eq!(c.view(), Some(&Viewport::default()));
    assert!(c.is_on_screen());
}

#[test]
fn snapping() {
    let mut c = ImplicitCurve::from_tree(
        Tree::x().square() + Tree::y().square() - 1.0,
    );
    c.update_path(&view());
    let p = c.polish_point(Point2::new(0.1, 0.05)).unwrap();
    assert!((p.coords.norm() - 1.0).abs() < 1e-6);
}

#[test]
fn persisted_coefficients() {
    let c = folium();
    let text = c.coeff().unwrap().to_string();
    let p: Poly = text.parse().unwrap();
    assert_eq!(Some(&p), c.coeff());

    let bad: Result<Poly, _> = "[[1.0, 2.0".parse();
    assert!(matches!(bad, Err(Error::BadCoefficientFormat(_))));
}

#[cfg(feature = "rhai")]
#[test]
fn curve_from_script() {
    let tree = locus::rhai::eval_equation("x^3 + y^3 = 3 * x * y").unwrap();
    let c = ImplicitCurve::from_tree(tree);
    let p = c.coeff().unwrap();
    assert_eq!(p.degree(), 3);
    assert_relative_eq!(p.get(1, 1), -3.0);
    assert!(c.is_on_path(Point2::new(1.5, 1.5)));
}
