//! Implicit curves with an optional exact polynomial representation
//!
//! An [`ImplicitCurve`] couples a [`ScalarField`] with (when the curve is
//! polynomial) the matching [`Poly`].  Both are replaced together by every
//! mutation, and the curve is re-traced over the last viewport it was traced
//! with.
//!
//! ```
//! use locus::{ImplicitCurve, trace::Viewport};
//! use nalgebra::{Point2, Vector2};
//!
//! // x^2 + y^2 - 1
//! let mut c = ImplicitCurve::from_coeffs(vec![
//!     vec![-1.0, 0.0, 1.0],
//!     vec![0.0],
//!     vec![1.0],
//! ])?;
//! c.update_path(&Viewport::from_bounds([-2.0, 2.0, -2.0, 2.0, 50.0, 50.0]));
//! assert!(c.is_on_screen());
//!
//! let inv = c.translate(Vector2::new(1.0, 0.0)).unwrap();
//! assert_eq!(inv.apply(Point2::new(1.0, 0.0)), Point2::new(2.0, 0.0));
//! assert!(c.is_on_path(Point2::new(2.0, 0.0)));
//! # Ok::<(), locus::Error>(())
//! ```
use crate::{
    Error,
    context::Tree,
    eval::{Function, MIN_PRECISION, ScalarField},
    poly::{AffineInverse, Poly, RationalMap, fit},
    seed,
    snap::{SnapSettings, snap},
    trace::{Locus, Scratch, TraceConfig, TraceStats, Tracer, Viewport},
};
use nalgebra::{Matrix2, Point2, Point3, Vector2};

/// A curve `f(x, y) = 0` together with its traced locus
#[derive(Clone, Debug)]
pub struct ImplicitCurve {
    field: ScalarField,
    poly: Option<Poly>,
    defined: bool,
    locus: Locus,
    config: TraceConfig,
    view: Option<Viewport>,
    step: f64,
    scratch: Scratch,
}

impl ImplicitCurve {
    fn new(field: ScalarField, poly: Option<Poly>) -> Self {
        Self {
            field,
            poly,
            defined: true,
            locus: Locus::new(),
            config: TraceConfig::default(),
            view: None,
            step: 0.0,
            scratch: Scratch::default(),
        }
    }

    /// Builds a curve from an expression tree
    ///
    /// If the tree expands to a polynomial, the coefficients are kept as
    /// well.  A polynomial whose coefficients overflow makes the curve
    /// undefined.
    pub fn from_tree(tree: Tree) -> Self {
        let mut defined = true;
        let poly = match Poly::from_tree(&tree) {
            Ok(p) => Some(p),
            Err(e @ Error::NonFiniteCoefficient(..)) => {
                log::warn!("curve is undefined: {e}");
                defined = false;
                None
            }
            Err(e) => {
                log::debug!("curve has no coefficients: {e}");
                None
            }
        };
        let mut out = Self::new(ScalarField::new(tree), poly);
        out.defined = defined;
        out
    }

    /// Builds a curve from a coefficient grid
    pub fn from_coeffs(coeff: Vec<Vec<f64>>) -> Result<Self, Error> {
        Ok(Self::from_poly(Poly::new(coeff)?))
    }

    /// Builds a curve from a polynomial
    pub fn from_poly(poly: Poly) -> Self {
        Self::new(ScalarField::new(poly.to_tree()), Some(poly))
    }

    /// Fits a polynomial curve through a set of points
    ///
    /// See [`fit::through_points`] for which point counts are accepted.
    pub fn through_points(points: &[Point2<f64>]) -> Result<Self, Error> {
        fit::through_points(points).map(Self::from_poly)
    }

    /// Fits a polynomial curve through points in homogeneous coordinates
    pub fn through_homogeneous_points(
        points: &[Point3<f64>],
    ) -> Result<Self, Error> {
        fit::through_homogeneous_points(points).map(Self::from_poly)
    }

    /// Replaces the trace configuration
    pub fn with_config(mut self, config: TraceConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the trace configuration
    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Replaces the curve with a polynomial, making it defined again
    pub fn set_coeff(&mut self, poly: Poly) {
        self.field = ScalarField::new(poly.to_tree());
        self.poly = Some(poly);
        self.defined = true;
        self.retrace();
    }

    /// Replaces the curve with a coefficient grid
    ///
    /// On error, the curve becomes undefined.
    pub fn set_coeff_grid(
        &mut self,
        coeff: Vec<Vec<f64>>,
    ) -> Result<(), Error> {
        match Poly::new(coeff) {
            Ok(p) => {
                self.set_coeff(p);
                Ok(())
            }
            Err(e) => {
                log::warn!("rejecting coefficients: {e}");
                self.set_undefined();
                Err(e)
            }
        }
    }

    /// Refits the curve through a set of points
    ///
    /// On error, the curve becomes undefined.
    pub fn fit(&mut self, points: &[Point2<f64>]) -> Result<(), Error> {
        match fit::through_points(points) {
            Ok(p) => {
                self.set_coeff(p);
                Ok(())
            }
            Err(e) => {
                self.set_undefined();
                Err(e)
            }
        }
    }

    /// Evaluates the field at a point
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        self.field.eval(x, y)
    }

    /// Evaluates the coefficients at a point, or the field if there are none
    pub fn eval_poly(&self, x: f64, y: f64) -> f64 {
        match &self.poly {
            Some(p) => p.eval(x, y),
            None => self.field.eval(x, y),
        }
    }

    /// Evaluates ∂f/∂x (NaN if unavailable)
    pub fn eval_diff_x(&self, x: f64, y: f64) -> f64 {
        match &self.poly {
            Some(p) => p.eval_diff_x(x, y),
            None => self.field.partial_x(x, y),
        }
    }

    /// Evaluates ∂f/∂y (NaN if unavailable)
    pub fn eval_diff_y(&self, x: f64, y: f64) -> f64 {
        match &self.poly {
            Some(p) => p.eval_diff_y(x, y),
            None => self.field.partial_y(x, y),
        }
    }

    /// Borrows the scalar field
    pub fn field(&self) -> &ScalarField {
        &self.field
    }

    /// Borrows the coefficients, if the curve is polynomial
    pub fn coeff(&self) -> Option<&Poly> {
        self.poly.as_ref()
    }

    /// Degree in `x`, if the curve is polynomial
    pub fn deg_x(&self) -> Option<usize> {
        self.poly.as_ref().map(Poly::deg_x)
    }

    /// Degree in `y`, if the curve is polynomial
    pub fn deg_y(&self) -> Option<usize> {
        self.poly.as_ref().map(Poly::deg_y)
    }

    /// Total degree, if the curve is polynomial
    pub fn degree(&self) -> Option<usize> {
        self.poly.as_ref().map(Poly::degree)
    }

    /// Checks whether the curve is defined
    pub fn is_defined(&self) -> bool {
        self.defined
    }

    /// Marks the curve as undefined, clearing its locus
    pub fn set_undefined(&mut self) {
        self.defined = false;
        self.locus.clear();
    }

    /// Borrows the traced locus
    pub fn locus(&self) -> &Locus {
        &self.locus
    }

    /// Checks whether any part of the curve was traced
    pub fn is_on_screen(&self) -> bool {
        self.defined && !self.locus.is_empty()
    }

    /// Checks whether a point lies on the curve, to within `1e-5`
    pub fn is_on_path(&self, p: Point2<f64>) -> bool {
        self.is_on_path_eps(p, MIN_PRECISION)
    }

    /// Checks whether a point lies on the curve, to within `eps`
    pub fn is_on_path_eps(&self, p: Point2<f64>, eps: f64) -> bool {
        self.defined && self.field.eval(p.x, p.y).abs() < eps
    }

    /// Traces the curve over a viewport
    pub fn update_path(&mut self, view: &Viewport) -> TraceStats {
        self.view = Some(*view);
        if !self.defined {
            self.locus.clear();
            return TraceStats::default();
        }
        let stats = self.config.tracer.trace(
            &self.field,
            view,
            &mut self.scratch,
            &mut self.locus,
        );
        self.step = stats.step;
        stats
    }

    /// Traces the curve over `[xmin, xmax, ymin, ymax, scale_x, scale_y]`
    ///
    /// Degenerate or non-finite bounds fall back to the default viewport.
    pub fn update_path_from_bounds(
        &mut self,
        bounds: [f64; 6],
    ) -> TraceStats {
        self.update_path(&Viewport::from_bounds(bounds))
    }

    /// Returns the last viewport passed to [`update_path`](Self::update_path)
    pub fn view(&self) -> Option<&Viewport> {
        self.view.as_ref()
    }

    fn retrace(&mut self) {
        match self.view {
            Some(v) => {
                self.update_path(&v);
            }
            None => self.locus.clear(),
        }
    }

    /// Replaces `(x, y)` with a rational map
    ///
    /// The tree and coefficients are both substituted.  Returns the inverse
    /// map for dependent points if the substitution is an invertible affine
    /// map.
    pub fn plug_in_rational(
        &mut self,
        map: &RationalMap,
    ) -> Result<Option<AffineInverse>, Error> {
        if !self.defined {
            return Ok(None);
        }
        match self.poly.as_ref().map(|p| p.substitute_rational(map)) {
            Some(Ok(next)) => self.set_coeff(next),
            Some(Err(e)) => {
                log::warn!("substitution failed: {e}");
                self.set_undefined();
                return Err(e);
            }
            None => {
                let (x, y) = map.to_trees();
                let tree = self.field.tree().remap_xy(&x, &y);
                self.field = ScalarField::new(tree);
                self.retrace();
            }
        }
        Ok(map.affine_inverse())
    }

    /// Substitutes an affine map, marking the curve undefined on failure
    fn plug_in_affine(
        &mut self,
        m: Matrix2<f64>,
        t: Vector2<f64>,
    ) -> Option<AffineInverse> {
        let out = RationalMap::affine(m, t)
            .and_then(|map| self.plug_in_rational(&map));
        match out {
            Ok(inv) => inv,
            Err(e) => {
                log::warn!("affine transform failed: {e}");
                self.set_undefined();
                None
            }
        }
    }

    /// Moves the curve by `v`
    pub fn translate(&mut self, v: Vector2<f64>) -> Option<AffineInverse> {
        self.plug_in_affine(Matrix2::identity(), -v)
    }

    /// Rotates the curve counterclockwise by `phi` radians about `center`
    pub fn rotate(
        &mut self,
        phi: f64,
        center: Point2<f64>,
    ) -> Option<AffineInverse> {
        let (s, c) = phi.sin_cos();
        let m = Matrix2::new(c, s, -s, c);
        let t = center.coords - m * center.coords;
        self.plug_in_affine(m, t)
    }

    /// Scales the curve by `r` about `center`
    pub fn dilate(
        &mut self,
        r: f64,
        center: Point2<f64>,
    ) -> Option<AffineInverse> {
        if r == 0.0 || !r.is_finite() {
            log::warn!("cannot dilate by {r}");
            self.set_undefined();
            return None;
        }
        let m = Matrix2::identity() / r;
        let t = center.coords - center.coords / r;
        self.plug_in_affine(m, t)
    }

    /// Reflects the curve through a point
    pub fn mirror_point(&mut self, q: Point2<f64>) -> Option<AffineInverse> {
        self.plug_in_affine(-Matrix2::identity(), q.coords * 2.0)
    }

    /// Reflects the curve across the line `a·x + b·y + c = 0`
    pub fn mirror_line(
        &mut self,
        a: f64,
        b: f64,
        c: f64,
    ) -> Option<AffineInverse> {
        let n = Vector2::new(a, b);
        let len2 = n.norm_squared();
        if !(len2 > 0.0) || !c.is_finite() {
            log::warn!("cannot mirror across degenerate line");
            self.set_undefined();
            return None;
        }
        let m = Matrix2::identity() - n * n.transpose() * (2.0 / len2);
        let t = n * (-2.0 * c / len2);
        self.plug_in_affine(m, t)
    }

    /// Inverts the curve through a circle
    ///
    /// On failure, the curve becomes undefined.
    pub fn mirror_circle(&mut self, center: Point2<f64>, radius: f64) {
        let out = RationalMap::circle_inversion(center, radius)
            .and_then(|map| self.plug_in_rational(&map));
        if let Err(e) = out {
            log::warn!("circle inversion failed: {e}");
            self.set_undefined();
        }
    }

    /// Moves a point onto the curve, searching within the last viewport
    ///
    /// Returns `None` if the curve is undefined, has never been traced, or no
    /// crossing is found.
    pub fn polish_point(&self, p: Point2<f64>) -> Option<Point2<f64>> {
        if !self.defined {
            return None;
        }
        let view = self.view?;
        let step = if self.step > 0.0 {
            self.step
        } else {
            view.side() / 64.0
        };
        snap(&self.field, p, &SnapSettings::new(view, Vector2::repeat(step)))
    }

    /// Returns at most `n` points near which this curve may cross `other`
    ///
    /// The search covers the overlap of both curves' last viewports.
    pub fn probable_points(
        &self,
        other: &ImplicitCurve,
        n: usize,
    ) -> Vec<Point2<f64>> {
        let (Some(a), Some(b)) = (self.view, other.view) else {
            return vec![];
        };
        let Some(v) = a.intersection(&b) else {
            return vec![];
        };
        seed::probable_initial_points(
            &self.field,
            &other.field,
            v.origin,
            v.max(),
            n,
        )
    }
}

impl From<Tree> for ImplicitCurve {
    fn from(t: Tree) -> Self {
        Self::from_tree(t)
    }
}

impl From<Poly> for ImplicitCurve {
    fn from(p: Poly) -> Self {
        Self::from_poly(p)
    }
}
