/// A value with its first partial derivatives
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Grad {
    /// Value of the function at this point
    pub v: f64,
    /// Partial derivative with respect to `x`
    pub dx: f64,
    /// Partial derivative with respect to `y`
    pub dy: f64,
}

impl std::fmt::Display for Grad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.v, self.dx, self.dy)
    }
}

impl Grad {
    /// Constructs a new gradient
    pub fn new(v: f64, dx: f64, dy: f64) -> Self {
        Self { v, dx, dy }
    }

    /// Squared magnitude of the gradient vector
    pub fn norm_squared(&self) -> f64 {
        self.dx * self.dx + self.dy * self.dy
    }

    /// Implicit slope `dy/dx = -f_x / f_y` of the level set through this point
    pub fn slope(&self) -> f64 {
        -self.dx / self.dy
    }
}

/// Second partial derivatives at a point
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Hessian {
    /// ∂²f/∂x²
    pub xx: f64,
    /// ∂²f/∂x∂y
    pub xy: f64,
    /// ∂²f/∂y²
    pub yy: f64,
}

impl Hessian {
    /// Constructs a new set of second partials
    pub fn new(xx: f64, xy: f64, yy: f64) -> Self {
        Self { xx, xy, yy }
    }

    /// Radius of curvature of the level set, given the gradient at the same
    /// point
    ///
    /// The result is signed, and is infinite or NaN where the curve is
    /// locally straight or singular.
    pub fn radius(&self, g: &Grad) -> f64 {
        let (fx, fy) = (g.dx, g.dy);
        let num = (fx * fx + fy * fy).powf(1.5);
        let den =
            self.xx * fy * fy + self.yy * fx * fx - 2.0 * self.xy * fx * fy;
        num / den
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn circle_radius() {
        // x^2 + y^2 - r^2 at (r, 0)
        for r in [0.5, 1.0, 3.0] {
            let g = Grad::new(0.0, 2.0 * r, 0.0);
            let h = Hessian::new(2.0, 0.0, 2.0);
            assert_relative_eq!(h.radius(&g), r);
        }
    }

    #[test]
    fn straight_line() {
        let g = Grad::new(0.0, 1.0, 1.0);
        let h = Hessian::default();
        assert!(h.radius(&g).is_infinite());
        assert_eq!(g.slope(), -1.0);
    }
}
