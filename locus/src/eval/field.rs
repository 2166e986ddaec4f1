use super::{Function, Grad, Hessian};
use crate::{
    Error,
    context::{Tree, Var},
};

/// Symbolic first and second partial derivatives of a tree
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub struct Derivatives {
    pub fx: Tree,
    pub fy: Tree,
    pub fxx: Tree,
    pub fxy: Tree,
    pub fyy: Tree,
}

impl Derivatives {
    /// Differentiates `t` twice in each direction
    pub fn new(t: &Tree) -> Result<Self, Error> {
        let fx = t.deriv(Var::X)?;
        let fy = t.deriv(Var::Y)?;
        let fxx = fx.deriv(Var::X)?;
        let fxy = fx.deriv(Var::Y)?;
        let fyy = fy.deriv(Var::Y)?;
        Ok(Self {
            fx,
            fy,
            fxx,
            fxy,
            fyy,
        })
    }
}

/// A function of `x` and `y` backed by an expression tree
///
/// Derivatives are computed once, when the field is built; a field whose
/// tree cannot be differentiated still evaluates, but reports NaN partials.
#[derive(Clone, Debug)]
pub struct ScalarField {
    tree: Tree,
    derivs: Option<Derivatives>,
}

impl ScalarField {
    /// Builds a new field, differentiating the tree symbolically
    pub fn new(tree: Tree) -> Self {
        let derivs = match Derivatives::new(&tree) {
            Ok(d) => Some(d),
            Err(e) => {
                log::debug!("field has no symbolic derivatives: {e}");
                None
            }
        };
        Self { tree, derivs }
    }

    /// Returns the underlying tree
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Returns the cached derivative trees, if any
    pub fn derivatives(&self) -> Option<&Derivatives> {
        self.derivs.as_ref()
    }

    /// Checks whether partial derivatives are available
    pub fn has_derivative(&self) -> bool {
        self.derivs.is_some()
    }

    /// Evaluates ∂f/∂x, or returns NaN if the field has no derivatives
    pub fn partial_x(&self, x: f64, y: f64) -> f64 {
        self.derivs.as_ref().map_or(f64::NAN, |d| d.fx.eval(x, y))
    }

    /// Evaluates ∂f/∂y, or returns NaN if the field has no derivatives
    pub fn partial_y(&self, x: f64, y: f64) -> f64 {
        self.derivs.as_ref().map_or(f64::NAN, |d| d.fy.eval(x, y))
    }

    /// Evaluates the implicit slope `dy/dx` of the level set
    pub fn slope(&self, x: f64, y: f64) -> f64 {
        -self.partial_x(x, y) / self.partial_y(x, y)
    }
}

impl Function for ScalarField {
    fn eval(&self, x: f64, y: f64) -> f64 {
        self.tree.eval(x, y)
    }
    fn grad(&self, x: f64, y: f64) -> Option<Grad> {
        let d = self.derivs.as_ref()?;
        Some(Grad::new(self.tree.eval(x, y), d.fx.eval(x, y), d.fy.eval(x, y)))
    }
    fn hessian(&self, x: f64, y: f64) -> Option<Hessian> {
        let d = self.derivs.as_ref()?;
        Some(Hessian::new(
            d.fxx.eval(x, y),
            d.fxy.eval(x, y),
            d.fyy.eval(x, y),
        ))
    }
}

impl From<Tree> for ScalarField {
    fn from(t: Tree) -> Self {
        Self::new(t)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn field_partials() {
        let (x, y) = Tree::axes();
        let f = ScalarField::new(x.square() * y.clone() + y);
        assert!(f.has_derivative());
        assert_eq!(f.eval(2.0, 3.0), 15.0);
        assert_eq!(f.partial_x(2.0, 3.0), 12.0);
        assert_eq!(f.partial_y(2.0, 3.0), 5.0);
        assert_eq!(f.slope(2.0, 3.0), -12.0 / 5.0);

        let h = f.hessian(2.0, 3.0).unwrap();
        assert_eq!(h, Hessian::new(6.0, 4.0, 0.0));
    }

    #[test]
    fn field_without_derivatives() {
        let f = ScalarField::new(Tree::x().max(Tree::y()));
        assert!(!f.has_derivative());
        assert_eq!(f.eval(1.0, 2.0), 2.0);
        assert!(f.partial_x(1.0, 2.0).is_nan());
        assert!(f.slope(1.0, 2.0).is_nan());
        assert!(f.grad(1.0, 2.0).is_none());
        assert!(f.hessian(1.0, 2.0).is_none());
    }
}
