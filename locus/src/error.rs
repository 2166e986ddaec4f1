//! Module containing the universal error type
use thiserror::Error;

/// Universal error type for `locus`
#[derive(Error, Debug)]
pub enum Error {
    /// Coefficient grid has no rows
    #[error("coefficient grid is empty")]
    EmptyCoefficients,

    /// Coefficient is infinite or NaN
    #[error("coefficient of x^{0} y^{1} is not finite")]
    NonFiniteCoefficient(usize, usize),

    /// Expression cannot be expanded into a polynomial
    #[error("expression is not a polynomial in x and y")]
    NotAPolynomial,

    /// Expanding the expression would produce a power above the cap
    #[error("expanded polynomial has degree {0}, which is too high")]
    DegreeTooHigh(usize),

    /// Expression uses an operation without a symbolic derivative
    #[error("expression is not differentiable")]
    NotDifferentiable,

    /// Point count does not allow an exact or least-squares fit
    #[error("cannot fit a curve through {0} points")]
    BadPointCount(usize),

    /// Homogeneous input point has a zero `z` coordinate
    #[error("point {0} is at infinity")]
    PointAtInfinity(usize),

    /// Every degree reduction of the fit system was singular
    #[error("fit system is singular for every degree")]
    FitExhausted,

    /// The fitted curve does not pass through one of its input points
    #[error("fitted curve does not pass through point {0}")]
    FitVerification(usize),

    /// Persisted coefficients could not be parsed
    #[error("bad coefficient format: {0}")]
    BadCoefficientFormat(#[from] serde_json::Error),

    /// Script produced something other than a tree or a number
    #[cfg(feature = "rhai")]
    #[error("expression evaluated to `{0}`, not a tree")]
    BadExpressionType(String),

    /// Rhai error; see inner code for details
    #[cfg(feature = "rhai")]
    #[error("Rhai parse error")]
    RhaiParseError(#[from] rhai::ParseError),

    /// Rhai error; see inner code for details
    #[cfg(feature = "rhai")]
    #[error("Rhai evaluation error")]
    RhaiEvalError(#[from] rhai::EvalAltResult),
}

#[cfg(feature = "rhai")]
impl From<Box<rhai::EvalAltResult>> for Error {
    fn from(e: Box<rhai::EvalAltResult>) -> Self {
        Error::RhaiEvalError(*e)
    }
}
