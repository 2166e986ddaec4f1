/// A one-argument math operation
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[allow(missing_docs)]
pub enum UnaryOpcode {
    Neg,
    Abs,
    Recip,
    Sqrt,
    Square,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Exp,
    Ln,
}

/// A two-argument math operation
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[allow(missing_docs)]
pub enum BinaryOpcode {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
}

impl UnaryOpcode {
    /// Applies the operation to a single value
    ///
    /// Out-of-domain inputs produce NaN or infinity, matching IEEE-754
    pub fn apply(self, a: f64) -> f64 {
        match self {
            UnaryOpcode::Neg => -a,
            UnaryOpcode::Abs => a.abs(),
            UnaryOpcode::Recip => 1.0 / a,
            UnaryOpcode::Sqrt => a.sqrt(),
            UnaryOpcode::Square => a * a,
            UnaryOpcode::Sin => a.sin(),
            UnaryOpcode::Cos => a.cos(),
            UnaryOpcode::Tan => a.tan(),
            UnaryOpcode::Asin => a.asin(),
            UnaryOpcode::Acos => a.acos(),
            UnaryOpcode::Atan => a.atan(),
            UnaryOpcode::Exp => a.exp(),
            UnaryOpcode::Ln => a.ln(),
        }
    }

    /// Function name, as used when printing a tree
    pub fn name(self) -> &'static str {
        match self {
            UnaryOpcode::Neg => "neg",
            UnaryOpcode::Abs => "abs",
            UnaryOpcode::Recip => "recip",
            UnaryOpcode::Sqrt => "sqrt",
            UnaryOpcode::Square => "square",
            UnaryOpcode::Sin => "sin",
            UnaryOpcode::Cos => "cos",
            UnaryOpcode::Tan => "tan",
            UnaryOpcode::Asin => "asin",
            UnaryOpcode::Acos => "acos",
            UnaryOpcode::Atan => "atan",
            UnaryOpcode::Exp => "exp",
            UnaryOpcode::Ln => "ln",
        }
    }
}

impl BinaryOpcode {
    /// Applies the operation to a pair of values
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOpcode::Add => a + b,
            BinaryOpcode::Sub => a - b,
            BinaryOpcode::Mul => a * b,
            BinaryOpcode::Div => a / b,
            BinaryOpcode::Min => a.min(b),
            BinaryOpcode::Max => a.max(b),
        }
    }

    /// Infix symbol for arithmetic opcodes, or `None` for `min` / `max`
    pub fn symbol(self) -> Option<&'static str> {
        match self {
            BinaryOpcode::Add => Some("+"),
            BinaryOpcode::Sub => Some("-"),
            BinaryOpcode::Mul => Some("*"),
            BinaryOpcode::Div => Some("/"),
            BinaryOpcode::Min | BinaryOpcode::Max => None,
        }
    }

    /// Function name, used for non-infix opcodes
    pub fn name(self) -> &'static str {
        match self {
            BinaryOpcode::Add => "add",
            BinaryOpcode::Sub => "sub",
            BinaryOpcode::Mul => "mul",
            BinaryOpcode::Div => "div",
            BinaryOpcode::Min => "min",
            BinaryOpcode::Max => "max",
        }
    }
}
