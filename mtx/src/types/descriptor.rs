//! Static type-and-shape descriptors

use std::fmt;

/// Type tag of a checked expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    Int,
    Float,
    Str,
    Vector,
    Matrix,
    /// A name that failed to resolve. Propagates without further reports.
    Undefined,
}

impl VarType {
    pub fn is_numeric(self) -> bool {
        matches!(self, VarType::Int | VarType::Float)
    }

    pub fn is_aggregate(self) -> bool {
        matches!(self, VarType::Vector | VarType::Matrix)
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VarType::Int => "int",
            VarType::Float => "float",
            VarType::Str => "string",
            VarType::Vector => "vector",
            VarType::Matrix => "matrix",
            VarType::Undefined => "undefined",
        };
        write!(f, "{s}")
    }
}

/// One dimension of a shape.
///
/// `Unbounded` is a size that cannot be known statically, such as
/// `zeros(n)` for a variable `n`. It matches every size and never fails a
/// bounds check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    Known(usize),
    Unbounded,
}

impl Dim {
    /// Whether two dimensions can describe the same runtime size
    pub fn matches(self, other: Dim) -> bool {
        match (self, other) {
            (Dim::Known(a), Dim::Known(b)) => a == b,
            _ => true,
        }
    }

    /// Whether `index` is statically known to fall outside this dimension
    pub fn excludes(self, index: i64) -> bool {
        match self {
            Dim::Known(size) => index < 0 || index as u64 >= size as u64,
            Dim::Unbounded => false,
        }
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Known(n) => write!(f, "{n}"),
            Dim::Unbounded => write!(f, "inf"),
        }
    }
}

/// Shapes match when they have the same rank and every dimension matches.
pub fn shapes_match(a: &[Dim], b: &[Dim]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.matches(*y))
}

/// Render a shape as `[2, 3]`
pub fn format_shape(shape: &[Dim]) -> String {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    format!("[{}]", dims.join(", "))
}

/// What the checker knows about an expression or a variable
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub ty: VarType,
    /// Empty for scalars, `[n]` for vectors, `[rows, cols]` for matrices
    pub shape: Vec<Dim>,
    /// Originating identifier, empty for temporaries
    pub name: String,
}

impl Descriptor {
    pub fn new(ty: VarType, shape: Vec<Dim>) -> Self {
        Descriptor {
            ty,
            shape,
            name: String::new(),
        }
    }

    pub fn scalar(ty: VarType) -> Self {
        Self::new(ty, Vec::new())
    }

    pub fn vector(len: Dim) -> Self {
        Self::new(VarType::Vector, vec![len])
    }

    pub fn matrix(rows: Dim, cols: Dim) -> Self {
        Self::new(VarType::Matrix, vec![rows, cols])
    }

    pub fn undefined() -> Self {
        Self::scalar(VarType::Undefined)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn is_undefined(&self) -> bool {
        self.ty == VarType::Undefined
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shape.is_empty() {
            write!(f, "{}", self.ty)
        } else {
            write!(f, "{}{}", self.ty, format_shape(&self.shape))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dim_matches() {
        assert!(Dim::Known(3).matches(Dim::Known(3)));
        assert!(!Dim::Known(3).matches(Dim::Known(2)));
        assert!(Dim::Unbounded.matches(Dim::Known(7)));
        assert!(Dim::Known(7).matches(Dim::Unbounded));
    }

    #[test]
    fn test_dim_excludes() {
        assert!(Dim::Known(2).excludes(2));
        assert!(Dim::Known(2).excludes(-1));
        assert!(!Dim::Known(2).excludes(1));
        assert!(!Dim::Unbounded.excludes(1_000_000));
    }

    #[test]
    fn test_shapes_match_rank() {
        let v = [Dim::Known(2)];
        let m = [Dim::Known(2), Dim::Known(1)];
        assert!(!shapes_match(&v, &m));
        assert!(shapes_match(&m, &[Dim::Unbounded, Dim::Known(1)]));
    }

    #[test]
    fn test_descriptor_display() {
        assert_eq!(Descriptor::scalar(VarType::Int).to_string(), "int");
        assert_eq!(
            Descriptor::matrix(Dim::Known(2), Dim::Unbounded).to_string(),
            "matrix[2, inf]"
        );
    }
}
