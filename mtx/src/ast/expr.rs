//! Expression AST nodes

use super::Spanned;
use serde::{Deserialize, Serialize};

/// One row of a matrix literal.
pub type Row = Spanned<Vec<Spanned<Expr>>>;

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Integer literal
    IntLit(i64),
    /// Float literal
    FloatLit(f64),
    /// String literal
    StringLit(String),

    /// Variable reference
    Var(String),

    /// Vector literal: [a, b, c]
    Vector(Vec<Spanned<Expr>>),

    /// Matrix literal: [[a, b], [c, d]]
    Matrix(Vec<Row>),

    /// Indexed access into a vector or matrix: m[i, j]
    Reference {
        name: Spanned<String>,
        coords: Vec<Spanned<Expr>>,
    },

    /// Builtin shape constructor call: zeros(n), ones(r, c), eye(n)
    Call {
        func: Builtin,
        args: Vec<Spanned<Expr>>,
    },

    /// Arithmetic operation
    Binary {
        left: Box<Spanned<Expr>>,
        op: BinOp,
        right: Box<Spanned<Expr>>,
    },

    /// Comparison
    Compare {
        left: Box<Spanned<Expr>>,
        op: CmpOp,
        right: Box<Spanned<Expr>>,
    },

    /// Unary operation
    Unary {
        op: UnOp,
        expr: Box<Spanned<Expr>>,
    },
}

impl Expr {
    /// The integer value of a literal, used for static bounds checks.
    pub fn as_int_literal(&self) -> Option<i64> {
        match self {
            Expr::IntLit(n) => Some(*n),
            _ => None,
        }
    }
}

/// Arithmetic operators, plain and element-wise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    DotAdd,
    DotSub,
    DotMul,
    DotDiv,
}

impl BinOp {
    pub fn is_elementwise(self) -> bool {
        matches!(self, BinOp::DotAdd | BinOp::DotSub | BinOp::DotMul | BinOp::DotDiv)
    }

    /// The scalar operator an element-wise operator applies at the leaves.
    pub fn base(self) -> BinOp {
        match self {
            BinOp::DotAdd => BinOp::Add,
            BinOp::DotSub => BinOp::Sub,
            BinOp::DotMul => BinOp::Mul,
            BinOp::DotDiv => BinOp::Div,
            other => other,
        }
    }

    /// Name used in diagnostics, e.g. "cannot ADD int and string"
    pub fn describe(self) -> &'static str {
        match self {
            BinOp::Add => "ADD",
            BinOp::Sub => "SUB",
            BinOp::Mul => "MUL",
            BinOp::Div => "DIV",
            BinOp::DotAdd => "DOT-ADD",
            BinOp::DotSub => "DOT-SUB",
            BinOp::DotMul => "DOT-MUL",
            BinOp::DotDiv => "DOT-DIV",
        }
    }
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::DotAdd => ".+",
            BinOp::DotSub => ".-",
            BinOp::DotMul => ".*",
            BinOp::DotDiv => "./",
        };
        write!(f, "{s}")
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl std::fmt::Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CmpOp::Lt => "<",
            CmpOp::Gt => ">",
            CmpOp::Le => "<=",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        };
        write!(f, "{s}")
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnOp {
    /// Arithmetic negation (-)
    Negate,
    /// Matrix transposition (postfix ')
    Transpose,
}

impl std::fmt::Display for UnOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnOp::Negate => write!(f, "NEGATE"),
            UnOp::Transpose => write!(f, "TRANSPOSE"),
        }
    }
}

/// Builtin matrix constructors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Builtin {
    Zeros,
    Ones,
    Eye,
}

impl std::fmt::Display for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Builtin::Zeros => write!(f, "zeros"),
            Builtin::Ones => write!(f, "ones"),
            Builtin::Eye => write!(f, "eye"),
        }
    }
}
