//! Statement AST nodes

use super::{BinOp, Expr, Spanned};
use serde::{Deserialize, Serialize};

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Block: { stmt1 stmt2 ... } with its own scope
    Block(Vec<Spanned<Stmt>>),

    /// break / continue
    Flow(FlowKeyword),

    /// print a, b, c
    Print(Vec<Spanned<Expr>>),

    /// return [expr]
    Return(Option<Spanned<Expr>>),

    /// target op value, where target is a `Var` or a `Reference`
    Assign {
        target: Spanned<Expr>,
        op: AssignOp,
        value: Spanned<Expr>,
    },

    /// if (cond) then_branch [else else_branch]
    If {
        cond: Spanned<Expr>,
        then_branch: Box<Spanned<Stmt>>,
        else_branch: Option<Box<Spanned<Stmt>>>,
    },

    /// while (cond) body
    While {
        cond: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },

    /// for iterator = start:end body
    For {
        iterator: Spanned<String>,
        range: Range,
        body: Box<Spanned<Stmt>>,
    },
}

/// Range bounds of a `for` loop; the end is exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub start: Spanned<Expr>,
    pub end: Spanned<Expr>,
}

/// Loop control keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowKeyword {
    Break,
    Continue,
}

impl std::fmt::Display for FlowKeyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowKeyword::Break => write!(f, "BREAK"),
            FlowKeyword::Continue => write!(f, "CONTINUE"),
        }
    }
}

/// Assignment operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    /// =
    Assign,
    /// +=
    AddAssign,
    /// -=
    SubAssign,
    /// *=
    MulAssign,
    /// /=
    DivAssign,
}

impl AssignOp {
    /// The arithmetic operator a compound assignment applies,
    /// or `None` for plain `=`.
    pub fn binary(self) -> Option<BinOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinOp::Add),
            AssignOp::SubAssign => Some(BinOp::Sub),
            AssignOp::MulAssign => Some(BinOp::Mul),
            AssignOp::DivAssign => Some(BinOp::Div),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            AssignOp::Assign => "ASSIGN",
            AssignOp::AddAssign => "ADD-ASSIGN",
            AssignOp::SubAssign => "SUB-ASSIGN",
            AssignOp::MulAssign => "MUL-ASSIGN",
            AssignOp::DivAssign => "DIV-ASSIGN",
        }
    }
}
