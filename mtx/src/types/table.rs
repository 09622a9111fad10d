//! Operation compatibility table
//!
//! `operator -> left type -> right type -> result type`. A missing entry is
//! an illegal combination. Unary operators are keyed with the operand type
//! on both sides.

use std::collections::HashMap;

use super::descriptor::VarType;
use crate::ast::{BinOp, UnOp};

/// Table key for an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Binary(BinOp),
    Unary(UnOp),
    /// Every comparison operator shares one row
    Compare,
}

#[derive(Debug, Clone, Default)]
pub struct OperationTable {
    rules: HashMap<Operator, HashMap<VarType, HashMap<VarType, VarType>>>,
}

impl OperationTable {
    pub fn new() -> Self {
        use VarType::*;

        let mut table = OperationTable::default();
        let numeric = [Int, Float];

        for op in [BinOp::Add, BinOp::Sub, BinOp::Mul] {
            for l in numeric {
                for r in numeric {
                    let result = if l == Int && r == Int { Int } else { Float };
                    table.allow(Operator::Binary(op), l, r, result);
                }
            }
        }
        for l in numeric {
            for r in numeric {
                table.allow(Operator::Binary(BinOp::Div), l, r, Float);
            }
        }

        for op in [BinOp::Add, BinOp::Sub] {
            table.allow(Operator::Binary(op), Vector, Vector, Vector);
            table.allow(Operator::Binary(op), Matrix, Matrix, Matrix);
        }
        table.allow(Operator::Binary(BinOp::Add), Str, Str, Str);

        // Algebraic products: dot product and matrix multiplication
        table.allow(Operator::Binary(BinOp::Mul), Vector, Vector, Float);
        table.allow(Operator::Binary(BinOp::Mul), Matrix, Matrix, Matrix);

        // Broadcast with a scalar; division only takes the scalar on the right
        for aggregate in [Vector, Matrix] {
            for scalar in numeric {
                table.allow(Operator::Binary(BinOp::Mul), aggregate, scalar, aggregate);
                table.allow(Operator::Binary(BinOp::Mul), scalar, aggregate, aggregate);
                table.allow(Operator::Binary(BinOp::Div), aggregate, scalar, aggregate);
            }
        }

        for op in [BinOp::DotAdd, BinOp::DotSub, BinOp::DotMul, BinOp::DotDiv] {
            table.allow(Operator::Binary(op), Vector, Vector, Vector);
            table.allow(Operator::Binary(op), Matrix, Matrix, Matrix);
        }

        table.allow(Operator::Unary(UnOp::Negate), Int, Int, Int);
        table.allow(Operator::Unary(UnOp::Negate), Float, Float, Float);
        table.allow(Operator::Unary(UnOp::Transpose), Matrix, Matrix, Matrix);

        for l in numeric {
            for r in numeric {
                table.allow(Operator::Compare, l, r, Int);
            }
        }
        table.allow(Operator::Compare, Str, Str, Int);

        table
    }

    fn allow(&mut self, op: Operator, left: VarType, right: VarType, result: VarType) {
        self.rules
            .entry(op)
            .or_default()
            .entry(left)
            .or_default()
            .insert(right, result);
    }

    /// Result type of `left op right`, or `None` when illegal
    pub fn lookup(&self, op: Operator, left: VarType, right: VarType) -> Option<VarType> {
        self.rules.get(&op)?.get(&left)?.get(&right).copied()
    }

    pub fn binary(&self, op: BinOp, left: VarType, right: VarType) -> Option<VarType> {
        self.lookup(Operator::Binary(op), left, right)
    }

    pub fn unary(&self, op: UnOp, operand: VarType) -> Option<VarType> {
        self.lookup(Operator::Unary(op), operand, operand)
    }

    pub fn compare(&self, left: VarType, right: VarType) -> Option<VarType> {
        self.lookup(Operator::Compare, left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use VarType::*;

    #[test]
    fn test_numeric_promotion() {
        let table = OperationTable::new();
        for op in [BinOp::Add, BinOp::Sub, BinOp::Mul] {
            assert_eq!(table.binary(op, Int, Int), Some(Int));
            assert_eq!(table.binary(op, Int, Float), Some(Float));
            assert_eq!(table.binary(op, Float, Int), Some(Float));
            assert_eq!(table.binary(op, Float, Float), Some(Float));
        }
    }

    #[test]
    fn test_division_always_float() {
        let table = OperationTable::new();
        assert_eq!(table.binary(BinOp::Div, Int, Int), Some(Float));
        assert_eq!(table.binary(BinOp::Div, Float, Int), Some(Float));
    }

    #[test]
    fn test_elementwise_rejects_scalars() {
        let table = OperationTable::new();
        assert_eq!(table.binary(BinOp::DotMul, Matrix, Matrix), Some(Matrix));
        assert_eq!(table.binary(BinOp::DotMul, Matrix, Int), None);
        assert_eq!(table.binary(BinOp::DotAdd, Int, Int), None);
    }

    #[test]
    fn test_broadcast() {
        let table = OperationTable::new();
        assert_eq!(table.binary(BinOp::Mul, Float, Vector), Some(Vector));
        assert_eq!(table.binary(BinOp::Div, Matrix, Int), Some(Matrix));
        assert_eq!(table.binary(BinOp::Div, Int, Matrix), None);
        assert_eq!(table.binary(BinOp::Add, Matrix, Int), None);
    }

    #[test]
    fn test_products() {
        let table = OperationTable::new();
        assert_eq!(table.binary(BinOp::Mul, Vector, Vector), Some(Float));
        assert_eq!(table.binary(BinOp::Mul, Matrix, Matrix), Some(Matrix));
        assert_eq!(table.binary(BinOp::Mul, Matrix, Vector), None);
    }

    #[test]
    fn test_unary() {
        let table = OperationTable::new();
        assert_eq!(table.unary(UnOp::Negate, Float), Some(Float));
        assert_eq!(table.unary(UnOp::Negate, Matrix), None);
        assert_eq!(table.unary(UnOp::Transpose, Matrix), Some(Matrix));
        assert_eq!(table.unary(UnOp::Transpose, Vector), None);
    }

    #[test]
    fn test_compare() {
        let table = OperationTable::new();
        assert_eq!(table.compare(Int, Float), Some(Int));
        assert_eq!(table.compare(Str, Str), Some(Int));
        assert_eq!(table.compare(Str, Int), None);
        assert_eq!(table.compare(Vector, Vector), None);
    }

    #[test]
    fn test_undefined_never_legal() {
        let table = OperationTable::new();
        assert_eq!(table.binary(BinOp::Add, Undefined, Int), None);
    }
}
