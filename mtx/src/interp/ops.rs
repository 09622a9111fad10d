//! Arithmetic, comparison and matrix operators on runtime values

use super::{InterpResult, RuntimeError, Value};
use crate::ast::{BinOp, CmpOp, UnOp};

/// Apply a binary operator.
///
/// Plain `+ -` on two arrays work position by position, `*` on two arrays is
/// a dot product or a matrix product, and `* /` with one scalar operand
/// broadcast it. The dot forms always work position by position.
pub fn binary(op: BinOp, left: &Value, right: &Value) -> InterpResult<Value> {
    if op.is_elementwise() {
        return elementwise(op.base(), left, right);
    }
    match (op, left, right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (BinOp::Add | BinOp::Sub, Value::Array(_), Value::Array(_)) => {
            elementwise(op, left, right)
        }
        (BinOp::Mul, Value::Array(_), Value::Array(_)) => {
            // A matrix without rows is stored as `[]`, same as an empty vector.
            let matrix_like = |v: &Value| v.is_matrix() || v.shape() == [0];
            if matrix_like(left) && matrix_like(right) {
                matmul(left, right)
            } else if !left.is_matrix() && !right.is_matrix() {
                dot(left, right)
            } else {
                Err(RuntimeError::unsupported(
                    "multiply",
                    left.type_name(),
                    right.type_name(),
                ))
            }
        }
        (BinOp::Mul | BinOp::Div, Value::Array(_), _) if !right.is_array() => {
            map_leaves(left, &|x: &Value| scalar(op, x, right))
        }
        (BinOp::Mul, _, Value::Array(_)) if !left.is_array() => {
            map_leaves(right, &|x: &Value| scalar(op, left, x))
        }
        _ => scalar(op, left, right),
    }
}

/// Scalar arithmetic with numeric promotion. `/` always yields a float.
pub fn scalar(op: BinOp, left: &Value, right: &Value) -> InterpResult<Value> {
    let op = op.base();
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => match op {
            BinOp::Add => Ok(Value::Int(a.wrapping_add(*b))),
            BinOp::Sub => Ok(Value::Int(a.wrapping_sub(*b))),
            BinOp::Mul => Ok(Value::Int(a.wrapping_mul(*b))),
            _ => divide(*a as f64, *b as f64),
        },
        _ => {
            let (Some(a), Some(b)) = (left.as_float(), right.as_float()) else {
                return Err(RuntimeError::unsupported(
                    op.describe(),
                    left.type_name(),
                    right.type_name(),
                ));
            };
            match op {
                BinOp::Add => Ok(Value::Float(a + b)),
                BinOp::Sub => Ok(Value::Float(a - b)),
                BinOp::Mul => Ok(Value::Float(a * b)),
                _ => divide(a, b),
            }
        }
    }
}

fn divide(a: f64, b: f64) -> InterpResult<Value> {
    if b == 0.0 {
        return Err(RuntimeError::division_by_zero());
    }
    Ok(Value::Float(a / b))
}

/// Recurse down two same-shape arrays and apply `op` at the scalars
fn elementwise(op: BinOp, left: &Value, right: &Value) -> InterpResult<Value> {
    match (left, right) {
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return Err(RuntimeError::shape_mismatch(&left.shape(), &right.shape()));
            }
            a.iter()
                .zip(b)
                .map(|(x, y)| elementwise(op, x, y))
                .collect::<InterpResult<Vec<_>>>()
                .map(Value::Array)
        }
        (Value::Array(_), _) | (_, Value::Array(_)) => Err(RuntimeError::shape_mismatch(
            &left.shape(),
            &right.shape(),
        )),
        _ => scalar(op, left, right),
    }
}

fn map_leaves(
    value: &Value,
    f: &dyn Fn(&Value) -> InterpResult<Value>,
) -> InterpResult<Value> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| map_leaves(item, f))
            .collect::<InterpResult<Vec<_>>>()
            .map(Value::Array),
        leaf => f(leaf),
    }
}

/// Sum of pairwise products of two vectors, as a float
pub fn dot(left: &Value, right: &Value) -> InterpResult<Value> {
    let product = dot_raw(left, right)?;
    Ok(Value::Float(product.as_float().unwrap_or_default()))
}

fn dot_raw(left: &Value, right: &Value) -> InterpResult<Value> {
    let (Value::Array(a), Value::Array(b)) = (left, right) else {
        return Err(RuntimeError::unsupported(
            "multiply",
            left.type_name(),
            right.type_name(),
        ));
    };
    if a.len() != b.len() {
        return Err(RuntimeError::shape_mismatch(&left.shape(), &right.shape()));
    }
    let mut sum = Value::Int(0);
    for (x, y) in a.iter().zip(b) {
        let product = scalar(BinOp::Mul, x, y)?;
        sum = scalar(BinOp::Add, &sum, &product)?;
    }
    Ok(sum)
}

/// Matrix product: each result cell is a row of `left` dotted with a row
/// of `right` transposed.
pub fn matmul(left: &Value, right: &Value) -> InterpResult<Value> {
    let (lshape, rshape) = (left.shape(), right.shape());
    let compatible = match (lshape.as_slice(), rshape.as_slice()) {
        ([0], _) => return Ok(Value::Array(Vec::new())),
        ([_, inner], [0]) => *inner == 0,
        ([_, inner], [rows, _]) => inner == rows,
        _ => false,
    };
    if !compatible {
        return Err(RuntimeError::shape_mismatch(&lshape, &rshape));
    }
    let columns = match transpose(right)? {
        Value::Array(columns) => columns,
        other => return Err(RuntimeError::type_error("matrix", other.type_name())),
    };
    let Value::Array(rows) = left else {
        return Err(RuntimeError::type_error("matrix", left.type_name()));
    };
    rows.iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| dot_raw(row, column))
                .collect::<InterpResult<Vec<_>>>()
                .map(Value::Array)
        })
        .collect::<InterpResult<Vec<_>>>()
        .map(Value::Array)
}

/// `result[i][j] = input[j][i]`
pub fn transpose(value: &Value) -> InterpResult<Value> {
    let Value::Array(rows) = value else {
        return Err(RuntimeError::type_error("matrix", value.type_name()));
    };
    let mut cells = Vec::with_capacity(rows.len());
    for row in rows {
        match row {
            Value::Array(cols) => cells.push(cols),
            other => return Err(RuntimeError::type_error("matrix", other.type_name())),
        }
    }
    let width = cells.first().map_or(0, |r| r.len());
    if cells.iter().any(|r| r.len() != width) {
        return Err(RuntimeError::shape_mismatch(&value.shape(), &[rows.len(), width]));
    }
    Ok(Value::Array(
        (0..width)
            .map(|j| Value::Array(cells.iter().map(|r| r[j].clone()).collect()))
            .collect(),
    ))
}

pub fn unary(op: UnOp, value: &Value) -> InterpResult<Value> {
    match (op, value) {
        (UnOp::Negate, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnOp::Negate, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnOp::Negate, other) => Err(RuntimeError::type_error("int or float", other.type_name())),
        (UnOp::Transpose, _) => transpose(value),
    }
}

/// Numeric or string comparison; the result is `1` or `0`
pub fn compare(op: CmpOp, left: &Value, right: &Value) -> InterpResult<Value> {
    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => {
                return Err(RuntimeError::unsupported(
                    "compare",
                    left.type_name(),
                    right.type_name(),
                ));
            }
        },
    };
    let holds = ordering.is_some_and(|o| match op {
        CmpOp::Lt => o.is_lt(),
        CmpOp::Gt => o.is_gt(),
        CmpOp::Le => o.is_le(),
        CmpOp::Ge => o.is_ge(),
        CmpOp::Eq => o.is_eq(),
        CmpOp::Ne => o.is_ne(),
    });
    Ok(Value::Int(i64::from(holds)))
}
