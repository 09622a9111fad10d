//! Builtin matrix constructors: `zeros`, `ones`, `eye`

use super::{InterpResult, RuntimeError, Value};
use crate::ast::Builtin;

/// Build the matrix for `func(sizes..)`. One size means a square matrix.
pub fn call(func: Builtin, sizes: &[i64]) -> InterpResult<Value> {
    let (rows, cols) = match sizes {
        [n] => (*n, *n),
        [rows, cols] => (*rows, *cols),
        _ => {
            return Err(RuntimeError::invalid_argument(format!(
                "{func} expects 1 or 2 arguments, got {}",
                sizes.len()
            )));
        }
    };
    let rows = dimension(func, rows)?;
    let cols = dimension(func, cols)?;

    let cell: fn(usize, usize) -> i64 = match func {
        Builtin::Zeros => |_, _| 0,
        Builtin::Ones => |_, _| 1,
        Builtin::Eye => |i, j| i64::from(i == j),
    };
    Ok(Value::Array(
        (0..rows)
            .map(|i| Value::Array((0..cols).map(|j| Value::Int(cell(i, j))).collect()))
            .collect(),
    ))
}

fn dimension(func: Builtin, size: i64) -> InterpResult<usize> {
    usize::try_from(size).map_err(|_| {
        RuntimeError::invalid_argument(format!("{func}: size must be non-negative, got {size}"))
    })
}
