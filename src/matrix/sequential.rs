//! Single-threaded baselines.

use super::transpose::transpose;
use super::{Matrix, dot, validate};
use crate::error::{Error, Result, UnitError};
use crate::threaded::Strategy;

/// Sequential matrix multiplication, one output column at a time.
///
/// Column j of B is copied into a buffer once, then dotted with every row
/// of A. This is the ground truth every concurrent strategy is checked
/// against.
///
/// # Errors
///
/// [`Error::DimensionMismatch`] or [`Error::Empty`] for invalid input,
/// [`Error::Execution`] if an accumulation overflows.
pub fn multiply(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    let size = validate(a, b)?;
    let mut c = Matrix::zeros(size);
    let mut column_b = vec![0; size];

    for column in 0..size {
        b.copy_column(column, &mut column_b);
        for (row, row_a) in a.rows().enumerate() {
            let value = dot(row_a, &column_b).ok_or_else(|| Error::Execution {
                strategy: Strategy::Sequential,
                source: UnitError::Overflow { row, column },
            })?;
            c.set(row, column, value);
        }
    }

    Ok(c)
}

/// Sequential multiplication with a pre-transposed B.
///
/// B^T is built once, so both operands are read row-major in the inner
/// loop.
pub fn multiply_transposed(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    let size = validate(a, b)?;
    let bt = transpose(b);
    let mut c = Matrix::zeros(size);

    for (row, row_a) in a.rows().enumerate() {
        for (column, row_bt) in bt.rows().enumerate() {
            let value = dot(row_a, row_bt).ok_or_else(|| Error::Execution {
                strategy: Strategy::SequentialTransposed,
                source: UnitError::Overflow { row, column },
            })?;
            c.set(row, column, value);
        }
    }

    Ok(c)
}
