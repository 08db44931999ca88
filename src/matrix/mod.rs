//! Square integer matrices and the sequential building blocks.
//!
//! These provide the correctness baselines and utility functions used by
//! the concurrent strategies in [`crate::threaded`].

pub mod compare;
pub mod factory;
pub mod sequential;
pub mod transpose;

use std::ops::Index;

use crate::error::{Error, Result};

/// Element type of every matrix. Products are accumulated with checked
/// arithmetic, so overflow is reported instead of wrapping.
pub type Element = i64;

/// Dense N×N matrix stored row-major in one contiguous buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matrix {
    size: usize,
    data: Vec<Element>,
}

impl Matrix {
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            data: vec![0; size * size],
        }
    }

    pub fn identity(size: usize) -> Self {
        let mut matrix = Self::zeros(size);
        for i in 0..size {
            matrix.data[i * size + i] = 1;
        }
        matrix
    }

    /// Builds a matrix from nested rows, rejecting anything that is not square.
    ///
    /// ```
    /// use matmul_pool::Matrix;
    ///
    /// let m = Matrix::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
    /// assert_eq!(m[(1, 0)], 3);
    /// assert!(Matrix::from_rows(vec![vec![1, 2], vec![3]]).is_err());
    /// ```
    pub fn from_rows(rows: Vec<Vec<Element>>) -> Result<Self> {
        let size = rows.len();
        let mut data = Vec::with_capacity(size * size);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != size {
                return Err(Error::NotSquare {
                    row,
                    len: values.len(),
                    expected: size,
                });
            }
            data.extend(values);
        }
        Ok(Self { size, data })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn row(&self, row: usize) -> &[Element] {
        &self.data[row * self.size..(row + 1) * self.size]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Element]> {
        // chunks_exact panics on 0
        self.data.chunks_exact(self.size.max(1))
    }

    /// Copies column `column` into `buf`, which must hold `size` elements.
    pub fn copy_column(&self, column: usize, buf: &mut [Element]) {
        for (k, slot) in buf.iter_mut().enumerate() {
            *slot = self.data[k * self.size + column];
        }
    }

    pub fn column(&self, column: usize) -> Vec<Element> {
        let mut buf = vec![0; self.size];
        self.copy_column(column, &mut buf);
        buf
    }

    pub fn set(&mut self, row: usize, column: usize, value: Element) {
        self.data[row * self.size + column] = value;
    }

    pub fn as_slice(&self) -> &[Element] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Element] {
        &mut self.data
    }

    pub fn to_rows(&self) -> Vec<Vec<Element>> {
        self.rows().map(<[Element]>::to_vec).collect()
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = Element;

    fn index(&self, (row, column): (usize, usize)) -> &Element {
        &self.data[row * self.size + column]
    }
}

/// Checks that `a` and `b` can be multiplied: same non-zero size.
///
/// Every strategy calls this before any work is dispatched.
pub fn validate(a: &Matrix, b: &Matrix) -> Result<usize> {
    if a.size() != b.size() {
        return Err(Error::DimensionMismatch(a.size(), b.size()));
    }
    if a.size() == 0 {
        return Err(Error::Empty);
    }
    Ok(a.size())
}

/// Checked dot product shared by every strategy.
///
/// Returns `None` on overflow; callers know which output cell they were
/// computing and report it.
#[inline]
pub fn dot(lhs: &[Element], rhs: &[Element]) -> Option<Element> {
    lhs.iter()
        .zip(rhs)
        .try_fold(0 as Element, |acc, (&x, &y)| {
            x.checked_mul(y).and_then(|p| acc.checked_add(p))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = Matrix::from_rows(vec![vec![1, 2, 3], vec![4, 5], vec![6, 7, 8]]).unwrap_err();
        assert!(matches!(
            err,
            Error::NotSquare {
                row: 1,
                len: 2,
                expected: 3
            }
        ));
    }

    #[test]
    fn test_from_rows_rejects_wide() {
        assert!(Matrix::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).is_err());
    }

    #[test]
    fn test_column_access() {
        let m = Matrix::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
        assert_eq!(m.column(1), vec![2, 4]);
        assert_eq!(m.row(1), &[3, 4]);
        assert_eq!(m.to_rows(), vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn test_validate() {
        assert!(matches!(
            validate(&Matrix::zeros(3), &Matrix::zeros(4)),
            Err(Error::DimensionMismatch(3, 4))
        ));
        assert!(matches!(
            validate(&Matrix::zeros(0), &Matrix::zeros(0)),
            Err(Error::Empty)
        ));
        assert_eq!(validate(&Matrix::zeros(2), &Matrix::zeros(2)).unwrap(), 2);
    }

    #[test]
    fn test_dot_overflow() {
        assert_eq!(dot(&[1, 2, 3], &[4, 5, 6]), Some(32));
        assert_eq!(dot(&[Element::MAX, 1], &[1, 1]), None);
        assert_eq!(dot(&[Element::MAX], &[2]), None);
    }
}
