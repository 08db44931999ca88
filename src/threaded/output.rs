//! Lock-free view of the output matrix shared by concurrent work units.

use std::marker::PhantomData;
use std::ptr;

use crate::matrix::{Element, Matrix};

/// Destination for computed output cells.
pub(crate) trait CellSink: Sync {
    /// Stores `value` at (`row`, `column`).
    ///
    /// # Safety
    ///
    /// Caller must ensure:
    /// - `row` and `column` are in bounds
    /// - no other thread writes the same cell during the call
    unsafe fn write(&self, row: usize, column: usize, value: Element);

    /// Stores a whole output row.
    ///
    /// # Safety
    ///
    /// Same as [`CellSink::write`] for every cell of `row`.
    unsafe fn write_row(&self, row: usize, values: &[Element]) {
        for (column, &value) in values.iter().enumerate() {
            unsafe { self.write(row, column, value) };
        }
    }

    /// Stores a whole output column.
    ///
    /// # Safety
    ///
    /// Same as [`CellSink::write`] for every cell of `column`.
    unsafe fn write_column(&self, column: usize, values: &[Element]) {
        for (row, &value) in values.iter().enumerate() {
            unsafe { self.write(row, column, value) };
        }
    }
}

/// Raw view of a matrix that several threads write through at once.
///
/// Holds the unique borrow of the matrix for its whole lifetime, so nothing
/// else can read the matrix until every unit has joined.
pub(crate) struct SharedOutput<'a> {
    ptr: *mut Element,
    size: usize,
    _matrix: PhantomData<&'a mut Matrix>,
}

// SAFETY: writers uphold the CellSink contract, so no cell is written by
// two threads at once.
unsafe impl Send for SharedOutput<'_> {}
unsafe impl Sync for SharedOutput<'_> {}

impl<'a> SharedOutput<'a> {
    pub(crate) fn new(matrix: &'a mut Matrix) -> Self {
        let size = matrix.size();
        Self {
            ptr: matrix.as_mut_slice().as_mut_ptr(),
            size,
            _matrix: PhantomData,
        }
    }
}

impl CellSink for SharedOutput<'_> {
    unsafe fn write(&self, row: usize, column: usize, value: Element) {
        debug_assert!(row < self.size && column < self.size);
        unsafe { self.ptr.add(row * self.size + column).write(value) };
    }

    unsafe fn write_row(&self, row: usize, values: &[Element]) {
        debug_assert!(row < self.size && values.len() == self.size);
        unsafe {
            ptr::copy_nonoverlapping(values.as_ptr(), self.ptr.add(row * self.size), self.size)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disjoint_columns_from_threads() {
        let size = 16;
        let mut c = Matrix::zeros(size);
        {
            let out = SharedOutput::new(&mut c);
            std::thread::scope(|s| {
                for column in 0..size {
                    let out = &out;
                    s.spawn(move || {
                        let values = vec![column as Element; size];
                        // SAFETY: one thread per column.
                        unsafe { out.write_column(column, &values) };
                    });
                }
            });
        }
        for row in 0..size {
            for column in 0..size {
                assert_eq!(c[(row, column)], column as Element);
            }
        }
    }

    #[test]
    fn test_write_row() {
        let mut c = Matrix::zeros(3);
        {
            let out = SharedOutput::new(&mut c);
            unsafe { out.write_row(1, &[7, 8, 9]) };
        }
        assert_eq!(c.to_rows(), vec![vec![0, 0, 0], vec![7, 8, 9], vec![0, 0, 0]]);
    }
}
