//! Reassembling value-returning work units into the output matrix.

use super::output::CellSink;
use crate::error::{Error, Result};
use crate::matrix::Element;

/// Which output slice a partial result belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slice {
    Row(usize),
    Column(usize),
}

impl Slice {
    pub fn index(self) -> usize {
        match self {
            Slice::Row(index) | Slice::Column(index) => index,
        }
    }
}

/// One fully computed row or column, tagged with its position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialResult {
    pub slice: Slice,
    pub values: Vec<Element>,
}

/// Copies partial results into the output as they arrive.
///
/// Arrival order does not matter. A slice delivered twice is rejected, and
/// [`Aggregator::finish`] fails unless every slice arrived. One aggregator
/// takes slices of a single kind, all rows or all columns.
pub(crate) struct Aggregator<'s, S> {
    sink: &'s S,
    size: usize,
    seen: Vec<bool>,
    received: usize,
}

impl<'s, S: CellSink> Aggregator<'s, S> {
    pub(crate) fn new(sink: &'s S, size: usize) -> Self {
        Self {
            sink,
            size,
            seen: vec![false; size],
            received: 0,
        }
    }

    pub(crate) fn absorb(&mut self, partial: PartialResult) -> Result<()> {
        let index = partial.slice.index();
        if index >= self.size {
            return Err(Error::SliceOutOfRange {
                index,
                size: self.size,
            });
        }
        if self.seen[index] {
            return Err(Error::DuplicateSlice(index));
        }
        debug_assert_eq!(partial.values.len(), self.size);

        // SAFETY: only the aggregating thread writes the output, and each
        // slice is written once.
        match partial.slice {
            Slice::Row(row) => unsafe { self.sink.write_row(row, &partial.values) },
            Slice::Column(column) => unsafe { self.sink.write_column(column, &partial.values) },
        }
        self.seen[index] = true;
        self.received += 1;
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<()> {
        if self.received != self.size {
            return Err(Error::MissingSlices {
                expected: self.size,
                received: self.received,
            });
        }
        Ok(())
    }
}
