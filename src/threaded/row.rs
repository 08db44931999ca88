//! Row strategies over a pre-transposed B.
//!
//! B^T is built once on the calling thread before any unit is spawned and
//! is only read afterwards, so every unit walks both operands row-major.

use std::ops::Range;
use std::sync::mpsc;

use super::Dispatch;
use super::aggregate::{Aggregator, PartialResult, Slice};
use super::output::CellSink;
use super::partition::cpu_blocks as partition_blocks;
use crate::error::{Result, UnitError};
use crate::matrix::transpose::transpose;
use crate::matrix::{Element, Matrix, dot};
use crate::pool::WorkerPool;

/// Fills `out` with row `row` of C. Returns `false` if the call was
/// aborted part-way through.
fn compute_row(
    a: &Matrix,
    bt: &Matrix,
    row: usize,
    dispatch: &Dispatch<'_>,
    out: &mut [Element],
) -> std::result::Result<bool, UnitError> {
    let row_a = a.row(row);
    for (column, (slot, row_bt)) in out.iter_mut().zip(bt.rows()).enumerate() {
        if dispatch.should_stop() {
            return Ok(false);
        }
        *slot = dot(row_a, row_bt).ok_or(UnitError::Overflow { row, column })?;
    }
    Ok(true)
}

fn write_rows<S: CellSink>(
    a: &Matrix,
    bt: &Matrix,
    rows: Range<usize>,
    dispatch: &Dispatch<'_>,
    sink: &S,
) -> std::result::Result<(), UnitError> {
    let mut buf = vec![0; a.size()];
    for row in rows {
        if !compute_row(a, bt, row, dispatch, &mut buf)? {
            return Ok(());
        }
        // SAFETY: rows of different units never overlap.
        unsafe { sink.write_row(row, &buf) };
    }
    Ok(())
}

/// One spawned unit per row of A, each writing its row of C directly.
pub(super) fn fan_out_shared<S: CellSink>(
    a: &Matrix,
    b: &Matrix,
    pool: &WorkerPool,
    dispatch: &Dispatch<'_>,
    sink: &S,
) {
    let bt = transpose(b);
    let bt = &bt;
    pool.scope(|s| {
        for row in 0..a.size() {
            s.spawn(move |_| {
                dispatch.run(|| write_rows(a, bt, row..row + 1, dispatch, sink));
            });
        }
    });
}

/// One spawned unit per contiguous block of rows.
///
/// Far fewer tasks than one-per-row when N is large; see
/// [`cpu_blocks`](super::partition::cpu_blocks) for how rows are split.
pub(super) fn cpu_blocks<S: CellSink>(
    a: &Matrix,
    b: &Matrix,
    pool: &WorkerPool,
    parallelism: usize,
    dispatch: &Dispatch<'_>,
    sink: &S,
) {
    let bt = transpose(b);
    let bt = &bt;
    pool.scope(|s| {
        for rows in partition_blocks(a.size(), parallelism) {
            s.spawn(move |_| {
                dispatch.run(|| write_rows(a, bt, rows, dispatch, sink));
            });
        }
    });
}

/// One spawned unit per row, each returning its row to the aggregator.
pub(super) fn fan_out_values<S: CellSink>(
    a: &Matrix,
    b: &Matrix,
    pool: &WorkerPool,
    dispatch: &Dispatch<'_>,
    sink: &S,
) -> Result<()> {
    let size = a.size();
    let bt = transpose(b);
    let bt = &bt;
    let mut aggregator = Aggregator::new(sink, size);
    let (tx, rx) = mpsc::channel::<PartialResult>();

    pool.in_place_scope(|s| {
        for row in 0..size {
            let tx = tx.clone();
            s.spawn(move |_| {
                dispatch.run(|| {
                    let mut values = vec![0; size];
                    if compute_row(a, bt, row, dispatch, &mut values)? {
                        let _ = tx.send(PartialResult {
                            slice: Slice::Row(row),
                            values,
                        });
                    }
                    Ok(())
                });
            });
        }
        drop(tx);

        for partial in rx {
            if let Err(err) = aggregator.absorb(partial) {
                dispatch.abort(err);
                break;
            }
        }
    });

    aggregator.finish()
}
