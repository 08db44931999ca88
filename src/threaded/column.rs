//! Column fan-out strategies: one work unit per output column.

use std::sync::mpsc;

use rayon::prelude::*;

use super::Dispatch;
use super::aggregate::{Aggregator, PartialResult, Slice};
use super::output::CellSink;
use crate::error::{Result, UnitError};
use crate::matrix::{Element, Matrix, dot};
use crate::pool::WorkerPool;

/// Computes column `column` of C from the matching column of B.
///
/// Returns `None` if the call was aborted part-way through.
fn compute_column(
    a: &Matrix,
    column_b: &[Element],
    column: usize,
    dispatch: &Dispatch<'_>,
) -> std::result::Result<Option<Vec<Element>>, UnitError> {
    let mut values = Vec::with_capacity(a.size());
    for (row, row_a) in a.rows().enumerate() {
        if dispatch.should_stop() {
            return Ok(None);
        }
        values.push(dot(row_a, column_b).ok_or(UnitError::Overflow { row, column })?);
    }
    Ok(Some(values))
}

fn write_column<S: CellSink>(
    a: &Matrix,
    column_b: &[Element],
    column: usize,
    dispatch: &Dispatch<'_>,
    sink: &S,
) -> std::result::Result<(), UnitError> {
    for (row, row_a) in a.rows().enumerate() {
        if dispatch.should_stop() {
            return Ok(());
        }
        let value = dot(row_a, column_b).ok_or(UnitError::Overflow { row, column })?;
        // SAFETY: this unit is the only one assigned `column`.
        unsafe { sink.write(row, column, value) };
    }
    Ok(())
}

/// One spawned unit per column, each writing its column of C directly.
///
/// The column of B is copied on the calling thread and moved into the unit.
pub(super) fn fan_out_shared<S: CellSink>(
    a: &Matrix,
    b: &Matrix,
    pool: &WorkerPool,
    dispatch: &Dispatch<'_>,
    sink: &S,
) {
    pool.scope(|s| {
        for column in 0..a.size() {
            let column_b = b.column(column);
            s.spawn(move |_| {
                dispatch.run(|| write_column(a, &column_b, column, dispatch, sink));
            });
        }
    });
}

/// One spawned unit per column, each returning its column as a value.
///
/// The calling thread aggregates columns in completion order while the
/// pool is still computing the rest.
pub(super) fn fan_out_values<S: CellSink>(
    a: &Matrix,
    b: &Matrix,
    pool: &WorkerPool,
    dispatch: &Dispatch<'_>,
    sink: &S,
) -> Result<()> {
    let size = a.size();
    let mut aggregator = Aggregator::new(sink, size);
    let (tx, rx) = mpsc::channel::<PartialResult>();

    pool.in_place_scope(|s| {
        for column in 0..size {
            let column_b = b.column(column);
            let tx = tx.clone();
            s.spawn(move |_| {
                dispatch.run(|| {
                    if let Some(values) = compute_column(a, &column_b, column, dispatch)? {
                        // receiver only hangs up after an aggregation error
                        let _ = tx.send(PartialResult {
                            slice: Slice::Column(column),
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

/// Parallel map over column indices; each unit extracts its own column of B.
pub(super) fn parallel_map<S: CellSink>(
    a: &Matrix,
    b: &Matrix,
    pool: &WorkerPool,
    dispatch: &Dispatch<'_>,
    sink: &S,
) {
    pool.install(|| {
        (0..a.size()).into_par_iter().for_each(|column| {
            dispatch.run(|| {
                let column_b = b.column(column);
                write_column(a, &column_b, column, dispatch, sink)
            });
        });
    });
}
