//! Concurrent multiplication strategies.
//!
//! Every strategy splits the N×N output into disjoint work units and runs
//! them on a shared [`WorkerPool`]. Units never write outside the region
//! they were assigned, so the output needs no lock; the rayon scope that
//! dispatches them is the barrier that makes every write visible before
//! the matrix is handed back.
//!
//! Available strategies:
//! - `column-shared`: one unit per column, writes straight into C
//! - `column-values`: one unit per column, returns the column to the aggregator
//! - `row-transposed`: B^T built once, one unit per row, writes into C
//! - `cpu-blocks`: one unit per contiguous block of rows, one block per CPU
//! - `parallel-columns`: parallel iterator over column indices
//! - `row-values`: B^T built once, one unit per row, returned to the aggregator
//!
//! plus the two sequential baselines, which need no pool.

pub mod aggregate;
mod column;
pub(crate) mod output;
pub mod partition;
mod row;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result, UnitError, UnknownStrategy};
use crate::matrix::{Matrix, sequential, validate};
use crate::pool::WorkerPool;
use output::{CellSink, SharedOutput};
use partition::Region;

/// Policy for partitioning and scheduling one multiplication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    Sequential,
    SequentialTransposed,
    ColumnShared,
    ColumnValues,
    RowTransposed,
    CpuBlocks,
    ParallelColumns,
    RowValues,
}

impl Strategy {
    pub const ALL: [Strategy; 8] = [
        Strategy::Sequential,
        Strategy::SequentialTransposed,
        Strategy::ColumnShared,
        Strategy::ColumnValues,
        Strategy::RowTransposed,
        Strategy::CpuBlocks,
        Strategy::ParallelColumns,
        Strategy::RowValues,
    ];

    pub const CONCURRENT: [Strategy; 6] = [
        Strategy::ColumnShared,
        Strategy::ColumnValues,
        Strategy::RowTransposed,
        Strategy::CpuBlocks,
        Strategy::ParallelColumns,
        Strategy::RowValues,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::SequentialTransposed => "sequential-transposed",
            Strategy::ColumnShared => "column-shared",
            Strategy::ColumnValues => "column-values",
            Strategy::RowTransposed => "row-transposed",
            Strategy::CpuBlocks => "cpu-blocks",
            Strategy::ParallelColumns => "parallel-columns",
            Strategy::RowValues => "row-values",
        }
    }

    pub fn needs_pool(self) -> bool {
        !matches!(self, Strategy::Sequential | Strategy::SequentialTransposed)
    }

    /// Output regions this strategy assigns to its work units.
    ///
    /// `parallelism` only matters for [`Strategy::CpuBlocks`]. The sequential
    /// strategies run as a single unit covering every row.
    pub fn partition(self, size: usize, parallelism: usize) -> Vec<Region> {
        match self {
            Strategy::Sequential | Strategy::SequentialTransposed => vec![Region::Rows(0..size)],
            Strategy::ColumnShared | Strategy::ColumnValues | Strategy::ParallelColumns => {
                (0..size).map(Region::Column).collect()
            }
            Strategy::RowTransposed | Strategy::RowValues => (0..size).map(Region::Row).collect(),
            Strategy::CpuBlocks => partition::cpu_blocks(size, parallelism)
                .into_iter()
                .map(Region::Rows)
                .collect(),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

/// Cancels an in-flight multiply from another thread.
///
/// Clones share the same flag. Once cancelled, units that have not started
/// are skipped, running units stop at their next output cell, and the call
/// returns [`Error::Interrupted`].
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Per-call state shared by every unit of one multiply.
pub(crate) struct Dispatch<'a> {
    strategy: Strategy,
    cancel: &'a CancelToken,
    aborted: AtomicBool,
    failure: Mutex<Option<Error>>,
}

impl<'a> Dispatch<'a> {
    fn new(strategy: Strategy, cancel: &'a CancelToken) -> Self {
        Self {
            strategy,
            cancel,
            aborted: AtomicBool::new(false),
            failure: Mutex::new(None),
        }
    }

    /// True once a sibling failed or the caller cancelled.
    pub(crate) fn should_stop(&self) -> bool {
        self.aborted.load(Ordering::Acquire) || self.cancel.is_cancelled()
    }

    /// Runs one unit, recording its failure or panic.
    pub(crate) fn run<F>(&self, unit: F)
    where
        F: FnOnce() -> std::result::Result<(), UnitError>,
    {
        if self.should_stop() {
            return;
        }
        let source = match panic::catch_unwind(AssertUnwindSafe(unit)) {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err,
            Err(payload) => UnitError::Panicked(panic_message(payload.as_ref())),
        };
        self.abort(Error::Execution {
            strategy: self.strategy,
            source,
        });
    }

    /// Records `err` (first one wins) and stops every remaining unit.
    pub(crate) fn abort(&self, err: Error) {
        warn!(strategy = %self.strategy, error = %err, "cancelling remaining work units");
        self.aborted.store(true, Ordering::Release);
        let mut slot = self.failure.lock();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    fn finish(self) -> Result<()> {
        if let Some(err) = self.failure.into_inner() {
            return Err(err);
        }
        if self.cancel.is_cancelled() {
            warn!(strategy = %self.strategy, "multiply interrupted");
            return Err(Error::Interrupted);
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Multiplies `a` by `b` with `strategy`.
///
/// Sequential strategies run on the calling thread and ignore `pool`. Every
/// other strategy needs one and blocks until all of its units finish.
pub fn multiply(
    a: &Matrix,
    b: &Matrix,
    strategy: Strategy,
    pool: Option<&WorkerPool>,
    cancel: &CancelToken,
) -> Result<Matrix> {
    let size = validate(a, b)?;
    if cancel.is_cancelled() {
        return Err(Error::Interrupted);
    }
    match strategy {
        Strategy::Sequential => return sequential::multiply(a, b),
        Strategy::SequentialTransposed => return sequential::multiply_transposed(a, b),
        _ => {}
    }

    let mut c = Matrix::zeros(size);
    execute(a, b, strategy, pool, cancel, &SharedOutput::new(&mut c))?;
    Ok(c)
}

/// Validates, partitions and runs every unit of `strategy`, writing the
/// product into `sink`.
///
/// Nothing is dispatched when validation fails or the call is already
/// cancelled.
pub(crate) fn execute<S: CellSink>(
    a: &Matrix,
    b: &Matrix,
    strategy: Strategy,
    pool: Option<&WorkerPool>,
    cancel: &CancelToken,
    sink: &S,
) -> Result<()> {
    let size = validate(a, b)?;
    let pool = match pool {
        Some(pool) => Some(pool),
        None if strategy.needs_pool() => return Err(Error::PoolRequired(strategy)),
        None => None,
    };
    if cancel.is_cancelled() {
        return Err(Error::Interrupted);
    }

    let parallelism = pool.map_or(1, WorkerPool::block_parallelism);
    debug_assert!(partition::tiles(&strategy.partition(size, parallelism), size));
    debug!(%strategy, size, parallelism, "dispatching multiply");

    let dispatch = Dispatch::new(strategy, cancel);
    let outcome = match (strategy, pool) {
        (Strategy::Sequential, _) => sequential::multiply(a, b).map(|c| copy_rows(&c, sink)),
        (Strategy::SequentialTransposed, _) => {
            sequential::multiply_transposed(a, b).map(|c| copy_rows(&c, sink))
        }
        (Strategy::ColumnShared, Some(pool)) => {
            column::fan_out_shared(a, b, pool, &dispatch, sink);
            Ok(())
        }
        (Strategy::ColumnValues, Some(pool)) => column::fan_out_values(a, b, pool, &dispatch, sink),
        (Strategy::ParallelColumns, Some(pool)) => {
            column::parallel_map(a, b, pool, &dispatch, sink);
            Ok(())
        }
        (Strategy::RowTransposed, Some(pool)) => {
            row::fan_out_shared(a, b, pool, &dispatch, sink);
            Ok(())
        }
        (Strategy::RowValues, Some(pool)) => row::fan_out_values(a, b, pool, &dispatch, sink),
        (Strategy::CpuBlocks, Some(pool)) => {
            row::cpu_blocks(a, b, pool, parallelism, &dispatch, sink);
            Ok(())
        }
        (_, None) => Err(Error::PoolRequired(strategy)),
    };

    dispatch.finish()?;
    outcome
}

fn copy_rows<S: CellSink>(c: &Matrix, sink: &S) {
    for (row, values) in c.rows().enumerate() {
        // SAFETY: the calling thread is the only writer.
        unsafe { sink.write_row(row, values) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Element;
    use crate::matrix::factory::create_seeded;
    use std::sync::atomic::AtomicUsize;

    /// Records how many times each output cell was written.
    struct CountingSink {
        size: usize,
        counts: Vec<AtomicUsize>,
    }

    impl CountingSink {
        fn new(size: usize) -> Self {
            Self {
                size,
                counts: (0..size * size).map(|_| AtomicUsize::new(0)).collect(),
            }
        }

        fn counts(&self) -> Vec<usize> {
            self.counts
                .iter()
                .map(|count| count.load(Ordering::SeqCst))
                .collect()
        }
    }

    impl CellSink for CountingSink {
        unsafe fn write(&self, row: usize, column: usize, _value: Element) {
            self.counts[row * self.size + column].fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_every_cell_written_exactly_once() {
        let pool = WorkerPool::new(4).unwrap();
        for size in [1, 2, 5, 33] {
            let a = create_seeded(size, 1).unwrap();
            let b = create_seeded(size, 2).unwrap();

            for strategy in Strategy::ALL {
                let sink = CountingSink::new(size);
                execute(&a, &b, strategy, Some(&pool), &CancelToken::new(), &sink).unwrap();
                assert!(
                    sink.counts().iter().all(|&count| count == 1),
                    "{} size {}: write counts {:?}",
                    strategy,
                    size,
                    sink.counts()
                );
            }
        }
    }

    #[test]
    fn test_mismatch_dispatches_nothing() {
        let pool = WorkerPool::new(2).unwrap();
        let a = Matrix::identity(3);
        let b = Matrix::identity(4);

        for strategy in Strategy::ALL {
            let sink = CountingSink::new(4);
            let result = execute(&a, &b, strategy, Some(&pool), &CancelToken::new(), &sink);
            assert!(matches!(result, Err(Error::DimensionMismatch(3, 4))));
            assert!(sink.counts().iter().all(|&count| count == 0));
        }
    }

    #[test]
    fn test_cancelled_call_dispatches_nothing() {
        let pool = WorkerPool::new(2).unwrap();
        let a = create_seeded(8, 5).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        for strategy in Strategy::CONCURRENT {
            let sink = CountingSink::new(8);
            let result = execute(&a, &a, strategy, Some(&pool), &cancel, &sink);
            assert!(matches!(result, Err(Error::Interrupted)));
            assert!(sink.counts().iter().all(|&count| count == 0));
        }
    }

    #[test]
    fn test_partitions_tile_output() {
        for size in [1, 2, 7, 33] {
            for parallelism in [1, 3, 8, 64] {
                for strategy in Strategy::ALL {
                    assert!(
                        partition::tiles(&strategy.partition(size, parallelism), size),
                        "{} size {} parallelism {}",
                        strategy,
                        size,
                        parallelism
                    );
                }
            }
        }
    }

    #[test]
    fn test_strategy_names_round_trip() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.name().parse::<Strategy>().unwrap(), strategy);
        }
        assert_eq!(
            "diagonal".parse::<Strategy>(),
            Err(UnknownStrategy("diagonal".to_string()))
        );
    }

    #[test]
    fn test_first_failure_wins() {
        let cancel = CancelToken::new();
        let dispatch = Dispatch::new(Strategy::ColumnShared, &cancel);

        dispatch.run(|| Err(UnitError::Overflow { row: 1, column: 2 }));
        assert!(dispatch.should_stop());

        let mut ran = false;
        dispatch.run(|| {
            ran = true;
            Ok(())
        });
        assert!(!ran, "units after a failure must be skipped");

        match dispatch.finish() {
            Err(Error::Execution { strategy, source }) => {
                assert_eq!(strategy, Strategy::ColumnShared);
                assert_eq!(source, UnitError::Overflow { row: 1, column: 2 });
            }
            other => panic!("expected execution failure, got {:?}", other),
        }
    }

    #[test]
    fn test_panic_is_captured() {
        let cancel = CancelToken::new();
        let dispatch = Dispatch::new(Strategy::RowValues, &cancel);

        dispatch.run(|| panic!("unit blew up"));

        match dispatch.finish() {
            Err(Error::Execution {
                source: UnitError::Panicked(msg),
                ..
            }) => assert_eq!(msg, "unit blew up"),
            other => panic!("expected captured panic, got {:?}", other),
        }
    }
}
