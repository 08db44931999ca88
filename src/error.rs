//! Error types for matrix multiplication.

use thiserror::Error;

use crate::threaded::Strategy;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("matrix dimension mismatch: A is {0}x{0}, B is {1}x{1}")]
    DimensionMismatch(usize, usize),

    #[error("matrix is not square: row {row} has {len} elements, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("matrix must have at least one row")]
    Empty,

    #[error("strategy `{0}` needs a worker pool")]
    PoolRequired(Strategy),

    #[error("worker pool needs at least one worker")]
    NoWorkers,

    #[error("failed to build worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),

    #[error("`{strategy}` multiply failed")]
    Execution {
        strategy: Strategy,
        #[source]
        source: UnitError,
    },

    #[error("multiply interrupted before completion")]
    Interrupted,

    #[error("aggregator received slice {0} twice")]
    DuplicateSlice(usize),

    #[error("aggregator received slice {index} for a {size}x{size} result")]
    SliceOutOfRange { index: usize, size: usize },

    #[error("aggregator expected {expected} slices, received {received}")]
    MissingSlices { expected: usize, received: usize },
}

/// Failure raised inside a single work unit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("integer overflow computing C[{row}][{column}]")]
    Overflow { row: usize, column: usize },

    #[error("worker panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown strategy `{0}`")]
pub struct UnknownStrategy(pub String);
