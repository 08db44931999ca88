//! Square integer matrix multiplication on a shared worker pool.
//!
//! I built this to compare the different ways of splitting one matrix
//! multiply across threads. Every strategy computes the same product; they
//! differ in how the N×N output is cut into work units (columns, rows, or
//! one block of rows per CPU) and in how results get back into C (direct
//! writes into disjoint slices, or values handed to an aggregator).
//!
//! ## Usage
//!
//! ```
//! use matmul_pool::{Matrix, Strategy, multiply};
//!
//! let a = Matrix::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
//! let b = Matrix::from_rows(vec![vec![5, 6], vec![7, 8]]).unwrap();
//!
//! let c = multiply(&a, &b, Strategy::Sequential, None).unwrap();
//! assert_eq!(c.to_rows(), vec![vec![19, 22], vec![43, 50]]);
//! ```
//!
//! Concurrent strategies need a pool, built once and reused:
//!
//! ```
//! use matmul_pool::{Strategy, WorkerPool, compare_all, create_seeded, multiply};
//!
//! let pool = WorkerPool::new(4).unwrap();
//! let a = create_seeded(128, 1).unwrap();
//! let b = create_seeded(128, 2).unwrap();
//!
//! let baseline = multiply(&a, &b, Strategy::Sequential, None).unwrap();
//! let blocks = multiply(&a, &b, Strategy::CpuBlocks, Some(&pool)).unwrap();
//! assert!(compare_all(&[&baseline, &blocks]));
//!
//! pool.shutdown();
//! ```
//!
//! ## What's inside
//!
//! - Two sequential baselines (column buffer, transposed B)
//! - Six concurrent strategies sharing one lock-free output
//! - Checked arithmetic everywhere, so overflow is an error, not a wrap
//! - Cooperative cancellation of sibling units on failure or interrupt

pub mod error;
pub mod matrix;
pub mod pool;
pub mod threaded;

pub use error::{Error, Result, UnitError};
pub use matrix::compare::compare_all;
pub use matrix::factory::{create, create_seeded};
pub use matrix::{Element, Matrix};
pub use pool::{PoolConfig, WorkerPool};
pub use threaded::{CancelToken, Strategy};

/// Matrix multiply: C = A * B
///
/// `pool` is required by every strategy except the two sequential ones.
///
/// # Errors
///
/// - [`Error::DimensionMismatch`] / [`Error::Empty`] before anything runs
/// - [`Error::PoolRequired`] if a concurrent strategy gets no pool
/// - [`Error::Execution`] if a work unit overflows or panics
pub fn multiply(
    a: &Matrix,
    b: &Matrix,
    strategy: Strategy,
    pool: Option<&WorkerPool>,
) -> Result<Matrix> {
    threaded::multiply(a, b, strategy, pool, &CancelToken::new())
}

/// Same as [`multiply`] but can be interrupted through `cancel`.
///
/// Cancelling from another thread makes the call return
/// [`Error::Interrupted`] instead of a partial matrix.
pub fn multiply_with_cancel(
    a: &Matrix,
    b: &Matrix,
    strategy: Strategy,
    pool: Option<&WorkerPool>,
    cancel: &CancelToken,
) -> Result<Matrix> {
    threaded::multiply(a, b, strategy, pool, cancel)
}
