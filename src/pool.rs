//! Worker pool shared by every concurrent multiply.

use std::num::NonZeroUsize;

use tracing::info;

use crate::error::{Error, Result};
use crate::matrix::Matrix;
use crate::threaded::{CancelToken, Strategy};

/// Configuration for [`WorkerPool`].
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Worker threads are named `{prefix}-{index}`.
    pub thread_name_prefix: String,
    /// Block count used by [`Strategy::CpuBlocks`]. Defaults to the number
    /// of available CPUs, independent of `workers`.
    pub block_parallelism: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: available_parallelism(),
            thread_name_prefix: "matmul-worker".to_string(),
            block_parallelism: None,
        }
    }
}

/// Number of CPUs the process may run on, at least 1.
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Fixed-size pool of worker threads reused across many multiplications.
///
/// Build it once, pass `&WorkerPool` to every call, and call
/// [`shutdown`](WorkerPool::shutdown) once at the end. Calling a multiply
/// from inside one of the pool's own workers is not supported.
///
/// ```
/// use matmul_pool::{Matrix, Strategy, WorkerPool};
///
/// let pool = WorkerPool::new(4).unwrap();
/// let a = Matrix::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
/// let b = Matrix::from_rows(vec![vec![5, 6], vec![7, 8]]).unwrap();
///
/// let c = pool.multiply(&a, &b, Strategy::CpuBlocks).unwrap();
/// assert_eq!(c.to_rows(), vec![vec![19, 22], vec![43, 50]]);
///
/// pool.shutdown();
/// ```
pub struct WorkerPool {
    inner: rayon::ThreadPool,
    config: PoolConfig,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self> {
        Self::with_config(PoolConfig {
            workers,
            ..PoolConfig::default()
        })
    }

    pub fn with_config(config: PoolConfig) -> Result<Self> {
        if config.workers == 0 {
            return Err(Error::NoWorkers);
        }
        let prefix = config.thread_name_prefix.clone();
        let inner = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(move |i| format!("{}-{}", prefix, i))
            .build()?;

        info!(
            workers = config.workers,
            block_parallelism = ?config.block_parallelism,
            "worker pool started"
        );
        Ok(Self { inner, config })
    }

    pub fn workers(&self) -> usize {
        self.inner.current_num_threads()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Block count for [`Strategy::CpuBlocks`].
    pub fn block_parallelism(&self) -> usize {
        self.config
            .block_parallelism
            .unwrap_or_else(available_parallelism)
            .max(1)
    }

    /// Multiplies `a` by `b` on this pool.
    pub fn multiply(&self, a: &Matrix, b: &Matrix, strategy: Strategy) -> Result<Matrix> {
        crate::threaded::multiply(a, b, strategy, Some(self), &CancelToken::new())
    }

    /// Stops the workers. Consumes the pool, so it can only happen once and
    /// only after every borrow used by a multiply has ended.
    pub fn shutdown(self) {
        info!(workers = self.config.workers, "worker pool shut down");
        drop(self.inner);
    }

    pub(crate) fn scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&rayon::Scope<'scope>) -> R + Send,
        R: Send,
    {
        self.inner.scope(op)
    }

    pub(crate) fn in_place_scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&rayon::Scope<'scope>) -> R,
    {
        self.inner.in_place_scope(op)
    }

    pub(crate) fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.inner.install(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(WorkerPool::new(0), Err(Error::NoWorkers)));
    }

    #[test]
    fn test_worker_count() {
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.workers(), 3);
        pool.shutdown();
    }

    #[test]
    fn test_block_parallelism_override() {
        let pool = WorkerPool::with_config(PoolConfig {
            workers: 2,
            block_parallelism: Some(8),
            ..PoolConfig::default()
        })
        .unwrap();
        assert_eq!(pool.block_parallelism(), 8);

        let pool = WorkerPool::new(2).unwrap();
        assert_eq!(pool.block_parallelism(), available_parallelism());
    }

    #[test]
    fn test_threads_are_named() {
        let pool = WorkerPool::with_config(PoolConfig {
            workers: 1,
            thread_name_prefix: "probe".to_string(),
            block_parallelism: None,
        })
        .unwrap();
        let name = pool.install(|| std::thread::current().name().map(str::to_string));
        assert_eq!(name.as_deref(), Some("probe-0"));
    }
}
