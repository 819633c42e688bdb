//! Common utilities used across the crate.
//!
//! This module provides the parallelism flag threaded through training and
//! scoring, and the thread pool setup used by the public entry points.

use std::sync::Arc;

use rayon::prelude::*;

use crate::error::Result;

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// Components receive this flag and pick rayon parallel iterators or plain
/// iterators accordingly. The thread pool itself is installed once per call
/// by [`run_with_threads`]; components never build pools of their own.
///
/// Switching between the two modes must never change numeric results: every
/// reduction in the crate runs in a fixed order that does not depend on the
/// number of workers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Parallelism {
    #[default]
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if the rayon pool has multiple threads)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map over an indexed collection, preserving input order in the output.
    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }

    /// Apply `f` to disjoint chunks of `out`, passing the chunk's start offset.
    #[inline]
    pub fn maybe_par_chunks_mut<T, F>(self, out: &mut [T], chunk_size: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync + Send,
    {
        let chunk_size = chunk_size.max(1);
        if self.is_parallel() {
            out.par_chunks_mut(chunk_size)
                .enumerate()
                .for_each(|(i, chunk)| f(i * chunk_size, chunk));
        } else {
            out.chunks_mut(chunk_size)
                .enumerate()
                .for_each(|(i, chunk)| f(i * chunk_size, chunk));
        }
    }
}

// =============================================================================
// Thread Pool Setup
// =============================================================================

/// Thread pool handle installed around each training or scoring step.
///
/// Thread count semantics:
/// - `0` = auto (use rayon's global pool)
/// - `1` = sequential (no thread pool)
/// - `n > 1` = a dedicated pool with exactly `n` threads
///
/// Cloning is cheap; clones share the same pool.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    pool: Option<Arc<rayon::ThreadPool>>,
    parallelism: Parallelism,
}

impl WorkerPool {
    /// Set up the pool for a thread count.
    pub fn new(n_threads: usize) -> Result<Self> {
        match n_threads {
            0 => Ok(Self {
                pool: None,
                parallelism: Parallelism::from_threads(0),
            }),
            1 => Ok(Self {
                pool: None,
                parallelism: Parallelism::Sequential,
            }),
            n => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
                Ok(Self {
                    pool: Some(Arc::new(pool)),
                    parallelism: Parallelism::Parallel,
                })
            }
        }
    }

    #[inline]
    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

    /// Run `f` inside the pool.
    pub fn install<T: Send>(&self, f: impl FnOnce(Parallelism) -> T + Send) -> T {
        let parallelism = self.parallelism;
        match &self.pool {
            Some(pool) => pool.install(|| f(parallelism)),
            None => f(parallelism),
        }
    }
}

/// Run a closure with the appropriate thread pool.
///
/// See [`WorkerPool`] for the thread count semantics.
///
/// # Example
///
/// ```
/// use gbforest::run_with_threads;
///
/// let total = run_with_threads(2, |_parallelism| 40 + 2).unwrap();
/// assert_eq!(total, 42);
/// ```
pub fn run_with_threads<T: Send>(
    n_threads: usize,
    f: impl FnOnce(Parallelism) -> T + Send,
) -> Result<T> {
    Ok(WorkerPool::new(n_threads)?.install(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_threads() {
        assert_eq!(Parallelism::from_threads(1), Parallelism::Sequential);
        assert_eq!(Parallelism::from_threads(4), Parallelism::Parallel);
    }

    #[test]
    fn test_maybe_par_map_preserves_order() {
        let items: Vec<usize> = (0..1000).collect();
        let seq = Parallelism::Sequential.maybe_par_map(items.clone(), |x| x * 2);
        let par = Parallelism::Parallel.maybe_par_map(items, |x| x * 2);
        assert_eq!(seq, par);
        assert_eq!(seq[999], 1998);
    }

    #[test]
    fn test_maybe_par_chunks_mut_offsets() {
        let mut out = vec![0usize; 10];
        Parallelism::Parallel.maybe_par_chunks_mut(&mut out, 3, |start, chunk| {
            for (i, v) in chunk.iter_mut().enumerate() {
                *v = start + i;
            }
        });
        assert_eq!(out, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_run_with_threads_sequential_and_pool() {
        let seq = run_with_threads(1, |p| p).unwrap();
        assert_eq!(seq, Parallelism::Sequential);

        let (par, threads) = run_with_threads(3, |p| (p, rayon::current_num_threads())).unwrap();
        assert_eq!(par, Parallelism::Parallel);
        assert_eq!(threads, 3);
    }
}
