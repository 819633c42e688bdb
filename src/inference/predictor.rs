//! Forest scoring over a data store.
//!
//! Rows are scored in blocks; within a row, tree contributions are added in
//! tree order starting from the base score, so the result of a row never
//! depends on how blocks are spread over threads.

use ndarray::{Array1, Array2};

use crate::data::DataStore;
use crate::error::{Error, Result};
use crate::repr::Forest;
use crate::utils::{Parallelism, WorkerPool};

use super::traversal::{ColumnBinding, CompiledTree};

/// Rows per work item.
pub const DEFAULT_BLOCK_SIZE: usize = 256;

/// A forest bound to one store, ready to score its rows.
#[derive(Debug)]
pub struct Predictor<'a> {
    forest: &'a Forest,
    binding: ColumnBinding<'a>,
    trees: Vec<CompiledTree>,
    block_size: usize,
}

impl<'a> Predictor<'a> {
    /// Bind the features the forest splits on and compile its trees.
    pub fn new(forest: &'a Forest, store: &'a DataStore) -> Result<Self> {
        let binding = ColumnBinding::bind(store, forest.features(), &forest.used_features())?;
        let trees = forest
            .trees()
            .iter()
            .map(|tree| CompiledTree::compile(tree, &binding))
            .collect();
        Ok(Self {
            forest,
            binding,
            trees,
            block_size: DEFAULT_BLOCK_SIZE,
        })
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.binding.n_rows()
    }

    /// Score every row with all trees.
    pub fn predict(&self, parallelism: Parallelism) -> Array1<f64> {
        let shrinkage = self.forest.shrinkage();
        let mut out = vec![self.forest.base_score(); self.n_rows()];
        parallelism.maybe_par_chunks_mut(&mut out, self.block_size, |start, block| {
            for tree in &self.trees {
                for (i, score) in block.iter_mut().enumerate() {
                    *score += shrinkage * tree.score(&self.binding, start + i);
                }
            }
        });
        Array1::from(out)
    }

    /// Scores using only the first `k` trees, for each requested `k`.
    ///
    /// Output row `i` belongs to `checkpoints[i]`. Checkpoints are processed
    /// ascending and each one continues from the previous partial sums.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if a checkpoint exceeds the number of trees.
    pub fn predict_at_checkpoints(&self, checkpoints: &[usize], parallelism: Parallelism) -> Result<Array2<f64>> {
        let n_trees = self.trees.len();
        if let Some(&bad) = checkpoints.iter().find(|&&k| k > n_trees) {
            return Err(Error::validation(format!(
                "checkpoint {bad} exceeds the forest size {n_trees}"
            )));
        }
        let mut sorted: Vec<usize> = checkpoints.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let n_rows = self.n_rows();
        let shrinkage = self.forest.shrinkage();
        let n_blocks = n_rows.div_ceil(self.block_size);

        // Per block: one row of partial sums per sorted checkpoint.
        let blocks = parallelism.maybe_par_map(0..n_blocks, |b| {
            let start = b * self.block_size;
            let end = (start + self.block_size).min(n_rows);
            let mut acc = vec![self.forest.base_score(); end - start];
            let mut snapshots = Vec::with_capacity(sorted.len());
            let mut done = 0;
            for &k in &sorted {
                for tree in &self.trees[done..k] {
                    for (i, score) in acc.iter_mut().enumerate() {
                        *score += shrinkage * tree.score(&self.binding, start + i);
                    }
                }
                done = k;
                snapshots.push(acc.clone());
            }
            snapshots
        });

        let mut out = Array2::zeros((checkpoints.len(), n_rows));
        for (b, snapshots) in blocks.iter().enumerate() {
            let start = b * self.block_size;
            for (out_row, k) in checkpoints.iter().enumerate() {
                // `sorted` holds every requested checkpoint.
                let pos = sorted.partition_point(|&s| s < *k);
                for (i, &v) in snapshots[pos].iter().enumerate() {
                    out[[out_row, start + i]] = v;
                }
            }
        }
        Ok(out)
    }
}

/// Scoring methods.
impl Forest {
    /// Score every row of `store`.
    ///
    /// Only the features that some split uses need to be present.
    ///
    /// # Example
    ///
    /// ```
    /// use gbforest::data::DataStore;
    /// use gbforest::repr::Forest;
    /// use gbforest::training::TrainingConfig;
    ///
    /// let forest = Forest::new(TrainingConfig::default(), 0.5).unwrap();
    /// let mut store = DataStore::new();
    /// store.add_raw_float_column("x", vec![1.0, 2.0]).unwrap();
    /// assert_eq!(forest.predict(&store).unwrap().to_vec(), vec![0.5, 0.5]);
    /// ```
    pub fn predict(&self, store: &DataStore) -> Result<Array1<f64>> {
        let predictor = Predictor::new(self, store)?;
        WorkerPool::new(self.config().num_threads)?.install(|parallelism| Ok(predictor.predict(parallelism)))
    }

    /// Scores at several prefix lengths, `checkpoints.len() x n_rows`.
    ///
    /// Row `i` equals `self.truncated(checkpoints[i])?.predict(store)?`.
    pub fn predict_at_checkpoints(&self, store: &DataStore, checkpoints: &[usize]) -> Result<Array2<f64>> {
        let predictor = Predictor::new(self, store)?;
        WorkerPool::new(self.config().num_threads)?
            .install(|parallelism| predictor.predict_at_checkpoints(checkpoints, parallelism))
    }
}
