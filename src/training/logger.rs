//! Training progress logging.
//!
//! Messages go through the `log` facade; the library never installs a logger.
//! [`Verbosity`] gates what is emitted on top of the facade's own filtering.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// How chatty training is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Nothing at all.
    Silent,
    /// Warnings only.
    Warning,
    /// Config, one line per tree, summary.
    #[default]
    Info,
    /// Adds per-tree structure details.
    Debug,
}

/// Per-iteration progress reporter.
#[derive(Debug)]
pub struct TrainingLogger {
    verbosity: Verbosity,
    started: Instant,
    first_loss: Option<f64>,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            started: Instant::now(),
            first_loss: None,
        }
    }

    #[inline]
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    #[inline]
    fn enabled(&self, level: Verbosity) -> bool {
        self.verbosity >= level
    }

    pub fn start_training(&mut self, n_trees: usize, n_rows: usize, n_features: usize, config: &impl std::fmt::Debug) {
        self.started = Instant::now();
        self.first_loss = None;
        if self.enabled(Verbosity::Info) {
            log::info!("training {n_trees} trees on {n_rows} rows x {n_features} features");
            log::info!("config: {config:?}");
        }
    }

    pub fn log_resume(&self, base_trees: usize) {
        if self.enabled(Verbosity::Info) {
            log::info!("resuming from base forest with {base_trees} trees");
        }
    }

    /// One line per tree: loss, relative reduction since the first tree, elapsed.
    pub fn log_iteration(&mut self, iteration: usize, loss: f64) {
        let first = *self.first_loss.get_or_insert(loss);
        if self.enabled(Verbosity::Info) {
            let reduced = if first != 0.0 {
                100.0 * (first - loss) / first
            } else {
                0.0
            };
            log::info!(
                "iteration {iteration}: loss={loss:.6}, reduced={reduced:.2}%, elapsed={:.3?}",
                self.started.elapsed()
            );
        }
    }

    pub fn log_tree(&self, iteration: usize, n_leaves: usize, n_sampled_rows: usize) {
        if self.enabled(Verbosity::Debug) {
            log::debug!("tree {iteration}: {n_leaves} leaves grown from {n_sampled_rows} rows");
        }
    }

    pub fn warn(&self, message: &str) {
        if self.enabled(Verbosity::Warning) {
            log::warn!("{message}");
        }
    }

    pub fn finish_training(&self, n_trees: usize) {
        if self.enabled(Verbosity::Info) {
            log::info!("finished {n_trees} trees in {:.3?}", self.started.elapsed());
        }
    }
}
