//! Checkpointed score files.
//!
//! Scores at checkpoint `k` go to `{model_name}.{k}.score`, one value per
//! row, newline terminated, in the row order of the scored store.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::Array2;

use crate::error::{Error, Result};

/// Checkpoints `forest_size, forest_size - interval, ...` down to 1, ascending.
///
/// An interval of 0 yields just `forest_size`.
///
/// ```
/// use gbforest::io::scores::checkpoints_from_interval;
///
/// assert_eq!(checkpoints_from_interval(10, 4), vec![2, 6, 10]);
/// assert_eq!(checkpoints_from_interval(10, 0), vec![10]);
/// ```
pub fn checkpoints_from_interval(forest_size: usize, interval: usize) -> Vec<usize> {
    if interval == 0 {
        return vec![forest_size];
    }
    let mut points: Vec<usize> = (1..=forest_size).rev().step_by(interval).collect();
    points.reverse();
    points
}

/// Path of the score file for one checkpoint.
pub fn score_file_path(dir: impl AsRef<Path>, model_name: &str, checkpoint: usize) -> PathBuf {
    dir.as_ref().join(format!("{model_name}.{checkpoint}.score"))
}

/// Write one file per checkpoint; row `i` of `scores` belongs to
/// `checkpoints[i]`. Returns the written paths.
///
/// # Errors
///
/// [`Error::Validation`] if `scores` has a different number of rows than
/// there are checkpoints.
pub fn write_checkpoint_scores(
    dir: impl AsRef<Path>,
    model_name: &str,
    checkpoints: &[usize],
    scores: &Array2<f64>,
) -> Result<Vec<PathBuf>> {
    if scores.nrows() != checkpoints.len() {
        return Err(Error::validation(format!(
            "{} score rows for {} checkpoints",
            scores.nrows(),
            checkpoints.len()
        )));
    }
    let mut written = Vec::with_capacity(checkpoints.len());
    for (row, &checkpoint) in scores.rows().into_iter().zip(checkpoints) {
        let path = score_file_path(&dir, model_name, checkpoint);
        let mut out = BufWriter::new(File::create(&path)?);
        for value in row.iter() {
            writeln!(out, "{value}")?;
        }
        out.flush()?;
        log::info!("wrote {} scores to {}", row.len(), path.display());
        written.push(path);
    }
    Ok(written)
}
