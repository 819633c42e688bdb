//! Per-row gradient buffer.
//!
//! Gradients and hessians are stored interleaved, one [`GradPair`] per row, so
//! the histogram hot loop reads both values with a single load per row.

/// First and second derivative of the loss for one row.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradPair {
    pub grad: f64,
    pub hess: f64,
}

impl GradPair {
    #[inline]
    pub fn new(grad: f64, hess: f64) -> Self {
        Self { grad, hess }
    }
}

/// Gradient buffer covering every row of the training store.
///
/// # Example
///
/// ```
/// use gbforest::training::Gradients;
///
/// let mut buffer = Gradients::new(3);
/// buffer.set(0, -0.5, 1.0);
/// buffer.add(0, 0.25, 0.5);
///
/// let pair = buffer.get(0);
/// assert_eq!(pair.grad, -0.25);
/// assert_eq!(pair.hess, 1.5);
/// ```
#[derive(Debug, Clone)]
pub struct Gradients {
    pairs: Vec<GradPair>,
}

impl Gradients {
    /// Zeroed buffer for `n_rows` rows.
    pub fn new(n_rows: usize) -> Self {
        Self {
            pairs: vec![GradPair::default(); n_rows],
        }
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn get(&self, row: usize) -> GradPair {
        self.pairs[row]
    }

    #[inline]
    pub fn set(&mut self, row: usize, grad: f64, hess: f64) {
        self.pairs[row] = GradPair { grad, hess };
    }

    #[inline]
    pub fn add(&mut self, row: usize, grad: f64, hess: f64) {
        let pair = &mut self.pairs[row];
        pair.grad += grad;
        pair.hess += hess;
    }

    /// Reset every row to zero.
    pub fn reset(&mut self) {
        self.pairs.fill(GradPair::default());
    }

    #[inline]
    pub fn pairs(&self) -> &[GradPair] {
        &self.pairs
    }

    #[inline]
    pub fn pairs_mut(&mut self) -> &mut [GradPair] {
        &mut self.pairs
    }

    /// Sum of gradients and hessians over `rows`, accumulated in row order.
    pub fn sum(&self, rows: &[u32]) -> (f64, f64) {
        rows.iter().fold((0.0, 0.0), |(g, h), &r| {
            let pair = self.pairs[r as usize];
            (g + pair.grad, h + pair.hess)
        })
    }
}
