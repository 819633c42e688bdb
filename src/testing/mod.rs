//! Helpers shared by unit tests, integration tests and benchmarks.
//!
//! - [`data`]: seeded synthetic stores for regression, classification and
//!   ranking
//! - score assertions that report the first differing row

pub mod data;

/// Default tolerance for comparing scores of order 1.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Assert two score vectors match element-wise within `tolerance`.
///
/// # Panics
///
/// Panics on a length mismatch or on the first row that differs by more
/// than `tolerance`. Two NaNs compare equal.
pub fn assert_scores_approx_eq(actual: &[f64], expected: &[f64], tolerance: f64, context: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{context}: length mismatch - got {}, expected {}",
        actual.len(),
        expected.len()
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        if a.is_nan() && e.is_nan() {
            continue;
        }
        let diff = (a - e).abs();
        assert!(
            diff <= tolerance,
            "{context}[{i}]: {a} != {e} (diff={diff:e}, tolerance={tolerance:e})"
        );
    }
}

/// Assert two score vectors are bitwise identical.
pub fn assert_scores_identical(actual: &[f64], expected: &[f64], context: &str) {
    assert_eq!(actual.len(), expected.len(), "{context}: length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            a.to_bits() == e.to_bits(),
            "{context}[{i}]: {a} is not bitwise equal to {e}"
        );
    }
}
