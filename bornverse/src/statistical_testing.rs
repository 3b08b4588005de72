//! Test utilities for statistical assertions on sampled outcomes.
//!
//! Tolerances are relative: ±5% for high sample counts, ±10% for smaller
//! or higher-variance runs.

/// Tolerance for tests with many samples.
pub const TOLERANCE_HIGH_SAMPLES: f64 = 0.05;

/// Tolerance for tests with fewer samples or higher variance.
#[allow(dead_code)]
pub const TOLERANCE_LOW_SAMPLES: f64 = 0.10;

/// Assert that an observed event rate matches the expected probability
/// within a relative tolerance.
///
/// # Panics
///
/// Panics when the observed rate deviates by more than the tolerance.
#[allow(clippy::cast_precision_loss)]
pub fn assert_rate_within_tolerance(
    observed: usize,
    total: usize,
    expected_probability: f64,
    relative_tolerance: f64,
    context: &str,
) {
    let observed_rate = observed as f64 / total as f64;
    let lower = expected_probability * (1.0 - relative_tolerance);
    let upper = expected_probability * (1.0 + relative_tolerance);
    assert!(
        (lower..upper).contains(&observed_rate),
        "{context}: observed rate {observed_rate:.4} deviates from expected \
         {expected_probability:.4} by more than {:.0}%",
        relative_tolerance * 100.0
    );
}
