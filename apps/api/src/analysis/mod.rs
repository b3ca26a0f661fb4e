pub mod batch;
pub mod envelope;
pub mod fit;
pub mod gaps;
pub mod handlers;
pub mod heatmap;
pub mod levels;
pub mod operation;
pub mod prompts;
pub mod readiness;
pub mod service;

/// Rounds to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
