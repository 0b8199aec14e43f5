use thiserror::Error;

/// Caller contract violations raised by the query engine.
///
/// Expected edge cases are never errors: empty-set nearest-neighbor queries
/// yield `+INFINITY`, empty-set centroids yield `None`. Only malformed
/// parameters fail, and they fail fast.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum EngineError {
    #[error("radius must be non-negative, got {0}")]
    NegativeRadius(f64),

    #[error("grid edge length must be positive, got {0}")]
    NonPositiveEdge(f64),

    #[error("minimum separation must be non-negative, got {0}")]
    NegativeSeparation(f64),
}
