use thiserror::Error;

/// Per-element input validation failures.
///
/// These are raised at the scene boundary before any geometry runs. A bad
/// anchor or sector is skipped and reported in the layout outcome; it never
/// aborts the pass for the remaining elements.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("sector radius must be non-negative, got {radius}")]
    NegativeRadius { radius: f64 },

    #[error("non-finite coordinate in {context}")]
    NonFiniteCoordinate { context: String },

    #[error("label size {width}x{height} has no area")]
    DegenerateLabelSize { width: f64, height: f64 },

    #[error("element id must not be empty")]
    EmptyElementId,
}
