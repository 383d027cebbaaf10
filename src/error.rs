//! Crate-wide error types.
//!
//! `ReadError` and `DetectionError` are terminal and surface to the
//! caller; `ParseError` and `RenderError` are recovered locally and
//! never escape the public stream interfaces (they are converted to
//! `Error` events instead).

use serde_json::Value;

use crate::vendor::Vendor;

/// A failure reading the underlying byte source. Terminal.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Auto-detection could not select a vendor parser. Terminal; surfaces
/// before any events are emitted.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no vendor parser matched the sampled input")]
    NoMatch,
    #[error("best candidate confidence {best:.2} did not meet the floor {floor:.2}")]
    LowConfidence { best: f64, floor: f64 },
}

/// A single line could not be parsed by the selected vendor parser.
/// Recovered locally: the driver converts this into an `Error` event
/// and continues processing.
#[derive(Debug, thiserror::Error, Clone)]
#[error("{vendor:?} parser failed on line {line_number}: {cause}")]
pub struct ParseError {
    pub vendor: Vendor,
    pub line_number: usize,
    pub line: String,
    pub cause: String,
    /// Optional structured context for debug diagnostics.
    pub context: Option<Value>,
}

/// An internal rendering failure. Isolated: the offending event is
/// skipped and an `Error` event is substituted in its output position.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
}
