//! Unified error handling for the stopcast crate.
//!
//! Three of the four variants encode domain-specific validity rules:
//! - [`StopcastError::InvalidConfiguration`] is fatal and surfaced
//!   immediately (bad segmentation parameters).
//! - [`StopcastError::Encoding`] / [`StopcastError::Decoding`] are
//!   recoverable at the call site by treating the path as absent.
//! - [`StopcastError::NoFeasibleCandidates`] is recoverable and signals
//!   "report no in-time destinations" rather than aborting the pipeline.

use thiserror::Error;

/// Errors produced by the stopcast core.
#[derive(Debug, Error)]
pub enum StopcastError {
    /// Segmentation was asked to run with unusable parameters.
    #[error("invalid segmentation configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// A coordinate sequence could not be encoded as a polyline.
    #[error("polyline encoding failed: {reason}")]
    Encoding { reason: String },

    /// A polyline string could not be decoded back to coordinates.
    #[error("malformed polyline at byte {offset}: {reason}")]
    Decoding { offset: usize, reason: String },

    /// Every candidate was excluded before estimation, leaving an empty
    /// weighted pool. Callers should report "no in-time destinations"
    /// instead of computing an entropy over zero elements.
    #[error("no feasible candidates remain out of {candidate_count}")]
    NoFeasibleCandidates { candidate_count: usize },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, StopcastError>;
