//! Error types for arrow configuration and region binding
//!
//! Only configuration can fail. The solver and renderers are total over
//! validated inputs.

use crate::tracker::Side;
use thiserror::Error;

/// A reference did not resolve to a usable surface element
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    #[error("{side} is not a valid element: '{reference}' matched nothing")]
    NotFound { side: Side, reference: String },

    /// Only raised under `MatchPolicy::Unique`
    #[error("{side} is ambiguous: '{reference}' matched {count} elements")]
    Ambiguous {
        side: Side,
        reference: String,
        count: usize,
    },

    /// The surface rejected the reference itself (e.g. a malformed selector)
    #[error("{side} reference '{reference}' is invalid: {reason}")]
    InvalidReference {
        side: Side,
        reference: String,
        reason: String,
    },
}

impl ResolutionError {
    pub fn side(&self) -> Side {
        match self {
            ResolutionError::NotFound { side, .. }
            | ResolutionError::Ambiguous { side, .. }
            | ResolutionError::InvalidReference { side, .. } => *side,
        }
    }
}

/// Option values rejected at configuration time
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionsError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("stretchMin ({min}) must not exceed stretchMax ({max})")]
    InvertedStretch { min: f64, max: f64 },

    #[error("unknown arrow type '{0}' (expected 'point' or 'box')")]
    UnknownType(String),

    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),

    #[error("attribute '{name}' expects a number, got '{value}'")]
    InvalidNumber { name: String, value: String },

    #[error("invalid configuration: {0}")]
    Malformed(String),
}

/// Any failure surfaced by `ArrowController::configure`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArrowError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Options(#[from] OptionsError),
}
