//! Recoverable failures of the catalog and resolver boundaries.
//!
//! None of these are fatal. The coordinator logs them, keeps the previous
//! catalog (or falls back to the sentinel embed URL) and carries on; they are
//! returned as values so callers and tests can tell the paths apart.

use std::fmt;

use thiserror::Error;

/// A catalog load that did not produce a new catalog.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LoadFailure {
    /// Connect error, timeout, unreadable file.
    #[error("catalog transport error: {0}")]
    Transport(String),

    /// Source answered with a non-success HTTP status.
    #[error("catalog source returned HTTP {0}")]
    HttpStatus(u16),

    /// Payload is not JSON (or not a JSON object).
    #[error("catalog document could not be decoded: {0}")]
    Decode(String),

    /// Payload decoded but failed shape validation.
    #[error("catalog document rejected: {0}")]
    Rejected(RejectReason),
}

/// Why a decoded listing document was not accepted.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RejectReason {
    /// `status` absent or not the number 200. Holds the raw marker text.
    #[error("status marker is {0}, expected 200")]
    BadStatus(String),

    #[error("data.items is missing")]
    MissingItems,

    #[error("data.items is empty")]
    EmptyItems,
}

/// A video reference that cannot be turned into an embed URL.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("invalid video reference {reference:?}: {reason}")]
    InvalidUrl {
        reference: Option<String>,
        reason: InvalidUrlReason,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidUrlReason {
    Absent,
    Malformed(String),
    MissingVideoId,
}

impl fmt::Display for InvalidUrlReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("no reference"),
            Self::Malformed(e) => write!(f, "not a URL ({})", e),
            Self::MissingVideoId => f.write_str("no `v` query parameter"),
        }
    }
}
