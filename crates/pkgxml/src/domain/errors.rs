//! Domain-specific errors.

use thiserror::Error;

/// Failure to turn manifest bytes into a [`TypeSet`](super::model::TypeSet).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("manifest is not valid UTF-8")]
    NotUtf8,
    #[error("malformed XML at byte {position}: {message}")]
    MalformedXml { position: u64, message: String },
    #[error("not a valid package manifest: {0}")]
    InvalidShape(#[from] ShapeError),
}

impl ManifestError {
    /// Malformed documents are surfaced to the user; shape errors are skipped quietly.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::NotUtf8 | Self::MalformedXml { .. })
    }
}

/// Well-formed XML that does not follow the `Package`/`types` layout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("unexpected root element <{0}>, expected <Package>")]
    UnexpectedRoot(String),
    #[error("<types> block without <name>")]
    MissingName,
    #[error("<types> block for {0} has more than one <name>")]
    DuplicateName(String),
    #[error("<types> block for {0} has no <members>")]
    NoMembers(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid selection at line {index}: {reason}")]
    InvalidSelection { index: usize, reason: &'static str },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid API version '{0}', expected a whole number such as 52 or 52.0")]
pub struct ApiVersionError(pub String);
