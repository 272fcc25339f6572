//! Error types for format adapters.

use thiserror::Error;

use crate::model::ModelError;
use crate::resolve::ResolutionError;

/// Errors that can occur while importing or exporting a foreign fixture
/// format.
///
/// Import errors are fatal for the one file being imported. Export-side
/// errors are wrapped in [`ExportFailure`](super::ExportFailure) per
/// fixture and never abort the rest of a batch.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Malformed foreign source.
    #[error("parse error: {0}")]
    Parse(String),

    /// XML parsing or serialization error.
    #[error("XML error: {0}")]
    Xml(String),

    /// ZIP archive error (GDTF containers).
    #[error("archive error: {0}")]
    Archive(String),

    /// Missing required element or attribute in the foreign source.
    #[error("missing required {kind}: {name}")]
    Missing { kind: &'static str, name: String },

    /// A cyclic `inherit_from` chain in an attribute table.
    #[error("attribute inheritance cycle involving `{0}`")]
    AttributeCycle(String),

    /// The format cannot import at all.
    #[error("{0} does not support importing")]
    ImportUnsupported(&'static str),

    /// The format cannot export at all.
    #[error("{0} does not support exporting")]
    ExportUnsupported(&'static str),

    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Inconsistent canonical model data.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Mode resolution failure.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// DMX value scaling failure.
    #[error(transparent)]
    Scale(#[from] crate::base::ScaleError),
}

impl FormatError {
    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }

    /// Create an archive error.
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive(message.into())
    }

    /// Create a missing element error.
    pub fn missing_element(name: impl Into<String>) -> Self {
        Self::Missing {
            kind: "element",
            name: name.into(),
        }
    }

    /// Create a missing attribute error.
    pub fn missing_attribute(name: impl Into<String>) -> Self {
        Self::Missing {
            kind: "attribute",
            name: name.into(),
        }
    }
}
