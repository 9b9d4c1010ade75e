//! Error types for editing sessions.
//!
//! Lower-layer errors are wrapped rather than flattened so callers can still
//! match on the document or reader failure that caused them.

use std::path::PathBuf;

use qcumber_document::{DocumentError, NodeId, ReadError};
use thiserror::Error;

/// Errors raised by session operations.
#[derive(Debug, Error)]
pub enum EditorError {
    /// An invalid configuration value was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A feature file was read but is not a feature.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File being read.
        path: PathBuf,
        /// Reader failure.
        #[source]
        source: ReadError,
    },

    /// A tree edit was rejected.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The node handle does not refer to a live node.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The feature has no associated file to save to.
    #[error("feature {0} has no associated file")]
    MissingFile(NodeId),

    /// Serialised text was rejected by the Gherkin parser.
    #[error("invalid Gherkin: {0}")]
    Gherkin(#[from] gherkin::ParseError),
}
