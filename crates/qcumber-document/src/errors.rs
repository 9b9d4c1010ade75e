//! Error types for tree edits, table edits and feature-file reading.

use thiserror::Error;

use crate::tree::{NodeId, NodeKind};

/// Errors raised by tree mutators when an edit would break the nesting rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The handle does not refer to a live node.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The child kind may not be placed under the parent kind.
    #[error("a {child} cannot be placed inside a {parent}")]
    InvalidNesting {
        /// Kind of the would-be parent.
        parent: NodeKind,
        /// Kind of the rejected child.
        child: NodeKind,
    },

    /// Features are roots and never have a parent.
    #[error("a feature cannot be placed inside another node")]
    NestedFeature,

    /// The feature already has a background.
    #[error("feature {0} already has a background")]
    DuplicateBackground(NodeId),

    /// The node is not a child of the given parent.
    #[error("node {child} is not a child of {parent}")]
    NotAChild {
        /// The expected parent.
        parent: NodeId,
        /// The node that was not found among its children.
        child: NodeId,
    },

    /// A node cannot be moved below itself.
    #[error("node {0} cannot be moved into its own subtree")]
    CyclicMove(NodeId),

    /// Only the given kinds carry this attribute.
    #[error("a {kind} does not have {attribute}")]
    UnsupportedAttribute {
        /// Kind of the node the edit targeted.
        kind: NodeKind,
        /// The attribute the edit tried to set.
        attribute: &'static str,
    },

    /// A table edit failed.
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Errors raised by table edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The cell lies outside the table.
    #[error("cell ({row}, {column}) is outside a {rows}x{columns} table")]
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        column: usize,
        /// Current row count.
        rows: usize,
        /// Current column count.
        columns: usize,
    },

    /// Tables keep at least one row and one column.
    #[error("cannot remove the last {0} of a table")]
    LastLine(&'static str),
}

/// Fatal problems reading a feature file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// The text contains no feature header.
    #[error("no `{keyword}:` header found")]
    MissingFeature {
        /// The feature keyword of the active language.
        keyword: &'static str,
    },
}
