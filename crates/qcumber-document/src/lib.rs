//! Feature-tree model and Gherkin serialisation for qcumber.
//!
//! A [`Document`] holds features built from [`Node`]s: backgrounds,
//! scenarios, steps (optionally with a [`Table`]) and comments. The
//! [`FeatureWriter`] renders a tree as canonical feature-file text and the
//! [`FeatureReader`] reads such text back, tolerating anything it does not
//! understand.

mod errors;
mod reader;
mod table;
mod tags;
mod tree;
mod writer;

pub use errors::{DocumentError, ReadError, TableError};
pub use reader::{FeatureRead, FeatureReader, ReadWarning, ReadWarningKind};
pub use table::Table;
pub use tags::{
    NEGATION_PREFIX, RunTagSelection, RunTagState, extend_tag_set, negated_tag, normalize_tag,
    normalize_tags, parse_tag_line,
};
pub use tree::{
    Document, Node, NodeId, NodeKind, TEMPLATE_FEATURE_TITLE, TEMPLATE_SCENARIO_TITLE,
};
pub use writer::FeatureWriter;
