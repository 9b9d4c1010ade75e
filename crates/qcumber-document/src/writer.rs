//! Canonical feature-file writer.
//!
//! Output uses a two-space indent unit: features at column 0, blocks at two
//! spaces, steps and block comments at four, table rows at six. Children of a
//! feature are separated by one blank line and the text ends with exactly one
//! newline.

use qcumber_patterns::Language;

use crate::errors::DocumentError;
use crate::tree::{Document, Node, NodeId, NodeKind};

const BLOCK_INDENT: &str = "  ";
const STEP_INDENT: &str = "    ";
const TABLE_INDENT: &str = "      ";

/// Serialises feature trees in one language.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureWriter {
    language: Language,
}

impl FeatureWriter {
    /// A writer using the keywords of `language`.
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Serialise any node.
    ///
    /// Features produce a whole file. A scenario is wrapped in its feature's
    /// header and background so it can be run on its own. Backgrounds, steps
    /// and comments produce bare fragments.
    ///
    /// # Errors
    /// Returns [`DocumentError::UnknownNode`] for stale handles.
    pub fn write_node(&self, doc: &Document, id: NodeId) -> Result<String, DocumentError> {
        let node = doc.get(id)?;
        let mut out = String::new();
        match node.kind() {
            NodeKind::Feature => self.feature(doc, id, node, &mut out),
            NodeKind::Scenario => self.scenario_in_context(doc, id, node, &mut out),
            NodeKind::Background => self.block(doc, id, node, &mut out),
            NodeKind::Step => Self::step(node, &mut out),
            NodeKind::Comment => {
                let in_block = doc
                    .parent(id)
                    .and_then(|parent| doc.node(parent))
                    .is_some_and(|parent| parent.kind() != NodeKind::Feature);
                let indent = if in_block { STEP_INDENT } else { BLOCK_INDENT };
                push_comment(&mut out, indent, node.title());
            }
        }
        Ok(out)
    }

    /// Serialise a feature as a complete file.
    ///
    /// # Errors
    /// Returns [`DocumentError::UnknownNode`] for stale handles.
    ///
    /// # Examples
    /// ```
    /// use qcumber_document::{Document, FeatureWriter, Node};
    ///
    /// let mut doc = Document::new();
    /// let feature = doc.add_feature(Node::feature("Basket").with_tags(["smoke"]))?;
    /// let scenario = doc.add_child(feature, Node::scenario("Eating"), None)?;
    /// doc.add_child(scenario, Node::step("Given I have 3 cucumbers"), None)?;
    ///
    /// let text = FeatureWriter::default().write_feature(&doc, feature)?;
    /// assert_eq!(
    ///     text,
    ///     "@smoke\nFeature: Basket\n\n  Scenario: Eating\n    Given I have 3 cucumbers\n"
    /// );
    /// # Ok::<(), qcumber_document::DocumentError>(())
    /// ```
    pub fn write_feature(&self, doc: &Document, feature: NodeId) -> Result<String, DocumentError> {
        let node = doc.get(feature)?;
        if node.kind() != NodeKind::Feature {
            return Err(DocumentError::UnsupportedAttribute {
                kind: node.kind(),
                attribute: "a feature file",
            });
        }
        let mut out = String::new();
        self.feature(doc, feature, node, &mut out);
        Ok(out)
    }

    fn feature(&self, doc: &Document, id: NodeId, node: &Node, out: &mut String) {
        self.feature_header(node, out);
        for line in node.description() {
            push_line(out, BLOCK_INDENT, line.trim());
        }
        for child_id in doc.children(id) {
            let Some(child) = doc.node(*child_id) else {
                continue;
            };
            debug_assert!(
                NodeKind::Feature.can_contain(child.kind()),
                "{} {child_id} inside a feature",
                child.kind()
            );
            out.push('\n');
            match child.kind() {
                NodeKind::Background | NodeKind::Scenario => self.block(doc, *child_id, child, out),
                NodeKind::Comment => push_comment(out, BLOCK_INDENT, child.title()),
                NodeKind::Feature | NodeKind::Step => {}
            }
        }
    }

    fn feature_header(&self, node: &Node, out: &mut String) {
        if let Some(comment) = node.comment_text() {
            push_comment(out, "", comment);
        }
        push_tags(out, "", node.tags());
        push_header(out, "", self.language.feature(), node.title());
    }

    fn scenario_in_context(&self, doc: &Document, id: NodeId, node: &Node, out: &mut String) {
        let feature = doc.parent(id).and_then(|parent| doc.node(parent).map(|n| (parent, n)));
        if let Some((feature_id, feature)) = feature {
            self.feature_header(feature, out);
            out.push('\n');
            let background = doc
                .background_of(feature_id)
                .and_then(|background| doc.node(background).map(|n| (background, n)));
            if let Some((background_id, background)) = background {
                self.block(doc, background_id, background, out);
                out.push('\n');
            }
        }
        self.block(doc, id, node, out);
    }

    fn block(&self, doc: &Document, id: NodeId, node: &Node, out: &mut String) {
        if let Some(comment) = node.comment_text() {
            push_comment(out, BLOCK_INDENT, comment);
        }
        let keyword = if node.kind() == NodeKind::Background {
            self.language.background()
        } else {
            push_tags(out, BLOCK_INDENT, node.tags());
            self.language.scenario()
        };
        push_header(out, BLOCK_INDENT, keyword, node.title());
        for child_id in doc.children(id) {
            let Some(child) = doc.node(*child_id) else {
                continue;
            };
            debug_assert!(
                node.kind().can_contain(child.kind()),
                "{} {child_id} inside a {}",
                child.kind(),
                node.kind()
            );
            match child.kind() {
                NodeKind::Step => Self::step(child, out),
                NodeKind::Comment => push_comment(out, STEP_INDENT, child.title()),
                NodeKind::Feature | NodeKind::Background | NodeKind::Scenario => {}
            }
        }
    }

    fn step(node: &Node, out: &mut String) {
        if let Some(comment) = node.comment_text() {
            push_comment(out, STEP_INDENT, comment);
        }
        push_line(out, STEP_INDENT, node.title().trim());
        if let Some(table) = node.table() {
            for row in table.render_rows(TABLE_INDENT) {
                out.push_str(&row);
                out.push('\n');
            }
        }
    }
}

fn push_line(out: &mut String, indent: &str, text: &str) {
    out.push_str(indent);
    out.push_str(text);
    out.push('\n');
}

fn push_header(out: &mut String, indent: &str, keyword: &str, title: &str) {
    out.push_str(indent);
    out.push_str(keyword);
    out.push(':');
    let title = title.trim();
    if !title.is_empty() {
        out.push(' ');
        out.push_str(title);
    }
    out.push('\n');
}

fn push_tags(out: &mut String, indent: &str, tags: &[String]) {
    if !tags.is_empty() {
        push_line(out, indent, &tags.join(" "));
    }
}

fn push_comment(out: &mut String, indent: &str, comment: &str) {
    for line in comment.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            push_line(out, indent, line);
        } else if line.is_empty() {
            push_line(out, indent, "#");
        } else {
            push_line(out, indent, &format!("# {line}"));
        }
    }
}
