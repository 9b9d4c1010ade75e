//! Arena-backed feature tree.
//!
//! A [`Document`] owns every node; nodes refer to their parent and children
//! through [`NodeId`] handles. Slots of removed nodes are never reused, so a
//! stale handle resolves to nothing instead of to an unrelated node.
//!
//! Nesting rules:
//!
//! - a feature holds backgrounds (at most one), scenarios and comments;
//! - backgrounds and scenarios hold steps and comments;
//! - steps and comments are leaves.
//!
//! Every mutator checks these rules and rejects violating edits with a
//! [`DocumentError`], so no sequence of edits produces an invalid tree.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use qcumber_patterns::{MatchResult, PatternSet};
use tracing::debug;

use crate::errors::DocumentError;
use crate::table::Table;
use crate::tags::{extend_tag_set, normalize_tag, normalize_tags};

/// Title given to features created from the template.
pub const TEMPLATE_FEATURE_TITLE: &str = "New Feature";
/// Title given to the scenario inside a template feature.
pub const TEMPLATE_SCENARIO_TITLE: &str = "New Scenario";

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node's slot in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kinds of node a feature tree is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A feature file's root.
    Feature,
    /// Steps shared by every scenario of a feature.
    Background,
    /// A scenario.
    Scenario,
    /// A free-standing comment.
    Comment,
    /// A step line.
    Step,
}

impl NodeKind {
    /// Whether a node of this kind may own a child of kind `child`.
    #[must_use]
    pub fn can_contain(self, child: Self) -> bool {
        match self {
            Self::Feature => matches!(child, Self::Background | Self::Scenario | Self::Comment),
            Self::Background | Self::Scenario => matches!(child, Self::Step | Self::Comment),
            Self::Comment | Self::Step => false,
        }
    }

    fn carries_tags(self) -> bool {
        matches!(self, Self::Feature | Self::Scenario)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Feature => "feature",
            Self::Background => "background",
            Self::Scenario => "scenario",
            Self::Comment => "comment",
            Self::Step => "step",
        })
    }
}

/// One node of the feature tree.
///
/// Build nodes with the kind constructors and `with_*` methods, then insert
/// them with [`Document::add_feature`] or [`Document::add_child`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    title: String,
    comment: Option<String>,
    tags: Vec<String>,
    description: Vec<String>,
    path: Option<PathBuf>,
    table: Option<Table>,
    match_result: MatchResult,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            comment: None,
            tags: Vec::new(),
            description: Vec::new(),
            path: None,
            table: None,
            match_result: MatchResult::unmatched(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// A feature with the given title.
    #[must_use]
    pub fn feature(title: impl Into<String>) -> Self {
        Self::new(NodeKind::Feature, title)
    }

    /// An untitled background.
    #[must_use]
    pub fn background() -> Self {
        Self::new(NodeKind::Background, "")
    }

    /// A scenario with the given title.
    #[must_use]
    pub fn scenario(title: impl Into<String>) -> Self {
        Self::new(NodeKind::Scenario, title)
    }

    /// A step; `text` includes the keyword, e.g. `Given I have 3 cucumbers`.
    #[must_use]
    pub fn step(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Step, text)
    }

    /// A comment node holding one or more lines.
    #[must_use]
    pub fn comment(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Comment, text)
    }

    /// Set the title (for backgrounds the optional name after the keyword).
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Attach comment lines written before the node.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Attach tags, normalised to `@tag` form without repeats.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    /// Attach free-text description lines (features only).
    #[must_use]
    pub fn with_description<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.description = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Associate the feature with a file.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach a table (steps only).
    #[must_use]
    pub fn with_table(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }

    /// The node kind.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Title, step text or comment text.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Comment lines preceding the node.
    #[must_use]
    pub fn comment_text(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Normalised tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Feature description lines.
    #[must_use]
    pub fn description(&self) -> &[String] {
        &self.description
    }

    /// File associated with a feature.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The step's table.
    #[must_use]
    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// Outcome of the last match of a step against the pattern set.
    #[must_use]
    pub fn match_result(&self) -> &MatchResult {
        &self.match_result
    }

    /// Whether the step matched a pattern.
    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.match_result.matched
    }

    /// The parent node; `None` for features.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in serialisation order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn check_attributes(&self) -> Result<(), DocumentError> {
        let unsupported = |attribute| DocumentError::UnsupportedAttribute {
            kind: self.kind,
            attribute,
        };
        if !self.tags.is_empty() && !self.kind.carries_tags() {
            return Err(unsupported("tags"));
        }
        if self.table.is_some() && self.kind != NodeKind::Step {
            return Err(unsupported("a table"));
        }
        if self.kind != NodeKind::Feature && !self.description.is_empty() {
            return Err(unsupported("a description"));
        }
        if self.kind != NodeKind::Feature && self.path.is_some() {
            return Err(unsupported("a file path"));
        }
        Ok(())
    }

    /// A copy with no links and no file, so two features never share a path.
    fn detached(&self) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            path: None,
            ..self.clone()
        }
    }
}

/// An editable collection of feature trees.
///
/// Removed slots are not reclaimed: the arena grows across edits and
/// re-imports until [`Document::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    features: Vec<NodeId>,
}

impl Document {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A document holding one "New Feature" with one "New Scenario".
    ///
    /// # Examples
    /// ```
    /// use qcumber_document::Document;
    ///
    /// let doc = Document::template();
    /// let feature = doc.features()[0];
    /// assert_eq!(doc.node(feature).map(|n| n.title()), Some("New Feature"));
    /// assert_eq!(doc.children(feature).len(), 1);
    /// ```
    #[must_use]
    pub fn template() -> Self {
        let mut doc = Self::new();
        doc.add_template_feature(None);
        doc
    }

    /// Append a template feature and return its id.
    pub fn add_template_feature(&mut self, path: Option<PathBuf>) -> NodeId {
        let mut feature = Node::feature(TEMPLATE_FEATURE_TITLE);
        feature.path = path;
        let feature_id = self.insert(None, feature, None);
        self.insert(
            Some(feature_id),
            Node::scenario(TEMPLATE_SCENARIO_TITLE),
            None,
        );
        feature_id
    }

    /// Root features in document order.
    #[must_use]
    pub fn features(&self) -> &[NodeId] {
        &self.features
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Whether the document holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Drop every node and release the arena. Every handle becomes stale.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.features.clear();
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Look up a node, failing for stale handles.
    ///
    /// # Errors
    /// Returns [`DocumentError::UnknownNode`] when `id` is not live.
    pub fn get(&self, id: NodeId) -> Result<&Node, DocumentError> {
        self.node(id).ok_or(DocumentError::UnknownNode(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, DocumentError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(DocumentError::UnknownNode(id))
    }

    /// The parent of `id`.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Children of `id`; empty for leaves and stale handles.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Append a feature.
    ///
    /// # Errors
    /// Fails when `feature` is not a feature node or carries attributes its
    /// kind does not support.
    pub fn add_feature(&mut self, feature: Node) -> Result<NodeId, DocumentError> {
        if feature.kind != NodeKind::Feature {
            return Err(DocumentError::InvalidNesting {
                parent: NodeKind::Feature,
                child: feature.kind,
            });
        }
        feature.check_attributes()?;
        Ok(self.insert(None, feature.detached(), None))
    }

    /// Insert `node` under `parent` at `position` (appended when `None`,
    /// clamped to the child count otherwise).
    ///
    /// # Errors
    /// Fails for stale parents, disallowed nesting, a second background or
    /// attributes the node's kind does not support.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        node: Node,
        position: Option<usize>,
    ) -> Result<NodeId, DocumentError> {
        self.check_placement(parent, node.kind, None)?;
        node.check_attributes()?;
        Ok(self.insert(Some(parent), node.detached(), position))
    }

    /// Remove `child` and its whole subtree from `parent`.
    ///
    /// # Errors
    /// Fails when `child` is not currently a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        let siblings = &mut self.get_mut(parent)?.children;
        let Some(index) = siblings.iter().position(|id| *id == child) else {
            return Err(DocumentError::NotAChild { parent, child });
        };
        siblings.remove(index);
        self.free_subtree(child);
        Ok(())
    }

    /// Remove a feature and everything below it.
    ///
    /// # Errors
    /// Fails when `feature` is not a root feature of this document.
    pub fn remove_feature(&mut self, feature: NodeId) -> Result<(), DocumentError> {
        let Some(index) = self.features.iter().position(|id| *id == feature) else {
            return Err(DocumentError::UnknownNode(feature));
        };
        self.features.remove(index);
        self.free_subtree(feature);
        Ok(())
    }

    /// Re-parent `child` under `new_parent` at `position`.
    ///
    /// # Errors
    /// Fails for features, moves into the node's own subtree and placements
    /// [`Document::add_child`] would reject.
    pub fn move_child(
        &mut self,
        child: NodeId,
        new_parent: NodeId,
        position: Option<usize>,
    ) -> Result<(), DocumentError> {
        let node = self.get(child)?;
        let Some(old_parent) = node.parent else {
            return Err(DocumentError::NestedFeature);
        };
        if self.ancestors(new_parent).any(|id| id == child) {
            return Err(DocumentError::CyclicMove(child));
        }
        self.check_placement(new_parent, node.kind, Some(child))?;

        self.get_mut(old_parent)?.children.retain(|id| *id != child);
        let siblings = &mut self.get_mut(new_parent)?.children;
        let index = position.map_or(siblings.len(), |p| p.min(siblings.len()));
        siblings.insert(index, child);
        self.get_mut(child)?.parent = Some(new_parent);
        Ok(())
    }

    /// Copy the subtree rooted at `id` and insert the copy right after the
    /// original.
    ///
    /// A copied feature is not associated with any file; give it one with
    /// [`Document::set_path`] before saving.
    ///
    /// # Errors
    /// Fails for stale handles and for backgrounds, which may not repeat.
    pub fn duplicate_subtree(&mut self, id: NodeId) -> Result<NodeId, DocumentError> {
        let node = self.get(id)?;
        let parent = node.parent;
        if node.kind == NodeKind::Background {
            return Err(DocumentError::DuplicateBackground(parent.unwrap_or(id)));
        }
        let siblings = parent.map_or(self.features.as_slice(), |p| self.children(p));
        let position = siblings.iter().position(|sibling| *sibling == id).map(|i| i + 1);
        Ok(self.copy_into(id, parent, position))
    }

    fn copy_into(&mut self, source: NodeId, parent: Option<NodeId>, position: Option<usize>) -> NodeId {
        let Some(node) = self.node(source) else {
            return source;
        };
        let children = node.children.clone();
        let copy = node.detached();
        let copy_id = self.insert(parent, copy, position);
        for child in children {
            self.copy_into(child, Some(copy_id), None);
        }
        copy_id
    }

    /// Every tag used on `id` and its descendants.
    #[must_use]
    pub fn tags_in_subtree(&self, id: NodeId) -> BTreeSet<String> {
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.node(node))
            .flat_map(|node| node.tags.iter().cloned())
            .collect()
    }

    /// Every tag used anywhere in the document.
    #[must_use]
    pub fn defined_tags(&self) -> BTreeSet<String> {
        self.features
            .iter()
            .flat_map(|feature| self.tags_in_subtree(*feature))
            .collect()
    }

    /// The background of `feature`, if it has one.
    #[must_use]
    pub fn background_of(&self, feature: NodeId) -> Option<NodeId> {
        self.children(feature).iter().copied().find(|child| {
            self.node(*child)
                .is_some_and(|node| node.kind == NodeKind::Background)
        })
    }

    /// The feature `id` belongs to (itself for features).
    #[must_use]
    pub fn feature_of(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).last()
    }

    /// `id` followed by its ancestors up to the root feature.
    fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).map(|_| id), |current| self.parent(*current))
    }

    /// `id` and every node below it, depth first.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            order.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// Steps below `id`, depth first.
    #[must_use]
    pub fn steps(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|node| self.node(*node).is_some_and(|n| n.kind == NodeKind::Step))
            .collect()
    }

    /// Every step in the document, depth first.
    #[must_use]
    pub fn all_steps(&self) -> Vec<NodeId> {
        self.features
            .iter()
            .flat_map(|feature| self.steps(*feature))
            .collect()
    }

    /// The feature associated with `path`.
    #[must_use]
    pub fn find_feature_by_path(&self, path: &Path) -> Option<NodeId> {
        self.features.iter().copied().find(|feature| {
            self.node(*feature)
                .and_then(Node::path)
                .is_some_and(|own| own == path)
        })
    }

    /// Replace a node's title, step text or comment text.
    ///
    /// Step match state is left untouched; use [`Document::set_step_text`]
    /// to re-match.
    ///
    /// # Errors
    /// Fails for stale handles.
    pub fn set_title(&mut self, id: NodeId, title: impl Into<String>) -> Result<(), DocumentError> {
        self.get_mut(id)?.title = title.into();
        Ok(())
    }

    /// Replace a step's text and match it against `patterns`.
    ///
    /// # Errors
    /// Fails for stale handles and non-step nodes.
    pub fn set_step_text(
        &mut self,
        id: NodeId,
        text: impl Into<String>,
        patterns: &PatternSet,
    ) -> Result<&MatchResult, DocumentError> {
        let node = self.get_mut(id)?;
        if node.kind != NodeKind::Step {
            return Err(DocumentError::UnsupportedAttribute {
                kind: node.kind,
                attribute: "step text",
            });
        }
        node.title = text.into();
        node.match_result = patterns.match_step(&node.title);
        Ok(&node.match_result)
    }

    /// Replace or clear the comment preceding a node.
    ///
    /// # Errors
    /// Fails for stale handles.
    pub fn set_comment(&mut self, id: NodeId, comment: Option<String>) -> Result<(), DocumentError> {
        self.get_mut(id)?.comment = comment;
        Ok(())
    }

    /// Replace a feature's description lines.
    ///
    /// # Errors
    /// Fails for stale handles and non-feature nodes.
    pub fn set_description(&mut self, id: NodeId, lines: Vec<String>) -> Result<(), DocumentError> {
        let node = self.feature_mut(id, "a description")?;
        node.description = lines;
        Ok(())
    }

    /// Associate a feature with a file.
    ///
    /// # Errors
    /// Fails for stale handles and non-feature nodes.
    pub fn set_path(&mut self, id: NodeId, path: Option<PathBuf>) -> Result<(), DocumentError> {
        let node = self.feature_mut(id, "a file path")?;
        node.path = path;
        Ok(())
    }

    fn feature_mut(&mut self, id: NodeId, attribute: &'static str) -> Result<&mut Node, DocumentError> {
        let node = self.get_mut(id)?;
        if node.kind == NodeKind::Feature {
            Ok(node)
        } else {
            Err(DocumentError::UnsupportedAttribute {
                kind: node.kind,
                attribute,
            })
        }
    }

    /// Add a tag to a feature or scenario.
    ///
    /// Returns `false` when the tag was blank or already present.
    ///
    /// # Errors
    /// Fails for stale handles and kinds without tags.
    pub fn add_tag(&mut self, id: NodeId, tag: &str) -> Result<bool, DocumentError> {
        let node = self.get_mut(id)?;
        if !node.kind.carries_tags() {
            return Err(DocumentError::UnsupportedAttribute {
                kind: node.kind,
                attribute: "tags",
            });
        }
        Ok(extend_tag_set(&mut node.tags, tag))
    }

    /// Remove a tag; returns whether it was present.
    ///
    /// # Errors
    /// Fails for stale handles.
    pub fn remove_tag(&mut self, id: NodeId, tag: &str) -> Result<bool, DocumentError> {
        let node = self.get_mut(id)?;
        let Some(formatted) = normalize_tag(tag) else {
            return Ok(false);
        };
        let before = node.tags.len();
        node.tags.retain(|existing| *existing != formatted);
        Ok(node.tags.len() != before)
    }

    /// Attach, replace or remove a step's table.
    ///
    /// # Errors
    /// Fails for stale handles and non-step nodes.
    pub fn set_table(&mut self, id: NodeId, table: Option<Table>) -> Result<(), DocumentError> {
        let node = self.get_mut(id)?;
        if node.kind != NodeKind::Step {
            return Err(DocumentError::UnsupportedAttribute {
                kind: node.kind,
                attribute: "a table",
            });
        }
        node.table = table;
        Ok(())
    }

    /// Mutable access to a step's table.
    #[must_use]
    pub fn table_mut(&mut self, id: NodeId) -> Option<&mut Table> {
        self.nodes.get_mut(id.0)?.as_mut()?.table.as_mut()
    }

    /// Re-match every step against `patterns`; returns how many matched.
    pub fn rematch_all(&mut self, patterns: &PatternSet) -> usize {
        let mut matched = 0;
        for node in self.nodes.iter_mut().flatten() {
            if node.kind == NodeKind::Step {
                node.match_result = patterns.match_step(&node.title);
                matched += usize::from(node.match_result.matched);
            }
        }
        debug!(matched, patterns = patterns.len(), "re-matched steps");
        matched
    }

    fn check_placement(
        &self,
        parent: NodeId,
        kind: NodeKind,
        moving: Option<NodeId>,
    ) -> Result<(), DocumentError> {
        let parent_kind = self.get(parent)?.kind;
        if kind == NodeKind::Feature {
            return Err(DocumentError::NestedFeature);
        }
        if !parent_kind.can_contain(kind) {
            return Err(DocumentError::InvalidNesting {
                parent: parent_kind,
                child: kind,
            });
        }
        if kind == NodeKind::Background
            && self
                .background_of(parent)
                .is_some_and(|existing| Some(existing) != moving)
        {
            return Err(DocumentError::DuplicateBackground(parent));
        }
        Ok(())
    }

    fn insert(&mut self, parent: Option<NodeId>, mut node: Node, position: Option<usize>) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = parent;
        self.nodes.push(Some(node));
        let siblings = match parent {
            Some(parent) => match self.nodes.get_mut(parent.0).and_then(Option::as_mut) {
                Some(parent_node) => &mut parent_node.children,
                None => return id,
            },
            None => &mut self.features,
        };
        let index = position.map_or(siblings.len(), |p| p.min(siblings.len()));
        siblings.insert(index, id);
        id
    }

    fn free_subtree(&mut self, id: NodeId) {
        for node in self.descendants(id) {
            if let Some(slot) = self.nodes.get_mut(node.0) {
                *slot = None;
            }
        }
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests build known-valid trees")]
mod tests {
    use super::*;
    use qcumber_patterns::{Language, StepPattern};

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let feature = doc
            .add_feature(Node::feature("Basket").with_tags(["smoke"]))
            .expect("feature");
        let scenario = doc
            .add_child(feature, Node::scenario("Eating").with_tags(["@slow", "wip"]), None)
            .expect("scenario");
        let step = doc
            .add_child(scenario, Node::step("Given I have 3 cucumbers"), None)
            .expect("step");
        (doc, feature, scenario, step)
    }

    #[test]
    fn rejects_invalid_nesting() {
        let (mut doc, feature, scenario, step) = sample();
        assert_eq!(
            doc.add_child(feature, Node::step("Given a step"), None),
            Err(DocumentError::InvalidNesting {
                parent: NodeKind::Feature,
                child: NodeKind::Step,
            })
        );
        assert_eq!(
            doc.add_child(scenario, Node::feature("Inner"), None),
            Err(DocumentError::NestedFeature)
        );
        assert!(matches!(
            doc.add_child(step, Node::comment("# note"), None),
            Err(DocumentError::InvalidNesting { .. })
        ));
        assert!(doc.add_feature(Node::scenario("Loose")).is_err());
    }

    #[test]
    fn allows_a_single_background() {
        let (mut doc, feature, _, _) = sample();
        let background = doc
            .add_child(feature, Node::background(), Some(0))
            .expect("first background");
        assert_eq!(doc.background_of(feature), Some(background));
        assert_eq!(
            doc.add_child(feature, Node::background(), None),
            Err(DocumentError::DuplicateBackground(feature))
        );
        assert_eq!(
            doc.duplicate_subtree(background),
            Err(DocumentError::DuplicateBackground(feature))
        );
    }

    #[test]
    fn rejects_attributes_the_kind_does_not_carry() {
        let (mut doc, _, scenario, step) = sample();
        assert!(matches!(
            doc.add_child(scenario, Node::comment("# x").with_table(Table::default()), None),
            Err(DocumentError::UnsupportedAttribute { attribute: "a table", .. })
        ));
        assert!(doc.add_tag(step, "@x").is_err());
        assert!(doc.set_table(scenario, Some(Table::default())).is_err());
        assert!(doc.set_description(scenario, vec!["text".into()]).is_err());
    }

    #[test]
    fn positions_are_clamped() {
        let (mut doc, _, scenario, step) = sample();
        let first = doc
            .add_child(scenario, Node::step("When I eat one"), Some(0))
            .expect("insert at front");
        let last = doc
            .add_child(scenario, Node::step("Then I have 2"), Some(99))
            .expect("insert past end");
        assert_eq!(doc.children(scenario), [first, step, last]);
        assert_eq!(doc.parent(first), Some(scenario));
    }

    #[test]
    fn removing_drops_the_whole_subtree() {
        let (mut doc, feature, scenario, step) = sample();
        assert_eq!(doc.len(), 3);
        doc.remove_child(feature, scenario).expect("remove scenario");
        assert!(doc.node(scenario).is_none());
        assert!(doc.node(step).is_none());
        assert_eq!(doc.len(), 1);
        assert_eq!(
            doc.remove_child(feature, scenario),
            Err(DocumentError::NotAChild {
                parent: feature,
                child: scenario
            })
        );
    }

    #[test]
    fn moving_keeps_a_single_owner() {
        let (mut doc, feature, scenario, step) = sample();
        let other = doc
            .add_child(feature, Node::scenario("Other"), None)
            .expect("second scenario");
        doc.move_child(step, other, None).expect("move step");
        assert!(doc.children(scenario).is_empty());
        assert_eq!(doc.children(other), [step]);
        assert_eq!(doc.parent(step), Some(other));
        assert_eq!(doc.move_child(feature, other, None), Err(DocumentError::NestedFeature));
        assert_eq!(doc.move_child(other, other, None), Err(DocumentError::CyclicMove(other)));
    }

    #[test]
    fn collects_tags() {
        let (mut doc, feature, scenario, _) = sample();
        let second = doc.add_feature(Node::feature("Other").with_tags(["@api"])).expect("feature");
        assert_eq!(
            doc.tags_in_subtree(scenario).into_iter().collect::<Vec<_>>(),
            ["@slow", "@wip"]
        );
        assert_eq!(doc.tags_in_subtree(feature).len(), 3);
        assert_eq!(
            doc.defined_tags().into_iter().collect::<Vec<_>>(),
            ["@api", "@slow", "@smoke", "@wip"]
        );
        assert!(doc.remove_tag(second, "api").expect("remove"));
        assert!(!doc.add_tag(scenario, "wip").expect("add"));
    }

    #[test]
    fn step_edits_rematch() {
        let (mut doc, feature, scenario, step) = sample();
        let patterns: PatternSet = vec![
            StepPattern::compile(r"I have (\d+) cucumbers", Language::English, Vec::new())
                .expect("pattern"),
        ]
        .into();
        assert_eq!(doc.rematch_all(&patterns), 1);
        assert_eq!(doc.get(step).expect("step").match_result().bound_values, ["3"]);

        let result = doc
            .set_step_text(step, "Given I have no cucumbers", &patterns)
            .expect("edit");
        assert!(!result.matched);
        assert!(doc.set_step_text(scenario, "x", &patterns).is_err());
        assert_eq!(doc.steps(feature), [step]);
        assert_eq!(doc.feature_of(step), Some(feature));
    }

    #[test]
    fn duplicates_subtrees_after_the_original() {
        let (mut doc, feature, scenario, step) = sample();
        doc.set_table(step, Some(Table::from_rows(vec![vec!["a"]])))
            .expect("table");
        let copy = doc.duplicate_subtree(scenario).expect("duplicate");
        assert_eq!(doc.children(feature), [scenario, copy]);
        let copied_step = doc.children(copy).first().copied().expect("copied step");
        assert_ne!(copied_step, step);
        assert_eq!(
            doc.get(copied_step).expect("node").table(),
            doc.get(step).expect("node").table()
        );

        let feature_copy = doc.duplicate_subtree(feature).expect("feature copy");
        assert_eq!(doc.features(), [feature, feature_copy]);
        assert_eq!(doc.steps(feature_copy).len(), 2);
    }

    #[test]
    fn duplicated_features_are_not_bound_to_the_file() {
        let mut doc = Document::new();
        let path = Path::new("features/a.feature");
        let feature = doc
            .add_feature(Node::feature("Files").with_path(path))
            .expect("feature");
        let copy = doc.duplicate_subtree(feature).expect("copy");
        assert_eq!(doc.get(copy).expect("copy").path(), None);
        assert_eq!(doc.find_feature_by_path(path), Some(feature));
        assert_eq!(doc.get(copy).expect("copy").title(), "Files");
    }

    #[test]
    fn removed_handles_stay_stale_after_new_inserts() {
        let (mut doc, feature, scenario, _) = sample();
        doc.remove_feature(feature).expect("remove");
        let replacement = doc.add_feature(Node::feature("Again")).expect("feature");
        assert_ne!(replacement, feature);
        assert_eq!(doc.get(scenario), Err(DocumentError::UnknownNode(scenario)));

        doc.clear();
        assert_eq!(doc.len(), 0);
        assert!(doc.node(replacement).is_none());
    }

    #[test]
    fn finds_features_by_path() {
        let mut doc = Document::new();
        let feature = doc
            .add_feature(Node::feature("Files").with_path("features/a.feature"))
            .expect("feature");
        assert_eq!(doc.find_feature_by_path(Path::new("features/a.feature")), Some(feature));
        assert_eq!(doc.find_feature_by_path(Path::new("features/b.feature")), None);
    }

    #[test]
    fn table_cells_are_editable_in_place() {
        let (mut doc, _, _, step) = sample();
        doc.set_table(step, Some(Table::default())).expect("table");
        doc.table_mut(step)
            .expect("table present")
            .set_cell(0, 1, "x")
            .expect("cell");
        assert_eq!(
            doc.get(step).expect("step").table().and_then(|t| t.cell(0, 1)),
            Some("x")
        );
    }
}
