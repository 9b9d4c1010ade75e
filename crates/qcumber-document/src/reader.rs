//! Tolerant, line-oriented feature-file reader.
//!
//! The reader never aborts on unexpected input: lines it cannot place are
//! kept as comment nodes so no text is lost, and each such line is reported
//! as a [`ReadWarning`]. Only text without any feature header is rejected.
//!
//! Text produced by [`FeatureWriter`](crate::FeatureWriter) reads back into a
//! tree that writes out to the same text.

use std::fmt;
use std::path::PathBuf;

use qcumber_patterns::Language;
use tracing::debug;

use crate::errors::ReadError;
use crate::table::{Table, parse_row};
use crate::tags::{is_tag_line, parse_tag_line};
use crate::tree::{Document, Node, NodeId, NodeKind};

/// Comments indented less than this inside a block belong to the feature.
const BLOCK_COMMENT_INDENT: usize = 4;

/// Why a line was kept as a comment instead of being read as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadWarningKind {
    /// Text before the feature header.
    TextBeforeFeature,
    /// A line matching no known shape.
    UnrecognisedLine,
    /// A table row with no step above it.
    OrphanTableRow,
    /// A second feature header in the same file.
    DuplicateFeature,
    /// A second background in the same feature.
    DuplicateBackground,
    /// Tags placed above a background, which cannot carry tags.
    TagsBeforeBackground,
    /// Tags followed by something other than a feature or scenario.
    StrayTags,
    /// A step outside any background or scenario.
    StepOutsideBlock,
}

impl fmt::Display for ReadWarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TextBeforeFeature => "text before the feature header",
            Self::UnrecognisedLine => "unrecognised line",
            Self::OrphanTableRow => "table row without a step",
            Self::DuplicateFeature => "second feature header",
            Self::DuplicateBackground => "second background",
            Self::TagsBeforeBackground => "tags on a background",
            Self::StrayTags => "tags not followed by a feature or scenario",
            Self::StepOutsideBlock => "step outside a scenario or background",
        })
    }
}

/// A tolerated line, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadWarning {
    /// Line number in the input.
    pub line: usize,
    /// What was wrong with it.
    pub kind: ReadWarningKind,
}

impl fmt::Display for ReadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

/// The feature read from one text and the lines that needed tolerance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRead {
    /// The new feature's id.
    pub feature: NodeId,
    /// Tolerated lines in input order.
    pub warnings: Vec<ReadWarning>,
}

/// Reads feature files written in one language.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureReader {
    language: Language,
}

impl FeatureReader {
    /// A reader recognising the keywords of `language`.
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Read `text` into a fresh document.
    ///
    /// # Errors
    /// Returns [`ReadError::MissingFeature`] when the text has no feature
    /// header.
    ///
    /// # Examples
    /// ```
    /// use qcumber_document::{FeatureReader, FeatureWriter};
    ///
    /// let text = "Feature: Basket\n\n  Scenario: Eating\n    Given I have 3 cucumbers\n";
    /// let (doc, read) = FeatureReader::default().read(text)?;
    /// assert!(read.warnings.is_empty());
    /// assert_eq!(FeatureWriter::default().write_feature(&doc, read.feature).unwrap(), text);
    /// # Ok::<(), qcumber_document::ReadError>(())
    /// ```
    pub fn read(&self, text: &str) -> Result<(Document, FeatureRead), ReadError> {
        let mut doc = Document::new();
        let read = self.read_into(&mut doc, text, None)?;
        Ok((doc, read))
    }

    /// Read `text` as one more feature of `doc`, associated with `path`.
    ///
    /// Nothing is added to `doc` when reading fails.
    ///
    /// # Errors
    /// Returns [`ReadError::MissingFeature`] when the text has no feature
    /// header.
    pub fn read_into(
        &self,
        doc: &mut Document,
        text: &str,
        path: Option<PathBuf>,
    ) -> Result<FeatureRead, ReadError> {
        let mut state = ReadState::new(self.language, doc, path);
        for (index, line) in text.lines().enumerate() {
            state.line(index + 1, line);
        }
        state.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    ExpectFeature,
    InFeatureHeader,
    InBlock,
    InStepBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentLevel {
    Feature,
    Block,
}

struct ReadState<'a> {
    language: Language,
    doc: &'a mut Document,
    path: Option<PathBuf>,
    phase: Phase,
    feature: Option<NodeId>,
    block: Option<NodeId>,
    last_step: Option<NodeId>,
    comments: Vec<String>,
    comment_level: CommentLevel,
    tag_lines: Vec<(usize, String)>,
    warnings: Vec<ReadWarning>,
}

impl<'a> ReadState<'a> {
    fn new(language: Language, doc: &'a mut Document, path: Option<PathBuf>) -> Self {
        Self {
            language,
            doc,
            path,
            phase: Phase::ExpectFeature,
            feature: None,
            block: None,
            last_step: None,
            comments: Vec::new(),
            comment_level: CommentLevel::Feature,
            tag_lines: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn line(&mut self, number: usize, raw: &str) {
        let text = raw.trim();
        if text.is_empty() {
            if self.phase != Phase::ExpectFeature {
                self.flush_comments();
            }
            return;
        }
        let indent = raw.len() - raw.trim_start().len();

        if text.starts_with('#') {
            self.comment(indent, text);
        } else if let Some(title) = header(text, self.language.feature()) {
            self.feature_header(number, text, title);
        } else if let Some(title) = header(text, self.language.background()) {
            self.background_header(number, text, title);
        } else if let Some(title) = header(text, self.language.scenario()) {
            self.scenario_header(number, text, title);
        } else if is_tag_line(text) {
            self.last_step = None;
            self.tag_lines.push((number, text.to_string()));
        } else if let Some(cells) = parse_row(text) {
            self.table_row(number, text, cells);
        } else if self.language.split_step(text).is_some() {
            self.step(number, text);
        } else {
            self.free_text(number, text);
        }
    }

    fn comment(&mut self, indent: usize, text: &str) {
        self.last_step = None;
        let in_block = matches!(self.phase, Phase::InBlock | Phase::InStepBlock);
        let level = if in_block && indent >= BLOCK_COMMENT_INDENT {
            CommentLevel::Block
        } else {
            CommentLevel::Feature
        };
        if level != self.comment_level {
            self.flush_comments();
            self.comment_level = level;
        }
        if in_block && level == CommentLevel::Feature {
            self.block = None;
            self.phase = Phase::InFeatureHeader;
        }
        self.comments.push(text.to_string());
    }

    fn feature_header(&mut self, number: usize, text: &str, title: &str) {
        if self.feature.is_some() {
            self.tolerate(number, text, ReadWarningKind::DuplicateFeature);
            return;
        }
        let mut node = Node::feature(title).with_tags(self.take_tags());
        if let Some(comment) = self.take_comment() {
            node = node.with_comment(comment);
        }
        if let Some(path) = self.path.take() {
            node = node.with_path(path);
        }
        match self.doc.add_feature(node) {
            Ok(id) => {
                self.feature = Some(id);
                self.phase = Phase::InFeatureHeader;
                self.comment_level = CommentLevel::Feature;
            }
            Err(err) => debug!(error = %err, "feature header rejected"),
        }
    }

    fn background_header(&mut self, number: usize, text: &str, title: &str) {
        let Some(feature) = self.feature else {
            self.before_feature(number, text);
            return;
        };
        if self.doc.background_of(feature).is_some() {
            self.close_block();
            self.tolerate(number, text, ReadWarningKind::DuplicateBackground);
            return;
        }
        let tags = std::mem::take(&mut self.tag_lines);
        let comment = self.take_comment();
        for (line, tag_line) in tags {
            self.warn(line, ReadWarningKind::TagsBeforeBackground);
            self.add_comment_node(feature, tag_line);
        }
        let mut node = Node::background().with_title(title);
        if let Some(comment) = comment {
            node = node.with_comment(comment);
        }
        self.open_block(feature, node);
    }

    fn scenario_header(&mut self, number: usize, text: &str, title: &str) {
        let Some(feature) = self.feature else {
            self.before_feature(number, text);
            return;
        };
        let mut node = Node::scenario(title).with_tags(self.take_tags());
        if let Some(comment) = self.take_comment() {
            node = node.with_comment(comment);
        }
        self.open_block(feature, node);
    }

    fn open_block(&mut self, feature: NodeId, node: Node) {
        match self.doc.add_child(feature, node, None) {
            Ok(id) => {
                self.block = Some(id);
                self.phase = Phase::InBlock;
                self.comment_level = CommentLevel::Block;
                self.last_step = None;
            }
            Err(err) => debug!(error = %err, "block header rejected"),
        }
    }

    fn table_row(&mut self, number: usize, text: &str, cells: Vec<String>) {
        let Some(step) = self.last_step else {
            self.tolerate(number, text, ReadWarningKind::OrphanTableRow);
            return;
        };
        if let Some(table) = self.doc.table_mut(step) {
            table.push_row(cells);
            return;
        }
        if let Err(err) = self.doc.set_table(step, Some(Table::from_rows([cells]))) {
            debug!(error = %err, "table rejected");
        }
    }

    fn step(&mut self, number: usize, text: &str) {
        let Some(block) = self.block else {
            if self.feature.is_none() {
                self.before_feature(number, text);
            } else if self.accepts_description() {
                self.description(text);
            } else {
                self.tolerate(number, text, ReadWarningKind::StepOutsideBlock);
            }
            return;
        };
        self.flush_comments();
        self.flush_stray_tags(block);
        match self.doc.add_child(block, Node::step(text), None) {
            Ok(id) => {
                self.last_step = Some(id);
                self.phase = Phase::InStepBlock;
            }
            Err(err) => debug!(error = %err, "step rejected"),
        }
    }

    fn free_text(&mut self, number: usize, text: &str) {
        if self.feature.is_none() {
            self.before_feature(number, text);
        } else if self.accepts_description() {
            self.description(text);
        } else {
            if looks_like_header(text) {
                self.close_block();
            }
            self.tolerate(number, text, ReadWarningKind::UnrecognisedLine);
        }
    }

    /// Leave the current block so following steps are not adopted by it.
    fn close_block(&mut self) {
        self.flush_comments();
        self.block = None;
        self.phase = Phase::InFeatureHeader;
        self.comment_level = CommentLevel::Feature;
    }

    fn accepts_description(&self) -> bool {
        self.phase == Phase::InFeatureHeader
            && self.comments.is_empty()
            && self.tag_lines.is_empty()
            && self
                .feature
                .is_some_and(|feature| self.doc.children(feature).is_empty())
    }

    fn description(&mut self, text: &str) {
        let Some(feature) = self.feature else {
            return;
        };
        let mut lines = self
            .doc
            .node(feature)
            .map(|node| node.description().to_vec())
            .unwrap_or_default();
        lines.push(text.to_string());
        if let Err(err) = self.doc.set_description(feature, lines) {
            debug!(error = %err, "description rejected");
        }
    }

    fn before_feature(&mut self, number: usize, text: &str) {
        self.warn(number, ReadWarningKind::TextBeforeFeature);
        self.comments.push(text.to_string());
    }

    /// Keep `text` as a comment node in the current container.
    fn tolerate(&mut self, number: usize, text: &str, kind: ReadWarningKind) {
        self.last_step = None;
        self.warn(number, kind);
        let Some(container) = self.container() else {
            self.comments.push(text.to_string());
            return;
        };
        self.flush_comments();
        self.flush_stray_tags(container);
        self.add_comment_node(container, text.to_string());
    }

    fn container(&self) -> Option<NodeId> {
        self.block.or(self.feature)
    }

    fn flush_comments(&mut self) {
        if self.comments.is_empty() {
            return;
        }
        let target = match self.comment_level {
            CommentLevel::Block => self.block.or(self.feature),
            CommentLevel::Feature => self.feature,
        };
        let Some(target) = target else {
            return;
        };
        let text = std::mem::take(&mut self.comments).join("\n");
        self.add_comment_node(target, text);
    }

    fn flush_stray_tags(&mut self, container: NodeId) {
        for (line, tag_line) in std::mem::take(&mut self.tag_lines) {
            self.warn(line, ReadWarningKind::StrayTags);
            self.add_comment_node(container, tag_line);
        }
    }

    fn add_comment_node(&mut self, parent: NodeId, text: String) {
        if let Err(err) = self.doc.add_child(parent, Node::comment(text), None) {
            debug!(error = %err, "comment rejected");
        }
    }

    fn take_comment(&mut self) -> Option<String> {
        (!self.comments.is_empty()).then(|| std::mem::take(&mut self.comments).join("\n"))
    }

    fn take_tags(&mut self) -> Vec<String> {
        std::mem::take(&mut self.tag_lines)
            .iter()
            .flat_map(|(_, line)| parse_tag_line(line))
            .collect()
    }

    fn warn(&mut self, line: usize, kind: ReadWarningKind) {
        debug!(line, %kind, "tolerated feature line");
        self.warnings.push(ReadWarning { line, kind });
    }

    fn finish(mut self) -> Result<FeatureRead, ReadError> {
        let Some(feature) = self.feature else {
            return Err(ReadError::MissingFeature {
                keyword: self.language.feature(),
            });
        };
        self.flush_comments();
        let container = self.container().unwrap_or(feature);
        self.flush_stray_tags(container);
        debug_assert!(
            self.doc
                .node(feature)
                .is_some_and(|node| node.kind() == NodeKind::Feature),
            "reader produced a non-feature root"
        );
        Ok(FeatureRead {
            feature,
            warnings: self.warnings,
        })
    }
}

/// Whether `line` has the `Words:` shape of a section header this reader
/// does not know, such as `Scenario Outline:`, `Examples:` or `Rule:`.
fn looks_like_header(line: &str) -> bool {
    line.split_once(':').is_some_and(|(keyword, _)| {
        !keyword.is_empty()
            && keyword.split(' ').count() <= 3
            && keyword.chars().all(|c| c.is_alphabetic() || c == ' ')
    })
}

/// Title after `<keyword>:` when `line` is that header.
fn header<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    Some(line.strip_prefix(keyword)?.strip_prefix(':')?.trim())
}
