//! The editing session: one document, one active pattern set.
//!
//! The document sits behind a single coarse lock. The pattern set is an
//! immutable `Arc<PatternSet>` replaced as a whole, so matching never sees a
//! partially imported set. Locks are always taken document first.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

use qcumber_document::{Document, NodeId, ReadWarning, RunTagSelection, RunTagState};
use qcumber_patterns::{MatchResult, PatternSet};
use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::discovery::{FEATURE_EXTENSION, discover_files};
use crate::error::EditorError;

/// Prefix of scratch feature file names.
pub const SCRATCH_PREFIX: &str = "noname_";

/// A file that could not be imported.
#[derive(Debug)]
pub struct ImportFailure {
    /// The file or directory that failed.
    pub path: PathBuf,
    /// Why it failed.
    pub error: EditorError,
}

/// A tolerated line in an imported feature file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportWarning {
    /// The file the line came from.
    pub path: PathBuf,
    /// The reader's warning.
    pub warning: ReadWarning,
}

/// Outcome of an import batch. Failures never abort the batch.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Files imported successfully.
    pub imported: Vec<PathBuf>,
    /// Step patterns in the active set after the import.
    pub patterns: usize,
    /// Steps matched after re-matching.
    pub matched_steps: usize,
    /// Tolerated lines in imported feature files.
    pub warnings: Vec<ImportWarning>,
    /// Files that were skipped.
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    /// Whether every file was imported.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// An editing session.
#[derive(Debug, Default)]
pub struct Session {
    config: EditorConfig,
    document: Mutex<Document>,
    patterns: RwLock<Arc<PatternSet>>,
    run_tags: Mutex<RunTagSelection>,
}

impl Session {
    /// An empty session.
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The session's configuration.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The active pattern set.
    #[must_use]
    pub fn patterns(&self) -> Arc<PatternSet> {
        Arc::clone(
            &self
                .patterns
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Run `f` with shared access to the document.
    pub fn with_document<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.lock_document())
    }

    /// Run `f` with exclusive access to the document and the active patterns.
    ///
    /// Edits made here are not re-matched automatically; use
    /// [`Session::set_step_text`] for step text or call
    /// `Document::rematch_all` inside `f`.
    pub fn edit<R>(&self, f: impl FnOnce(&mut Document, &PatternSet) -> R) -> R {
        let mut doc = self.lock_document();
        let patterns = self.patterns();
        f(&mut doc, &patterns)
    }

    /// Replace the active pattern set with the definitions in `paths` and
    /// re-match every step.
    ///
    /// Files are parsed without holding any lock; unreadable files are
    /// reported and skipped.
    pub fn import_step_definitions<I, P>(&self, paths: I) -> ImportReport
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
        let import = self.config.definition_parser().parse_files(paths.iter().cloned());

        let mut report = ImportReport::default();
        for failure in import.failures {
            report.failures.push(ImportFailure {
                path: failure.path,
                error: EditorError::Io(failure.source),
            });
        }
        report.imported = paths
            .into_iter()
            .filter(|path| !report.failures.iter().any(|f| &f.path == path))
            .collect();
        report.patterns = import.patterns.len();

        let new_set = Arc::new(import.patterns);
        let mut doc = self.lock_document();
        *self
            .patterns
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&new_set);
        report.matched_steps = doc.rematch_all(&new_set);
        info!(
            patterns = report.patterns,
            matched = report.matched_steps,
            "pattern set replaced"
        );
        report
    }

    /// Run [`Session::import_step_definitions`] on a background thread.
    ///
    /// The import cannot be cancelled; join the handle for the report.
    pub fn import_step_definitions_in_background(
        self: &Arc<Self>,
        paths: Vec<PathBuf>,
    ) -> JoinHandle<ImportReport> {
        let session = Arc::clone(self);
        thread::spawn(move || session.import_step_definitions(paths))
    }

    /// Read feature files, or directories searched recursively for
    /// `*.feature`, into the document.
    ///
    /// A file that is already open is replaced. Imported steps are matched
    /// against the active pattern set.
    pub fn import_features<I, P>(&self, paths: I) -> ImportReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut report = ImportReport::default();
        let mut files = Vec::new();
        for root in paths {
            let root = root.as_ref();
            match discover_files(root, FEATURE_EXTENSION) {
                Ok(found) => files.extend(found),
                Err(error) => {
                    warn!(path = %root.display(), %error, "feature path skipped");
                    report.failures.push(ImportFailure {
                        path: root.to_path_buf(),
                        error,
                    });
                }
            }
        }

        let mut texts = Vec::with_capacity(files.len());
        for path in files {
            match fs::read_to_string(&path) {
                Ok(text) => texts.push((path, text)),
                Err(source) => {
                    warn!(path = %path.display(), error = %source, "feature file skipped");
                    report.failures.push(ImportFailure {
                        path,
                        error: EditorError::Io(source),
                    });
                }
            }
        }

        let reader = self.config.reader();
        let mut doc = self.lock_document();
        for (path, text) in texts {
            let previous = doc.find_feature_by_path(&path);
            match reader.read_into(&mut doc, &text, Some(path.clone())) {
                Ok(read) => {
                    if let Some(previous) = previous {
                        debug!(path = %path.display(), "replacing open feature");
                        if let Err(error) = doc.remove_feature(previous) {
                            warn!(%error, "stale feature left in place");
                        }
                    }
                    report
                        .warnings
                        .extend(read.warnings.into_iter().map(|warning| ImportWarning {
                            path: path.clone(),
                            warning,
                        }));
                    report.imported.push(path);
                }
                Err(source) => {
                    warn!(path = %path.display(), error = %source, "feature file skipped");
                    report.failures.push(ImportFailure {
                        path: path.clone(),
                        error: EditorError::Read { path, source },
                    });
                }
            }
        }

        let patterns = self.patterns();
        report.patterns = patterns.len();
        report.matched_steps = doc.rematch_all(&patterns);
        info!(
            files = report.imported.len(),
            warnings = report.warnings.len(),
            failures = report.failures.len(),
            "imported feature files"
        );
        report
    }

    /// Add a template feature associated with `<dir>/noname_<millis>.feature`.
    pub fn new_scratch_feature(&self, dir: &Path) -> NodeId {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        let path = dir.join(format!("{SCRATCH_PREFIX}{millis}.{FEATURE_EXTENSION}"));
        debug!(path = %path.display(), "scratch feature created");
        self.lock_document().add_template_feature(Some(path))
    }

    /// Write a feature back to its associated file and return the path.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::UnknownNode` for stale handles,
    /// `EditorError::MissingFile` when the feature has no path and
    /// `EditorError::Io` when writing fails.
    pub fn save(&self, feature: NodeId) -> Result<PathBuf, EditorError> {
        let (path, text) = self.render_feature(feature)?;
        let path = path.ok_or(EditorError::MissingFile(feature))?;
        fs::write(&path, text)?;
        info!(path = %path.display(), "feature saved");
        Ok(path)
    }

    /// Write every feature that has an associated file.
    ///
    /// Features without a path are skipped.
    pub fn save_all(&self) -> ImportReport {
        let features: Vec<NodeId> = self.with_document(|doc| doc.features().to_vec());
        let mut report = ImportReport::default();
        for feature in features {
            match self.save(feature) {
                Ok(path) => report.imported.push(path),
                Err(EditorError::MissingFile(_)) => {}
                Err(error) => {
                    let path = self
                        .with_document(|doc| {
                            doc.node(feature)
                                .and_then(|node| node.path().map(Path::to_path_buf))
                        })
                        .unwrap_or_default();
                    report.failures.push(ImportFailure { path, error });
                }
            }
        }
        report
    }

    /// Write a feature to `<dir>/<file name>` and return the new path.
    ///
    /// The feature's own path is left unchanged.
    ///
    /// # Errors
    ///
    /// As for [`Session::save`]; the file name comes from the feature's
    /// associated path.
    pub fn export(&self, feature: NodeId, dir: &Path) -> Result<PathBuf, EditorError> {
        let (path, text) = self.render_feature(feature)?;
        let file_name = path
            .as_deref()
            .and_then(Path::file_name)
            .map(ToOwned::to_owned)
            .ok_or(EditorError::MissingFile(feature))?;
        fs::create_dir_all(dir)?;
        let target = dir.join(file_name);
        fs::write(&target, text)?;
        info!(path = %target.display(), "feature exported");
        Ok(target)
    }

    /// Serialise any node; scenarios carry their feature context.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::Document` for stale handles.
    pub fn export_node(&self, id: NodeId) -> Result<String, EditorError> {
        let doc = self.lock_document();
        Ok(self.config.writer().write_node(&doc, id)?)
    }

    /// Set a step's text and return its new match state.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::Document` when `id` is not a step.
    pub fn set_step_text(&self, id: NodeId, text: &str) -> Result<MatchResult, EditorError> {
        let mut doc = self.lock_document();
        let patterns = self.patterns();
        Ok(doc.set_step_text(id, text, &patterns)?.clone())
    }

    /// Every tag defined on any feature or scenario.
    #[must_use]
    pub fn defined_tags(&self) -> BTreeSet<String> {
        self.with_document(Document::defined_tags)
    }

    /// Cycle a tag through the run selection.
    pub fn toggle_run_tag(&self, tag: &str) -> Option<RunTagState> {
        self.run_tags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .toggle(tag)
    }

    /// A snapshot of the run selection.
    #[must_use]
    pub fn run_tags(&self) -> RunTagSelection {
        self.run_tags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn render_feature(&self, feature: NodeId) -> Result<(Option<PathBuf>, String), EditorError> {
        let doc = self.lock_document();
        let node = doc.node(feature).ok_or(EditorError::UnknownNode(feature))?;
        let text = self.config.writer().write_feature(&doc, feature)?;
        Ok((node.path().map(Path::to_path_buf), text))
    }

    fn lock_document(&self) -> MutexGuard<'_, Document> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
