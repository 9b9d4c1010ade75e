//! Editing sessions for qcumber.
//!
//! A [`Session`] ties a [`qcumber_document::Document`] to the step patterns
//! imported from automation source files and moves both between memory and
//! disk.
//!
//! # Overview
//!
//! - step-definition import, synchronously or on a background thread, with
//!   re-matching of every step against the new set
//! - feature import from files or directories, with per-file failures
//!   collected in an [`ImportReport`]
//! - save, export and scenario export with feature context
//! - run-tag selection for the test runner
//!
//! # Configuration
//!
//! - `QCUMBER_LOG_LEVEL`: log verbosity (trace, debug, info, warn, error)
//! - `QCUMBER_LANGUAGE`: feature-file keyword language (`en`, `da`)
//! - `QCUMBER_OVERRIDE_MARKER`: marker of parameter-override comments
//!
//! # Example
//!
//! ```no_run
//! use qcumber_editor::{EditorConfig, Session};
//!
//! let config = EditorConfig::from_env()?;
//! let session = Session::new(config);
//! let report = session.import_step_definitions(["features/step_definitions/basket.rb"]);
//! assert!(report.is_clean());
//! session.import_features(["features"]);
//! # Ok::<(), qcumber_editor::EditorError>(())
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod session;
pub mod validate;

pub use config::{EditorConfig, LogLevel};
pub use error::EditorError;
pub use logging::init_logging;
pub use session::{ImportFailure, ImportReport, ImportWarning, Session};
pub use validate::{GherkinSummary, validate_gherkin};
