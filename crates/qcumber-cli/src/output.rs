//! Helpers for rendering command output.

use std::io::Write;
use std::path::Path;

use eyre::{Context, Result};
use qcumber_patterns::StepPattern;
use serde::Serialize;

/// A step pattern as listed by `qcumber steps`.
#[derive(Debug, Serialize)]
pub(crate) struct StepRecord<'a> {
    pub file: String,
    pub line: usize,
    pub pattern: &'a str,
    pub parameters: Vec<String>,
    pub degraded: bool,
}

impl<'a> From<&'a StepPattern> for StepRecord<'a> {
    fn from(pattern: &'a StepPattern) -> Self {
        Self {
            file: pattern.source().display().to_string(),
            line: pattern.line(),
            pattern: pattern.body(),
            parameters: pattern
                .group_parameters()
                .iter()
                .map(ToString::to_string)
                .collect(),
            degraded: pattern.is_degraded(),
        }
    }
}

/// Category of a problem found by `qcumber check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ProblemKind {
    ImportFailed,
    UnmatchedStep,
    ParameterMismatch,
    ToleratedLine,
    InvalidGherkin,
}

/// One problem found by `qcumber check`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Problem {
    pub file: String,
    pub kind: ProblemKind,
    pub message: String,
}

impl Problem {
    pub(crate) fn new(file: &Path, kind: ProblemKind, message: impl Into<String>) -> Self {
        Self {
            file: file.display().to_string(),
            kind,
            message: message.into(),
        }
    }
}

/// Totals and problems reported by `qcumber check`.
#[derive(Debug, Default, Serialize)]
pub(crate) struct CheckReport {
    pub features: usize,
    pub steps: usize,
    pub matched: usize,
    pub problems: Vec<Problem>,
}

/// Output of `qcumber tags`.
#[derive(Debug, Serialize)]
pub(crate) struct TagReport {
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<String>,
}

pub(crate) fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value).wrap_err("failed to encode JSON output")?;
    writeln!(writer).wrap_err("failed to terminate JSON output")
}

pub(crate) fn write_step(writer: &mut dyn Write, step: &StepRecord<'_>) -> Result<()> {
    let mut line = format!("{}:{}: {}", step.file, step.line, step.pattern);
    if !step.parameters.is_empty() {
        line.push_str(" [");
        line.push_str(&step.parameters.join(", "));
        line.push(']');
    }
    if step.degraded {
        line.push_str(" (degraded)");
    }
    writeln!(writer, "{line}")
        .wrap_err_with(|| format!("failed to write step {}:{}", step.file, step.line))
}

pub(crate) fn write_check(writer: &mut dyn Write, report: &CheckReport) -> Result<()> {
    for problem in &report.problems {
        writeln!(writer, "{}: {}", problem.file, problem.message)
            .wrap_err_with(|| format!("failed to write problem in {}", problem.file))?;
    }
    writeln!(
        writer,
        "{} feature(s), {} of {} step(s) matched, {} problem(s)",
        report.features,
        report.matched,
        report.steps,
        report.problems.len()
    )
    .wrap_err("failed to write check summary")
}

pub(crate) fn write_tags(writer: &mut dyn Write, report: &TagReport) -> Result<()> {
    for tag in &report.tags {
        writeln!(writer, "{tag}").wrap_err_with(|| format!("failed to write tag {tag}"))?;
    }
    if let Some(selection) = &report.selection {
        writeln!(writer, "--tags {selection}").wrap_err("failed to write run selection")?;
    }
    Ok(())
}

pub(crate) fn write_path(writer: &mut dyn Write, verb: &str, path: &Path) -> Result<()> {
    writeln!(writer, "{verb} {}", path.display())
        .wrap_err_with(|| format!("failed to report {}", path.display()))
}
