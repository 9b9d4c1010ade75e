//! Command dispatch for the `qcumber` entrypoint.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use eyre::{Context, Result, bail, eyre};
use qcumber_document::{Document, NodeId, NodeKind};
use qcumber_editor::discovery::{DEFINITION_EXTENSION, discover_files};
use qcumber_editor::{
    EditorConfig, ImportFailure, ImportReport, LogLevel, Session, init_logging, validate_gherkin,
};
use qcumber_patterns::{Language, PatternSet};
use tracing::{debug, error};

use crate::output::{
    CheckReport, Problem, ProblemKind, StepRecord, TagReport, write_check, write_json,
    write_path, write_step, write_tags,
};

/// Step matching and formatting for Gherkin feature files.
#[derive(Parser)]
#[command(name = "qcumber", author, version, about)]
pub(crate) struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,
    /// Keyword language of feature and definition files (en, da).
    #[arg(long, global = true)]
    language: Option<Language>,
    #[command(subcommand)]
    command: Commands,
}

/// Supported commands.
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// List step patterns found in definition files.
    Steps(StepsArgs),
    /// Match feature files against step definitions and report problems.
    Check(CheckArgs),
    /// Rewrite feature files in canonical form.
    Fmt(FmtArgs),
    /// List tags and build a run selection.
    Tags(TagsArgs),
    /// Print one scenario with its feature header and background.
    Scenario(ScenarioArgs),
    /// Create a template feature file.
    New(NewArgs),
}

#[derive(Args)]
pub(crate) struct StepsArgs {
    /// Definition files or directories searched for `*.rb`.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// Emit JSON instead of human-readable text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Definition files or directories searched for `*.rb`.
    #[arg(long = "steps", required = true)]
    pub steps: Vec<PathBuf>,
    /// Feature files or directories searched for `*.feature`.
    #[arg(required = true)]
    pub features: Vec<PathBuf>,
    /// Emit JSON instead of human-readable text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub(crate) struct FmtArgs {
    /// Feature files or directories searched for `*.feature`.
    #[arg(required = true)]
    pub features: Vec<PathBuf>,
    /// Report files that would change without writing them.
    #[arg(long)]
    pub check: bool,
}

#[derive(Args)]
pub(crate) struct TagsArgs {
    /// Feature files or directories searched for `*.feature`.
    #[arg(required = true)]
    pub features: Vec<PathBuf>,
    /// Cycle a tag through the run selection; repeat to exclude.
    #[arg(long = "toggle", value_name = "TAG")]
    pub toggle: Vec<String>,
    /// Emit JSON instead of human-readable text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub(crate) struct ScenarioArgs {
    /// Feature file holding the scenario.
    pub feature: PathBuf,
    /// Scenario title.
    pub title: String,
}

#[derive(Args)]
pub(crate) struct NewArgs {
    /// Directory to create the file in.
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

pub(crate) fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = EditorConfig::from_env()
        .wrap_err("invalid QCUMBER_* environment")?
        .apply_overrides(cli.log_level, cli.language);
    init_logging(&config);
    let session = Session::new(config);

    let mut stdout = io::stdout().lock();
    let code = match cli.command {
        Commands::Steps(args) => handle_steps(&session, &args, &mut stdout)?,
        Commands::Check(args) => handle_check(&session, &args, &mut stdout)?,
        Commands::Fmt(args) => handle_fmt(&session, &args, &mut stdout)?,
        Commands::Tags(args) => handle_tags(&session, &args, &mut stdout)?,
        Commands::Scenario(args) => handle_scenario(&session, &args, &mut stdout)?,
        Commands::New(args) => handle_new(&session, &args, &mut stdout)?,
    };
    stdout.flush().wrap_err("failed to flush output to stdout")?;
    Ok(code)
}

fn handle_steps(session: &Session, args: &StepsArgs, out: &mut dyn Write) -> Result<ExitCode> {
    let imported = import_definitions(session, &args.paths);
    let patterns = session.patterns();
    let records: Vec<StepRecord<'_>> = patterns.iter().map(StepRecord::from).collect();
    if args.json {
        write_json(out, &records)?;
    } else {
        for record in &records {
            write_step(out, record)?;
        }
    }
    Ok(exit_code(imported.is_clean()))
}

fn handle_check(session: &Session, args: &CheckArgs, out: &mut dyn Write) -> Result<ExitCode> {
    let definitions = import_definitions(session, &args.steps);
    let imported = import_features(session, &args.features);

    let mut report = CheckReport::default();
    for failure in definitions.failures.iter().chain(&imported.failures) {
        report.problems.push(Problem::new(
            &failure.path,
            ProblemKind::ImportFailed,
            failure.error.to_string(),
        ));
    }
    for warning in &imported.warnings {
        report.problems.push(Problem::new(
            &warning.path,
            ProblemKind::ToleratedLine,
            warning.warning.to_string(),
        ));
    }

    let patterns = session.patterns();
    let language = session.config().language;
    let features = session.with_document(|doc| doc.features().to_vec());
    for feature in features {
        let path = feature_path(session, feature);
        report.features += 1;
        session.with_document(|doc| check_steps(doc, feature, &patterns, &path, &mut report));

        let text = session.export_node(feature)?;
        if let Err(err) = validate_gherkin(&text, language) {
            report
                .problems
                .push(Problem::new(&path, ProblemKind::InvalidGherkin, err.to_string()));
        }
    }

    if args.json {
        write_json(out, &report)?;
    } else {
        write_check(out, &report)?;
    }
    Ok(exit_code(report.problems.is_empty()))
}

fn check_steps(
    doc: &Document,
    feature: NodeId,
    patterns: &PatternSet,
    path: &Path,
    report: &mut CheckReport,
) {
    for step in doc.steps(feature).into_iter().filter_map(|id| doc.node(id)) {
        report.steps += 1;
        let result = step.match_result();
        if !result.matched {
            report.problems.push(Problem::new(
                path,
                ProblemKind::UnmatchedStep,
                format!("unmatched step \"{}\"", step.title()),
            ));
            continue;
        }
        report.matched += 1;
        let Some(pattern) = result.pattern_index.and_then(|index| patterns.pattern(index)) else {
            continue;
        };
        if let Err(index) = pattern.accepts(&result.bound_values) {
            let value = result.bound_values.get(index).map_or("", String::as_str);
            let allowed = pattern
                .group_parameters()
                .get(index)
                .map(ToString::to_string)
                .unwrap_or_default();
            report.problems.push(Problem::new(
                path,
                ProblemKind::ParameterMismatch,
                format!(
                    "step \"{}\" binds \"{value}\" to parameter {}, expected {allowed}",
                    step.title(),
                    index + 1
                ),
            ));
        }
    }
}

fn handle_fmt(session: &Session, args: &FmtArgs, out: &mut dyn Write) -> Result<ExitCode> {
    let imported = import_features(session, &args.features);
    for warning in &imported.warnings {
        tracing::warn!(
            path = %warning.path.display(),
            warning = %warning.warning,
            "line kept as a comment"
        );
    }

    let mut unformatted = 0usize;
    let features = session.with_document(|doc| doc.features().to_vec());
    for feature in features {
        let path = feature_path(session, feature);
        let formatted = session.export_node(feature)?;
        let current = fs::read_to_string(&path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        if current == formatted {
            debug!(path = %path.display(), "already canonical");
            continue;
        }
        unformatted += 1;
        if args.check {
            write_path(out, "would reformat", &path)?;
        } else {
            session
                .save(feature)
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            write_path(out, "reformatted", &path)?;
        }
    }
    Ok(exit_code(imported.is_clean() && (!args.check || unformatted == 0)))
}

fn handle_tags(session: &Session, args: &TagsArgs, out: &mut dyn Write) -> Result<ExitCode> {
    let imported = import_features(session, &args.features);
    for tag in &args.toggle {
        let state = session.toggle_run_tag(tag);
        debug!(tag, ?state, "run tag toggled");
    }
    let selection = session.run_tags();
    let report = TagReport {
        tags: session.defined_tags().into_iter().collect(),
        selection: (!selection.is_empty()).then(|| selection.to_string()),
    };
    if args.json {
        write_json(out, &report)?;
    } else {
        write_tags(out, &report)?;
    }
    Ok(exit_code(imported.is_clean()))
}

fn handle_scenario(
    session: &Session,
    args: &ScenarioArgs,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let imported = session.import_features([&args.feature]);
    if let Some(failure) = imported.failures.into_iter().next() {
        return Err(eyre!(failure.error)
            .wrap_err(format!("failed to import {}", failure.path.display())));
    }
    let scenario = session.with_document(|doc| {
        doc.features()
            .iter()
            .flat_map(|feature| doc.children(*feature).iter().copied())
            .find(|id| {
                doc.node(*id).is_some_and(|node| {
                    node.kind() == NodeKind::Scenario && node.title().trim() == args.title.trim()
                })
            })
    });
    let Some(scenario) = scenario else {
        bail!(
            "no scenario titled '{}' in {}",
            args.title,
            args.feature.display()
        );
    };
    let text = session.export_node(scenario)?;
    out.write_all(text.as_bytes())
        .wrap_err("failed to write scenario")?;
    Ok(ExitCode::SUCCESS)
}

fn handle_new(session: &Session, args: &NewArgs, out: &mut dyn Write) -> Result<ExitCode> {
    fs::create_dir_all(&args.dir)
        .wrap_err_with(|| format!("failed to create {}", args.dir.display()))?;
    let feature = session.new_scratch_feature(&args.dir);
    let path = session.save(feature).wrap_err("failed to write template")?;
    write_path(out, "created", &path)?;
    Ok(ExitCode::SUCCESS)
}

/// Discover and import definitions. Unreadable roots and files are logged
/// and returned in the report; the files that did read stay active.
fn import_definitions(session: &Session, roots: &[PathBuf]) -> ImportReport {
    let mut files = Vec::new();
    let mut failures = Vec::new();
    for root in roots {
        match discover_files(root, DEFINITION_EXTENSION) {
            Ok(found) => files.extend(found),
            Err(error) => failures.push(ImportFailure {
                path: root.clone(),
                error,
            }),
        }
    }
    let mut report = session.import_step_definitions(files);
    failures.append(&mut report.failures);
    report.failures = failures;
    log_failures(&report);
    report
}

fn import_features<I, P>(session: &Session, roots: I) -> ImportReport
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let report = session.import_features(roots);
    log_failures(&report);
    report
}

fn log_failures(report: &ImportReport) {
    for failure in &report.failures {
        error!(path = %failure.path.display(), error = %failure.error, "file skipped");
    }
}

fn feature_path(session: &Session, feature: NodeId) -> PathBuf {
    session
        .with_document(|doc| {
            doc.node(feature)
                .and_then(|node| node.path().map(Path::to_path_buf))
        })
        .unwrap_or_default()
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
