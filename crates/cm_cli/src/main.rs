// crates/cm_cli/src/main.rs
//
// Exit codes, typed error mapping, CLI parsing, the validate-only
// short-circuit and the full run path
// (load → validate → pipeline → run record → artifacts → optional rendering).

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    pub const VALIDATION: i32 = 2;
    pub const IO: i32 = 4;
    pub const RENDER: i32 = 5;
}

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use chrono::Utc;
use log::LevelFilter;

use args::{parse_and_validate as parse_cli, Args, CliError};

use cm_core::{ScoringParams, Snapshot};
use cm_io::{canonical_json, loader, IoError};
use cm_pipeline::{build_run_record, run, validate, EngineMeta, PipelineError, PipelineOutputs, RunRecord, Severity, ValidationReport};
use cm_report::{build_model, ReportError, ReportModel};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// Malformed inputs or failed validation.
    Validation(String),
    /// Read/write/path/limit errors.
    Io(String),
    /// Report build or template failures.
    Render(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) => write!(f, "validation: {m}"),
            MainError::Io(m) => write!(f, "io: {m}"),
            MainError::Render(m) => write!(f, "render: {m}"),
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("cm: error: {e}");
            let rc = match e {
                CliError::NonLocalPath(_) => exitcodes::VALIDATION,
                CliError::NotFound(_) => exitcodes::IO,
            };
            return ExitCode::from(rc as u8);
        }
    };
    init_logging(&args);

    let res = if args.validate_only { validate_only(&args) } else { run_once(&args) };
    let rc = match res {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            log::error!("{e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// `--quiet` → errors only, `--verbose` → debug; `RUST_LOG` still wins.
fn init_logging(args: &Args) {
    let level = if args.quiet {
        LevelFilter::Error
    } else if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new().filter_level(level).parse_default_env().init();
}

fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) => VALIDATION,
        MainError::Io(_) => IO,
        MainError::Render(_) => RENDER,
    }
}

/// Translate cm_io::IoError into MainError buckets for exit-code mapping.
fn map_io_err(e: IoError) -> MainError {
    match e {
        IoError::Json { pointer, msg } => MainError::Validation(format!("json {pointer}: {msg}")),
        IoError::Invalid(m) => MainError::Validation(format!("invalid: {m}")),
        IoError::Hash(m) => MainError::Validation(format!("hash: {m}")),

        IoError::Read(m) => MainError::Io(format!("read: {m}")),
        IoError::Write(m) => MainError::Io(format!("write: {m}")),
        IoError::Limit(m) => MainError::Io(format!("limit: {m}")),
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    match e {
        PipelineError::Params(c) => MainError::Validation(c.to_string()),
        PipelineError::Io(io) => map_io_err(io),
    }
}

fn map_report_err(e: ReportError) -> MainError {
    match e {
        ReportError::Template(m) => MainError::Render(format!("template: {m}")),
        ReportError::Json(m) => MainError::Render(format!("json: {m}")),
    }
}

fn load_inputs(args: &Args) -> Result<(Snapshot, ScoringParams), MainError> {
    let snapshot = loader::load_snapshot(&args.snapshot).map_err(map_io_err)?;
    let params = match &args.params {
        Some(p) => loader::load_params(p).map_err(map_io_err)?,
        None => ScoringParams::default(),
    };
    Ok((snapshot, params))
}

fn log_report(report: &ValidationReport) {
    for i in &report.issues {
        match i.severity {
            Severity::Error => log::error!("{} {:?}: {}", i.code, i.where_, i.message),
            Severity::Warning => log::warn!("{} {:?}: {}", i.code, i.where_, i.message),
        }
    }
}

fn fail_on_errors(report: &ValidationReport) -> Result<(), MainError> {
    if report.pass {
        return Ok(());
    }
    Err(MainError::Validation(format!(
        "{} error(s), {} warning(s)",
        report.count(Severity::Error),
        report.count(Severity::Warning)
    )))
}

/// Validate-only path (no pipeline, no artifacts).
fn validate_only(args: &Args) -> Result<(), MainError> {
    let (snapshot, params) = load_inputs(args)?;
    let report = validate(&snapshot, &params);
    log_report(&report);
    fail_on_errors(&report)?;
    log::info!("validate-only: inputs OK ({} warning(s))", report.count(Severity::Warning));
    Ok(())
}

/// Full run path. Validation errors stop before any artifact is written;
/// warnings are logged and the run proceeds.
fn run_once(args: &Args) -> Result<(), MainError> {
    let (snapshot, params) = load_inputs(args)?;
    let report = validate(&snapshot, &params);
    log_report(&report);
    fail_on_errors(&report)?;

    let as_of = args.as_of.unwrap_or_else(Utc::now);
    let outputs = run(&snapshot, &params, as_of);
    let record = build_run_record(&snapshot, &params, as_of, &outputs, &report, &EngineMeta::current())
        .map_err(map_pipeline_err)?;

    write_artifacts(&args.out, &outputs, &record)?;
    maybe_render_reports(args, &outputs, &record)?;

    log::info!("run {}: artifacts written to {}", record.id, args.out.display());
    Ok(())
}

fn write_artifacts(out_dir: &Path, outs: &PipelineOutputs, record: &RunRecord) -> Result<(), MainError> {
    fs::create_dir_all(out_dir).map_err(|e| MainError::Io(format!("mkdir {}: {e}", out_dir.display())))?;

    let w = |name: &str, r: Result<(), IoError>| r.map_err(|e| MainError::Io(format!("write {name}: {e}")));
    w("voter_scores.json", canonical_json::write_canonical_file(&out_dir.join("voter_scores.json"), &outs.voter_scores))?;
    w("families.json", canonical_json::write_canonical_file(&out_dir.join("families.json"), &outs.family_metrics))?;
    w("mohallas.json", canonical_json::write_canonical_file(&out_dir.join("mohallas.json"), &outs.mohalla_metrics))?;
    w("dashboard.json", canonical_json::write_canonical_file(&out_dir.join("dashboard.json"), &outs.dashboard))?;
    w("demographics.json", canonical_json::write_canonical_file(&out_dir.join("demographics.json"), &outs.demographics))?;
    w("run_record.json", canonical_json::write_canonical_file(&out_dir.join("run_record.json"), record))?;
    Ok(())
}

fn maybe_render_reports(args: &Args, outs: &PipelineOutputs, record: &RunRecord) -> Result<(), MainError> {
    if args.render.is_empty() {
        return Ok(());
    }
    let model = build_model(outs).with_run_record(record);
    for fmt in &args.render {
        match fmt.as_str() {
            "json" => render_json_report(&model, &args.out)?,
            "html" => render_html_report(&model, &args.out)?,
            other => return Err(MainError::Render(format!("unknown renderer: {other}"))),
        }
    }
    Ok(())
}

fn render_json_report(model: &ReportModel, out_dir: &Path) -> Result<(), MainError> {
    #[cfg(feature = "report-json")]
    {
        let v = cm_report::render_json(model).map_err(map_report_err)?;
        canonical_json::write_canonical_file(&out_dir.join("report.json"), &v)
            .map_err(|e| MainError::Io(format!("write report.json: {e}")))
    }
    #[cfg(not(feature = "report-json"))]
    {
        let _ = (model, out_dir);
        Err(MainError::Render("json renderer not enabled (build with feature `report-json`)".into()))
    }
}

fn render_html_report(model: &ReportModel, out_dir: &Path) -> Result<(), MainError> {
    #[cfg(feature = "report-html")]
    {
        let html = cm_report::render_html(model).map_err(map_report_err)?;
        fs::write(out_dir.join("report.html"), html).map_err(|e| MainError::Io(format!("write report.html: {e}")))
    }
    #[cfg(not(feature = "report-html"))]
    {
        let _ = (model, out_dir);
        Err(MainError::Render("html renderer not enabled (build with feature `report-html`)".into()))
    }
}
