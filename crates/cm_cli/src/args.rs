// crates/cm_cli/src/args.rs
//
// Offline CLI argument surface.
// - Local paths only (reject any scheme:// like http/https/file)
// - --snapshot is required; --params is optional (defaults apply)
// - --as-of fixes the reference instant; omitted means "now"
// - Output: --out dir, --render [json|html]*
// - --validate-only loads and validates without writing artifacts

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::Parser;

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "cm",
    disable_help_subcommand = true,
    about = "Offline, deterministic campaign metrics engine"
)]
pub struct Args {
    /// Snapshot JSON (voters, households, mohallas, influencers).
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Scoring parameter JSON; omitted fields keep their defaults.
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Reference instant for survey freshness (RFC 3339).
    #[arg(long, value_parser = parse_as_of)]
    pub as_of: Option<DateTime<Utc>>,

    /// Output directory (default: current directory).
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Renderer(s) to emit. Choose up to 2 (json, html). Omit to skip rendering.
    #[arg(long, value_parser = ["json", "html"], num_args = 0..=2)]
    pub render: Vec<String>,

    /// Load and validate inputs only, do not run the engine.
    #[arg(long)]
    pub validate_only: bool,

    /// Only log errors.
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log debug detail.
    #[arg(long)]
    pub verbose: bool,
}

/// Errors surfaced by argument validation.
/// Keep messages short/stable (handy for scripts/tests).
#[derive(Debug)]
pub enum CliError {
    NonLocalPath(String),
    NotFound(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::NonLocalPath(p) => write!(f, "path must be local file (no scheme): {p}"),
            CliError::NotFound(p) => write!(f, "file not found: {p}"),
        }
    }
}
impl std::error::Error for CliError {}

pub fn parse_as_of(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 timestamp: {e}"))
}

#[inline]
fn has_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("file:")
}

#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if has_scheme(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

fn ensure_local_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    ensure_local_path(p)?;
    let meta = fs::metadata(p).map_err(|_| CliError::NotFound(format!("{label} {}", p.display())))?;
    if !meta.is_file() {
        return Err(CliError::NotFound(format!("{label} {}", p.display())));
    }
    Ok(())
}

/// Best-effort normalization to an absolute path.
fn normalize_path(p: &Path) -> PathBuf {
    fs::canonicalize(p).unwrap_or_else(|_| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(p)
        }
    })
}

/// Entry point used by main.rs
pub fn parse_and_validate() -> Result<Args, CliError> {
    check(Args::parse())
}

fn check(mut args: Args) -> Result<Args, CliError> {
    ensure_local_exists(&args.snapshot, "--snapshot")?;
    if let Some(p) = &args.params {
        ensure_local_exists(p, "--params")?;
    }
    ensure_local_path(&args.out)?;

    args.snapshot = normalize_path(&args.snapshot);
    args.params = args.params.take().map(|p| normalize_path(&p));
    args.out = normalize_path(&args.out);
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_of_accepts_offsets() {
        let t = parse_as_of("2026-10-01T05:30:00+05:30").unwrap();
        assert_eq!(t.to_rfc3339(), "2026-10-01T00:00:00+00:00");
        assert!(parse_as_of("yesterday").is_err());
    }

    #[test]
    fn schemes_are_rejected() {
        assert!(ensure_local_path(Path::new("https://x/y.json")).is_err());
        assert!(ensure_local_path(Path::new("file://tmp/y.json")).is_err());
        assert!(ensure_local_path(Path::new("/tmp/y.json")).is_ok());
    }

    #[test]
    fn missing_snapshot_is_not_found() {
        let a = Args::parse_from(["cm", "--snapshot", "/definitely/not/here.json"]);
        assert!(matches!(check(a), Err(CliError::NotFound(_))));
    }

    #[test]
    fn render_accepts_both() {
        let a = Args::parse_from(["cm", "--snapshot", "s.json", "--render", "json", "html"]);
        assert_eq!(a.render, vec!["json", "html"]);
        assert!(a.as_of.is_none());
    }
}
