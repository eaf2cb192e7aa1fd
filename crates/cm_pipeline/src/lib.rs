//! cm_pipeline: deterministic pipeline surface
//! (validate → score → families → mohallas → dashboard → demographics → run record).
//!
//! This crate stays I/O-free: callers hand in an already-loaded `Snapshot`,
//! the `ScoringParams` and the `as_of` instant. Hashing goes through `cm_io`,
//! math through `cm_algo`.

#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cm_algo::{
    calculate_dashboard_metrics, calculate_demographic_metrics, calculate_family_metrics,
    calculate_mohalla_metrics, score_all_voters, DashboardMetrics, DemographicMetrics, FamilyMetrics,
    MohallaMetrics, VoterSupportScore,
};
use cm_core::{ScoringParams, Snapshot};

pub mod memo;
pub mod run_record;
pub mod validate;

pub use memo::MemoPipeline;
pub use run_record::{build_run_record, RunRecord};
pub use validate::{validate, EntityRef, Severity, ValidationIssue, ValidationReport};

/// Engine identifiers recorded in every run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMeta {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub build: String,
}

impl EngineMeta {
    pub fn current() -> Self {
        Self {
            vendor: "campaign-metrics".to_string(),
            name: "cm_pipeline".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            build: if cfg!(debug_assertions) { "debug" } else { "release" }.to_string(),
        }
    }
}

/// Everything one computation produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutputs {
    pub voter_scores: Vec<VoterSupportScore>,
    pub family_metrics: Vec<FamilyMetrics>,
    pub mohalla_metrics: Vec<MohallaMetrics>,
    pub dashboard: DashboardMetrics,
    pub demographics: DemographicMetrics,
}

/// Single error surface for the pipeline orchestration.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("parameter error: {0}")]
    Params(#[from] cm_core::CoreError),

    #[error(transparent)]
    Io(#[from] cm_io::IoError),
}

/// Run every stage in data-flow order. Never fails; parameter sanity is the
/// caller's job (see `run_checked`).
pub fn run(snapshot: &Snapshot, params: &ScoringParams, as_of: DateTime<Utc>) -> PipelineOutputs {
    let voter_scores = score_all_voters(&snapshot.voters, params);
    let family_metrics =
        calculate_family_metrics(&snapshot.households, &voter_scores, &snapshot.mohallas, params);
    let mohalla_metrics =
        calculate_mohalla_metrics(&snapshot.mohallas, &family_metrics, &voter_scores, params);
    let dashboard = calculate_dashboard_metrics(
        &voter_scores,
        &family_metrics,
        &mohalla_metrics,
        &snapshot.influencers,
        &snapshot.voters,
        as_of,
        params,
    );
    let demographics = calculate_demographic_metrics(&voter_scores, &family_metrics);

    PipelineOutputs { voter_scores, family_metrics, mohalla_metrics, dashboard, demographics }
}

/// `run`, after checking parameter domains.
pub fn run_checked(
    snapshot: &Snapshot,
    params: &ScoringParams,
    as_of: DateTime<Utc>,
) -> Result<PipelineOutputs, PipelineError> {
    cm_core::params::validate_domains(params)?;
    Ok(run(snapshot, params, as_of))
}
