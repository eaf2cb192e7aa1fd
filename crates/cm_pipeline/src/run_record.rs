// crates/cm_pipeline/src/run_record.rs
//
// Provenance record for one computation.
// - Input digests are SHA-256 over canonical JSON of the snapshot and params.
// - Output digests cover each output document separately.
// - The run id is computed over the record *without* the id field, then
//   injected, so the hash is stable and well-defined.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use cm_core::{ScoringParams, Snapshot};
use cm_io::hasher::{sha256_canonical, short_hex};

use crate::validate::{Severity, ValidationReport};
use crate::{EngineMeta, PipelineError, PipelineOutputs};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDigests {
    pub snapshot_sha256: String,
    pub params_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDigests {
    pub voter_scores_sha256: String,
    pub family_metrics_sha256: String,
    pub mohalla_metrics_sha256: String,
    pub dashboard_sha256: String,
    pub demographics_sha256: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCounts {
    pub voters: usize,
    pub households: usize,
    pub mohallas: usize,
    pub influencers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub pass: bool,
    pub errors: usize,
    pub warnings: usize,
}

/// Everything the id is computed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecordBody {
    pub as_of: DateTime<Utc>,
    pub engine: EngineMeta,
    pub inputs: InputDigests,
    pub outputs: OutputDigests,
    pub counts: RunCounts,
    pub validation: ValidationSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    /// `RUN:<as_of>:<first 12 hex of the body digest>`
    pub id: String,
    #[serde(flatten)]
    pub body: RunRecordBody,
}

pub fn build_run_record(
    snapshot: &Snapshot,
    params: &ScoringParams,
    as_of: DateTime<Utc>,
    outputs: &PipelineOutputs,
    report: &ValidationReport,
    engine: &EngineMeta,
) -> Result<RunRecord, PipelineError> {
    let inputs = InputDigests {
        snapshot_sha256: sha256_canonical(snapshot)?,
        params_sha256: sha256_canonical(params)?,
    };
    let outputs_digests = OutputDigests {
        voter_scores_sha256: sha256_canonical(&outputs.voter_scores)?,
        family_metrics_sha256: sha256_canonical(&outputs.family_metrics)?,
        mohalla_metrics_sha256: sha256_canonical(&outputs.mohalla_metrics)?,
        dashboard_sha256: sha256_canonical(&outputs.dashboard)?,
        demographics_sha256: sha256_canonical(&outputs.demographics)?,
    };

    let body = RunRecordBody {
        as_of,
        engine: engine.clone(),
        inputs,
        outputs: outputs_digests,
        counts: RunCounts {
            voters: snapshot.voters.len(),
            households: snapshot.households.len(),
            mohallas: snapshot.mohallas.len(),
            influencers: snapshot.influencers.len(),
        },
        validation: ValidationSummary {
            pass: report.pass,
            errors: report.count(Severity::Error),
            warnings: report.count(Severity::Warning),
        },
    };

    let digest = sha256_canonical(&body)?;
    let id = format!(
        "RUN:{}:{}",
        as_of.to_rfc3339_opts(SecondsFormat::Secs, true),
        short_hex(&digest, 12)?
    );
    log::info!("run record {id}");
    Ok(RunRecord { id, body })
}
