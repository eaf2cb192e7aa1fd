//! structure.rs: report model mapped from pipeline outputs.
//!
//! Renderers never recompute: every number here is already formatted, so the
//! JSON and HTML views show byte-identical figures.

use serde::{Deserialize, Serialize};

use cm_algo::{FamilyMetrics, Priority, Severity};
use cm_core::{AgeBand, Gender};
use cm_pipeline::{PipelineOutputs, RunRecord};

/// `12.345` → `"12.3%"`.
pub fn pct1(v: f64) -> String {
    format!("{v:.1}%")
}

/// One decimal, no unit.
pub fn num1(v: f64) -> String {
    format!("{v:.1}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub total_voters: u32,
    pub present_voters: u32,
    pub away_voters: u32,
    pub expected_votes: String,
    pub vote_share: String,
    pub win_probability: String,
    pub band: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoveragePanel {
    pub surveyed: String,
    pub household_coverage: String,
    pub voter_tagging: String,
    pub data_freshness: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRow {
    pub label: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRow {
    pub severity: String,
    pub message: String,
    pub action: Option<String>,
    pub mohalla_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyRow {
    pub household_id: String,
    pub head_name: String,
    pub mohalla: String,
    pub influence: u8,
    pub sentiment: String,
    pub voters: u32,
    pub support: String,
    pub expected_votes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MohallaRow {
    pub mohalla_id: String,
    pub name: String,
    pub coverage: String,
    pub voters: u32,
    pub swing_universe: u32,
    pub actionable_swing: u32,
    pub danger_pockets: u32,
    pub expected_votes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRow {
    pub mohalla: String,
    pub priority: String,
    pub vehicles: u32,
    pub volunteers: u32,
    pub booth_agents: u32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemographicRow {
    pub group: String,
    pub key: String,
    pub voters: u32,
    pub support: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footer {
    pub run_id: String,
    pub as_of: String,
    pub engine_version: String,
    pub snapshot_sha256: String,
    pub params_sha256: String,
}

/// Top-level report model. Section order is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportModel {
    pub headline: Headline,
    pub coverage: CoveragePanel,
    pub vote_breakdown: Vec<CountRow>,
    pub alerts: Vec<AlertRow>,
    pub danger_pockets: Vec<FamilyRow>,
    pub top_families: Vec<FamilyRow>,
    pub gotv_families: Vec<FamilyRow>,
    pub mohallas: Vec<MohallaRow>,
    pub resources: Vec<ResourceRow>,
    pub demographics: Vec<DemographicRow>,
    pub footer: Option<Footer>,
}

impl ReportModel {
    /// Add run provenance to the footer.
    pub fn with_run_record(mut self, rec: &RunRecord) -> Self {
        self.footer = Some(Footer {
            run_id: rec.id.clone(),
            as_of: rec.body.as_of.to_rfc3339(),
            engine_version: rec.body.engine.version.clone(),
            snapshot_sha256: rec.body.inputs.snapshot_sha256.clone(),
            params_sha256: rec.body.inputs.params_sha256.clone(),
        });
        self
    }
}

fn severity_label(s: Severity) -> &'static str {
    match s {
        Severity::High => "high",
        Severity::Medium => "medium",
        Severity::Low => "low",
    }
}

fn priority_label(p: Priority) -> &'static str {
    match p {
        Priority::High => "high",
        Priority::Medium => "medium",
        Priority::Low => "low",
    }
}

fn family_row(f: &FamilyMetrics) -> FamilyRow {
    FamilyRow {
        household_id: f.household_id.to_string(),
        head_name: f.head_name.clone(),
        mohalla: if f.mohalla_name.is_empty() { f.mohalla_id.to_string() } else { f.mohalla_name.clone() },
        influence: f.family_influence_level,
        sentiment: f.family_sentiment.as_str().to_string(),
        voters: f.voter_count,
        support: num1(f.family_support_score * 100.0),
        expected_votes: num1(f.expected_votes_for_us),
    }
}

fn demographic_rows(out: &PipelineOutputs) -> Vec<DemographicRow> {
    let d = &out.demographics;
    let mut rows = Vec::new();
    for band in AgeBand::ALL {
        rows.push(DemographicRow {
            group: "Age".into(),
            key: band.as_str().into(),
            voters: d.by_age.get(band).copied().unwrap_or(0),
            support: num1(d.support_by_age.get(band).copied().unwrap_or(0.0) * 100.0),
        });
    }
    for g in Gender::ALL {
        rows.push(DemographicRow {
            group: "Gender".into(),
            key: g.as_str().into(),
            voters: d.by_gender.get(g).copied().unwrap_or(0),
            support: num1(d.support_by_gender.get(g).copied().unwrap_or(0.0) * 100.0),
        });
    }
    for (caste, n) in &d.by_caste {
        rows.push(DemographicRow {
            group: "Caste".into(),
            key: caste.clone(),
            voters: *n,
            support: num1(d.support_by_caste.get(caste).copied().unwrap_or(0.0) * 100.0),
        });
    }
    rows
}

/// Map pipeline outputs into the report model.
pub fn build_model(out: &PipelineOutputs) -> ReportModel {
    let d = &out.dashboard;
    let b = &d.vote_breakdown;

    ReportModel {
        headline: Headline {
            total_voters: d.total_voters,
            present_voters: d.total_present_voters,
            away_voters: d.away_voters,
            expected_votes: num1(d.expected_votes_if_today_polling),
            vote_share: pct1(d.vote_share_percent),
            win_probability: pct1(d.win_probability_percent),
            band: d.win_probability_band.as_str().to_string(),
        },
        coverage: CoveragePanel {
            surveyed: format!("{} / {}", d.coverage.surveyed_households, d.coverage.total_households),
            household_coverage: pct1(d.coverage.household_coverage_percent),
            voter_tagging: pct1(d.coverage.voter_tagging_percent),
            data_freshness: pct1(d.coverage.data_freshness_percent),
        },
        vote_breakdown: [
            ("Confirmed", b.confirmed),
            ("Likely", b.likely),
            ("Swing", b.swing),
            ("Opposition", b.opposition),
            ("Unknown", b.unknown),
        ]
        .into_iter()
        .map(|(label, count)| CountRow { label: label.to_string(), count })
        .collect(),
        alerts: d
            .risk_alerts
            .iter()
            .map(|a| AlertRow {
                severity: severity_label(a.severity).to_string(),
                message: a.message.clone(),
                action: a.action.clone(),
                mohalla_id: a.mohalla_id.as_ref().map(|m| m.to_string()),
            })
            .collect(),
        danger_pockets: d.danger_pockets.iter().map(family_row).collect(),
        top_families: d.top_families.iter().map(family_row).collect(),
        gotv_families: d.gotv_families.iter().map(family_row).collect(),
        mohallas: out
            .mohalla_metrics
            .iter()
            .map(|m| MohallaRow {
                mohalla_id: m.mohalla_id.to_string(),
                name: m.name.clone(),
                coverage: pct1(m.coverage_percent),
                voters: m.total_voters,
                swing_universe: m.swing_universe,
                actionable_swing: m.actionable_swing,
                danger_pockets: m.danger_pockets,
                expected_votes: num1(m.expected_votes),
            })
            .collect(),
        resources: d
            .resource_recommendations
            .iter()
            .map(|r| ResourceRow {
                mohalla: if r.mohalla_name.is_empty() { r.mohalla_id.to_string() } else { r.mohalla_name.clone() },
                priority: priority_label(r.priority).to_string(),
                vehicles: r.vehicles,
                volunteers: r.volunteers,
                booth_agents: r.booth_agents,
                reason: r.reason.clone(),
            })
            .collect(),
        demographics: demographic_rows(out),
        footer: None,
    }
}
