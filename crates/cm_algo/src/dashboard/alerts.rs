//! Rule-based risk alerts.
//!
//! Rules are evaluated in a fixed order and the list is then stably sorted by
//! severity, so equal inputs give the same alerts in the same order.

use serde::{Deserialize, Serialize};

use cm_core::{MohallaId, ScoringParams};

use crate::family::FamilyMetrics;
use crate::mohalla::MohallaMetrics;

use super::{CoverageStats, InfluenceSummary};
use super::win_probability::WinProbabilityBand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAlert {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mohalla_id: Option<MohallaId>,
}

impl RiskAlert {
    fn new(severity: Severity, message: String) -> Self {
        Self { severity, message, action: None, mohalla_id: None }
    }
    fn action(mut self, a: &str) -> Self {
        self.action = Some(a.to_string());
        self
    }
    fn in_mohalla(mut self, m: &MohallaId) -> Self {
        self.mohalla_id = Some(m.clone());
        self
    }
}

/// Freshness below this share of surveyed households raises a warning.
const STALE_SURVEY_PERCENT: f64 = 50.0;
/// Voter tagging below this share raises a warning.
const LOW_TAGGING_PERCENT: f64 = 50.0;

/// Inputs the alert rules read. Bundled so the rule list can grow without
/// touching the call site.
pub(crate) struct AlertInputs<'a> {
    pub families: &'a [FamilyMetrics],
    pub mohallas: &'a [MohallaMetrics],
    pub coverage: &'a CoverageStats,
    pub influence: &'a InfluenceSummary,
    pub band: WinProbabilityBand,
    pub vote_share_percent: f64,
    pub total_present_voters: u32,
    pub away_voters: u32,
}

fn mohalla_label(m: &MohallaMetrics) -> &str {
    if m.name.is_empty() { m.mohalla_id.as_str() } else { m.name.as_str() }
}

pub(crate) fn generate_risk_alerts(inp: &AlertInputs<'_>, params: &ScoringParams) -> Vec<RiskAlert> {
    let mut out = Vec::new();

    match inp.band {
        WinProbabilityBand::Critical if inp.total_present_voters > 0 => {
            out.push(
                RiskAlert::new(
                    Severity::High,
                    format!("Projected vote share is {:.1}%, win probability is critical", inp.vote_share_percent),
                )
                .action("Focus on converting swing voters in the top swing mohallas"),
            );
        }
        WinProbabilityBand::Critical
        | WinProbabilityBand::Competitive
        | WinProbabilityBand::Comfortable
        | WinProbabilityBand::Strong => {}
    }

    for m in inp.mohallas {
        if m.danger_pockets >= params.danger_cluster_size {
            out.push(
                RiskAlert::new(
                    Severity::High,
                    format!("{} has {} danger pockets", mohalla_label(m), m.danger_pockets),
                )
                .action("Send senior leaders to meet influential families")
                .in_mohalla(&m.mohalla_id),
            );
        }
    }

    for m in inp.mohallas {
        if m.is_under_surveyed {
            out.push(
                RiskAlert::new(
                    Severity::Medium,
                    format!("{} survey coverage is {:.1}%", mohalla_label(m), m.coverage_percent),
                )
                .action("Assign survey volunteers")
                .in_mohalla(&m.mohalla_id),
            );
        }
    }

    if inp.influence.opposed_vote_control > inp.influence.votes_under_supportive_influence {
        out.push(
            RiskAlert::new(
                Severity::Medium,
                format!(
                    "Opposed influencers control {} votes against {} under supportive influence",
                    inp.influence.opposed_vote_control, inp.influence.votes_under_supportive_influence
                ),
            )
            .action("Approach convertible influencers"),
        );
    }

    if inp.coverage.surveyed_households > 0 && inp.coverage.data_freshness_percent < STALE_SURVEY_PERCENT {
        out.push(
            RiskAlert::new(
                Severity::Medium,
                format!(
                    "Only {:.1}% of surveyed households were visited in the last {} days",
                    inp.coverage.data_freshness_percent, params.freshness_days
                ),
            )
            .action("Re-survey stale households"),
        );
    }

    let gotv = inp.families.iter().filter(|f| f.needs_gotv()).count();
    if gotv > 0 {
        out.push(
            RiskAlert::new(Severity::Low, format!("{gotv} supportive families have low expected turnout"))
                .action("Schedule GOTV visits"),
        );
    }

    if inp.coverage.total_voters > 0 && inp.coverage.voter_tagging_percent < LOW_TAGGING_PERCENT {
        out.push(
            RiskAlert::new(
                Severity::Low,
                format!("Only {:.1}% of voters are tagged", inp.coverage.voter_tagging_percent),
            )
            .action("Complete voter tagging"),
        );
    }

    if inp.away_voters > 0 {
        out.push(
            RiskAlert::new(Severity::Low, format!("{} voters are away from the constituency", inp.away_voters))
                .action("Contact migrant voters before polling day"),
        );
    }

    // Stable: rule order is kept inside a severity.
    out.sort_by_key(|a| a.severity);
    out
}
