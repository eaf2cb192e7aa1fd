//! Per-mohalla staffing plan.

use serde::{Deserialize, Serialize};

use cm_core::determinism::StableOrd;
use cm_core::rounding::ceil_div;
use cm_core::{MohallaId, ScoringParams};

use crate::mohalla::MohallaMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecommendation {
    pub mohalla_id: MohallaId,
    pub mohalla_name: String,
    pub vehicles: u32,
    pub volunteers: u32,
    pub booth_agents: u32,
    pub priority: Priority,
    pub reason: String,
}

fn priority(m: &MohallaMetrics, params: &ScoringParams) -> Priority {
    if m.actionable_swing >= params.resource_ratios.high_priority_swing
        || m.danger_pockets >= params.danger_cluster_size
    {
        Priority::High
    } else if m.is_under_surveyed || m.actionable_swing > 0 || m.danger_pockets > 0 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

fn reason(m: &MohallaMetrics) -> String {
    let mut parts: Vec<String> = Vec::new();
    if m.actionable_swing > 0 {
        parts.push(format!("{} actionable swing voters", m.actionable_swing));
    }
    if m.danger_pockets > 0 {
        parts.push(format!("{} danger pockets", m.danger_pockets));
    }
    if m.is_under_surveyed {
        parts.push(format!("survey coverage {:.1}%", m.coverage_percent));
    }
    if m.transport_voters > 0 {
        parts.push(format!("{} voters need transport", m.transport_voters));
    }
    if parts.is_empty() {
        "Stable; maintain booth presence".to_string()
    } else {
        parts.join(", ")
    }
}

fn ceil_u32(num: u32, per: u32) -> u32 {
    ceil_div(num as u64, per as u64) as u32
}

/// One recommendation per mohalla that has voters, sorted by priority and
/// then mohalla id.
pub(crate) fn recommend_resources(mohallas: &[MohallaMetrics], params: &ScoringParams) -> Vec<ResourceRecommendation> {
    let r = &params.resource_ratios;
    let mut out: Vec<ResourceRecommendation> = mohallas
        .iter()
        .filter(|m| m.total_voters > 0)
        .map(|m| ResourceRecommendation {
            mohalla_id: m.mohalla_id.clone(),
            mohalla_name: m.name.clone(),
            vehicles: ceil_u32(m.transport_voters, r.voters_per_vehicle),
            volunteers: ceil_u32(m.actionable_swing, r.swing_voters_per_volunteer)
                + ceil_u32(m.unsurveyed_households(), r.households_per_survey_volunteer),
            booth_agents: ceil_u32(m.total_voters, r.voters_per_booth_agent),
            priority: priority(m, params),
            reason: reason(m),
        })
        .collect();
    out.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.mohalla_id.stable_cmp(&b.mohalla_id)));
    out
}
