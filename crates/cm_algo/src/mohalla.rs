//! Neighborhood (mohalla) roll-up.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cm_core::rounding::{mean, percent_count};
use cm_core::{LikelyTurnout, Mohalla, MohallaId, ScoringParams, Sentiment};

use crate::family::FamilyMetrics;
use crate::scoring::VoterSupportScore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MohallaMetrics {
    pub mohalla_id: MohallaId,
    pub name: String,
    pub total_households: u32,
    pub surveyed_households: u32,
    pub total_voters: u32,
    pub present_voters: u32,
    pub favorable_households: u32,
    pub dicey_households: u32,
    pub unfavorable_households: u32,
    pub swing_universe: u32,
    pub actionable_swing: u32,
    pub expected_votes: f64,
    pub average_support: f64,
    pub danger_pockets: u32,
    /// Present voters living in households flagged as needing transport.
    pub transport_voters: u32,
    pub coverage_percent: f64,
    pub is_under_surveyed: bool,
}

impl MohallaMetrics {
    pub fn unsurveyed_households(&self) -> u32 {
        self.total_households.saturating_sub(self.surveyed_households)
    }
}

/// Swing voters we can still reach: present and not already written off as
/// low turnout.
fn is_actionable_swing(s: &VoterSupportScore) -> bool {
    if !s.is_swing || !s.is_present {
        return false;
    }
    match s.likely_turnout {
        LikelyTurnout::High | LikelyTurnout::Medium => true,
        LikelyTurnout::Low => false,
    }
}

/// One `MohallaMetrics` per mohalla, in mohalla input order.
///
/// Voter-level figures are taken from the scores keyed by the voter's own
/// `mohallaId`; household figures from the families keyed by theirs.
pub fn calculate_mohalla_metrics(
    mohallas: &[Mohalla],
    family_metrics: &[FamilyMetrics],
    voter_scores: &[VoterSupportScore],
    params: &ScoringParams,
) -> Vec<MohallaMetrics> {
    let mut families: BTreeMap<&MohallaId, Vec<&FamilyMetrics>> = BTreeMap::new();
    for f in family_metrics {
        families.entry(&f.mohalla_id).or_default().push(f);
    }
    let mut voters: BTreeMap<&MohallaId, Vec<&VoterSupportScore>> = BTreeMap::new();
    for s in voter_scores {
        voters.entry(&s.mohalla_id).or_default().push(s);
    }

    mohallas
        .iter()
        .map(|m| {
            let fams: &[&FamilyMetrics] = families.get(&m.id).map(Vec::as_slice).unwrap_or(&[]);
            let vs: &[&VoterSupportScore] = voters.get(&m.id).map(Vec::as_slice).unwrap_or(&[]);

            let mut favorable = 0u32;
            let mut dicey = 0u32;
            let mut unfavorable = 0u32;
            for f in fams {
                match f.family_sentiment {
                    Sentiment::Favorable => favorable += 1,
                    Sentiment::Dicey => dicey += 1,
                    Sentiment::Unfavorable => unfavorable += 1,
                }
            }

            let total_households = m.total_households.max(fams.len() as u32);
            let surveyed_households = fams.iter().filter(|f| f.is_surveyed).count() as u32;
            let coverage_percent = percent_count(surveyed_households as u64, total_households as u64);

            let expected_votes: f64 = vs
                .iter()
                .filter(|s| s.is_present && s.is_favorable)
                .map(|s| s.support_score * s.turnout_probability)
                .sum();

            MohallaMetrics {
                mohalla_id: m.id.clone(),
                name: m.name.clone(),
                total_households,
                surveyed_households,
                total_voters: vs.len() as u32,
                present_voters: vs.iter().filter(|s| s.is_present).count() as u32,
                favorable_households: favorable,
                dicey_households: dicey,
                unfavorable_households: unfavorable,
                swing_universe: vs.iter().filter(|s| s.is_swing).count() as u32,
                actionable_swing: vs.iter().filter(|s| is_actionable_swing(s)).count() as u32,
                expected_votes,
                average_support: mean(vs.iter().map(|s| s.support_score)),
                danger_pockets: fams.iter().filter(|f| f.is_danger_pocket).count() as u32,
                transport_voters: fams
                    .iter()
                    .filter(|f| f.needs_transport)
                    .map(|f| f.present_voter_count)
                    .sum(),
                coverage_percent,
                is_under_surveyed: coverage_percent < params.low_coverage_threshold,
            }
        })
        .collect()
}
