//! The single campaign dashboard aggregate.
//!
//! `calculate_dashboard_metrics` never fails. Empty inputs produce the same
//! shape as `DashboardMetrics::empty()`: zero counts, empty lists, Critical.

pub mod alerts;
pub mod resources;
pub mod win_probability;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cm_core::determinism::{cmp_count_desc, cmp_score_desc, StableOrd};
use cm_core::rounding::{percent_count, percent_of};
use cm_core::{
    EnhancedVoter, HouseholdId, Influencer, LikelyTurnout, MohallaId, ScoringParams, Stance, VoterId,
    VoterType,
};

use crate::family::FamilyMetrics;
use crate::mohalla::MohallaMetrics;
use crate::scoring::VoterSupportScore;

use alerts::{generate_risk_alerts, AlertInputs, RiskAlert};
use resources::{recommend_resources, ResourceRecommendation};
use win_probability::{win_probability_band, win_probability_percent, WinProbabilityBand};

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBreakdown {
    pub confirmed: u32,
    pub likely: u32,
    pub swing: u32,
    pub opposition: u32,
    pub unknown: u32,
}

impl VoteBreakdown {
    fn add(&mut self, t: VoterType) {
        match t {
            VoterType::Confirmed => self.confirmed += 1,
            VoterType::Likely => self.likely += 1,
            VoterType::Swing => self.swing += 1,
            VoterType::Opposition => self.opposition += 1,
            VoterType::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.confirmed + self.likely + self.swing + self.opposition + self.unknown
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnoutBuckets {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl TurnoutBuckets {
    fn add(&mut self, t: LikelyTurnout) {
        match t {
            LikelyTurnout::High => self.high += 1,
            LikelyTurnout::Medium => self.medium += 1,
            LikelyTurnout::Low => self.low += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageStats {
    pub total_households: u32,
    pub surveyed_households: u32,
    pub fresh_households: u32,
    pub household_coverage_percent: f64,
    pub total_voters: u32,
    pub tagged_voters: u32,
    pub voter_tagging_percent: f64,
    /// Fresh surveys as a share of surveyed households.
    pub data_freshness_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStats {
    pub working_outside: u32,
    pub seasonal_migrants: u32,
    pub students: u32,
    pub elderly_sick: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluenceSummary {
    pub supportive: u32,
    pub neutral: u32,
    pub opposed: u32,
    pub convertible: u32,
    pub votes_under_supportive_influence: u64,
    pub opposed_vote_control: u64,
    /// Votes held by convertible influencers who are not yet supportive.
    pub convertible_votes_at_stake: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportReason {
    ElderlySick,
    HouseholdNeedsTransport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportVoter {
    pub voter_id: VoterId,
    pub name: String,
    pub household_id: HouseholdId,
    pub mohalla_id: MohallaId,
    pub reason: TransportReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_voters: u32,
    pub total_present_voters: u32,
    pub away_voters: u32,
    pub total_support_score: f64,
    pub expected_votes_if_today_polling: f64,
    pub vote_share_percent: f64,
    pub win_probability_percent: f64,
    pub win_probability_band: WinProbabilityBand,
    pub vote_breakdown: VoteBreakdown,
    pub turnout_buckets: TurnoutBuckets,
    pub coverage: CoverageStats,
    pub migration: MigrationStats,
    pub influence: InfluenceSummary,
    pub top_families: Vec<FamilyMetrics>,
    pub danger_pockets: Vec<FamilyMetrics>,
    pub weak_pockets: Vec<FamilyMetrics>,
    pub top_swing_mohallas: Vec<MohallaMetrics>,
    pub gotv_families: Vec<FamilyMetrics>,
    pub under_surveyed_mohallas: Vec<MohallaMetrics>,
    pub transport_required: Vec<TransportVoter>,
    pub risk_alerts: Vec<RiskAlert>,
    pub resource_recommendations: Vec<ResourceRecommendation>,
}

impl DashboardMetrics {
    /// Shape returned when there is nothing to summarize.
    pub fn empty() -> Self {
        Self {
            total_voters: 0,
            total_present_voters: 0,
            away_voters: 0,
            total_support_score: 0.0,
            expected_votes_if_today_polling: 0.0,
            vote_share_percent: 0.0,
            win_probability_percent: 0.0,
            win_probability_band: WinProbabilityBand::Critical,
            vote_breakdown: VoteBreakdown::default(),
            turnout_buckets: TurnoutBuckets::default(),
            coverage: CoverageStats::default(),
            migration: MigrationStats::default(),
            influence: InfluenceSummary::default(),
            top_families: Vec::new(),
            danger_pockets: Vec::new(),
            weak_pockets: Vec::new(),
            top_swing_mohallas: Vec::new(),
            gotv_families: Vec::new(),
            under_surveyed_mohallas: Vec::new(),
            transport_required: Vec::new(),
            risk_alerts: Vec::new(),
            resource_recommendations: Vec::new(),
        }
    }
}

/// Survey age is measured in whole seconds; a survey dated after `as_of`
/// counts as fresh.
fn is_fresh(surveyed_at: DateTime<Utc>, as_of: DateTime<Utc>, days: u32) -> bool {
    as_of.timestamp() - surveyed_at.timestamp() <= i64::from(days) * SECONDS_PER_DAY
}

fn coverage_stats(
    scores: &[VoterSupportScore],
    families: &[FamilyMetrics],
    as_of: DateTime<Utc>,
    params: &ScoringParams,
) -> CoverageStats {
    let total_households = families.len() as u32;
    let surveyed_households = families.iter().filter(|f| f.is_surveyed).count() as u32;
    let fresh_households = families
        .iter()
        .filter_map(|f| f.surveyed_at)
        .filter(|t| is_fresh(*t, as_of, params.freshness_days))
        .count() as u32;
    let total_voters = scores.len() as u32;
    let tagged_voters = scores.iter().filter(|s| s.voter_type.is_tagged()).count() as u32;
    CoverageStats {
        total_households,
        surveyed_households,
        fresh_households,
        household_coverage_percent: percent_count(surveyed_households.into(), total_households.into()),
        total_voters,
        tagged_voters,
        voter_tagging_percent: percent_count(tagged_voters.into(), total_voters.into()),
        data_freshness_percent: percent_count(fresh_households.into(), surveyed_households.into()),
    }
}

fn migration_stats(voters: &[EnhancedVoter]) -> MigrationStats {
    let mut m = MigrationStats::default();
    for v in voters {
        m.working_outside += u32::from(v.working_outside);
        m.seasonal_migrants += u32::from(v.seasonal_migrant);
        m.students += u32::from(v.is_student);
        m.elderly_sick += u32::from(v.is_elderly_sick);
    }
    m
}

fn influence_summary(influencers: &[Influencer]) -> InfluenceSummary {
    let mut s = InfluenceSummary::default();
    for i in influencers {
        let votes = u64::from(i.estimated_vote_control);
        match i.stance {
            Stance::Supportive => {
                s.supportive += 1;
                s.votes_under_supportive_influence += votes;
            }
            Stance::Neutral => s.neutral += 1,
            Stance::Opposed => {
                s.opposed += 1;
                s.opposed_vote_control += votes;
            }
        }
        if i.is_convertible {
            s.convertible += 1;
            match i.stance {
                Stance::Neutral | Stance::Opposed => s.convertible_votes_at_stake += votes,
                Stance::Supportive => {}
            }
        }
    }
    s
}

fn transport_required(voters: &[EnhancedVoter], families: &[FamilyMetrics]) -> Vec<TransportVoter> {
    let needs: BTreeMap<&HouseholdId, bool> =
        families.iter().map(|f| (&f.household_id, f.needs_transport)).collect();
    voters
        .iter()
        .filter(|v| v.is_present && v.voter_type.is_favorable())
        .filter_map(|v| {
            let reason = if v.is_elderly_sick {
                TransportReason::ElderlySick
            } else if needs.get(&v.household_id).copied().unwrap_or(false) {
                TransportReason::HouseholdNeedsTransport
            } else {
                return None;
            };
            Some(TransportVoter {
                voter_id: v.id.clone(),
                name: v.name.clone(),
                household_id: v.household_id.clone(),
                mohalla_id: v.mohalla_id.clone(),
                reason,
            })
        })
        .collect()
}

fn ranked_families(families: &[FamilyMetrics], params: &ScoringParams) -> RankedFamilies {
    let mut top: Vec<FamilyMetrics> = families
        .iter()
        .filter(|f| f.voter_count > 0 && f.family_support_score > 0.0)
        .cloned()
        .collect();
    top.sort_by(|a, b| {
        b.family_support_score
            .total_cmp(&a.family_support_score)
            .then_with(|| cmp_score_desc(a.expected_votes_for_us, &a.household_id, b.expected_votes_for_us, &b.household_id))
    });
    top.truncate(params.top_families_limit);

    let mut danger: Vec<FamilyMetrics> = families.iter().filter(|f| f.is_danger_pocket).cloned().collect();
    danger.sort_by(|a, b| {
        cmp_count_desc(
            a.family_influence_level.into(),
            &a.household_id,
            b.family_influence_level.into(),
            &b.household_id,
        )
    });

    let mut weak: Vec<FamilyMetrics> = families.iter().filter(|f| f.is_weak_pocket).cloned().collect();
    weak.sort_by(|a, b| {
        a.family_support_score
            .total_cmp(&b.family_support_score)
            .then_with(|| a.household_id.stable_cmp(&b.household_id))
    });

    let mut gotv: Vec<FamilyMetrics> = families.iter().filter(|f| f.needs_gotv()).cloned().collect();
    gotv.sort_by(|a, b| {
        cmp_count_desc(
            a.present_voter_count.into(),
            &a.household_id,
            b.present_voter_count.into(),
            &b.household_id,
        )
    });

    RankedFamilies { top, danger, weak, gotv }
}

struct RankedFamilies {
    top: Vec<FamilyMetrics>,
    danger: Vec<FamilyMetrics>,
    weak: Vec<FamilyMetrics>,
    gotv: Vec<FamilyMetrics>,
}

pub fn calculate_dashboard_metrics(
    voter_scores: &[VoterSupportScore],
    family_metrics: &[FamilyMetrics],
    mohalla_metrics: &[MohallaMetrics],
    influencers: &[Influencer],
    enhanced_voters: &[EnhancedVoter],
    as_of: DateTime<Utc>,
    params: &ScoringParams,
) -> DashboardMetrics {
    if voter_scores.is_empty()
        && family_metrics.is_empty()
        && mohalla_metrics.is_empty()
        && influencers.is_empty()
        && enhanced_voters.is_empty()
    {
        log::debug!("calculate_dashboard_metrics: empty input");
        return DashboardMetrics::empty();
    }

    let mut vote_breakdown = VoteBreakdown::default();
    let mut turnout_buckets = TurnoutBuckets::default();
    let mut total_support_score = 0.0;
    let mut expected = 0.0;
    let mut present = 0u32;
    for s in voter_scores.iter().filter(|s| s.is_present) {
        present += 1;
        vote_breakdown.add(s.voter_type);
        turnout_buckets.add(s.likely_turnout);
        total_support_score += s.support_score;
        if s.is_favorable {
            expected += s.support_score * s.turnout_probability;
        }
    }
    let total_voters = voter_scores.len() as u32;
    let vote_share_percent = percent_of(expected, f64::from(present));
    let win_probability_percent = win_probability_percent(vote_share_percent, &params.win_probability_curve);
    let band = win_probability_band(win_probability_percent, &params.win_band_breakpoints);

    let coverage = coverage_stats(voter_scores, family_metrics, as_of, params);
    let influence = influence_summary(influencers);
    let ranked = ranked_families(family_metrics, params);

    let mut top_swing_mohallas: Vec<MohallaMetrics> =
        mohalla_metrics.iter().filter(|m| m.actionable_swing > 0).cloned().collect();
    top_swing_mohallas.sort_by(|a, b| {
        cmp_count_desc(a.actionable_swing.into(), &a.mohalla_id, b.actionable_swing.into(), &b.mohalla_id)
    });
    top_swing_mohallas.truncate(params.top_swing_mohallas_limit);

    let mut under_surveyed_mohallas: Vec<MohallaMetrics> =
        mohalla_metrics.iter().filter(|m| m.is_under_surveyed).cloned().collect();
    under_surveyed_mohallas.sort_by(|a, b| {
        a.coverage_percent
            .total_cmp(&b.coverage_percent)
            .then_with(|| a.mohalla_id.stable_cmp(&b.mohalla_id))
    });

    let away_voters = total_voters - present;
    let risk_alerts = generate_risk_alerts(
        &AlertInputs {
            families: family_metrics,
            mohallas: mohalla_metrics,
            coverage: &coverage,
            influence: &influence,
            band,
            vote_share_percent,
            total_present_voters: present,
            away_voters,
        },
        params,
    );
    let resource_recommendations = recommend_resources(mohalla_metrics, params);

    log::info!(
        "dashboard: {} voters ({} present), vote share {:.1}%, win {:.1}% ({}), {} alerts",
        total_voters,
        present,
        vote_share_percent,
        win_probability_percent,
        band.as_str(),
        risk_alerts.len()
    );

    DashboardMetrics {
        total_voters,
        total_present_voters: present,
        away_voters,
        total_support_score,
        expected_votes_if_today_polling: expected,
        vote_share_percent,
        win_probability_percent,
        win_probability_band: band,
        vote_breakdown,
        turnout_buckets,
        coverage,
        migration: migration_stats(enhanced_voters),
        influence,
        top_families: ranked.top,
        danger_pockets: ranked.danger,
        weak_pockets: ranked.weak,
        top_swing_mohallas,
        gotv_families: ranked.gotv,
        under_surveyed_mohallas,
        transport_required: transport_required(enhanced_voters, family_metrics),
        risk_alerts,
        resource_recommendations,
    }
}
