//! Household (family) roll-up of voter scores.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cm_core::rounding::mean;
use cm_core::{Household, HouseholdId, Mohalla, MohallaId, ScoringParams, Sentiment};

use crate::scoring::VoterSupportScore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMetrics {
    pub household_id: HouseholdId,
    pub mohalla_id: MohallaId,
    /// Empty when the mohalla is not in the snapshot.
    pub mohalla_name: String,
    pub head_name: String,
    pub caste: String,
    pub category: String,
    pub family_influence_level: u8,
    pub family_sentiment: Sentiment,
    pub voter_count: u32,
    pub present_voter_count: u32,
    pub family_support_score: f64,
    pub average_turnout: f64,
    pub expected_votes_for_us: f64,
    pub swing_voter_count: u32,
    pub is_surveyed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surveyed_at: Option<DateTime<Utc>>,
    pub needs_transport: bool,
    pub is_high_support: bool,
    pub is_low_turnout: bool,
    pub is_danger_pocket: bool,
    pub is_swing_opportunity: bool,
    pub is_weak_pocket: bool,
    pub is_high_influence: bool,
}

impl FamilyMetrics {
    /// Supportive family whose members are unlikely to turn out.
    pub fn needs_gotv(&self) -> bool {
        self.is_high_support && self.is_low_turnout
    }
}

/// Group scores by household id, keeping each group in voter input order.
pub(crate) fn group_by_household(scores: &[VoterSupportScore]) -> BTreeMap<&HouseholdId, Vec<&VoterSupportScore>> {
    let mut m: BTreeMap<&HouseholdId, Vec<&VoterSupportScore>> = BTreeMap::new();
    for s in scores {
        m.entry(&s.household_id).or_default().push(s);
    }
    m
}

fn head_name(h: &Household, members: &[&VoterSupportScore]) -> String {
    let stored = h.head_name.trim();
    if !stored.is_empty() {
        return stored.to_string();
    }
    members
        .iter()
        .find(|s| s.is_head)
        .map(|s| s.name.clone())
        .unwrap_or_default()
}

/// One `FamilyMetrics` per household, in household input order. Households
/// without any scored member still get an entry with zeroed voter figures.
pub fn calculate_family_metrics(
    households: &[Household],
    voter_scores: &[VoterSupportScore],
    mohallas: &[Mohalla],
    params: &ScoringParams,
) -> Vec<FamilyMetrics> {
    let by_household = group_by_household(voter_scores);
    let mohalla_names: BTreeMap<&MohallaId, &str> =
        mohallas.iter().map(|m| (&m.id, m.name.as_str())).collect();

    let out: Vec<FamilyMetrics> = households
        .iter()
        .map(|h| {
            let members: &[&VoterSupportScore] =
                by_household.get(&h.id).map(Vec::as_slice).unwrap_or(&[]);

            let voter_count = members.len() as u32;
            let present_voter_count = members.iter().filter(|s| s.is_present).count() as u32;
            let swing_voter_count = members.iter().filter(|s| s.is_swing).count() as u32;
            let family_support_score = mean(members.iter().map(|s| s.support_score));
            let average_turnout = mean(members.iter().map(|s| s.turnout_probability));
            let expected_votes_for_us: f64 = members
                .iter()
                .filter(|s| s.is_present && s.is_favorable)
                .map(|s| s.support_score * s.turnout_probability)
                .sum();

            let has_voters = voter_count > 0;
            let influence = h.family_influence_level;

            FamilyMetrics {
                household_id: h.id.clone(),
                mohalla_id: h.mohalla_id.clone(),
                mohalla_name: mohalla_names.get(&h.mohalla_id).map(|n| n.to_string()).unwrap_or_default(),
                head_name: head_name(h, members),
                caste: h.caste.clone(),
                category: h.category.clone(),
                family_influence_level: influence,
                family_sentiment: h.family_sentiment,
                voter_count,
                present_voter_count,
                family_support_score,
                average_turnout,
                expected_votes_for_us,
                swing_voter_count,
                is_surveyed: h.is_surveyed(),
                surveyed_at: h.surveyed_at,
                needs_transport: h.needs_transport,
                is_high_support: has_voters && family_support_score >= params.high_support_threshold,
                is_low_turnout: has_voters && average_turnout < params.low_turnout_threshold,
                is_danger_pocket: influence >= params.danger_pocket_influence
                    && h.family_sentiment.is_at_risk(),
                is_swing_opportunity: swing_voter_count > 0 && h.family_sentiment == Sentiment::Dicey,
                is_weak_pocket: has_voters && family_support_score < params.weak_support_threshold,
                is_high_influence: influence >= params.high_influence_threshold,
            }
        })
        .collect();

    log::debug!(
        "calculate_family_metrics: {} households, {} danger pockets",
        out.len(),
        out.iter().filter(|f| f.is_danger_pocket).count()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::score_all_voters;
    use cm_core::{AgeBand, EnhancedVoter, Gender, LikelyTurnout, LoyaltyStrength, VoterType};

    fn household(id: &str, influence: u8, sentiment: Sentiment) -> Household {
        Household {
            id: id.parse().unwrap(),
            mohalla_id: "m1".parse().unwrap(),
            head_name: String::new(),
            caste: "Yadav".into(),
            category: "OBC".into(),
            family_influence_level: influence,
            family_sentiment: sentiment,
            total_voters: 0,
            male_voters: 0,
            female_voters: 0,
            surveyed_at: None,
            needs_transport: false,
        }
    }

    fn voter(id: &str, hh: &str, t: VoterType, turnout: LikelyTurnout) -> EnhancedVoter {
        EnhancedVoter {
            id: id.parse().unwrap(),
            name: format!("Voter {id}"),
            gender: Gender::Female,
            age_band: AgeBand::A36To45,
            relation_to_head: "Spouse".into(),
            household_id: hh.parse().unwrap(),
            mohalla_id: "m1".parse().unwrap(),
            voter_type: t,
            loyalty_strength: Some(LoyaltyStrength::Strong),
            likely_turnout: turnout,
            is_present: true,
            working_outside: false,
            seasonal_migrant: false,
            is_student: false,
            is_elderly_sick: false,
        }
    }

    fn mohallas() -> Vec<Mohalla> {
        vec![Mohalla { id: "m1".parse().unwrap(), name: "Purab Tola".into(), total_households: 0, total_voters: 0 }]
    }

    #[test]
    fn supportive_family_with_low_turnout_needs_gotv() {
        let p = ScoringParams::default();
        let voters = vec![
            voter("v1", "h1", VoterType::Confirmed, LikelyTurnout::Low),
            voter("v2", "h1", VoterType::Confirmed, LikelyTurnout::Medium),
        ];
        let scores = score_all_voters(&voters, &p);
        let fam = calculate_family_metrics(&[household("h1", 2, Sentiment::Favorable)], &scores, &mohallas(), &p);
        let f = &fam[0];
        assert_eq!(f.voter_count, 2);
        assert_eq!(f.family_support_score, 1.0);
        assert!((f.average_turnout - 0.35).abs() < 1e-12);
        assert!((f.expected_votes_for_us - 0.7).abs() < 1e-12);
        assert!(f.is_high_support && f.is_low_turnout && f.needs_gotv());
        assert_eq!(f.mohalla_name, "Purab Tola");
    }

    #[test]
    fn influential_unfavorable_family_is_danger_pocket() {
        let p = ScoringParams::default();
        let fam = calculate_family_metrics(&[household("h1", 5, Sentiment::Unfavorable)], &[], &mohallas(), &p);
        assert!(fam[0].is_danger_pocket);
        assert!(fam[0].is_high_influence);
        let fam = calculate_family_metrics(&[household("h1", 5, Sentiment::Favorable)], &[], &mohallas(), &p);
        assert!(!fam[0].is_danger_pocket);
    }

    #[test]
    fn empty_household_is_kept_with_zeroes() {
        let p = ScoringParams::default();
        let fam = calculate_family_metrics(&[household("h9", 1, Sentiment::Dicey)], &[], &[], &p);
        assert_eq!(fam.len(), 1);
        let f = &fam[0];
        assert_eq!(f.voter_count, 0);
        assert_eq!(f.family_support_score, 0.0);
        assert!(!f.is_high_support && !f.is_low_turnout && !f.is_weak_pocket && !f.is_swing_opportunity);
        assert_eq!(f.mohalla_name, "");
    }

    #[test]
    fn swing_opportunity_needs_dicey_sentiment() {
        let p = ScoringParams::default();
        let mut swing = voter("v1", "h1", VoterType::Swing, LikelyTurnout::High);
        swing.loyalty_strength = Some(LoyaltyStrength::Weak);
        let scores = score_all_voters(&[swing], &p);
        let dicey = calculate_family_metrics(&[household("h1", 1, Sentiment::Dicey)], &scores, &[], &p);
        assert!(dicey[0].is_swing_opportunity);
        // 0.3 × 0.7
        assert!((dicey[0].family_support_score - 0.21).abs() < 1e-12);
        assert!(dicey[0].is_weak_pocket);
        let fav = calculate_family_metrics(&[household("h1", 1, Sentiment::Favorable)], &scores, &[], &p);
        assert!(!fav[0].is_swing_opportunity);
    }

    #[test]
    fn support_at_weak_threshold_is_not_weak() {
        let p = ScoringParams::default();
        let scores = score_all_voters(&[voter("v1", "h1", VoterType::Swing, LikelyTurnout::High)], &p);
        let fam = calculate_family_metrics(&[household("h1", 1, Sentiment::Dicey)], &scores, &[], &p);
        assert_eq!(fam[0].family_support_score, cm_core::params::WEAK_SUPPORT_THRESHOLD);
        assert!(!fam[0].is_weak_pocket);

        let mut below = p.clone();
        below.weak_support_threshold = 0.31;
        let fam = calculate_family_metrics(&[household("h1", 1, Sentiment::Dicey)], &scores, &[], &below);
        assert!(fam[0].is_weak_pocket);
    }

    #[test]
    fn head_name_prefers_stored_then_self_member() {
        let p = ScoringParams::default();
        let mut head = voter("v1", "h1", VoterType::Likely, LikelyTurnout::High);
        head.relation_to_head = "Self".into();
        head.name = "Ram Prasad".into();
        let scores = score_all_voters(&[head], &p);

        let fam = calculate_family_metrics(&[household("h1", 1, Sentiment::Dicey)], &scores, &[], &p);
        assert_eq!(fam[0].head_name, "Ram Prasad");

        let mut stored = household("h1", 1, Sentiment::Dicey);
        stored.head_name = "Shyam Lal".into();
        let fam = calculate_family_metrics(&[stored], &scores, &[], &p);
        assert_eq!(fam[0].head_name, "Shyam Lal");
    }

    #[test]
    fn away_favorable_voters_do_not_add_expected_votes() {
        let p = ScoringParams::default();
        let mut away = voter("v1", "h1", VoterType::Confirmed, LikelyTurnout::High);
        away.is_present = false;
        let scores = score_all_voters(&[away], &p);
        let fam = calculate_family_metrics(&[household("h1", 1, Sentiment::Favorable)], &scores, &[], &p);
        assert_eq!(fam[0].expected_votes_for_us, 0.0);
        assert_eq!(fam[0].present_voter_count, 0);
        assert_eq!(fam[0].voter_count, 1);
    }
}
