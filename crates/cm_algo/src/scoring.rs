//! Voter support scoring.
//!
//! Each voter is scored in isolation: the result depends on that voter and
//! the parameter tables only, so the list can be recomputed piecemeal.

use serde::{Deserialize, Serialize};

use cm_core::rounding::clamp_finite;
use cm_core::{
    AgeBand, EnhancedVoter, Gender, HouseholdId, LikelyTurnout, LoyaltyStrength, MohallaId,
    ScoringParams, VoterId, VoterType,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterSupportScore {
    pub voter_id: VoterId,
    pub name: String,
    pub household_id: HouseholdId,
    pub mohalla_id: MohallaId,
    pub gender: Gender,
    pub age_band: AgeBand,
    pub voter_type: VoterType,
    pub likely_turnout: LikelyTurnout,
    pub is_head: bool,
    pub is_present: bool,
    /// In `[0, 1]`.
    pub support_score: f64,
    pub turnout_probability: f64,
    pub is_swing: bool,
    pub is_favorable: bool,
}

/// Swing voters plus untagged voters without a strong loyalty signal.
fn is_swing(voter_type: VoterType, loyalty: Option<LoyaltyStrength>) -> bool {
    match voter_type {
        VoterType::Swing => true,
        VoterType::Unknown => loyalty != Some(LoyaltyStrength::Strong),
        VoterType::Confirmed | VoterType::Likely | VoterType::Opposition => false,
    }
}

pub fn score_voter(voter: &EnhancedVoter, params: &ScoringParams) -> VoterSupportScore {
    let base = params.voter_type_values.value(voter.voter_type);
    let mult = params.loyalty_multipliers.multiplier(voter.loyalty_strength);
    VoterSupportScore {
        voter_id: voter.id.clone(),
        name: voter.name.clone(),
        household_id: voter.household_id.clone(),
        mohalla_id: voter.mohalla_id.clone(),
        gender: voter.gender,
        age_band: voter.age_band,
        voter_type: voter.voter_type,
        likely_turnout: voter.likely_turnout,
        is_head: voter.is_head(),
        is_present: voter.is_present,
        support_score: clamp_finite(base * mult, 0.0, 1.0),
        turnout_probability: params.turnout_probabilities.probability(voter.likely_turnout),
        is_swing: is_swing(voter.voter_type, voter.loyalty_strength),
        is_favorable: voter.voter_type.is_favorable(),
    }
}

/// Score every voter, preserving input order. Away voters are scored too.
pub fn score_all_voters(voters: &[EnhancedVoter], params: &ScoringParams) -> Vec<VoterSupportScore> {
    let out: Vec<VoterSupportScore> = voters.iter().map(|v| score_voter(v, params)).collect();
    log::debug!("score_all_voters: scored {} voters", out.len());
    out
}
