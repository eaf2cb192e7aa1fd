//! params.rs: scoring parameters and the named constants they default to.
//!
//! The constants below are part of the engine contract: every downstream
//! number depends on them. `ScoringParams::default()` reproduces them exactly;
//! a parameter file may override any subset for what-if runs (omitted fields
//! keep their defaults).

use serde::{Deserialize, Serialize};

use crate::entities::{LikelyTurnout, LoyaltyStrength, VoterType};
use crate::errors::CoreError;

// ------------ Lookup tables ------------

/// Base support value per voter type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterTypeValues {
    pub confirmed: f64,
    pub likely: f64,
    pub swing: f64,
    pub opposition: f64,
    pub unknown: f64,
}

impl VoterTypeValues {
    pub fn value(&self, t: VoterType) -> f64 {
        match t {
            VoterType::Confirmed => self.confirmed,
            VoterType::Likely => self.likely,
            VoterType::Swing => self.swing,
            VoterType::Opposition => self.opposition,
            VoterType::Unknown => self.unknown,
        }
    }
}

/// Multiplier applied to the base value when loyalty was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyMultipliers {
    pub strong: f64,
    pub medium: f64,
    pub weak: f64,
}

impl LoyaltyMultipliers {
    /// Absent loyalty is neutral (1.0).
    pub fn multiplier(&self, l: Option<LoyaltyStrength>) -> f64 {
        match l {
            Some(LoyaltyStrength::Strong) => self.strong,
            Some(LoyaltyStrength::Medium) => self.medium,
            Some(LoyaltyStrength::Weak) => self.weak,
            None => NEUTRAL_LOYALTY_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnoutProbabilities {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl TurnoutProbabilities {
    pub fn probability(&self, t: LikelyTurnout) -> f64 {
        match t {
            LikelyTurnout::High => self.high,
            LikelyTurnout::Medium => self.medium,
            LikelyTurnout::Low => self.low,
        }
    }
}

/// One knot of the vote-share → win-probability curve (both in percent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurvePoint {
    pub vote_share: f64,
    pub win_probability: f64,
}

/// Lower bounds (inclusive, percent) of the upper three win bands.
/// Below `competitive` is Critical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinBandBreakpoints {
    pub competitive: f64,
    pub comfortable: f64,
    pub strong: f64,
}

/// Staffing ratios used by the resource planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRatios {
    pub voters_per_vehicle: u32,
    pub swing_voters_per_volunteer: u32,
    pub households_per_survey_volunteer: u32,
    pub voters_per_booth_agent: u32,
    /// Actionable swing count at which a mohalla becomes high priority.
    pub high_priority_swing: u32,
}

// ------------ Named constants (contract) ------------

pub const VOTER_TYPE_VALUES: VoterTypeValues = VoterTypeValues {
    confirmed: 1.0,
    likely: 0.75,
    unknown: 0.4,
    swing: 0.3,
    opposition: 0.0,
};

pub const LOYALTY_MULTIPLIERS: LoyaltyMultipliers = LoyaltyMultipliers {
    strong: 1.0,
    medium: 0.85,
    weak: 0.7,
};

pub const NEUTRAL_LOYALTY_MULTIPLIER: f64 = 1.0;

pub const TURNOUT_PROBABILITIES: TurnoutProbabilities = TurnoutProbabilities {
    high: 0.8,
    medium: 0.5,
    low: 0.2,
};

/// Influence level (0..=5) from which a family counts as high influence.
pub const HIGH_INFLUENCE_THRESHOLD: u8 = 3;
/// Influence level from which an at-risk family is a danger pocket.
pub const DANGER_POCKET_INFLUENCE: u8 = 4;
/// Mohalla survey coverage (percent) below which it is under-surveyed.
pub const LOW_COVERAGE_THRESHOLD: f64 = 50.0;
/// A survey older than this many days is stale.
pub const FRESHNESS_DAYS: u32 = 30;
pub const HIGH_SUPPORT_THRESHOLD: f64 = 0.7;
pub const LOW_TURNOUT_THRESHOLD: f64 = 0.5;
pub const WEAK_SUPPORT_THRESHOLD: f64 = 0.3;

pub const WIN_PROBABILITY_CURVE: [CurvePoint; 6] = [
    CurvePoint { vote_share: 0.0, win_probability: 0.0 },
    CurvePoint { vote_share: 15.0, win_probability: 20.0 },
    CurvePoint { vote_share: 25.0, win_probability: 45.0 },
    CurvePoint { vote_share: 35.0, win_probability: 70.0 },
    CurvePoint { vote_share: 45.0, win_probability: 90.0 },
    CurvePoint { vote_share: 100.0, win_probability: 99.0 },
];

pub const WIN_BAND_BREAKPOINTS: WinBandBreakpoints = WinBandBreakpoints {
    competitive: 30.0,
    comfortable: 55.0,
    strong: 75.0,
};

pub const RESOURCE_RATIOS: ResourceRatios = ResourceRatios {
    voters_per_vehicle: 10,
    swing_voters_per_volunteer: 15,
    households_per_survey_volunteer: 20,
    voters_per_booth_agent: 250,
    high_priority_swing: 20,
};

pub const TOP_FAMILIES_LIMIT: usize = 10;
pub const TOP_SWING_MOHALLAS_LIMIT: usize = 3;
/// Danger pockets in one mohalla that escalate to a high-severity alert.
pub const DANGER_CLUSTER_SIZE: u32 = 3;

// ------------ Params ------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringParams {
    pub voter_type_values: VoterTypeValues,
    pub loyalty_multipliers: LoyaltyMultipliers,
    pub turnout_probabilities: TurnoutProbabilities,
    pub high_influence_threshold: u8,
    pub danger_pocket_influence: u8,
    pub low_coverage_threshold: f64,
    pub freshness_days: u32,
    pub high_support_threshold: f64,
    pub low_turnout_threshold: f64,
    pub weak_support_threshold: f64,
    pub win_probability_curve: Vec<CurvePoint>,
    pub win_band_breakpoints: WinBandBreakpoints,
    pub resource_ratios: ResourceRatios,
    pub top_families_limit: usize,
    pub top_swing_mohallas_limit: usize,
    pub danger_cluster_size: u32,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            voter_type_values: VOTER_TYPE_VALUES,
            loyalty_multipliers: LOYALTY_MULTIPLIERS,
            turnout_probabilities: TURNOUT_PROBABILITIES,
            high_influence_threshold: HIGH_INFLUENCE_THRESHOLD,
            danger_pocket_influence: DANGER_POCKET_INFLUENCE,
            low_coverage_threshold: LOW_COVERAGE_THRESHOLD,
            freshness_days: FRESHNESS_DAYS,
            high_support_threshold: HIGH_SUPPORT_THRESHOLD,
            low_turnout_threshold: LOW_TURNOUT_THRESHOLD,
            weak_support_threshold: WEAK_SUPPORT_THRESHOLD,
            win_probability_curve: WIN_PROBABILITY_CURVE.to_vec(),
            win_band_breakpoints: WIN_BAND_BREAKPOINTS,
            resource_ratios: RESOURCE_RATIOS,
            top_families_limit: TOP_FAMILIES_LIMIT,
            top_swing_mohallas_limit: TOP_SWING_MOHALLAS_LIMIT,
            danger_cluster_size: DANGER_CLUSTER_SIZE,
        }
    }
}

// -------- Validation (domain + cross-field consistency) --------

fn unit_interval(v: f64) -> bool {
    v.is_finite() && (0.0..=1.0).contains(&v)
}

fn percent(v: f64) -> bool {
    v.is_finite() && (0.0..=100.0).contains(&v)
}

/// Validate numeric domains and cross-field consistency.
pub fn validate_domains(p: &ScoringParams) -> Result<(), CoreError> {
    let vt = &p.voter_type_values;
    if ![vt.confirmed, vt.likely, vt.swing, vt.opposition, vt.unknown].into_iter().all(unit_interval) {
        return Err(CoreError::DomainOutOfRange("voterTypeValues must lie in [0,1]"));
    }
    let lm = &p.loyalty_multipliers;
    if ![lm.strong, lm.medium, lm.weak].into_iter().all(|m| m.is_finite() && (0.0..=2.0).contains(&m)) {
        return Err(CoreError::DomainOutOfRange("loyaltyMultipliers must lie in [0,2]"));
    }
    let tp = &p.turnout_probabilities;
    if ![tp.high, tp.medium, tp.low].into_iter().all(unit_interval) {
        return Err(CoreError::DomainOutOfRange("turnoutProbabilities must lie in [0,1]"));
    }
    if p.high_influence_threshold > 5 || p.danger_pocket_influence > 5 {
        return Err(CoreError::DomainOutOfRange("influence thresholds must lie in 0..=5"));
    }
    if !percent(p.low_coverage_threshold) {
        return Err(CoreError::DomainOutOfRange("lowCoverageThreshold must lie in [0,100]"));
    }
    if ![p.high_support_threshold, p.low_turnout_threshold, p.weak_support_threshold]
        .into_iter()
        .all(unit_interval)
    {
        return Err(CoreError::DomainOutOfRange("support/turnout thresholds must lie in [0,1]"));
    }
    if p.weak_support_threshold > p.high_support_threshold {
        return Err(CoreError::Consistency("weakSupportThreshold exceeds highSupportThreshold"));
    }

    validate_curve(&p.win_probability_curve)?;

    let b = &p.win_band_breakpoints;
    if ![b.competitive, b.comfortable, b.strong].into_iter().all(percent) {
        return Err(CoreError::DomainOutOfRange("winBandBreakpoints must lie in [0,100]"));
    }
    if !(0.0 < b.competitive && b.competitive < b.comfortable && b.comfortable < b.strong) {
        return Err(CoreError::Consistency("winBandBreakpoints must be strictly increasing and above 0"));
    }

    let r = &p.resource_ratios;
    if r.voters_per_vehicle == 0
        || r.swing_voters_per_volunteer == 0
        || r.households_per_survey_volunteer == 0
        || r.voters_per_booth_agent == 0
    {
        return Err(CoreError::DomainOutOfRange("resourceRatios must be positive"));
    }
    if p.danger_cluster_size == 0 {
        return Err(CoreError::DomainOutOfRange("dangerClusterSize must be positive"));
    }
    Ok(())
}

/// The curve must span vote share 0..=100 with strictly increasing x and
/// non-decreasing y inside [0,100].
fn validate_curve(curve: &[CurvePoint]) -> Result<(), CoreError> {
    if curve.len() < 2 {
        return Err(CoreError::DomainOutOfRange("winProbabilityCurve needs at least two points"));
    }
    if !curve.iter().all(|c| percent(c.vote_share) && percent(c.win_probability)) {
        return Err(CoreError::DomainOutOfRange("winProbabilityCurve points must lie in [0,100]"));
    }
    let first = curve[0];
    let last = curve[curve.len() - 1];
    if first.vote_share != 0.0 || last.vote_share != 100.0 {
        return Err(CoreError::Consistency("winProbabilityCurve must start at 0 and end at 100"));
    }
    for w in curve.windows(2) {
        if w[1].vote_share <= w[0].vote_share || w[1].win_probability < w[0].win_probability {
            return Err(CoreError::Consistency("winProbabilityCurve must be increasing"));
        }
    }
    Ok(())
}
