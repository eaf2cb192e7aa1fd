//! entities.rs: input records as they arrive from the persistence layer.
//!
//! Wire names are camelCase and enum tokens match the strings the field app
//! stores. Every enum is closed; consumers match exhaustively so a new variant
//! is a compile-time-visible change in every scoring table and aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tokens::{HouseholdId, InfluencerId, MohallaId, VoterId};

/// Define a serde'd closed enum with explicit wire tokens, an `ALL` table in
/// declaration order and `as_str()` returning the wire token.
macro_rules! wire_enum {
    ($(#[$outer:meta])* $name:ident => { $($(#[$inner:meta])* $variant:ident = $token:literal),+ $(,)? }) => {
        $(#[$outer])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $(#[$inner])*
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum!(Gender => {
    Male = "Male",
    Female = "Female",
    #[serde(other)]
    Other = "Other",
});

wire_enum!(
    /// Age bands as tagged by surveyors.
    AgeBand => {
    A18To25 = "18-25",
    A26To35 = "26-35",
    A36To45 = "36-45",
    A46To55 = "46-55",
    A56To65 = "56-65",
    A65Plus = "65+",
});

wire_enum!(
    /// Unrecognized strings land in `Unknown`.
    VoterType => {
    Confirmed = "Confirmed",
    Likely = "Likely",
    Swing = "Swing",
    Opposition = "Opposition",
    #[serde(other)]
    Unknown = "Unknown",
});

wire_enum!(LoyaltyStrength => {
    Strong = "Strong",
    Medium = "Medium",
    Weak = "Weak",
});

wire_enum!(LikelyTurnout => {
    High = "High",
    Medium = "Medium",
    Low = "Low",
});

wire_enum!(Sentiment => {
    Favorable = "Favorable",
    Dicey = "Dicey",
    Unfavorable = "Unfavorable",
});

wire_enum!(Stance => {
    Supportive = "Supportive",
    Neutral = "Neutral",
    Opposed = "Opposed",
});

impl Default for VoterType {
    fn default() -> Self { VoterType::Unknown }
}

impl Default for LikelyTurnout {
    fn default() -> Self { LikelyTurnout::Medium }
}

impl Default for Sentiment {
    // An unsurveyed household is treated as undecided.
    fn default() -> Self { Sentiment::Dicey }
}

impl VoterType {
    /// Confirmed and Likely voters are the ones counted as votes for us.
    pub fn is_favorable(self) -> bool {
        match self {
            VoterType::Confirmed | VoterType::Likely => true,
            VoterType::Swing | VoterType::Opposition | VoterType::Unknown => false,
        }
    }

    /// Whether a surveyor has actually tagged this voter.
    pub fn is_tagged(self) -> bool {
        match self {
            VoterType::Unknown => false,
            VoterType::Confirmed | VoterType::Likely | VoterType::Swing | VoterType::Opposition => true,
        }
    }
}

impl Sentiment {
    /// Dicey or Unfavorable.
    pub fn is_at_risk(self) -> bool {
        match self {
            Sentiment::Favorable => false,
            Sentiment::Dicey | Sentiment::Unfavorable => true,
        }
    }
}

fn default_true() -> bool { true }

/// One voter with the survey enrichment the field team attaches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedVoter {
    pub id: VoterId,
    #[serde(default)]
    pub name: String,
    pub gender: Gender,
    pub age_band: AgeBand,
    /// Free text; `"Self"` marks the household head.
    #[serde(default)]
    pub relation_to_head: String,
    pub household_id: HouseholdId,
    pub mohalla_id: MohallaId,
    #[serde(default)]
    pub voter_type: VoterType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loyalty_strength: Option<LoyaltyStrength>,
    #[serde(default)]
    pub likely_turnout: LikelyTurnout,
    /// `false` means migrated/away on polling day.
    #[serde(default = "default_true")]
    pub is_present: bool,
    #[serde(default)]
    pub working_outside: bool,
    #[serde(default)]
    pub seasonal_migrant: bool,
    #[serde(default)]
    pub is_student: bool,
    #[serde(default)]
    pub is_elderly_sick: bool,
}

impl EnhancedVoter {
    pub fn is_head(&self) -> bool {
        self.relation_to_head.trim().eq_ignore_ascii_case("self")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Household {
    pub id: HouseholdId,
    pub mohalla_id: MohallaId,
    #[serde(default)]
    pub head_name: String,
    #[serde(default)]
    pub caste: String,
    #[serde(default)]
    pub category: String,
    /// 0..=5
    #[serde(default)]
    pub family_influence_level: u8,
    #[serde(default)]
    pub family_sentiment: Sentiment,
    #[serde(default)]
    pub total_voters: u32,
    #[serde(default)]
    pub male_voters: u32,
    #[serde(default)]
    pub female_voters: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surveyed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub needs_transport: bool,
}

impl Household {
    pub fn is_surveyed(&self) -> bool {
        self.surveyed_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mohalla {
    pub id: MohallaId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub total_households: u32,
    #[serde(default)]
    pub total_voters: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Influencer {
    pub id: InfluencerId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mohalla_id: Option<MohallaId>,
    pub stance: Stance,
    #[serde(default)]
    pub estimated_vote_control: u32,
    #[serde(default)]
    pub is_convertible: bool,
}

/// Everything the engine reads for one computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub voters: Vec<EnhancedVoter>,
    #[serde(default)]
    pub households: Vec<Household>,
    #[serde(default)]
    pub mohallas: Vec<Mohalla>,
    #[serde(default)]
    pub influencers: Vec<Influencer>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
            && self.households.is_empty()
            && self.mohallas.is_empty()
            && self.influencers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_voter_type_string_falls_back() {
        let v: VoterType = serde_json::from_str("\"Leaning\"").unwrap();
        assert_eq!(v, VoterType::Unknown);
        let v: VoterType = serde_json::from_str("\"Likely\"").unwrap();
        assert_eq!(v, VoterType::Likely);
    }

    #[test]
    fn age_band_tokens_round_through_wire_names() {
        assert_eq!(serde_json::to_string(&AgeBand::A65Plus).unwrap(), "\"65+\"");
        let b: AgeBand = serde_json::from_str("\"26-35\"").unwrap();
        assert_eq!(b, AgeBand::A26To35);
        assert_eq!(AgeBand::ALL.len(), 6);
    }

    #[test]
    fn voter_defaults_fill_missing_fields() {
        let js = r#"{
            "id": "v1", "gender": "Female", "ageBand": "36-45",
            "householdId": "h1", "mohallaId": "m1"
        }"#;
        let v: EnhancedVoter = serde_json::from_str(js).unwrap();
        assert_eq!(v.voter_type, VoterType::Unknown);
        assert_eq!(v.likely_turnout, LikelyTurnout::Medium);
        assert!(v.is_present);
        assert!(v.loyalty_strength.is_none());
        assert!(!v.is_head());
    }

    #[test]
    fn household_surveyed_at_parses_rfc3339() {
        let js = r#"{
            "id": "h1", "mohallaId": "m1", "headName": "Ram Prasad",
            "familyInfluenceLevel": 4, "familySentiment": "Unfavorable",
            "surveyedAt": "2026-09-01T10:00:00Z"
        }"#;
        let h: Household = serde_json::from_str(js).unwrap();
        assert!(h.is_surveyed());
        assert!(h.family_sentiment.is_at_risk());
    }

    #[test]
    fn favorable_types() {
        let fav: Vec<VoterType> = VoterType::ALL.iter().copied().filter(|t| t.is_favorable()).collect();
        assert_eq!(fav, vec![VoterType::Confirmed, VoterType::Likely]);
    }
}
