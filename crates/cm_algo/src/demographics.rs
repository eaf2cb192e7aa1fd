//! Age, gender and caste breakdowns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cm_core::rounding::safe_div;
use cm_core::{AgeBand, Gender, HouseholdId};

use crate::family::FamilyMetrics;
use crate::scoring::VoterSupportScore;

/// Bucket for voters whose household (or its caste) is not known.
pub const UNKNOWN_CASTE: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicMetrics {
    /// Every age band is present, zero or not.
    pub by_age: BTreeMap<AgeBand, u32>,
    pub by_gender: BTreeMap<Gender, u32>,
    pub by_caste: BTreeMap<String, u32>,
    pub households_by_caste: BTreeMap<String, u32>,
    pub support_by_age: BTreeMap<AgeBand, f64>,
    pub support_by_gender: BTreeMap<Gender, f64>,
    pub support_by_caste: BTreeMap<String, f64>,
}

#[derive(Default, Clone, Copy)]
struct Acc {
    n: u32,
    sum: f64,
}

impl Acc {
    fn add(&mut self, v: f64) {
        self.n += 1;
        self.sum += v;
    }
    fn mean(&self) -> f64 {
        safe_div(self.sum, self.n as f64)
    }
}

fn caste_key(c: &str) -> String {
    let c = c.trim();
    if c.is_empty() { UNKNOWN_CASTE.to_string() } else { c.to_string() }
}

pub fn calculate_demographic_metrics(
    voter_scores: &[VoterSupportScore],
    family_metrics: &[FamilyMetrics],
) -> DemographicMetrics {
    let caste_of: BTreeMap<&HouseholdId, &str> =
        family_metrics.iter().map(|f| (&f.household_id, f.caste.as_str())).collect();

    let mut age: BTreeMap<AgeBand, Acc> = AgeBand::ALL.iter().map(|b| (*b, Acc::default())).collect();
    let mut gender: BTreeMap<Gender, Acc> = Gender::ALL.iter().map(|g| (*g, Acc::default())).collect();
    let mut caste: BTreeMap<String, Acc> = BTreeMap::new();

    for s in voter_scores {
        age.entry(s.age_band).or_default().add(s.support_score);
        gender.entry(s.gender).or_default().add(s.support_score);
        let key = caste_of.get(&s.household_id).map(|c| caste_key(c)).unwrap_or_else(|| UNKNOWN_CASTE.to_string());
        caste.entry(key).or_default().add(s.support_score);
    }

    let mut households_by_caste: BTreeMap<String, u32> = BTreeMap::new();
    for f in family_metrics {
        *households_by_caste.entry(caste_key(&f.caste)).or_default() += 1;
    }

    DemographicMetrics {
        by_age: age.iter().map(|(k, a)| (*k, a.n)).collect(),
        by_gender: gender.iter().map(|(k, a)| (*k, a.n)).collect(),
        by_caste: caste.iter().map(|(k, a)| (k.clone(), a.n)).collect(),
        households_by_caste,
        support_by_age: age.iter().map(|(k, a)| (*k, a.mean())).collect(),
        support_by_gender: gender.iter().map(|(k, a)| (*k, a.mean())).collect(),
        support_by_caste: caste.iter().map(|(k, a)| (k.clone(), a.mean())).collect(),
    }
}
