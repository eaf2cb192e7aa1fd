//! crates/cm_pipeline/src/validate.rs
//! Structural & semantic checks over a snapshot before any computation.
//!
//! Validation never blocks a run on its own: the engine computes over
//! whatever it is given. Callers decide what a failing report means (the CLI
//! exits with a validation code when `pass` is false).

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use cm_core::params::validate_domains;
use cm_core::{HouseholdId, InfluencerId, MohallaId, ScoringParams, Snapshot, VoterId};

/// Highest allowed `familyInfluenceLevel`.
pub const MAX_INFLUENCE_LEVEL: u8 = 5;

/// Issue severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

/// Where the issue occurred (kept small & deterministic).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum EntityRef {
    Root,
    Voter(VoterId),
    Household(HouseholdId),
    Mohalla(MohallaId),
    Influencer(InfluencerId),
    Params,
}

/// One validation finding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    #[serde(rename = "where")]
    pub where_: EntityRef,
}

/// Deterministic report: pass = (no Error); ordering of issues is stable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub pass: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

fn issue(severity: Severity, code: &'static str, where_: EntityRef, message: String) -> ValidationIssue {
    ValidationIssue { severity, code, message, where_ }
}

/// Top-level entry point.
pub fn validate(snapshot: &Snapshot, params: &ScoringParams) -> ValidationReport {
    let mut issues: Vec<ValidationIssue> = Vec::new();

    issues.extend(check_params(params));
    issues.extend(check_duplicate_ids(snapshot));
    issues.extend(check_voter_refs(snapshot));
    issues.extend(check_households(snapshot));
    issues.extend(check_influencers(snapshot));

    sort_issues_stably(&mut issues);

    let report = ValidationReport {
        pass: !issues.iter().any(|i| i.severity == Severity::Error),
        issues,
    };
    log::debug!(
        "validate: pass={} errors={} warnings={}",
        report.pass,
        report.count(Severity::Error),
        report.count(Severity::Warning)
    );
    report
}

fn check_params(params: &ScoringParams) -> Vec<ValidationIssue> {
    match validate_domains(params) {
        Ok(()) => Vec::new(),
        Err(e) => vec![issue(Severity::Error, "Params.Domain", EntityRef::Params, e.to_string())],
    }
}

/// Report every id that appears more than once, once per id.
fn duplicates<'a, T: Ord + 'a, I: IntoIterator<Item = &'a T>>(ids: I) -> Vec<&'a T> {
    let mut seen = BTreeSet::new();
    let mut dup = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            dup.insert(id);
        }
    }
    dup.into_iter().collect()
}

fn check_duplicate_ids(s: &Snapshot) -> Vec<ValidationIssue> {
    let mut out = Vec::new();
    for id in duplicates(s.voters.iter().map(|v| &v.id)) {
        out.push(issue(Severity::Error, "Voter.DuplicateId", EntityRef::Voter(id.clone()), format!("voter id {id} appears more than once")));
    }
    for id in duplicates(s.households.iter().map(|h| &h.id)) {
        out.push(issue(Severity::Error, "Household.DuplicateId", EntityRef::Household(id.clone()), format!("household id {id} appears more than once")));
    }
    for id in duplicates(s.mohallas.iter().map(|m| &m.id)) {
        out.push(issue(Severity::Error, "Mohalla.DuplicateId", EntityRef::Mohalla(id.clone()), format!("mohalla id {id} appears more than once")));
    }
    for id in duplicates(s.influencers.iter().map(|i| &i.id)) {
        out.push(issue(Severity::Error, "Influencer.DuplicateId", EntityRef::Influencer(id.clone()), format!("influencer id {id} appears more than once")));
    }
    out
}

fn check_voter_refs(s: &Snapshot) -> Vec<ValidationIssue> {
    let households: BTreeMap<&HouseholdId, &MohallaId> = s.households.iter().map(|h| (&h.id, &h.mohalla_id)).collect();
    let mohallas: BTreeSet<&MohallaId> = s.mohallas.iter().map(|m| &m.id).collect();
    let mut out = Vec::new();
    for v in &s.voters {
        match households.get(&v.household_id) {
            None => out.push(issue(
                Severity::Warning,
                "Voter.UnknownHousehold",
                EntityRef::Voter(v.id.clone()),
                format!("household {} not found", v.household_id),
            )),
            Some(hm) if **hm != v.mohalla_id => out.push(issue(
                Severity::Warning,
                "Voter.MohallaMismatch",
                EntityRef::Voter(v.id.clone()),
                format!("voter is in mohalla {} but household {} is in {}", v.mohalla_id, v.household_id, hm),
            )),
            Some(_) => {}
        }
        if !mohallas.contains(&v.mohalla_id) {
            out.push(issue(
                Severity::Warning,
                "Voter.UnknownMohalla",
                EntityRef::Voter(v.id.clone()),
                format!("mohalla {} not found", v.mohalla_id),
            ));
        }
    }
    out
}

fn check_households(s: &Snapshot) -> Vec<ValidationIssue> {
    let mohallas: BTreeSet<&MohallaId> = s.mohallas.iter().map(|m| &m.id).collect();
    let mut members: BTreeMap<&HouseholdId, u32> = BTreeMap::new();
    for v in &s.voters {
        *members.entry(&v.household_id).or_default() += 1;
    }

    let mut out = Vec::new();
    for h in &s.households {
        let at = || EntityRef::Household(h.id.clone());
        if !mohallas.contains(&h.mohalla_id) {
            out.push(issue(Severity::Warning, "Household.UnknownMohalla", at(), format!("mohalla {} not found", h.mohalla_id)));
        }
        if h.family_influence_level > MAX_INFLUENCE_LEVEL {
            out.push(issue(
                Severity::Error,
                "Household.InfluenceOutOfRange",
                at(),
                format!("familyInfluenceLevel {} exceeds {MAX_INFLUENCE_LEVEL}", h.family_influence_level),
            ));
        }
        let listed = members.get(&h.id).copied().unwrap_or(0);
        // A stored total of 0 means "not recorded".
        if h.total_voters > 0 && h.total_voters != listed {
            out.push(issue(
                Severity::Warning,
                "Household.VoterCountMismatch",
                at(),
                format!("totalVoters is {} but {listed} voters reference it", h.total_voters),
            ));
        }
    }
    out
}

fn check_influencers(s: &Snapshot) -> Vec<ValidationIssue> {
    let mohallas: BTreeSet<&MohallaId> = s.mohallas.iter().map(|m| &m.id).collect();
    s.influencers
        .iter()
        .filter_map(|i| {
            let m = i.mohalla_id.as_ref()?;
            if mohallas.contains(m) {
                None
            } else {
                Some(issue(
                    Severity::Warning,
                    "Influencer.UnknownMohalla",
                    EntityRef::Influencer(i.id.clone()),
                    format!("mohalla {m} not found"),
                ))
            }
        })
        .collect()
}

/// Errors first, then by code, location and message for byte-identical runs.
fn sort_issues_stably(issues: &mut [ValidationIssue]) {
    issues.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.code.cmp(b.code))
            .then_with(|| a.where_.cmp(&b.where_))
            .then_with(|| a.message.cmp(&b.message))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_core::{AgeBand, EnhancedVoter, Gender, Household, LikelyTurnout, Mohalla, Sentiment, VoterType};

    fn voter(id: &str, hh: &str, m: &str) -> EnhancedVoter {
        EnhancedVoter {
            id: id.parse().unwrap(),
            name: String::new(),
            gender: Gender::Male,
            age_band: AgeBand::A18To25,
            relation_to_head: String::new(),
            household_id: hh.parse().unwrap(),
            mohalla_id: m.parse().unwrap(),
            voter_type: VoterType::Unknown,
            loyalty_strength: None,
            likely_turnout: LikelyTurnout::Medium,
            is_present: true,
            working_outside: false,
            seasonal_migrant: false,
            is_student: false,
            is_elderly_sick: false,
        }
    }

    fn household(id: &str, influence: u8, total: u32) -> Household {
        Household {
            id: id.parse().unwrap(),
            mohalla_id: "m1".parse().unwrap(),
            head_name: String::new(),
            caste: String::new(),
            category: String::new(),
            family_influence_level: influence,
            family_sentiment: Sentiment::Dicey,
            total_voters: total,
            male_voters: 0,
            female_voters: 0,
            surveyed_at: None,
            needs_transport: false,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            voters: vec![voter("v1", "h1", "m1")],
            households: vec![household("h1", 2, 1)],
            mohallas: vec![Mohalla { id: "m1".parse().unwrap(), name: "Purab Tola".into(), total_households: 1, total_voters: 1 }],
            influencers: vec![],
        }
    }

    #[test]
    fn clean_snapshot_passes() {
        let r = validate(&snapshot(), &ScoringParams::default());
        assert!(r.pass);
        assert!(r.issues.is_empty());
    }

    #[test]
    fn dangling_refs_are_warnings() {
        let mut s = snapshot();
        s.voters.push(voter("v2", "h404", "m9"));
        let r = validate(&s, &ScoringParams::default());
        assert!(r.pass);
        let codes: Vec<&str> = r.issues.iter().map(|i| i.code).collect();
        assert_eq!(codes, vec!["Voter.UnknownHousehold", "Voter.UnknownMohalla"]);
    }

    #[test]
    fn duplicates_and_influence_fail() {
        let mut s = snapshot();
        s.voters.push(voter("v1", "h1", "m1"));
        s.households.push(household("h2", 7, 0));
        let r = validate(&s, &ScoringParams::default());
        assert!(!r.pass);
        assert_eq!(r.count(Severity::Error), 2);
        // h1 now has two listed voters against a stored total of 1.
        assert_eq!(r.issues[0].code, "Household.InfluenceOutOfRange");
        assert_eq!(r.issues[1].code, "Voter.DuplicateId");
        assert_eq!(r.issues[2].code, "Household.VoterCountMismatch");
    }

    #[test]
    fn bad_params_fail() {
        let mut p = ScoringParams::default();
        p.freshness_days = 0;
        p.win_band_breakpoints.competitive = 0.0;
        let r = validate(&snapshot(), &p);
        assert!(!r.pass);
        assert_eq!(r.issues[0].where_, EntityRef::Params);
    }
}
