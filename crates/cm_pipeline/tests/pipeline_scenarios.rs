//! End-to-end scenarios through `cm_pipeline::run` on small hand-built wards.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::{json, Value};

use cm_algo::WinProbabilityBand;
use cm_core::{ScoringParams, Snapshot};
use cm_io::loader::snapshot_from_value;
use cm_pipeline::{build_run_record, run, validate, EngineMeta, MemoPipeline};

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap()
}

fn snapshot(v: Value) -> Snapshot {
    snapshot_from_value(v).unwrap()
}

fn voter(id: &str, hh: &str, m: &str, voter_type: &str, turnout: &str) -> Value {
    json!({
        "id": id, "name": format!("Voter {id}"), "gender": "Female", "ageBand": "26-35",
        "relationToHead": "Spouse", "householdId": hh, "mohallaId": m,
        "voterType": voter_type, "likelyTurnout": turnout
    })
}

fn purab_tola() -> Snapshot {
    snapshot(json!({
        "voters": [
            voter("v1", "hA", "m1", "Confirmed", "High"),
            voter("v2", "hA", "m1", "Confirmed", "High"),
            voter("v3", "hB", "m1", "Swing", "Medium"),
        ],
        "households": [
            {"id": "hA", "mohallaId": "m1", "headName": "Ram Prasad", "familySentiment": "Favorable",
             "surveyedAt": "2026-09-20T00:00:00Z"},
            {"id": "hB", "mohallaId": "m1", "headName": "Shyam Lal", "familySentiment": "Dicey"}
        ],
        "mohallas": [{"id": "m1", "name": "Purab Tola", "totalHouseholds": 2}]
    }))
}

#[test]
fn purab_tola_scenario() {
    let out = run(&purab_tola(), &ScoringParams::default(), as_of());

    assert_eq!(out.mohalla_metrics.len(), 1);
    assert_eq!(out.mohalla_metrics[0].swing_universe, 1);

    let a = &out.family_metrics[0];
    assert_eq!(a.household_id.as_str(), "hA");
    assert_eq!(a.swing_voter_count, 0);
    assert!(a.is_high_support);

    let b = &out.family_metrics[1];
    assert_eq!(b.swing_voter_count, 1);
    assert!(b.is_swing_opportunity);

    // 2 Confirmed High voters: 2 × 1.0 × 0.8 expected votes out of 3 present.
    let d = &out.dashboard;
    assert_eq!(d.total_present_voters, 3);
    assert!((d.expected_votes_if_today_polling - 1.6).abs() < 1e-12);
    assert!((d.vote_share_percent - 160.0 / 3.0).abs() < 1e-9);
    assert_eq!(d.coverage.surveyed_households, 1);
    assert_eq!(d.coverage.data_freshness_percent, 100.0);
}

#[test]
fn influential_unfavorable_household_is_a_danger_pocket() {
    let snap = snapshot(json!({
        "voters": [voter("v1", "h1", "m1", "Opposition", "High")],
        "households": [
            {"id": "h1", "mohallaId": "m1", "familyInfluenceLevel": 5, "familySentiment": "Unfavorable"},
            {"id": "h2", "mohallaId": "m1", "familyInfluenceLevel": 2, "familySentiment": "Unfavorable"}
        ],
        "mohallas": [{"id": "m1", "name": "Paschim Tola"}]
    }));
    let out = run(&snap, &ScoringParams::default(), as_of());

    assert!(out.family_metrics[0].is_danger_pocket);
    assert!(!out.family_metrics[1].is_danger_pocket);
    let ids: Vec<&str> = out.dashboard.danger_pockets.iter().map(|f| f.household_id.as_str()).collect();
    assert_eq!(ids, vec!["h1"]);
    assert_eq!(out.mohalla_metrics[0].danger_pockets, 1);
}

#[test]
fn two_of_ten_surveyed_is_flagged_under_surveyed() {
    let snap = snapshot(json!({
        "households": [
            {"id": "h1", "mohallaId": "m1", "surveyedAt": "2026-09-25T00:00:00Z"},
            {"id": "h2", "mohallaId": "m1", "surveyedAt": "2026-09-26T00:00:00Z"},
            {"id": "h3", "mohallaId": "m1"}
        ],
        "mohallas": [{"id": "m1", "name": "Uttar Tola", "totalHouseholds": 10}]
    }));
    let out = run(&snap, &ScoringParams::default(), as_of());
    let m = &out.mohalla_metrics[0];
    assert_eq!(m.coverage_percent, 20.0);
    assert!(m.is_under_surveyed);
    assert_eq!(out.dashboard.under_surveyed_mohallas.len(), 1);
    assert!(out
        .dashboard
        .risk_alerts
        .iter()
        .any(|a| a.mohalla_id.as_ref().map(|id| id.as_str()) == Some("m1")));
}

#[test]
fn empty_snapshot_is_stable() {
    let out = run(&Snapshot::default(), &ScoringParams::default(), as_of());
    assert_eq!(out.dashboard.win_probability_band, WinProbabilityBand::Critical);
    assert_eq!(out.dashboard.vote_share_percent, 0.0);
    assert!(out.dashboard.risk_alerts.is_empty());
    assert!(out.demographics.by_age.values().all(|n| *n == 0));
    assert!(validate(&Snapshot::default(), &ScoringParams::default()).pass);
}

#[test]
fn run_record_matches_for_identical_runs() {
    let snap = purab_tola();
    let params = ScoringParams::default();
    let out1 = run(&snap, &params, as_of());
    let out2 = run(&snap, &params, as_of());
    assert_eq!(out1, out2);

    let report = validate(&snap, &params);
    let engine = EngineMeta::current();
    let r1 = build_run_record(&snap, &params, as_of(), &out1, &report, &engine).unwrap();
    let r2 = build_run_record(&snap, &params, as_of(), &out2, &report, &engine).unwrap();
    assert_eq!(r1.id, r2.id);
    assert_eq!(r1.body.counts.voters, 3);
}

#[test]
fn memo_returns_cached_outputs() {
    let snap = purab_tola();
    let params = ScoringParams::default();
    let fresh = run(&snap, &params, as_of());

    let mut memo = MemoPipeline::new();
    assert_eq!(memo.run(&snap, &params, as_of()).unwrap(), &fresh);
    assert_eq!(memo.run(&snap, &params, as_of()).unwrap(), &fresh);
    assert_eq!((memo.hits(), memo.misses()), (1, 1));
}

const TYPES: [&str; 5] = ["Confirmed", "Likely", "Swing", "Opposition", "Unknown"];
const TURNOUTS: [&str; 3] = ["High", "Medium", "Low"];

fn ward(layout: &[(usize, usize, usize, bool)]) -> Snapshot {
    let voters: Vec<Value> = layout
        .iter()
        .enumerate()
        .map(|(i, (t, turnout, hh, present))| {
            let mut v = voter(&format!("v{i}"), &format!("h{hh}"), &format!("m{}", hh % 2), TYPES[*t], TURNOUTS[*turnout]);
            v["isPresent"] = json!(present);
            v
        })
        .collect();
    let households: Vec<Value> =
        (0..4).map(|h| json!({"id": format!("h{h}"), "mohallaId": format!("m{}", h % 2)})).collect();
    snapshot(json!({
        "voters": voters,
        "households": households,
        "mohallas": [{"id": "m0", "name": "Dakshin Tola"}, {"id": "m1", "name": "Purab Tola"}]
    }))
}

proptest! {
    #[test]
    fn counts_and_swing_are_conserved(layout in prop::collection::vec((0usize..5, 0usize..3, 0usize..4, any::<bool>()), 0..40)) {
        let snap = ward(&layout);
        let out = run(&snap, &ScoringParams::default(), as_of());

        let family_voters: u32 = out.family_metrics.iter().map(|f| f.voter_count).sum();
        prop_assert_eq!(family_voters as usize, snap.voters.len());

        let mohalla_voters: u32 = out.mohalla_metrics.iter().map(|m| m.total_voters).sum();
        prop_assert_eq!(mohalla_voters as usize, snap.voters.len());

        let family_swing: u32 = out.family_metrics.iter().map(|f| f.swing_voter_count).sum();
        let mohalla_swing: u32 = out.mohalla_metrics.iter().map(|m| m.swing_universe).sum();
        let scored_swing = out.voter_scores.iter().filter(|s| s.is_swing).count() as u32;
        prop_assert_eq!(family_swing, scored_swing);
        prop_assert_eq!(mohalla_swing, scored_swing);

        let d = &out.dashboard;
        prop_assert_eq!(d.total_present_voters + d.away_voters, d.total_voters);
        prop_assert_eq!(d.vote_breakdown.total(), d.total_present_voters);
        prop_assert!((0.0..=100.0).contains(&d.win_probability_percent));

        prop_assert_eq!(run(&snap, &ScoringParams::default(), as_of()), out);
    }
}
