//! cm_report: pure offline report model + renderers (JSON/HTML).
//!
//! Determinism rules:
//! - No network, no I/O here. Callers supply outputs already in memory.
//! - Percent strings use one-decimal formatting done once, in `build_model`.
//! - Stable section order and field names.

#![deny(unsafe_code)]

use core::fmt;

pub mod structure;

#[cfg(feature = "render_json")]
pub mod render_json;
#[cfg(feature = "render_html")]
pub mod render_html;

pub use structure::{build_model, ReportModel};

#[cfg(feature = "render_json")]
pub use render_json::render_json;
#[cfg(feature = "render_html")]
pub use render_html::render_html;

// ===== Errors =====
#[derive(Debug)]
pub enum ReportError {
    Template(String),
    Json(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Template(m) => write!(f, "template error: {m}"),
            ReportError::Json(m) => write!(f, "json error: {m}"),
        }
    }
}

impl std::error::Error for ReportError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cm_core::{
        AgeBand, EnhancedVoter, Gender, Household, LikelyTurnout, Mohalla, ScoringParams, Sentiment,
        Snapshot, VoterType,
    };
    use cm_pipeline::{build_run_record, run, validate, EngineMeta, PipelineOutputs};

    fn outputs_with_head(head: &str) -> (Snapshot, PipelineOutputs) {
        let snap = Snapshot {
            voters: vec![EnhancedVoter {
                id: "v1".parse().unwrap(),
                name: "Sita".into(),
                gender: Gender::Female,
                age_band: AgeBand::A26To35,
                relation_to_head: "Self".into(),
                household_id: "h1".parse().unwrap(),
                mohalla_id: "m1".parse().unwrap(),
                voter_type: VoterType::Confirmed,
                loyalty_strength: None,
                likely_turnout: LikelyTurnout::High,
                is_present: true,
                working_outside: false,
                seasonal_migrant: false,
                is_student: false,
                is_elderly_sick: false,
            }],
            households: vec![Household {
                id: "h1".parse().unwrap(),
                mohalla_id: "m1".parse().unwrap(),
                head_name: head.into(),
                caste: "Kurmi".into(),
                category: "OBC".into(),
                family_influence_level: 5,
                family_sentiment: Sentiment::Dicey,
                total_voters: 1,
                male_voters: 0,
                female_voters: 1,
                surveyed_at: None,
                needs_transport: false,
            }],
            mohallas: vec![Mohalla { id: "m1".parse().unwrap(), name: "Purab Tola".into(), total_households: 3, total_voters: 1 }],
            influencers: vec![],
        };
        let as_of = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let out = run(&snap, &ScoringParams::default(), as_of);
        (snap, out)
    }

    #[test]
    fn model_formats_percent_with_one_decimal() {
        let (_, out) = outputs_with_head("Ram");
        let m = build_model(&out);
        // 1 × 1.0 × 0.8 expected out of 1 present voter.
        assert_eq!(m.headline.vote_share, "80.0%");
        assert_eq!(m.headline.expected_votes, "0.8");
        assert_eq!(m.coverage.household_coverage, "0.0%");
        assert_eq!(m.coverage.surveyed, "0 / 1");
        assert_eq!(m.danger_pockets.len(), 1);
        assert_eq!(m.mohallas[0].coverage, "0.0%");
        assert_eq!(m.demographics.iter().filter(|r| r.group == "Age").count(), 6);
        assert!(m.footer.is_none());
    }

    #[test]
    fn json_keeps_section_names() {
        let (_, out) = outputs_with_head("Ram");
        let v = render_json(&build_model(&out)).unwrap();
        for key in ["headline", "coverage", "vote_breakdown", "alerts", "mohallas", "resources", "demographics"] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn html_escapes_names_and_shows_footer() {
        let (snap, out) = outputs_with_head("<script>alert(1)</script>");
        let params = ScoringParams::default();
        let as_of = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let rec = build_run_record(&snap, &params, as_of, &out, &validate(&snap, &params), &EngineMeta::current())
            .unwrap();
        let html = render_html(&build_model(&out).with_run_record(&rec)).unwrap();
        assert!(html.starts_with("<!doctype html>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains(&rec.id));
        assert!(html.contains("Purab Tola"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let (_, out) = outputs_with_head("Ram");
        let m = build_model(&out);
        assert_eq!(render_html(&m).unwrap(), render_html(&m).unwrap());
    }
}
