// crates/cm_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Pure computation layer of the campaign metrics engine.
//!
//! Stages, in data-flow order:
//! 1. `scoring`     : one `VoterSupportScore` per voter
//! 2. `family`      : one `FamilyMetrics` per household
//! 3. `mohalla`     : one `MohallaMetrics` per mohalla
//! 4. `dashboard`   : the single `DashboardMetrics` aggregate
//! 5. `demographics`: age/gender/caste breakdowns
//!
//! Nothing here does I/O, reads the clock or fails: empty inputs give zeroed
//! outputs and every ratio is guarded through `cm_core::rounding`.

pub mod scoring;
pub mod family;
pub mod mohalla;
pub mod demographics;
pub mod dashboard;

// Convenience re-exports (pipeline imports these from crate root)
pub use scoring::{score_all_voters, score_voter, VoterSupportScore};
pub use family::{calculate_family_metrics, FamilyMetrics};
pub use mohalla::{calculate_mohalla_metrics, MohallaMetrics};
pub use demographics::{calculate_demographic_metrics, DemographicMetrics};
pub use dashboard::{
    calculate_dashboard_metrics, DashboardMetrics,
    alerts::{RiskAlert, Severity},
    resources::{Priority, ResourceRecommendation},
    win_probability::{win_probability_band, win_probability_percent, WinProbabilityBand},
};
