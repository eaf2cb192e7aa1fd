//! cm_core: Core records, closed enums, id tokens, scoring parameters and
//! stable ordering helpers for the campaign metrics engine.
//!
//! This crate is **I/O-free**. It defines the stable types shared across the
//! workspace (`cm_io`, `cm_algo`, `cm_pipeline`, `cm_report`, `cm_cli`).
//!
//! - Record tokens: `VoterId`, `HouseholdId`, `MohallaId`, `InfluencerId`
//! - Input records: `EnhancedVoter`, `Household`, `Mohalla`, `Influencer`, `Snapshot`
//! - Scoring parameters and their named constant defaults (`params`)
//! - Guarded numeric helpers (`rounding`) and deterministic ordering (`determinism`)

#![forbid(unsafe_code)]

pub mod entities;
pub mod params;
pub mod determinism;

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum CoreError {
        InvalidToken(String),
        DomainOutOfRange(&'static str),
        Consistency(&'static str),
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidToken(s) => write!(f, "invalid token: {s:?}"),
                CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
                CoreError::Consistency(k) => write!(f, "inconsistent parameters: {k}"),
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub mod tokens {
    //! Record token types with a strict charset.

    use crate::errors::CoreError;
    use core::fmt;
    use core::str::FromStr;
    use serde::{Deserialize, Serialize};

    /// Document ids coming out of the hosted store are short ASCII strings.
    fn is_token(s: &str) -> bool {
        let len = s.len();
        if !(1..=128).contains(&len) { return false; }
        s.bytes().all(|b| matches!(b,
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' |
            b'_' | b'-' | b':' | b'.'
        ))
    }

    macro_rules! def_token {
        ($name:ident) => {
            #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
            #[serde(try_from = "String", into = "String")]
            pub struct $name(String);

            impl $name {
                pub fn as_str(&self) -> &str { &self.0 }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
            }

            impl FromStr for $name {
                type Err = CoreError;
                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    if is_token(s) { Ok(Self(s.to_string())) } else { Err(CoreError::InvalidToken(s.to_string())) }
                }
            }

            impl TryFrom<String> for $name {
                type Error = CoreError;
                fn try_from(s: String) -> Result<Self, Self::Error> {
                    if is_token(&s) { Ok(Self(s)) } else { Err(CoreError::InvalidToken(s)) }
                }
            }

            impl From<$name> for String {
                fn from(t: $name) -> String { t.0 }
            }
        }
    }

    def_token!(VoterId);
    def_token!(HouseholdId);
    def_token!(MohallaId);
    def_token!(InfluencerId);

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn accepts_store_style_ids() {
            let id: HouseholdId = "hh_0042-A".parse().unwrap();
            assert_eq!(id.as_str(), "hh_0042-A");
        }

        #[test]
        fn rejects_empty_and_spaces() {
            assert!("".parse::<VoterId>().is_err());
            assert!("a b".parse::<MohallaId>().is_err());
        }

        #[test]
        fn serde_validates_on_the_way_in() {
            let ok: VoterId = serde_json::from_str("\"v-1\"").unwrap();
            assert_eq!(ok.as_str(), "v-1");
            assert!(serde_json::from_str::<VoterId>("\"bad id\"").is_err());
        }
    }
}

pub mod rounding {
    //! Guarded float helpers. Every ratio in the engine goes through these so
    //! a zero denominator yields 0 instead of NaN or infinity.

    /// `num / den`, or 0.0 when `den` is zero or the result is not finite.
    #[inline]
    pub fn safe_div(num: f64, den: f64) -> f64 {
        if den == 0.0 { return 0.0; }
        let v = num / den;
        if v.is_finite() { v } else { 0.0 }
    }

    /// `num * 100 / den`, guarded. Scaling first keeps exact ratios exact.
    #[inline]
    pub fn percent_of(num: f64, den: f64) -> f64 {
        safe_div(num * 100.0, den)
    }

    /// Integer-count percentage, guarded.
    #[inline]
    pub fn percent_count(num: u64, den: u64) -> f64 {
        percent_of(num as f64, den as f64)
    }

    /// Arithmetic mean, 0.0 for an empty iterator.
    pub fn mean<I: IntoIterator<Item = f64>>(it: I) -> f64 {
        let (sum, n) = it.into_iter().fold((0.0f64, 0u64), |(s, n), x| (s + x, n + 1));
        safe_div(sum, n as f64)
    }

    /// Ceiling division on counts; 0 when the divisor is 0.
    #[inline]
    pub fn ceil_div(num: u64, per: u64) -> u64 {
        if per == 0 { 0 } else { num.div_ceil(per) }
    }

    /// Clamp into `[lo, hi]`, mapping NaN to `lo`.
    #[inline]
    pub fn clamp_finite(v: f64, lo: f64, hi: f64) -> f64 {
        if v.is_nan() { lo } else { v.max(lo).min(hi) }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn zero_denominators_are_zero() {
            assert_eq!(safe_div(3.0, 0.0), 0.0);
            assert_eq!(percent_count(5, 0), 0.0);
            assert_eq!(mean(core::iter::empty()), 0.0);
            assert_eq!(ceil_div(7, 0), 0);
        }

        #[test]
        fn percent_and_ceil() {
            assert_eq!(percent_count(2, 10), 20.0);
            assert_eq!(ceil_div(21, 10), 3);
            assert_eq!(ceil_div(0, 10), 0);
        }

        #[test]
        fn clamp_handles_nan() {
            assert_eq!(clamp_finite(f64::NAN, 0.0, 1.0), 0.0);
            assert_eq!(clamp_finite(1.7, 0.0, 1.0), 1.0);
        }

        proptest::proptest! {
            #[test]
            fn ceil_div_is_smallest_cover(num in 0u64..1_000_000, per in 1u64..1_000) {
                let k = ceil_div(num, per);
                proptest::prop_assert!(k * per >= num);
                proptest::prop_assert!(k == 0 || (k - 1) * per < num);
            }

            #[test]
            fn count_percent_stays_in_range(den in 0u64..100_000, frac in 0.0f64..=1.0) {
                let num = (den as f64 * frac) as u64;
                let p = percent_count(num, den);
                proptest::prop_assert!((0.0..=100.0).contains(&p));
            }

            #[test]
            fn clamp_stays_in_bounds(v in proptest::num::f64::ANY) {
                let c = clamp_finite(v, 0.0, 1.0);
                proptest::prop_assert!((0.0..=1.0).contains(&c));
            }
        }
    }
}

pub use entities::{
    AgeBand, EnhancedVoter, Gender, Household, Influencer, LikelyTurnout, LoyaltyStrength,
    Mohalla, Sentiment, Snapshot, Stance, VoterType,
};
pub use errors::CoreError;
pub use params::ScoringParams;
pub use tokens::{HouseholdId, InfluencerId, MohallaId, VoterId};
