//! Determinism utilities: stable ordering for ranked outputs.
//!
//! This module is **I/O-free**. It provides:
//! - Stable total orders for record tokens
//! - A NaN-safe descending score comparator (ties broken by id)
//! - A small map helper to materialize canonical (key-ordered) maps
//!
//! Every ranked list the engine emits (top families, swing mohallas, resource
//! plans) goes through these so that equal inputs always give equal outputs.

use core::cmp::Ordering;

use crate::tokens::{HouseholdId, InfluencerId, MohallaId, VoterId};

use std::collections::BTreeMap;

/* -------------------------------------------------------------------------- */
/*                               Stable Ordering                              */
/* -------------------------------------------------------------------------- */

/// Provide a **total**, stable order for values that must sort canonically.
pub trait StableOrd {
    fn stable_cmp(&self, other: &Self) -> Ordering;
}

macro_rules! stable_ord_token {
    ($($t:ty),+) => {
        $(
            impl StableOrd for $t {
                #[inline]
                fn stable_cmp(&self, other: &Self) -> Ordering {
                    self.as_str().cmp(other.as_str())
                }
            }
        )+
    };
}

stable_ord_token!(VoterId, HouseholdId, MohallaId, InfluencerId);

/* -------------------------------------------------------------------------- */
/*                            Canonical sort helpers                           */
/* -------------------------------------------------------------------------- */

/// Descending by score (IEEE total order, so NaN never panics), then
/// ascending by the stable key.
#[inline]
pub fn cmp_score_desc<K: StableOrd>(a_score: f64, a_key: &K, b_score: f64, b_key: &K) -> Ordering {
    match b_score.total_cmp(&a_score) {
        Ordering::Equal => a_key.stable_cmp(b_key),
        o => o,
    }
}

/// Descending by count, then ascending by the stable key.
#[inline]
pub fn cmp_count_desc<K: StableOrd>(a_count: u64, a_key: &K, b_count: u64, b_key: &K) -> Ordering {
    match b_count.cmp(&a_count) {
        Ordering::Equal => a_key.stable_cmp(b_key),
        o => o,
    }
}

/// Sort **in place** by ascending stable key.
#[inline]
pub fn sort_by_key_stable<T, K: StableOrd, F: Fn(&T) -> &K>(xs: &mut [T], key: F) {
    xs.sort_by(|a, b| key(a).stable_cmp(key(b)));
}

/* -------------------------------------------------------------------------- */
/*                          Canonical map materialization                      */
/* -------------------------------------------------------------------------- */

/// Build a key-ordered `BTreeMap` from an iterator of `(K, V)`.
#[inline]
pub fn btreemap_from_iter_kv<K: Ord, V, I: IntoIterator<Item = (K, V)>>(it: I) -> BTreeMap<K, V> {
    it.into_iter().collect()
}

/* ---------------------------------- Tests --------------------------------- */
