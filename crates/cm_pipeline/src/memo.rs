//! Single-slot memoization of pipeline outputs.
//!
//! Dashboards re-render far more often than surveys land. The cache key is the
//! canonical SHA-256 of `(snapshot, params, as_of)`, so any change to the
//! inputs, including the reference instant, forces a recompute.

use chrono::{DateTime, Utc};

use cm_core::{ScoringParams, Snapshot};
use cm_io::hasher::sha256_canonical;

use crate::{run, PipelineError, PipelineOutputs};

#[derive(Debug, Default)]
pub struct MemoPipeline {
    last: Option<(String, PipelineOutputs)>,
    hits: u64,
    misses: u64,
}

impl MemoPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return cached outputs when the inputs hash to the last key, otherwise
    /// recompute and replace the slot.
    pub fn run(
        &mut self,
        snapshot: &Snapshot,
        params: &ScoringParams,
        as_of: DateTime<Utc>,
    ) -> Result<&PipelineOutputs, PipelineError> {
        let key = sha256_canonical(&(snapshot, params, as_of))?;

        let hit = matches!(&self.last, Some((k, _)) if *k == key);
        if hit {
            self.hits += 1;
            log::debug!("memo hit {}", &key[..12]);
        } else {
            self.misses += 1;
            log::debug!("memo miss {}", &key[..12]);
            self.last = None;
        }

        let (_, out) = self.last.get_or_insert_with(|| (key, run(snapshot, params, as_of)));
        Ok(out)
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drop the cached slot; counters are kept.
    pub fn clear(&mut self) {
        self.last = None;
    }
}
