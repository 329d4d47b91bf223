///! Two-stage random selection over the image index
///!
///! Cassini dominates the index, so a mission is drawn first and only then
///! an observation from that mission. Every eligible mission gets the same
///! share of posts regardless of how many rows it contributes.

use super::dataset::DatasetIndex;
use planetary_common::{BotError, BotResult, CatalogRow};
use rand::Rng;
use rand::seq::IteratorRandom;
use std::collections::BTreeSet;

/// Hubble is not a deep-space mission; New Horizons pre-Pluto data is dull.
pub const DEFAULT_EXCLUDED_MISSIONS: [&str; 2] = ["HST", "NH"];

#[derive(Debug, Clone)]
pub struct Sampler {
    excluded: BTreeSet<String>,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_MISSIONS.iter().map(|code| code.to_string()))
    }
}

impl Sampler {
    pub fn new(excluded: impl IntoIterator<Item = String>) -> Self {
        Self {
            excluded: excluded.into_iter().collect(),
        }
    }

    pub fn excluded(&self) -> &BTreeSet<String> {
        &self.excluded
    }

    /// Mission codes eligible for selection
    pub fn candidate_missions<'a>(&self, index: &'a DatasetIndex) -> Vec<&'a str> {
        index
            .missions()
            .into_iter()
            .filter(|code| !self.excluded.contains(*code))
            .collect()
    }

    /// Pick one observation using the thread-local RNG
    pub fn select<'a>(&self, index: &'a DatasetIndex) -> BotResult<&'a CatalogRow> {
        self.select_with(index, &mut rand::rng())
    }

    /// Pick one observation using the supplied RNG
    pub fn select_with<'a, R: Rng + ?Sized>(
        &self,
        index: &'a DatasetIndex,
        rng: &mut R,
    ) -> BotResult<&'a CatalogRow> {
        let candidates = self.candidate_missions(index);
        if candidates.is_empty() {
            return Err(BotError::Config(format!(
                "No missions left to sample from after excluding {:?} ({} rows in index)",
                self.excluded,
                index.len()
            )));
        }

        let mission = candidates[rng.random_range(0..candidates.len())];

        // Exclusive upper bound: every draw lands on a real row.
        let row = index
            .rows_for_mission(mission)
            .choose(rng)
            .ok_or_else(|| BotError::Load(format!("Mission {} has no rows", mission)))?;

        tracing::debug!(
            "Selected {} from mission {} ({} candidate missions)",
            row.observation_id,
            mission,
            candidates.len()
        );

        Ok(row)
    }
}
