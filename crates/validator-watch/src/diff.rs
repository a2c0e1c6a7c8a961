//! Comparison of the current snapshot against the prior one, and the
//! alerting predicates evaluated on the current snapshot alone.

use crate::fetcher::CurrentValidator;
use crate::snapshot::ValidatorSnapshot;

/// Produced/expected ratio below which a validator is flagged.
pub const PRODUCTIVITY_THRESHOLD: f64 = 0.8;

/// Minimum expected chunks before the productivity check is trusted. The first
/// few assignments of an epoch are too small a sample to alert on.
pub const MIN_EXPECTED_CHUNKS: u64 = 4;

/// How to treat the very first cycle, when there is nothing to compare with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FirstRunPolicy {
    /// Record a baseline silently.
    #[default]
    Suppress,
    /// Treat the first observation as an epoch change and announce it.
    Announce,
}

/// Whether the epoch rolled over since the prior snapshot.
pub fn epoch_changed(
    prev: Option<&ValidatorSnapshot>,
    curr: &ValidatorSnapshot,
    first_run: FirstRunPolicy,
) -> bool {
    match prev {
        Some(prev) => prev.epoch_start_height != curr.epoch_start_height,
        None => first_run == FirstRunPolicy::Announce,
    }
}

/// Notable changes in the pool's standing between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpochTransition {
    /// Listed in `prev_epoch_kickout` now but was not before.
    pub newly_kicked_out: bool,
    pub joined_active_set: bool,
    pub left_active_set: bool,
    pub joined_next_set: bool,
    pub left_next_set: bool,
}

/// Derive transition flags. With no prior snapshot every present state counts as new.
pub fn transition(prev: Option<&ValidatorSnapshot>, curr: &ValidatorSnapshot) -> EpochTransition {
    let had = |f: fn(&ValidatorSnapshot) -> bool| prev.is_some_and(f);

    let was_kicked = had(|s| s.kickout_state.is_some());
    let was_active = had(|s| s.current_validator_state.is_some());
    let was_next = had(|s| s.next_validator_state.is_some());

    let is_kicked = curr.kickout_state.is_some();
    let is_active = curr.current_validator_state.is_some();
    let is_next = curr.next_validator_state.is_some();

    EpochTransition {
        newly_kicked_out: is_kicked && !was_kicked,
        joined_active_set: is_active && !was_active,
        left_active_set: was_active && !is_active,
        joined_next_set: is_next && !was_next,
        left_next_set: was_next && !is_next,
    }
}

/// Produced/expected, with `expected == 0` counting as a perfect score.
pub fn ratio(produced: u64, expected: u64) -> f64 {
    if expected == 0 {
        1.0
    } else {
        produced as f64 / expected as f64
    }
}

/// Raw counters behind a productivity alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductivityAlert {
    pub expected_chunks: u64,
    pub produced_chunks: u64,
    pub expected_blocks: u64,
    pub produced_blocks: u64,
}

impl ProductivityAlert {
    pub fn chunks_ratio(&self) -> f64 {
        ratio(self.produced_chunks, self.expected_chunks)
    }

    pub fn blocks_ratio(&self) -> f64 {
        ratio(self.produced_blocks, self.expected_blocks)
    }
}

impl From<&CurrentValidator> for ProductivityAlert {
    fn from(v: &CurrentValidator) -> Self {
        Self {
            expected_chunks: v.num_expected_chunks,
            produced_chunks: v.num_produced_chunks,
            expected_blocks: v.num_expected_blocks,
            produced_blocks: v.num_produced_blocks,
        }
    }
}

/// Flag a validator producing under [`PRODUCTIVITY_THRESHOLD`] once at least
/// [`MIN_EXPECTED_CHUNKS`] chunks were expected of it.
pub fn productivity_alert(curr: &ValidatorSnapshot) -> Option<ProductivityAlert> {
    let detail = ProductivityAlert::from(curr.current_validator_state.as_ref()?);

    let underperforming = detail.chunks_ratio() < PRODUCTIVITY_THRESHOLD
        || detail.blocks_ratio() < PRODUCTIVITY_THRESHOLD;

    (underperforming && detail.expected_chunks >= MIN_EXPECTED_CHUNKS).then_some(detail)
}

/// True when the node signs as some account other than the configured pool.
/// A node with no validator key at all is a mismatch too.
pub fn identity_mismatch(reported: Option<&str>, configured: &str) -> bool {
    reported != Some(configured)
}
