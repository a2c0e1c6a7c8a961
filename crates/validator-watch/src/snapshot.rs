//! The persisted/compared unit and how it is assembled from raw node responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fetcher::{
    CurrentValidator, EpochValidatorInfo, KickoutEntry, NetworkInfo, NextValidator, NodeStatus,
};

/// What one cycle observed about the watched pool.
///
/// Legacy aliases let us read state files written by the earlier JS script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorSnapshot {
    pub epoch_start_height: u64,
    #[serde(default)]
    pub epoch_height: u64,
    #[serde(
        default,
        alias = "myKickoutState",
        skip_serializing_if = "Option::is_none"
    )]
    pub kickout_state: Option<KickoutEntry>,
    #[serde(
        default,
        alias = "myValidatorState",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_validator_state: Option<CurrentValidator>,
    #[serde(
        default,
        alias = "myNextValidatorsState",
        skip_serializing_if = "Option::is_none"
    )]
    pub next_validator_state: Option<NextValidator>,
    /// When the cycle that produced this snapshot ran. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

/// Assemble a snapshot for `pool_id` from the three node responses.
///
/// Status and network info are part of the contract but nothing in the
/// snapshot derives from them today; the status line is composed separately.
pub fn build(
    _node_status: &NodeStatus,
    _network_info: &NetworkInfo,
    validators: &EpochValidatorInfo,
    pool_id: &str,
) -> ValidatorSnapshot {
    ValidatorSnapshot {
        epoch_start_height: validators.epoch_start_height,
        epoch_height: validators.epoch_height,
        kickout_state: find_pool(&validators.prev_epoch_kickout, pool_id, |k| &k.account_id),
        current_validator_state: find_pool(&validators.current_validators, pool_id, |v| {
            &v.account_id
        }),
        next_validator_state: find_pool(&validators.next_validators, pool_id, |v| &v.account_id),
        observed_at: None,
    }
}

fn find_pool<T: Clone>(entries: &[T], pool_id: &str, account: impl Fn(&T) -> &String) -> Option<T> {
    entries.iter().find(|e| account(e) == pool_id).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL: &str = "pool.poolv1.near";

    fn status() -> NodeStatus {
        NodeStatus {
            validator_account_id: Some(POOL.to_string()),
            protocol_version: 63,
            latest_protocol_version: 63,
        }
    }

    fn current(account_id: &str) -> CurrentValidator {
        CurrentValidator {
            account_id: account_id.to_string(),
            public_key: "ed25519:key".to_string(),
            stake: "100".to_string(),
            is_slashed: false,
            shards: vec![0],
            num_produced_blocks: 5,
            num_expected_blocks: 5,
            num_produced_chunks: 5,
            num_expected_chunks: 5,
        }
    }

    #[test]
    fn selects_only_the_watched_pool() {
        let info = EpochValidatorInfo {
            prev_epoch_kickout: vec![KickoutEntry {
                account_id: "someone.near".to_string(),
                reason: serde_json::json!("Slashed"),
            }],
            current_validators: vec![current("a.near"), current(POOL), current("b.near")],
            next_validators: vec![NextValidator {
                account_id: POOL.to_string(),
                public_key: String::new(),
                stake: "100".to_string(),
                shards: vec![],
            }],
            epoch_start_height: 100,
            epoch_height: 7,
        };

        let snap = build(&status(), &NetworkInfo { num_active_peers: 3 }, &info, POOL);
        assert_eq!(snap.epoch_start_height, 100);
        assert_eq!(snap.epoch_height, 7);
        assert!(snap.kickout_state.is_none());
        assert_eq!(snap.current_validator_state.unwrap().account_id, POOL);
        assert!(snap.next_validator_state.is_some());
    }

    #[test]
    fn absent_pool_is_not_an_error() {
        let info = EpochValidatorInfo {
            prev_epoch_kickout: vec![],
            current_validators: vec![current("a.near")],
            next_validators: vec![],
            epoch_start_height: 1,
            epoch_height: 1,
        };
        let snap = build(&status(), &NetworkInfo { num_active_peers: 0 }, &info, POOL);
        assert!(snap.current_validator_state.is_none());
        assert!(snap.next_validator_state.is_none());
        assert!(snap.kickout_state.is_none());
    }

    #[test]
    fn reads_legacy_state_keys() {
        let legacy = r#"{
          "myValidatorState": {
            "account_id": "pool.poolv1.near",
            "num_produced_blocks": 1,
            "num_expected_blocks": 2,
            "num_produced_chunks": 3,
            "num_expected_chunks": 4
          },
          "epochStartHeight": 555
        }"#;
        let snap: ValidatorSnapshot = serde_json::from_str(legacy).unwrap();
        assert_eq!(snap.epoch_start_height, 555);
        assert_eq!(snap.epoch_height, 0);
        assert_eq!(snap.current_validator_state.unwrap().num_expected_chunks, 4);
        assert!(snap.next_validator_state.is_none());
    }
}
