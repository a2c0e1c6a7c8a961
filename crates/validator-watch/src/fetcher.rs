//! Node status contract and the decoded response types it yields.

use serde::{Deserialize, Serialize};

use crate::error::WatchError;

/// Subset of the node's `/status` response the watcher cares about.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeStatus {
    /// Account the node signs as. `None` when the node runs without a validator key.
    #[serde(default)]
    pub validator_account_id: Option<String>,
    pub protocol_version: u32,
    pub latest_protocol_version: u32,
}

/// Subset of the node's `/network_info` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NetworkInfo {
    pub num_active_peers: u32,
}

/// A `prev_epoch_kickout` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KickoutEntry {
    pub account_id: String,
    /// Kickout reason as reported by the node, e.g. `{"NotEnoughChunks": {...}}`.
    #[serde(default)]
    pub reason: serde_json::Value,
}

/// A `current_validators` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentValidator {
    pub account_id: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub stake: String,
    #[serde(default)]
    pub is_slashed: bool,
    #[serde(default)]
    pub shards: Vec<u64>,
    pub num_produced_blocks: u64,
    pub num_expected_blocks: u64,
    pub num_produced_chunks: u64,
    pub num_expected_chunks: u64,
}

/// A `next_validators` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextValidator {
    pub account_id: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub stake: String,
    #[serde(default)]
    pub shards: Vec<u64>,
}

/// The `result` member of the `validators` JSON-RPC call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EpochValidatorInfo {
    #[serde(default)]
    pub prev_epoch_kickout: Vec<KickoutEntry>,
    #[serde(default)]
    pub current_validators: Vec<CurrentValidator>,
    #[serde(default)]
    pub next_validators: Vec<NextValidator>,
    pub epoch_start_height: u64,
    pub epoch_height: u64,
}

/// Trait for reading validator status from a node. Implemented over HTTP by
/// [`crate::rpc::NearRpcClient`]; tests plug in canned responses.
///
/// Every call is a suspension point; a failure of any of them is a
/// [`WatchError::Fetch`].
pub trait NodeStatusFetcher: Send + Sync {
    fn node_status(
        &self,
    ) -> impl std::future::Future<Output = Result<NodeStatus, WatchError>> + Send;

    fn network_info(
        &self,
    ) -> impl std::future::Future<Output = Result<NetworkInfo, WatchError>> + Send;

    fn validators(
        &self,
    ) -> impl std::future::Future<Output = Result<EpochValidatorInfo, WatchError>> + Send;
}
