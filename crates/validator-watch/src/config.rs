//! Watcher configuration from environment variables.

use std::time::Duration;
use url::Url;

use crate::diff::FirstRunPolicy;
use crate::error::WatchError;
use crate::seat_price::DEFAULT_SEAT_PRICE_COMMAND;
use crate::telegram::DEFAULT_TELEGRAM_API_URL;

const DEFAULT_STATE_FILE: &str = "./.prev_state.json";
const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TELEGRAM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_NEAR_ENV: &str = "mainnet";
const DEFAULT_SEAT_PRICE_TIMEOUT_SECS: u64 = 60;

/// Resolved settings for one monitoring run.
#[derive(Clone)]
pub struct WatchConfig {
    /// Node HTTP/JSON-RPC endpoint (env: NODE_RPC).
    pub node_rpc: String,
    /// Pool account being watched (env: POOL_ID).
    pub pool_id: String,
    /// Telegram bot token (env: TG_API_KEY). Never log this.
    pub telegram_token: String,
    /// Target chat (env: TG_CHAT_ID).
    pub telegram_chat_id: String,
    /// Bot API base URL (env: TELEGRAM_API_URL).
    pub telegram_api_url: String,
    /// Where the previous snapshot lives (env: STATE_FILE, default: ./.prev_state.json).
    pub state_file: String,
    /// Per-request node timeout (env: RPC_TIMEOUT_SECS, default: 10).
    pub rpc_timeout: Duration,
    pub telegram_timeout: Duration,
    /// Passed to the seat price command (env: NEAR_ENV, default: mainnet).
    pub near_env: String,
    /// Shell command line printing the seat price (env: SEAT_PRICE_COMMAND).
    pub seat_price_command: String,
    /// env: SEAT_PRICE_TIMEOUT_SECS, default: 60.
    pub seat_price_timeout: Duration,
    /// env: ANNOUNCE_FIRST_EPOCH (true/false/yes/no/on/off/1/0), default: false.
    pub first_run: FirstRunPolicy,
}

impl std::fmt::Debug for WatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchConfig")
            .field("node_rpc", &self.node_rpc)
            .field("pool_id", &self.pool_id)
            .field("telegram_token", &"[REDACTED]")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("state_file", &self.state_file)
            .field("rpc_timeout", &self.rpc_timeout)
            .field("telegram_timeout", &self.telegram_timeout)
            .field("near_env", &self.near_env)
            .field("seat_price_command", &self.seat_price_command)
            .field("seat_price_timeout", &self.seat_price_timeout)
            .field("first_run", &self.first_run)
            .finish()
    }
}

impl WatchConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, WatchError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WatchError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| {
            get(key).ok_or_else(|| WatchError::Config(format!("{key} is required")))
        };
        let secs = |key: &'static str, default: u64| -> Result<Duration, WatchError> {
            match get(key) {
                None => Ok(Duration::from_secs(default)),
                Some(v) => v
                    .parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .map(Duration::from_secs)
                    .ok_or_else(|| {
                        WatchError::Config(format!("{key} must be a positive integer, got {v:?}"))
                    }),
            }
        };

        let node_rpc = require("NODE_RPC")?;
        Url::parse(&node_rpc)
            .map_err(|e| WatchError::Config(format!("NODE_RPC is not a valid URL: {e}")))?;

        let pool_id = require("POOL_ID")?;
        let telegram_token = require("TG_API_KEY")?;
        let telegram_chat_id = require("TG_CHAT_ID")?;

        let telegram_api_url =
            get("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string());
        Url::parse(&telegram_api_url)
            .map_err(|e| WatchError::Config(format!("TELEGRAM_API_URL is not a valid URL: {e}")))?;

        let state_file = get("STATE_FILE").unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
        let rpc_timeout = secs("RPC_TIMEOUT_SECS", DEFAULT_RPC_TIMEOUT_SECS)?;
        let telegram_timeout = secs("TELEGRAM_TIMEOUT_SECS", DEFAULT_TELEGRAM_TIMEOUT_SECS)?;
        let near_env = get("NEAR_ENV").unwrap_or_else(|| DEFAULT_NEAR_ENV.to_string());
        let seat_price_command =
            get("SEAT_PRICE_COMMAND").unwrap_or_else(|| DEFAULT_SEAT_PRICE_COMMAND.to_string());
        let seat_price_timeout = secs("SEAT_PRICE_TIMEOUT_SECS", DEFAULT_SEAT_PRICE_TIMEOUT_SECS)?;

        let first_run = match get("ANNOUNCE_FIRST_EPOCH").map(|v| v.to_ascii_lowercase()) {
            None => FirstRunPolicy::Suppress,
            Some(v) => match v.as_str() {
                "true" | "1" | "yes" | "on" => FirstRunPolicy::Announce,
                "false" | "0" | "no" | "off" => FirstRunPolicy::Suppress,
                _ => {
                    return Err(WatchError::Config(format!(
                        "ANNOUNCE_FIRST_EPOCH must be true or false, got {v:?}"
                    )));
                }
            },
        };

        Ok(Self {
            node_rpc,
            pool_id,
            telegram_token,
            telegram_chat_id,
            telegram_api_url,
            state_file,
            rpc_timeout,
            telegram_timeout,
            near_env,
            seat_price_command,
            seat_price_timeout,
            first_run,
        })
    }
}
