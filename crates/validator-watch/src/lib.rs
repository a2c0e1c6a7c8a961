//! validator-watch: health monitoring for a single NEAR validator.
//!
//! Each run fetches the node's status and the epoch's validator set, compares
//! the watched pool's standing against the snapshot persisted by the previous
//! run, and reports epoch changes, low productivity and misconfiguration to
//! the operator through a [`Notifier`] (Telegram in production).
//!
//! Scheduling is external: a cron job or systemd timer invokes one
//! [`Monitor::run_cycle`] per period.

pub mod alert;
pub mod config;
pub mod diff;
pub mod error;
pub mod fetcher;
pub mod notifier;
pub mod rpc;
pub mod runner;
pub mod seat_price;
pub mod snapshot;
pub mod store;
pub mod telegram;

pub use config::WatchConfig;
pub use diff::{FirstRunPolicy, ProductivityAlert};
pub use error::WatchError;
pub use fetcher::{EpochValidatorInfo, NetworkInfo, NodeStatus, NodeStatusFetcher};
pub use notifier::Notifier;
pub use rpc::NearRpcClient;
pub use runner::{CycleReport, CycleStage, MessageKind, Monitor};
pub use seat_price::{SeatPriceOutput, SeatPriceProbe, ShellSeatPrice};
pub use snapshot::ValidatorSnapshot;
pub use store::StateStore;
pub use telegram::TelegramNotifier;

/// Wire a [`Monitor`] from configuration with the production collaborators.
pub fn monitor_from_config(
    config: &WatchConfig,
) -> Result<Monitor<NearRpcClient, TelegramNotifier, ShellSeatPrice>, WatchError> {
    let fetcher = NearRpcClient::new(&config.node_rpc, config.rpc_timeout)?;
    let notifier = TelegramNotifier::new(
        &config.telegram_api_url,
        config.telegram_token.clone(),
        config.telegram_chat_id.clone(),
        config.telegram_timeout,
    )?;
    let seat_price = ShellSeatPrice::new(
        config.seat_price_command.clone(),
        config.near_env.clone(),
        config.seat_price_timeout,
    );

    Ok(Monitor::new(
        fetcher,
        notifier,
        seat_price,
        StateStore::new(&config.state_file),
        config.pool_id.clone(),
    )
    .with_first_run_policy(config.first_run))
}
