//! One monitoring cycle: fetch, build, diff, notify, persist, verify, then the
//! auxiliary seat price check.
//!
//! Any fetch failure or identity mismatch short-circuits the pipeline into a
//! single error notification. The seat price check runs no matter what.

use chrono::Utc;

use crate::alert;
use crate::diff::{self, FirstRunPolicy};
use crate::error::WatchError;
use crate::fetcher::NodeStatusFetcher;
use crate::notifier::Notifier;
use crate::seat_price::SeatPriceProbe;
use crate::snapshot;
use crate::store::StateStore;

/// Pipeline position, recorded for logs and for where a cycle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Fetching,
    Building,
    Diffing,
    Notifying,
    Persisting,
    Verifying,
    AuxCheck,
    Done,
}

impl std::fmt::Display for CycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CycleStage::Fetching => "fetching",
            CycleStage::Building => "building",
            CycleStage::Diffing => "diffing",
            CycleStage::Notifying => "notifying",
            CycleStage::Persisting => "persisting",
            CycleStage::Verifying => "verifying",
            CycleStage::AuxCheck => "aux_check",
            CycleStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Which notification a message was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Status,
    EpochChange,
    Productivity,
    Error,
    SeatPrice,
}

/// A notification the cycle attempted to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub kind: MessageKind,
    pub delivered: bool,
}

/// A caught cycle failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleFailure {
    pub stage: CycleStage,
    pub message: String,
}

/// Outcome of [`Monitor::run_cycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub dispatched: Vec<Dispatched>,
    pub persisted: bool,
    pub failure: Option<CycleFailure>,
    pub stage: CycleStage,
}

impl CycleReport {
    fn new() -> Self {
        Self {
            dispatched: Vec::new(),
            persisted: false,
            failure: None,
            stage: CycleStage::Fetching,
        }
    }

    /// Kinds of every attempted notification, in send order.
    pub fn kinds(&self) -> Vec<MessageKind> {
        self.dispatched.iter().map(|d| d.kind).collect()
    }

    pub fn failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Drives a monitoring cycle over the given collaborators.
pub struct Monitor<F, N, S> {
    fetcher: F,
    notifier: N,
    seat_price: S,
    store: StateStore,
    pool_id: String,
    first_run: FirstRunPolicy,
}

impl<F, N, S> Monitor<F, N, S>
where
    F: NodeStatusFetcher,
    N: Notifier,
    S: SeatPriceProbe,
{
    pub fn new(fetcher: F, notifier: N, seat_price: S, store: StateStore, pool_id: String) -> Self {
        Self {
            fetcher,
            notifier,
            seat_price,
            store,
            pool_id,
            first_run: FirstRunPolicy::default(),
        }
    }

    pub fn with_first_run_policy(mut self, policy: FirstRunPolicy) -> Self {
        self.first_run = policy;
        self
    }

    /// Run one full cycle. Never returns an error: failures are reported to
    /// the operator and recorded in the returned report.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::new();

        if let Err(e) = self.observe(&mut report).await {
            tracing::error!(stage = %report.stage, error = %e, "monitoring cycle failed");
            report.failure = Some(CycleFailure {
                stage: report.stage,
                message: e.to_string(),
            });
            self.dispatch(&mut report, MessageKind::Error, &alert::error_message(&e))
                .await;
        }

        self.advance(&mut report, CycleStage::AuxCheck);
        self.check_seat_price(&mut report).await;

        self.advance(&mut report, CycleStage::Done);
        report
    }

    /// The main pipeline, up to and including the identity check.
    async fn observe(&self, report: &mut CycleReport) -> Result<(), WatchError> {
        let node_status = self.fetcher.node_status().await?;
        let network_info = self.fetcher.network_info().await?;
        let validators = self.fetcher.validators().await?;
        tracing::info!(
            protocol_version = node_status.protocol_version,
            latest_protocol_version = node_status.latest_protocol_version,
            peers = network_info.num_active_peers,
            epoch_height = validators.epoch_height,
            "node status fetched"
        );

        self.advance(report, CycleStage::Building);
        let mut current = snapshot::build(&node_status, &network_info, &validators, &self.pool_id);
        current.observed_at = Some(Utc::now());

        self.advance(report, CycleStage::Diffing);
        let prev = self.store.load();
        let epoch_changed = diff::epoch_changed(prev.as_ref(), &current, self.first_run);
        let productivity = diff::productivity_alert(&current);
        if prev.is_none() {
            tracing::info!(
                policy = ?self.first_run,
                "no prior state, this run sets the baseline"
            );
        }

        self.advance(report, CycleStage::Notifying);
        let status = alert::status_line(
            node_status.protocol_version,
            node_status.latest_protocol_version,
            network_info.num_active_peers,
        );
        self.dispatch(report, MessageKind::Status, &status).await;

        if epoch_changed {
            tracing::info!(
                from = prev.as_ref().map(|p| p.epoch_start_height),
                to = current.epoch_start_height,
                "epoch changed"
            );
            let msg = alert::epoch_change_message(current.epoch_height, prev.as_ref(), &current);
            self.dispatch(report, MessageKind::EpochChange, &msg).await;
        }

        if let Some(detail) = productivity {
            tracing::warn!(
                produced_chunks = detail.produced_chunks,
                expected_chunks = detail.expected_chunks,
                produced_blocks = detail.produced_blocks,
                expected_blocks = detail.expected_blocks,
                "productivity below threshold"
            );
            self.dispatch(report, MessageKind::Productivity, &alert::productivity_message(&detail))
                .await;
        }

        self.advance(report, CycleStage::Persisting);
        match self.store.save(&current) {
            Ok(()) => report.persisted = true,
            Err(e) => tracing::error!(
                path = %self.store.path().display(),
                error = %e,
                "state not persisted"
            ),
        }

        self.advance(report, CycleStage::Verifying);
        let reported = node_status.validator_account_id.as_deref();
        if diff::identity_mismatch(reported, &self.pool_id) {
            return Err(WatchError::IdentityMismatch {
                configured: self.pool_id.clone(),
                reported: reported.unwrap_or("<none>").to_string(),
            });
        }

        Ok(())
    }

    async fn check_seat_price(&self, report: &mut CycleReport) {
        let stdout = match self.seat_price.next_seat_price().await {
            Ok(out) => {
                if !out.success() {
                    tracing::warn!(
                        exit_code = out.exit_code,
                        stderr = %out.stderr.trim(),
                        "seat price command exited non-zero"
                    );
                } else {
                    tracing::debug!(duration_ms = out.duration_ms, "seat price fetched");
                }
                out.stdout
            }
            Err(e) => {
                tracing::warn!(error = %e, "seat price check failed");
                String::new()
            }
        };

        self.dispatch(report, MessageKind::SeatPrice, &alert::seat_price_message(&stdout))
            .await;
    }

    async fn dispatch(&self, report: &mut CycleReport, kind: MessageKind, text: &str) {
        let delivered = match self.notifier.send_message(text).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(kind = ?kind, error = %e, "notification not delivered");
                false
            }
        };
        report.dispatched.push(Dispatched { kind, delivered });
    }

    fn advance(&self, report: &mut CycleReport, stage: CycleStage) {
        tracing::debug!(from = %report.stage, to = %stage, "cycle stage");
        report.stage = stage;
    }
}
