//! Watch error types.

/// Errors that can occur during a monitoring cycle.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// A node API call failed, timed out or returned something undecodable.
    #[error("node request `{call}` failed: {reason}")]
    Fetch { call: &'static str, reason: String },

    /// The node is running under a different validator account than the pool we watch.
    #[error("POOL ID PROBLEMS: configured {configured}, node reports {reported}")]
    IdentityMismatch { configured: String, reported: String },

    #[error("failed to persist state: {0}")]
    Persist(String),

    #[error("notification failed: {0}")]
    Notify(String),

    #[error("seat price command failed: {0}")]
    SeatPrice(String),

    #[error("config error: {0}")]
    Config(String),
}

impl WatchError {
    pub(crate) fn fetch(call: &'static str, reason: impl ToString) -> Self {
        WatchError::Fetch {
            call,
            reason: reason.to_string(),
        }
    }
}
