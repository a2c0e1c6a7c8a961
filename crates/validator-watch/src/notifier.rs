//! Notification sink contract.

use crate::error::WatchError;

/// Something that can deliver a text message to the operator.
///
/// One attempt per call; callers treat a failure as logged-and-forgotten.
pub trait Notifier: Send + Sync {
    fn send_message(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), WatchError>> + Send;
}
