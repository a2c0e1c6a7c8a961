//! Next-epoch seat price lookup through an external CLI.
//!
//! The command's stdout is forwarded to the operator verbatim; we never
//! interpret it.

use std::time::{Duration, Instant};

use crate::error::WatchError;

/// Default query: the NEAR CLI prints the seat price among its validator table.
pub const DEFAULT_SEAT_PRICE_COMMAND: &str = r#"near validators next | grep "seat price""#;

/// Captured result of one probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatPriceOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: u64,
}

impl SeatPriceOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait for the auxiliary seat price check.
///
/// `Err` means the command could not be run or did not finish in time; a
/// command that ran and exited non-zero is still `Ok`.
pub trait SeatPriceProbe: Send + Sync {
    fn next_seat_price(
        &self,
    ) -> impl std::future::Future<Output = Result<SeatPriceOutput, WatchError>> + Send;
}

/// Runs a shell command line under `bash -c` with `NEAR_ENV` set.
#[derive(Debug, Clone)]
pub struct ShellSeatPrice {
    command: String,
    near_env: String,
    timeout: Duration,
}

impl ShellSeatPrice {
    pub fn new(command: String, near_env: String, timeout: Duration) -> Self {
        Self {
            command,
            near_env,
            timeout,
        }
    }
}

impl SeatPriceProbe for ShellSeatPrice {
    async fn next_seat_price(&self) -> Result<SeatPriceOutput, WatchError> {
        let start = Instant::now();

        let result = tokio::time::timeout(
            self.timeout,
            tokio::process::Command::new("bash")
                .arg("-c")
                .arg(&self.command)
                .env("NEAR_ENV", &self.near_env)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| {
            WatchError::SeatPrice(format!("timed out after {}s", self.timeout.as_secs_f64()))
        })?
        .map_err(|e| WatchError::SeatPrice(format!("failed to execute: {e}")))?;

        Ok(SeatPriceOutput {
            stdout: String::from_utf8_lossy(&result.stdout).to_string(),
            stderr: String::from_utf8_lossy(&result.stderr).to_string(),
            exit_code: result.status.code().unwrap_or(-1),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
