//! Human-readable notification bodies.

use std::fmt::Write;

use crate::diff::{self, ProductivityAlert};
use crate::snapshot::ValidatorSnapshot;

/// Marker line that prefixes every cycle failure report.
pub const ERROR_MARKER: &str = "🚨 ERROR 🚨";

/// Header of the seat price report.
pub const SEAT_PRICE_HEADER: &str = "Next Seat Price";

/// Informational line sent on every successful fetch.
pub fn status_line(
    protocol_version: u32,
    latest_protocol_version: u32,
    connected_peers: u32,
) -> String {
    let mut msg = format!(
        "protocol version: {protocol_version}\n\
         Near latest version: {latest_protocol_version}\n\
         Connected Peers: {connected_peers}"
    );
    if protocol_version < latest_protocol_version {
        msg.push_str("\n⬆ node is behind the latest protocol version, upgrade soon");
    }
    msg
}

/// Summary of a new epoch and how the pool's standing changed.
pub fn epoch_change_message(
    epoch_height: u64,
    prev: Option<&ValidatorSnapshot>,
    curr: &ValidatorSnapshot,
) -> String {
    let t = diff::transition(prev, curr);
    let mut rows = vec![
        "🔄 EPOCH CHANGED".to_string(),
        format!(
            "Epoch height: {epoch_height} (started at block {})",
            curr.epoch_start_height
        ),
    ];

    if let Some(kickout) = &curr.kickout_state {
        let marker = if t.newly_kicked_out {
            "⛔ Kicked out"
        } else {
            "⛔ Still kicked out"
        };
        rows.push(format!(
            "{marker} in previous epoch: {}",
            kickout_reason(&kickout.reason)
        ));
    }

    rows.push(match (&curr.current_validator_state, t.joined_active_set) {
        (Some(_), true) => "✅ Joined the active validator set".to_string(),
        (Some(_), false) => "✅ Validating this epoch".to_string(),
        (None, _) if t.left_active_set => {
            "❌ Dropped out of the active validator set".to_string()
        }
        (None, _) => "❌ Not validating this epoch".to_string(),
    });

    rows.push(match (&curr.next_validator_state, t.joined_next_set) {
        (Some(_), true) => "🆕 Promoted to next epoch validators".to_string(),
        (Some(_), false) => "✅ Scheduled to validate next epoch".to_string(),
        (None, _) if t.left_next_set => "⚠ Removed from next epoch validators".to_string(),
        (None, _) => "❌ Not in next epoch validators".to_string(),
    });

    if let Some(last) = prev.and_then(|p| p.current_validator_state.as_ref()) {
        rows.push(chunks_blocks_stat(
            "Previous epoch (last observed)",
            &ProductivityAlert::from(last),
        ));
    }

    rows.join("\n")
}

/// Fixed-format productivity warning.
pub fn productivity_message(detail: &ProductivityAlert) -> String {
    [
        "⚠ SOMETHING WRONG!",
        "Your node has produced lower than expected",
        &chunks_blocks_stat("Productivity", detail),
    ]
    .join("\n")
}

/// Wrap a cycle failure for the operator.
pub fn error_message(err: &dyn std::fmt::Display) -> String {
    format!("{ERROR_MARKER}\n{err}")
}

/// Seat price report; `stdout` is forwarded as-is.
pub fn seat_price_message(stdout: &str) -> String {
    format!("{SEAT_PRICE_HEADER}\n{stdout}")
}

fn chunks_blocks_stat(title: &str, detail: &ProductivityAlert) -> String {
    let mut out = String::from(title);
    let _ = write!(
        out,
        "\nBlocks: {}/{} ({})",
        detail.produced_blocks,
        detail.expected_blocks,
        percent(detail.produced_blocks, detail.expected_blocks)
    );
    let _ = write!(
        out,
        "\nChunks: {}/{} ({})",
        detail.produced_chunks,
        detail.expected_chunks,
        percent(detail.produced_chunks, detail.expected_chunks)
    );
    out
}

fn percent(produced: u64, expected: u64) -> String {
    if expected == 0 {
        "n/a".to_string()
    } else {
        format!("{:.2}%", diff::ratio(produced, expected) * 100.0)
    }
}

/// Kickout reasons arrive as `"Slashed"` or `{"NotEnoughChunks": {...}}`.
fn kickout_reason(reason: &serde_json::Value) -> String {
    match reason {
        serde_json::Value::Null => "unknown reason".to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(map) if map.len() == 1 => match map.iter().next() {
            Some((kind, serde_json::Value::Object(d))) if !d.is_empty() => {
                let fields: Vec<String> = d.iter().map(|(k, v)| format!("{k}={v}")).collect();
                format!("{kind} ({})", fields.join(", "))
            }
            Some((kind, _)) => kind.clone(),
            None => reason.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{CurrentValidator, KickoutEntry, NextValidator};

    fn snap(epoch_start_height: u64) -> ValidatorSnapshot {
        ValidatorSnapshot {
            epoch_start_height,
            epoch_height: 42,
            kickout_state: None,
            current_validator_state: None,
            next_validator_state: None,
            observed_at: None,
        }
    }

    fn validator(produced_chunks: u64, expected_chunks: u64) -> CurrentValidator {
        CurrentValidator {
            account_id: "pool.near".to_string(),
            public_key: String::new(),
            stake: String::new(),
            is_slashed: false,
            shards: vec![],
            num_produced_blocks: 9,
            num_expected_blocks: 10,
            num_produced_chunks: produced_chunks,
            num_expected_chunks: expected_chunks,
        }
    }

    #[test]
    fn status_line_format() {
        assert_eq!(
            status_line(63, 63, 12),
            "protocol version: 63\nNear latest version: 63\nConnected Peers: 12"
        );
        assert!(status_line(62, 63, 1).contains("upgrade"));
    }

    #[test]
    fn productivity_block() {
        let msg = productivity_message(&ProductivityAlert {
            expected_chunks: 10,
            produced_chunks: 7,
            expected_blocks: 10,
            produced_blocks: 9,
        });
        assert_eq!(
            msg,
            "⚠ SOMETHING WRONG!\n\
             Your node has produced lower than expected\n\
             Productivity\n\
             Blocks: 9/10 (90.00%)\n\
             Chunks: 7/10 (70.00%)"
        );
    }

    #[test]
    fn productivity_zero_expected_renders_na() {
        let msg = productivity_message(&ProductivityAlert {
            expected_chunks: 5,
            produced_chunks: 1,
            expected_blocks: 0,
            produced_blocks: 0,
        });
        assert!(msg.contains("Blocks: 0/0 (n/a)"));
        assert!(msg.contains("Chunks: 1/5 (20.00%)"));
    }

    #[test]
    fn epoch_message_reports_kickout_and_next_set() {
        let mut prev = snap(100);
        prev.current_validator_state = Some(validator(3, 10));
        prev.next_validator_state = Some(NextValidator {
            account_id: "pool.near".to_string(),
            public_key: String::new(),
            stake: String::new(),
            shards: vec![],
        });

        let mut curr = snap(200);
        curr.epoch_height = 43;
        curr.kickout_state = Some(KickoutEntry {
            account_id: "pool.near".to_string(),
            reason: serde_json::json!({ "NotEnoughChunks": { "expected": 10, "produced": 3 } }),
        });

        let msg = epoch_change_message(curr.epoch_height, Some(&prev), &curr);
        assert!(msg.starts_with("🔄 EPOCH CHANGED\nEpoch height: 43 (started at block 200)"));
        assert!(msg.contains(
            "⛔ Kicked out in previous epoch: NotEnoughChunks (expected=10, produced=3)"
        ));
        assert!(msg.contains("Dropped out of the active validator set"));
        assert!(msg.contains("Removed from next epoch validators"));
        assert!(msg.contains(
            "Previous epoch (last observed)\nBlocks: 9/10 (90.00%)\nChunks: 3/10 (30.00%)"
        ));

        let mut next = snap(300);
        next.epoch_height = 44;
        next.kickout_state = Some(KickoutEntry {
            account_id: "pool.near".to_string(),
            reason: serde_json::json!("Unstaked"),
        });
        let msg = epoch_change_message(next.epoch_height, Some(&curr), &next);
        assert!(msg.contains("⛔ Still kicked out in previous epoch: Unstaked"));
        assert!(!msg.contains("⛔ Kicked out"));
        assert!(msg.contains("❌ Not validating this epoch"));
    }

    #[test]
    fn epoch_message_first_observation() {
        let mut curr = snap(200);
        curr.current_validator_state = Some(validator(1, 1));
        let msg = epoch_change_message(42, None, &curr);
        assert!(msg.contains("Joined the active validator set"));
        assert!(msg.contains("Not in next epoch validators"));
        assert!(!msg.contains("Previous epoch"));
    }

    #[test]
    fn error_and_seat_price_wrappers() {
        assert_eq!(error_message(&"node down"), "🚨 ERROR 🚨\nnode down");
        assert_eq!(seat_price_message(""), "Next Seat Price\n");
        assert_eq!(
            seat_price_message("seat price = 42"),
            "Next Seat Price\nseat price = 42"
        );
    }

    #[test]
    fn kickout_reason_shapes() {
        assert_eq!(kickout_reason(&serde_json::json!("Slashed")), "Slashed");
        assert_eq!(kickout_reason(&serde_json::Value::Null), "unknown reason");
        assert_eq!(kickout_reason(&serde_json::json!({ "Unstaked": {} })), "Unstaked");
    }
}
