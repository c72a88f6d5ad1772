//! Bridge message extraction from verified receipts.
//!
//! Separated from state handling so the sequencing rule can be tested
//! as a pure function: given receipts and the last accepted sequence
//! number, produce the ordered payloads and the advanced counter, or
//! fail on the first gap or replay.

use crate::execution::trie::keccak256;
use crate::types::execution::Receipt;
use thiserror::Error;

/// Canonical signature of the bridge message event.
pub const MESSAGE_EVENT_SIGNATURE: &str = "Message(string,uint256,bytes)";

/// keccak-256 topic hash of the bridge message event signature.
pub fn message_event_topic() -> [u8; 32] {
    keccak256(MESSAGE_EVENT_SIGNATURE.as_bytes())
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Invalid message sequence: expected {expected}, log claims {claimed}")]
    InvalidSequence { expected: u64, claimed: String },

    #[error("Malformed bridge event log: {reason}")]
    MalformedLog { reason: String },
}

/// Extract bridge message payloads from receipts, enforcing gap-free
/// sequencing.
///
/// Logs whose first topic is not the bridge event signature are
/// skipped. Each matching log must claim exactly the next sequence
/// number after `start_seq` (in log order within a receipt, receipt
/// order within the slice); any gap or repeat fails the whole batch.
///
/// Returns the payloads in encounter order and the final sequence
/// number.
pub fn extract(receipts: &[Receipt], start_seq: u64) -> Result<(Vec<Vec<u8>>, u64), MessageError> {
    let event_topic = message_event_topic();
    let mut seq = start_seq;
    let mut payloads = Vec::new();

    for receipt in receipts {
        for log in &receipt.logs {
            match log.topics.first() {
                Some(signature) if *signature == event_topic => {}
                _ => continue,
            }
            let claimed = log.topics.get(2).ok_or_else(|| MessageError::MalformedLog {
                reason: "sequence topic missing".to_string(),
            })?;
            seq = seq.checked_add(1).ok_or_else(|| MessageError::MalformedLog {
                reason: "sequence counter overflow".to_string(),
            })?;
            if !sequence_matches(seq, claimed) {
                return Err(MessageError::InvalidSequence {
                    expected: seq,
                    claimed: format!("0x{}", hex::encode(claimed)),
                });
            }
            let payload = log
                .message_payload()
                .map_err(|reason| MessageError::MalformedLog { reason })?;
            payloads.push(payload);
        }
    }

    Ok((payloads, seq))
}

/// A claimed sequence topic is a 32-byte big-endian integer; anything
/// that does not fit the counter's width cannot match it.
fn sequence_matches(seq: u64, claimed: &[u8; 32]) -> bool {
    if claimed[..24].iter().any(|&b| b != 0) {
        return false;
    }
    let mut arr = [0u8; 8];
    arr.copy_from_slice(&claimed[24..]);
    u64::from_be_bytes(arr) == seq
}
