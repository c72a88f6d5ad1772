//! The verifier's single mutable state record.
//!
//! Exactly one instance exists per deployed verifier. The host layer
//! loads it at the start of a relay call, threads it by `&mut` through
//! the processors, and persists it only when the whole submission
//! succeeded.

use crate::rlp;
use crate::types::beacon::{BeaconBlockHeader, BlsPublicKey, SyncCommittee};
use serde::{Deserialize, Serialize};

/// Accumulated trust of the verifier: committees, finalized header,
/// bridge identity, and message sequencing position.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifierState {
    /// Network identifier of the counterpart chain.
    pub src_network_id: String,
    /// Address of the bridge contract allowed to call this verifier.
    pub bmc: String,
    /// Genesis validators hash, the immutable anchor for signing domains.
    pub genesis_validators_hash: [u8; 32],
    /// The sync committee trusted for the current finalized period.
    pub current_sync_committee: SyncCommittee,
    /// The committee announced for the next period, once learned.
    pub next_sync_committee: Option<SyncCommittee>,
    /// The latest finalized beacon header we have verified.
    pub finalized_header: BeaconBlockHeader,
    /// Sequence number of the last accepted bridge message.
    pub last_msg_seq: u64,
    /// Slot of the block that produced the last accepted message.
    pub last_msg_slot: u64,
}

impl Default for VerifierState {
    fn default() -> Self {
        Self {
            src_network_id: String::new(),
            bmc: String::new(),
            genesis_validators_hash: [0u8; 32],
            current_sync_committee: SyncCommittee {
                pubkeys: Vec::new(),
                aggregate_pubkey: BlsPublicKey([0u8; 48]),
            },
            next_sync_committee: None,
            finalized_header: BeaconBlockHeader::default(),
            last_msg_seq: 0,
            last_msg_slot: 0,
        }
    }
}

impl VerifierState {
    /// Sync committee period of the trusted finalized header.
    pub fn finalized_period(&self) -> u64 {
        self.finalized_header.period()
    }

    pub fn to_rlp_bytes(&self) -> Vec<u8> {
        rlp::encode_list(&[
            rlp::encode_bytes(self.src_network_id.as_bytes()),
            rlp::encode_bytes(self.bmc.as_bytes()),
            rlp::encode_bytes(&self.genesis_validators_hash),
            self.current_sync_committee.to_rlp_bytes(),
            match &self.next_sync_committee {
                Some(committee) => committee.to_rlp_bytes(),
                None => rlp::encode_list(&[]),
            },
            self.finalized_header.to_rlp_bytes(),
            rlp::encode_u64(self.last_msg_seq),
            rlp::encode_u64(self.last_msg_slot),
        ])
    }

    pub fn from_rlp_bytes(bytes: &[u8]) -> Result<Self, String> {
        let items = rlp::decode_list(bytes)?;
        if items.len() != 8 {
            return Err(format!(
                "Verifier state: expected 8 items, got {}",
                items.len()
            ));
        }
        let next_sync_committee = if rlp::decode_list(&items[4])?.is_empty() {
            None
        } else {
            Some(SyncCommittee::from_rlp_bytes(&items[4])?)
        };
        Ok(Self {
            src_network_id: utf8(&items[0], "src_network_id")?,
            bmc: utf8(&items[1], "bmc")?,
            genesis_validators_hash: rlp::decode_fixed(&items[2], "genesis_validators_hash")?,
            current_sync_committee: SyncCommittee::from_rlp_bytes(&items[3])?,
            next_sync_committee,
            finalized_header: BeaconBlockHeader::from_rlp_bytes(&items[5])?,
            last_msg_seq: rlp::decode_u64(&items[6])?,
            last_msg_slot: rlp::decode_u64(&items[7])?,
        })
    }
}

fn utf8(item: &[u8], what: &str) -> Result<String, String> {
    String::from_utf8(item.to_vec()).map_err(|_| format!("{}: invalid utf-8", what))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_rlp_round_trip() {
        let state = VerifierState {
            src_network_id: "0xaa36a7.eth2".to_string(),
            bmc: "cx4b2d3c9f81eab".to_string(),
            genesis_validators_hash: [0x99; 32],
            current_sync_committee: SyncCommittee {
                pubkeys: vec![BlsPublicKey([0x07; 48]); 4],
                aggregate_pubkey: BlsPublicKey([0x08; 48]),
            },
            next_sync_committee: Some(SyncCommittee {
                pubkeys: vec![BlsPublicKey([0x09; 48]); 4],
                aggregate_pubkey: BlsPublicKey([0x0A; 48]),
            }),
            finalized_header: BeaconBlockHeader {
                slot: 82_000,
                proposer_index: 12,
                parent_root: [1; 32],
                state_root: [2; 32],
                body_root: [3; 32],
            },
            last_msg_seq: 41,
            last_msg_slot: 81_990,
        };

        let decoded = VerifierState::from_rlp_bytes(&state.to_rlp_bytes()).unwrap();
        assert_eq!(decoded.src_network_id, state.src_network_id);
        assert_eq!(decoded.bmc, state.bmc);
        assert_eq!(decoded.current_sync_committee, state.current_sync_committee);
        assert_eq!(decoded.next_sync_committee, state.next_sync_committee);
        assert_eq!(decoded.finalized_header, state.finalized_header);
        assert_eq!(decoded.last_msg_seq, 41);
        assert_eq!(decoded.last_msg_slot, 81_990);

        // None committee survives the round trip distinctly
        let mut no_next = state;
        no_next.next_sync_committee = None;
        let decoded = VerifierState::from_rlp_bytes(&no_next.to_rlp_bytes()).unwrap();
        assert!(decoded.next_sync_committee.is_none());
    }

    #[test]
    fn test_finalized_period() {
        let mut state = VerifierState::default();
        state.finalized_header.slot = 10 * 8192 + 5;
        assert_eq!(state.finalized_period(), 10);
    }
}
