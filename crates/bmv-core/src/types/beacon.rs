use crate::rlp;
use serde::{Deserialize, Serialize};

/// Number of validators in the Ethereum beacon chain sync committee.
pub const SYNC_COMMITTEE_SIZE: usize = 512;

/// Number of bytes in a BLS12-381 public key (compressed).
pub const BLS_PUBKEY_LEN: usize = 48;

/// Number of bytes in a BLS12-381 signature (compressed).
pub const BLS_SIGNATURE_LEN: usize = 96;

/// Slots per epoch.
pub const SLOTS_PER_EPOCH: u64 = 32;

/// Epochs per sync committee period.
pub const EPOCHS_PER_SYNC_COMMITTEE_PERIOD: u64 = 256;

/// Slots per sync committee period (256 epochs * 32 slots/epoch = 8192).
pub const SLOTS_PER_SYNC_COMMITTEE_PERIOD: u64 =
    SLOTS_PER_EPOCH * EPOCHS_PER_SYNC_COMMITTEE_PERIOD;

/// Retention window of the beacon state's direct block-root vector.
/// Blocks older than this need a historical summary proof.
pub const SLOTS_PER_HISTORICAL_ROOT: u64 = 8192;

/// Domain type for sync committee signatures.
pub const DOMAIN_SYNC_COMMITTEE: [u8; 4] = [0x07, 0x00, 0x00, 0x00];

/// Fork version used when computing the sync committee signing domain.
pub const SYNC_COMMITTEE_FORK_VERSION: [u8; 4] = [0x04, 0x00, 0x00, 0x00];

/// Minimum number of sync committee participants required (2/3 of 512).
pub const MIN_SYNC_COMMITTEE_PARTICIPANTS: usize = 342;

/// Sync committee period containing the given slot.
pub fn sync_committee_period(slot: u64) -> u64 {
    slot / SLOTS_PER_SYNC_COMMITTEE_PERIOD
}

/// A BLS12-381 public key (48 bytes, compressed G1 point).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsPublicKey(pub [u8; BLS_PUBKEY_LEN]);

impl Serialize for BlsPublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for BlsPublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl BlsPublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_PUBKEY_LEN {
            return Err("Invalid BLS public key length");
        }
        let mut arr = [0u8; BLS_PUBKEY_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

/// A BLS12-381 signature (96 bytes, compressed G2 point).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsSignature(pub [u8; BLS_SIGNATURE_LEN]);

impl Serialize for BlsSignature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for BlsSignature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl BlsSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_SIGNATURE_LEN {
            return Err("Invalid BLS signature length");
        }
        let mut arr = [0u8; BLS_SIGNATURE_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

/// A beacon chain block header.
/// This is the minimal header — enough to verify the chain without
/// storing full blocks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlockHeader {
    /// Slot number of this block.
    pub slot: u64,
    /// Index of the validator who proposed this block.
    pub proposer_index: u64,
    /// Root hash of the parent beacon block.
    pub parent_root: [u8; 32],
    /// Root hash of the beacon state after processing this block.
    pub state_root: [u8; 32],
    /// Root hash of the block body.
    pub body_root: [u8; 32],
}

impl BeaconBlockHeader {
    /// Sync committee period containing this header's slot.
    pub fn period(&self) -> u64 {
        sync_committee_period(self.slot)
    }

    pub fn to_rlp_bytes(&self) -> Vec<u8> {
        rlp::encode_list(&[
            rlp::encode_u64(self.slot),
            rlp::encode_u64(self.proposer_index),
            rlp::encode_bytes(&self.parent_root),
            rlp::encode_bytes(&self.state_root),
            rlp::encode_bytes(&self.body_root),
        ])
    }

    pub fn from_rlp_bytes(bytes: &[u8]) -> Result<Self, String> {
        let items = rlp::decode_list(bytes)?;
        if items.len() != 5 {
            return Err(format!("Header: expected 5 items, got {}", items.len()));
        }
        Ok(Self {
            slot: rlp::decode_u64(&items[0])?,
            proposer_index: rlp::decode_u64(&items[1])?,
            parent_root: rlp::decode_fixed(&items[2], "parent_root")?,
            state_root: rlp::decode_fixed(&items[3], "state_root")?,
            body_root: rlp::decode_fixed(&items[4], "body_root")?,
        })
    }
}

/// The sync committee — 512 validators that sign off on the chain head.
/// Rotates every ~27 hours (256 epochs).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCommittee {
    /// 512 BLS public keys of committee members.
    pub pubkeys: Vec<BlsPublicKey>,
    /// Aggregated public key for fast signature verification.
    pub aggregate_pubkey: BlsPublicKey,
}

impl SyncCommittee {
    /// Validate the sync committee has the correct number of members.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.pubkeys.len() != SYNC_COMMITTEE_SIZE {
            return Err("Sync committee must have exactly 512 members");
        }
        Ok(())
    }

    pub fn to_rlp_bytes(&self) -> Vec<u8> {
        let pubkeys: Vec<Vec<u8>> = self
            .pubkeys
            .iter()
            .map(|pk| rlp::encode_bytes(&pk.0))
            .collect();
        rlp::encode_list(&[
            rlp::encode_list(&pubkeys),
            rlp::encode_bytes(&self.aggregate_pubkey.0),
        ])
    }

    pub fn from_rlp_bytes(bytes: &[u8]) -> Result<Self, String> {
        let items = rlp::decode_list(bytes)?;
        if items.len() != 2 {
            return Err(format!("Committee: expected 2 items, got {}", items.len()));
        }
        let pubkeys = rlp::decode_list(&items[0])?
            .iter()
            .map(|pk| Ok(BlsPublicKey(rlp::decode_fixed(pk, "pubkey")?)))
            .collect::<Result<Vec<_>, String>>()?;
        Ok(Self {
            pubkeys,
            aggregate_pubkey: BlsPublicKey(rlp::decode_fixed(&items[1], "aggregate_pubkey")?),
        })
    }
}

/// The aggregate BLS signature from the sync committee.
/// Contains a bitvector indicating which of the 512 members signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAggregate {
    /// Bitvector indicating which of the 512 committee members signed.
    /// Each bit corresponds to a committee member at the same index.
    pub sync_committee_bits: Vec<u8>,
    /// The aggregated BLS signature from all participating members.
    pub sync_committee_signature: BlsSignature,
}

impl SyncAggregate {
    /// Count how many sync committee members participated (set bits).
    pub fn num_participants(&self) -> usize {
        self.sync_committee_bits
            .iter()
            .map(|byte| byte.count_ones() as usize)
            .sum()
    }

    /// Check if a specific committee member (by index) participated.
    pub fn has_participant(&self, index: usize) -> bool {
        if index >= SYNC_COMMITTEE_SIZE {
            return false;
        }
        let byte_index = index / 8;
        let bit_index = index % 8;
        if byte_index >= self.sync_committee_bits.len() {
            return false;
        }
        (self.sync_committee_bits[byte_index] >> bit_index) & 1 == 1
    }

    /// Get the indices of all participating committee members.
    pub fn participant_indices(&self) -> Vec<usize> {
        (0..SYNC_COMMITTEE_SIZE)
            .filter(|&i| self.has_participant(i))
            .collect()
    }

    pub fn to_rlp_bytes(&self) -> Vec<u8> {
        rlp::encode_list(&[
            rlp::encode_bytes(&self.sync_committee_bits),
            rlp::encode_bytes(&self.sync_committee_signature.0),
        ])
    }

    pub fn from_rlp_bytes(bytes: &[u8]) -> Result<Self, String> {
        let items = rlp::decode_list(bytes)?;
        if items.len() != 2 {
            return Err(format!(
                "Sync aggregate: expected 2 items, got {}",
                items.len()
            ));
        }
        Ok(Self {
            sync_committee_bits: items[0].clone(),
            sync_committee_signature: BlsSignature(rlp::decode_fixed(
                &items[1],
                "sync_committee_signature",
            )?),
        })
    }
}

/// A sync-committee-attested header advancement.
/// This is what relayers submit to move the verifier's finalized head.
/// Every field must be cryptographically verified before accepting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockUpdate {
    /// The header that the sync committee is attesting to.
    pub attested_header: BeaconBlockHeader,
    /// The latest finalized header that this update references.
    pub finalized_header: BeaconBlockHeader,
    /// Merkle branch proving finalized_header against the attested state.
    pub finality_branch: Vec<[u8; 32]>,
    /// The next sync committee (present only near a period boundary).
    pub next_sync_committee: Option<SyncCommittee>,
    /// Merkle branch proving next_sync_committee against the attested state.
    pub next_sync_committee_branch: Vec<[u8; 32]>,
    /// The slot at which the signature was produced.
    pub signature_slot: u64,
    /// The aggregate signature from the sync committee.
    pub sync_aggregate: SyncAggregate,
}

impl BlockUpdate {
    pub fn to_rlp_bytes(&self) -> Vec<u8> {
        rlp::encode_list(&[
            self.attested_header.to_rlp_bytes(),
            self.finalized_header.to_rlp_bytes(),
            encode_branch(&self.finality_branch),
            match &self.next_sync_committee {
                Some(committee) => committee.to_rlp_bytes(),
                None => rlp::encode_list(&[]),
            },
            encode_branch(&self.next_sync_committee_branch),
            rlp::encode_u64(self.signature_slot),
            self.sync_aggregate.to_rlp_bytes(),
        ])
    }

    pub fn from_rlp_bytes(bytes: &[u8]) -> Result<Self, String> {
        let items = rlp::decode_list(bytes)?;
        if items.len() != 7 {
            return Err(format!(
                "Block update: expected 7 items, got {}",
                items.len()
            ));
        }
        let next_sync_committee = if rlp::decode_list(&items[3])?.is_empty() {
            None
        } else {
            Some(SyncCommittee::from_rlp_bytes(&items[3])?)
        };
        Ok(Self {
            attested_header: BeaconBlockHeader::from_rlp_bytes(&items[0])?,
            finalized_header: BeaconBlockHeader::from_rlp_bytes(&items[1])?,
            finality_branch: decode_branch(&items[2])?,
            next_sync_committee,
            next_sync_committee_branch: decode_branch(&items[4])?,
            signature_slot: rlp::decode_u64(&items[5])?,
            sync_aggregate: SyncAggregate::from_rlp_bytes(&items[6])?,
        })
    }
}

pub(crate) fn encode_branch(branch: &[[u8; 32]]) -> Vec<u8> {
    let nodes: Vec<Vec<u8>> = branch.iter().map(|n| rlp::encode_bytes(n)).collect();
    rlp::encode_list(&nodes)
}

pub(crate) fn decode_branch(item: &[u8]) -> Result<Vec<[u8; 32]>, String> {
    rlp::decode_list(item)?
        .iter()
        .map(|n| rlp::decode_fixed(n, "branch node"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_arithmetic() {
        assert_eq!(sync_committee_period(0), 0);
        assert_eq!(sync_committee_period(8191), 0);
        assert_eq!(sync_committee_period(8192), 1);
        assert_eq!(sync_committee_period(10 * 8192 + 17), 10);
    }

    #[test]
    fn test_header_rlp_round_trip() {
        let header = BeaconBlockHeader {
            slot: 123_456,
            proposer_index: 42,
            parent_root: [0x11; 32],
            state_root: [0x22; 32],
            body_root: [0x33; 32],
        };
        let decoded = BeaconBlockHeader::from_rlp_bytes(&header.to_rlp_bytes()).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_block_update_codec_preserves_missing_committee() {
        let update = BlockUpdate {
            attested_header: BeaconBlockHeader {
                slot: 101,
                ..Default::default()
            },
            finalized_header: BeaconBlockHeader {
                slot: 90,
                ..Default::default()
            },
            finality_branch: vec![[0xAA; 32]; 6],
            next_sync_committee: None,
            next_sync_committee_branch: vec![],
            signature_slot: 102,
            sync_aggregate: SyncAggregate {
                sync_committee_bits: vec![0xFF; 64],
                sync_committee_signature: BlsSignature([0u8; 96]),
            },
        };
        let decoded = BlockUpdate::from_rlp_bytes(&update.to_rlp_bytes()).unwrap();
        assert!(decoded.next_sync_committee.is_none());
        assert_eq!(decoded.finality_branch, update.finality_branch);
        assert_eq!(decoded.signature_slot, 102);
    }

    #[test]
    fn test_sync_aggregate_participation() {
        let mut bits = vec![0u8; 64]; // 512 bits
        bits[0] = 0b11111111; // First 8 members participated
        bits[1] = 0b00000001; // 9th member

        let aggregate = SyncAggregate {
            sync_committee_bits: bits,
            sync_committee_signature: BlsSignature([0u8; 96]),
        };

        assert_eq!(aggregate.num_participants(), 9);
        assert!(aggregate.has_participant(0));
        assert!(aggregate.has_participant(7));
        assert!(aggregate.has_participant(8));
        assert!(!aggregate.has_participant(9));
    }

    #[test]
    fn test_committee_size_validation() {
        let committee = SyncCommittee {
            pubkeys: vec![BlsPublicKey([0u8; 48]); 100],
            aggregate_pubkey: BlsPublicKey([0u8; 48]),
        };
        assert!(committee.validate().is_err());
    }
}
