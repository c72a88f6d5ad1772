use crate::rlp;
use crate::types::beacon::{decode_branch, encode_branch, BeaconBlockHeader, BlockUpdate};
use serde::{Deserialize, Serialize};

/// Relay wire tag for a block update sub-message.
pub const RELAY_TYPE_BLOCK_UPDATE: u64 = 1;
/// Relay wire tag for a block proof sub-message.
pub const RELAY_TYPE_BLOCK_PROOF: u64 = 2;
/// Relay wire tag for a message proof sub-message.
pub const RELAY_TYPE_MESSAGE_PROOF: u64 = 3;

/// A fixed-depth binary hash-tree inclusion proof.
///
/// The branch length is the proof depth; the generalized index encodes
/// both the depth and the left/right hashing order at each height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SszProof {
    /// The leaf value being proven.
    pub leaf: [u8; 32],
    /// Sibling hashes from the leaf up to the root.
    pub branch: Vec<[u8; 32]>,
    /// Generalized index of the leaf within the tree.
    pub gindex: u64,
}

impl SszProof {
    pub fn to_rlp_bytes(&self) -> Vec<u8> {
        rlp::encode_list(&[
            rlp::encode_bytes(&self.leaf),
            encode_branch(&self.branch),
            rlp::encode_u64(self.gindex),
        ])
    }

    pub fn from_rlp_bytes(bytes: &[u8]) -> Result<Self, String> {
        let items = rlp::decode_list(bytes)?;
        if items.len() != 3 {
            return Err(format!("SSZ proof: expected 3 items, got {}", items.len()));
        }
        Ok(Self {
            leaf: rlp::decode_fixed(&items[0], "proof leaf")?,
            branch: decode_branch(&items[1])?,
            gindex: rlp::decode_u64(&items[2])?,
        })
    }
}

/// Proof that a referenced block is consistent with the verifier's
/// trusted finalized state, directly or through a historical summary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockProof {
    /// The beacon header of the block being proven.
    pub header: BeaconBlockHeader,
    /// Inclusion proof anchored at the trusted finalized state root.
    pub proof: SszProof,
    /// Second hop chaining a block older than the retention window to
    /// an intermediate root proven by `proof`.
    pub historical_proof: Option<SszProof>,
}

impl BlockProof {
    pub fn to_rlp_bytes(&self) -> Vec<u8> {
        rlp::encode_list(&[
            self.header.to_rlp_bytes(),
            self.proof.to_rlp_bytes(),
            match &self.historical_proof {
                Some(proof) => proof.to_rlp_bytes(),
                None => rlp::encode_list(&[]),
            },
        ])
    }

    pub fn from_rlp_bytes(bytes: &[u8]) -> Result<Self, String> {
        let items = rlp::decode_list(bytes)?;
        if items.len() != 3 {
            return Err(format!(
                "Block proof: expected 3 items, got {}",
                items.len()
            ));
        }
        let historical_proof = if rlp::decode_list(&items[2])?.is_empty() {
            None
        } else {
            Some(SszProof::from_rlp_bytes(&items[2])?)
        };
        Ok(Self {
            header: BeaconBlockHeader::from_rlp_bytes(&items[0])?,
            proof: SszProof::from_rlp_bytes(&items[1])?,
            historical_proof,
        })
    }
}

/// One transaction receipt's inclusion proof in the receipts trie.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReceiptProof {
    /// Trie key (the RLP-encoded transaction index).
    pub key: Vec<u8>,
    /// RLP-encoded trie nodes forming the proof path.
    pub proofs: Vec<Vec<u8>>,
}

impl ReceiptProof {
    pub fn to_rlp_bytes(&self) -> Vec<u8> {
        let nodes: Vec<Vec<u8>> = self.proofs.iter().map(|n| rlp::encode_bytes(n)).collect();
        rlp::encode_list(&[rlp::encode_bytes(&self.key), rlp::encode_list(&nodes)])
    }

    pub fn from_rlp_bytes(bytes: &[u8]) -> Result<Self, String> {
        let items = rlp::decode_list(bytes)?;
        if items.len() != 2 {
            return Err(format!(
                "Receipt proof: expected 2 items, got {}",
                items.len()
            ));
        }
        Ok(Self {
            key: items[0].clone(),
            proofs: rlp::decode_list(&items[1])?,
        })
    }
}

/// Proof that specific receipts, and the events inside them, belong
/// to a block already established by a preceding [`BlockProof`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageProof {
    /// Proof of the receipts root under the proven block's state root.
    pub receipts_root_proof: SszProof,
    /// Per-receipt trie inclusion proofs, in transaction order.
    pub receipt_proofs: Vec<ReceiptProof>,
}

impl MessageProof {
    pub fn to_rlp_bytes(&self) -> Vec<u8> {
        let proofs: Vec<Vec<u8>> = self
            .receipt_proofs
            .iter()
            .map(|p| p.to_rlp_bytes())
            .collect();
        rlp::encode_list(&[
            self.receipts_root_proof.to_rlp_bytes(),
            rlp::encode_list(&proofs),
        ])
    }

    pub fn from_rlp_bytes(bytes: &[u8]) -> Result<Self, String> {
        let items = rlp::decode_list(bytes)?;
        if items.len() != 2 {
            return Err(format!(
                "Message proof: expected 2 items, got {}",
                items.len()
            ));
        }
        let receipt_proofs = rlp::decode_list(&items[1])?
            .iter()
            .map(|p| ReceiptProof::from_rlp_bytes(p))
            .collect::<Result<Vec<_>, String>>()?;
        Ok(Self {
            receipts_root_proof: SszProof::from_rlp_bytes(&items[0])?,
            receipt_proofs,
        })
    }
}

/// One typed sub-message of a relay submission.
#[derive(Clone, Debug)]
pub enum TypedMessage {
    BlockUpdate(Box<BlockUpdate>),
    BlockProof(BlockProof),
    MessageProof(MessageProof),
}

impl TypedMessage {
    pub fn to_rlp_bytes(&self) -> Vec<u8> {
        let (tag, payload) = match self {
            TypedMessage::BlockUpdate(update) => (RELAY_TYPE_BLOCK_UPDATE, update.to_rlp_bytes()),
            TypedMessage::BlockProof(proof) => (RELAY_TYPE_BLOCK_PROOF, proof.to_rlp_bytes()),
            TypedMessage::MessageProof(proof) => (RELAY_TYPE_MESSAGE_PROOF, proof.to_rlp_bytes()),
        };
        rlp::encode_list(&[rlp::encode_u64(tag), rlp::encode_bytes(&payload)])
    }

    pub fn from_rlp_bytes(bytes: &[u8]) -> Result<Self, String> {
        let items = rlp::decode_list(bytes)?;
        if items.len() != 2 {
            return Err(format!(
                "Typed message: expected 2 items, got {}",
                items.len()
            ));
        }
        let tag = rlp::decode_u64(&items[0])?;
        match tag {
            RELAY_TYPE_BLOCK_UPDATE => Ok(TypedMessage::BlockUpdate(Box::new(
                BlockUpdate::from_rlp_bytes(&items[1])?,
            ))),
            RELAY_TYPE_BLOCK_PROOF => {
                Ok(TypedMessage::BlockProof(BlockProof::from_rlp_bytes(&items[1])?))
            }
            RELAY_TYPE_MESSAGE_PROOF => Ok(TypedMessage::MessageProof(
                MessageProof::from_rlp_bytes(&items[1])?,
            )),
            other => Err(format!("Unknown relay message type {}", other)),
        }
    }
}

/// An ordered relay submission. Decoding order is authoritative: a
/// message proof applies to the nearest preceding block proof.
#[derive(Clone, Debug)]
pub struct RelayMessage {
    pub messages: Vec<TypedMessage>,
}

impl RelayMessage {
    pub fn to_rlp_bytes(&self) -> Vec<u8> {
        let messages: Vec<Vec<u8>> = self.messages.iter().map(|m| m.to_rlp_bytes()).collect();
        rlp::encode_list(&[rlp::encode_list(&messages)])
    }

    pub fn from_rlp_bytes(bytes: &[u8]) -> Result<Self, String> {
        let items = rlp::decode_list(bytes)?;
        if items.len() != 1 {
            return Err(format!(
                "Relay message: expected 1 item, got {}",
                items.len()
            ));
        }
        let messages = rlp::decode_list(&items[0])?
            .iter()
            .map(|m| TypedMessage::from_rlp_bytes(m))
            .collect::<Result<Vec<_>, String>>()?;
        Ok(Self { messages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_proof() -> SszProof {
        SszProof {
            leaf: [0x01; 32],
            branch: vec![[0x02; 32], [0x03; 32]],
            gindex: 6,
        }
    }

    #[test]
    fn test_block_proof_round_trip() {
        let proof = BlockProof {
            header: BeaconBlockHeader {
                slot: 77,
                ..Default::default()
            },
            proof: sample_proof(),
            historical_proof: None,
        };
        let decoded = BlockProof::from_rlp_bytes(&proof.to_rlp_bytes()).unwrap();
        assert_eq!(decoded.header.slot, 77);
        assert_eq!(decoded.proof, proof.proof);
        assert!(decoded.historical_proof.is_none());

        let with_history = BlockProof {
            historical_proof: Some(sample_proof()),
            ..proof
        };
        let decoded = BlockProof::from_rlp_bytes(&with_history.to_rlp_bytes()).unwrap();
        assert!(decoded.historical_proof.is_some());
    }

    #[test]
    fn test_relay_message_order_preserved() {
        let relay = RelayMessage {
            messages: vec![
                TypedMessage::BlockProof(BlockProof {
                    header: BeaconBlockHeader::default(),
                    proof: sample_proof(),
                    historical_proof: None,
                }),
                TypedMessage::MessageProof(MessageProof {
                    receipts_root_proof: sample_proof(),
                    receipt_proofs: vec![ReceiptProof {
                        key: vec![0x80],
                        proofs: vec![vec![0xC0]],
                    }],
                }),
            ],
        };
        let decoded = RelayMessage::from_rlp_bytes(&relay.to_rlp_bytes()).unwrap();
        assert_eq!(decoded.messages.len(), 2);
        assert!(matches!(decoded.messages[0], TypedMessage::BlockProof(_)));
        assert!(matches!(decoded.messages[1], TypedMessage::MessageProof(_)));
    }

    #[test]
    fn test_unknown_relay_tag_rejected() {
        let bogus = rlp::encode_list(&[rlp::encode_u64(9), rlp::encode_bytes(&[0xC0])]);
        let wire = rlp::encode_list(&[rlp::encode_list(&[bogus])]);
        assert!(RelayMessage::from_rlp_bytes(&wire).is_err());
    }
}
