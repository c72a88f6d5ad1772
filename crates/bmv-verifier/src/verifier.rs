use crate::btp::BtpAddress;
use crate::error::BmvError;
use crate::store::StateStore;
use bmv_core::{
    apply_block_update, decode_receipt, extract, rlp, ssz, validate_block_update, BeaconBlockHeader,
    BlockProof, BlockUpdate, MessageProof, RelayMessage, SyncCommittee, TypedMessage,
    VerifierState, SLOTS_PER_HISTORICAL_ROOT,
};
use bmv_core::execution::trie;
use tracing::debug;

/// Host-supplied identities for one external call.
#[derive(Clone, Debug)]
pub struct CallContext {
    /// Address of the contract invoking the verifier.
    pub caller: String,
    /// Address of the verifier's owner.
    pub owner: String,
}

/// Deployment-time configuration. Every field is optional so a
/// deployment can be configured incrementally; only supplied fields
/// are applied. Passing a config at all is the explicit signal to
/// materialize state; constructing the verifier alone never touches
/// the store.
#[derive(Clone, Debug, Default)]
pub struct InitConfig {
    /// Network identifier of the counterpart chain.
    pub src_network_id: Option<String>,
    /// Address of the bridge contract allowed to call this verifier.
    pub bmc: Option<String>,
    /// Genesis validators hash of the counterpart chain.
    pub genesis_validators_hash: Option<[u8; 32]>,
    /// Initial (current-period) sync committee.
    pub sync_committee: Option<SyncCommittee>,
    /// Initial trusted finalized header.
    pub finalized_header: Option<BeaconBlockHeader>,
    /// Initial message sequence number.
    pub sequence: Option<u64>,
}

/// Status snapshot returned to the bridge contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BmvStatus {
    /// Slot of the trusted finalized header.
    pub height: u64,
    /// RLP of `[last_msg_seq, last_msg_slot]`.
    pub extra: Vec<u8>,
}

/// The BTP message verifier.
///
/// Invoked synchronously by the bridge contract, one relay submission
/// at a time. State is loaded at call start, threaded through the
/// processors, and written back only when the whole submission
/// succeeded; a failed call commits nothing.
pub struct BtpMessageVerifier<S: StateStore> {
    store: S,
}

impl<S: StateStore> BtpMessageVerifier<S> {
    /// Wrap a store without touching it. Re-deploying over existing
    /// state is a no-op until [`initialize`](Self::initialize) is
    /// called.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Apply deployment configuration over the stored state, creating
    /// a zeroed record on first initialization.
    pub fn initialize(&mut self, config: InitConfig) -> Result<(), BmvError> {
        let mut state = match self.store.load()? {
            Some(record) => decode_state(&record)?,
            None => VerifierState::default(),
        };

        if let Some(net) = config.src_network_id {
            state.src_network_id = net;
        }
        if let Some(bmc) = config.bmc {
            state.bmc = bmc;
        }
        if let Some(hash) = config.genesis_validators_hash {
            state.genesis_validators_hash = hash;
        }
        if let Some(committee) = config.sync_committee {
            state.current_sync_committee = committee;
        }
        if let Some(header) = config.finalized_header {
            state.finalized_header = header;
        }
        if let Some(seq) = config.sequence {
            state.last_msg_seq = seq;
        }

        self.store.save(&state.to_rlp_bytes())?;
        Ok(())
    }

    /// Verify one relay submission and return the extracted bridge
    /// message payloads in encounter order.
    ///
    /// `bmc` is the current bridge address, `prev` the previous hop;
    /// both are BTP addresses. The expected-sequence argument is kept
    /// for call-surface compatibility; sequencing is enforced from the
    /// stored counter.
    pub fn handle_relay_message(
        &mut self,
        bmc: &str,
        prev: &str,
        _expected_seq: u64,
        msg: &[u8],
        ctx: &CallContext,
    ) -> Result<Vec<Vec<u8>>, BmvError> {
        debug!(bmc, prev, len = msg.len(), "handle relay message");
        let mut state = self.load_state()?;
        check_accessible(&state, bmc, prev, ctx)?;

        let relay = RelayMessage::from_rlp_bytes(msg)
            .map_err(|e| BmvError::verification(format!("invalid relay message: {}", e)))?;

        let mut block_proof: Option<BlockProof> = None;
        let mut payloads = Vec::new();
        for message in relay.messages {
            match message {
                TypedMessage::BlockUpdate(update) => {
                    process_block_update(&mut state, &update)?;
                }
                TypedMessage::BlockProof(proof) => {
                    process_block_proof(&state, &proof)?;
                    block_proof = Some(proof);
                }
                TypedMessage::MessageProof(proof) => {
                    let msgs = process_message_proof(&mut state, &proof, block_proof.as_ref())?;
                    payloads.extend(msgs);
                }
            }
        }

        self.store.save(&state.to_rlp_bytes())?;
        Ok(payloads)
    }

    /// Current verification height and sequencing position.
    pub fn status(&self) -> Result<BmvStatus, BmvError> {
        let state = self.load_state()?;
        Ok(BmvStatus {
            height: state.finalized_header.slot,
            extra: rlp::encode_list(&[
                rlp::encode_u64(state.last_msg_seq),
                rlp::encode_u64(state.last_msg_slot),
            ]),
        })
    }

    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Overwrite the stored message sequence. Owner only.
    pub fn set_sequence(&mut self, seq: u64, ctx: &CallContext) -> Result<(), BmvError> {
        if ctx.caller != ctx.owner {
            return Err(BmvError::verification("only owner can call this method"));
        }
        let mut state = self.load_state()?;
        state.last_msg_seq = seq;
        self.store.save(&state.to_rlp_bytes())?;
        Ok(())
    }

    fn load_state(&self) -> Result<VerifierState, BmvError> {
        match self.store.load()? {
            Some(record) => decode_state(&record),
            None => Err(BmvError::verification("bmv is not initialized")),
        }
    }
}

fn decode_state(record: &[u8]) -> Result<VerifierState, BmvError> {
    VerifierState::from_rlp_bytes(record)
        .map_err(|e| BmvError::verification(format!("corrupt verifier state: {}", e)))
}

/// The relay caller must be the registered bridge contract, the
/// previous hop must live on the configured counterpart network, and
/// the submission must be addressed to the registered bridge.
fn check_accessible(
    state: &VerifierState,
    bmc: &str,
    prev: &str,
    ctx: &CallContext,
) -> Result<(), BmvError> {
    let cur_addr: BtpAddress = bmc.parse()?;
    let prev_addr: BtpAddress = prev.parse()?;
    if prev_addr.net() != state.src_network_id {
        return Err(BmvError::verification("invalid prev bmc"));
    }
    if ctx.caller != state.bmc {
        return Err(BmvError::verification("invalid caller bmc"));
    }
    if cur_addr.account() != state.bmc {
        return Err(BmvError::verification("invalid current bmc"));
    }
    Ok(())
}

fn process_block_update(state: &mut VerifierState, update: &BlockUpdate) -> Result<(), BmvError> {
    debug!(
        signature_slot = update.signature_slot,
        attested_slot = update.attested_header.slot,
        finalized_slot = update.finalized_header.slot,
        "processing block update"
    );
    validate_block_update(update, state)?;
    apply_block_update(update, state)?;
    debug!(
        finalized_slot = state.finalized_header.slot,
        has_next_committee = state.next_sync_committee.is_some(),
        "block update applied"
    );
    Ok(())
}

/// Prove the referenced block consistent with the trusted finalized
/// state: directly when it is within the historical retention window,
/// through a chained historical summary proof when older.
///
/// No state is mutated; the proven block becomes transient context for
/// message proofs later in the same submission.
fn process_block_proof(state: &VerifierState, proof: &BlockProof) -> Result<(), BmvError> {
    let finalized_slot = state.finalized_header.slot;
    let block_slot = proof.header.slot;
    debug!(
        block_slot,
        finalized_slot,
        state_root = %hex::encode(state.finalized_header.state_root),
        "processing block proof"
    );

    if finalized_slot < block_slot {
        return Err(BmvError::verification(format!(
            "block proof slot {} exceeds finalized slot {}",
            block_slot, finalized_slot
        )));
    }

    let block_root = ssz::hash_tree_root_header(&proof.header);
    let state_root = state.finalized_header.state_root;

    if block_slot + SLOTS_PER_HISTORICAL_ROOT < finalized_slot {
        // Too old for the state's direct root vector: chain through a
        // historical summary. The block must be the historical leaf,
        // the summary must hang off the trusted state root.
        let historical = proof
            .historical_proof
            .as_ref()
            .ok_or_else(|| BmvError::verification("historical proof empty"))?;
        if historical.leaf != block_root {
            return Err(BmvError::verification("invalid hash tree of block proof"));
        }
        if !ssz::verify_proof(&state_root, &proof.proof) {
            return Err(BmvError::verification("invalid block proof"));
        }
        if !ssz::verify_proof(&proof.proof.leaf, historical) {
            return Err(BmvError::verification("invalid historical proof"));
        }
    } else {
        if proof.proof.leaf != block_root {
            return Err(BmvError::verification("invalid hash tree of block proof"));
        }
        if !ssz::verify_proof(&state_root, &proof.proof) {
            return Err(BmvError::verification("invalid block proof"));
        }
    }

    Ok(())
}

/// Extract bridge messages out of receipts proven against the block
/// established by the nearest preceding block proof.
fn process_message_proof(
    state: &mut VerifierState,
    proof: &MessageProof,
    block_proof: Option<&BlockProof>,
) -> Result<Vec<Vec<u8>>, BmvError> {
    let block_proof = block_proof
        .ok_or_else(|| BmvError::verification("message proof without preceding block proof"))?;
    let state_root = block_proof.header.state_root;

    if !ssz::verify_proof(&state_root, &proof.receipts_root_proof) {
        return Err(BmvError::verification("invalid receipts root proof"));
    }
    let receipts_root = proof.receipts_root_proof.leaf;
    debug!(
        receipts_root = %hex::encode(receipts_root),
        proofs = proof.receipt_proofs.len(),
        "receipts root proven"
    );

    let mut receipts = Vec::with_capacity(proof.receipt_proofs.len());
    for receipt_proof in &proof.receipt_proofs {
        let value = trie::prove(&receipts_root, &receipt_proof.key, &receipt_proof.proofs)?;
        let receipt = decode_receipt(&value)
            .map_err(|e| BmvError::verification(format!("invalid receipt: {}", e)))?;
        receipts.push(receipt);
    }

    let (payloads, end_seq) = extract(&receipts, state.last_msg_seq)?;
    debug!(
        receipts = receipts.len(),
        messages = payloads.len(),
        end_seq,
        "message proof processed"
    );

    if !payloads.is_empty() {
        state.last_msg_seq = end_seq;
        state.last_msg_slot = block_proof.header.slot;
    }

    Ok(payloads)
}
