use crate::ssz::{hash_tree_root_header, sha256};
use crate::types::beacon::*;
use thiserror::Error;

/// Errors raised by the block-update consensus rules.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("Insufficient sync committee participation: {participants}/512 (need at least {required})")]
    InsufficientParticipation {
        participants: usize,
        required: usize,
    },

    #[error("Invalid signature: the aggregate does not verify against the participating committee members")]
    InvalidSignature,

    #[error("Invalid BLS public key at index {index}: {reason}")]
    InvalidPublicKey { index: usize, reason: String },

    #[error("Signature slot {signature_slot} must be after attested slot {attested_slot}")]
    InvalidSlotOrder {
        signature_slot: u64,
        attested_slot: u64,
    },

    #[error("Attested slot {attested_slot} must not precede finalized slot {finalized_slot}")]
    InvalidFinalityOrder {
        attested_slot: u64,
        finalized_slot: u64,
    },

    #[error("Invalid finality branch: finalized header is not committed to by the attested state")]
    InvalidFinalityBranch,

    #[error("Invalid next sync committee branch: candidate committee is not committed to by the attested state")]
    InvalidNextCommitteeBranch,

    #[error("Sync committee bits length mismatch: expected 64 bytes, got {got}")]
    InvalidBitsLength { got: usize },

    #[error("Sync committee size mismatch: expected 512 members, got {got}")]
    InvalidCommitteeSize { got: usize },

    #[error("Signature period outside the verifiable window of finalized slot {slot}")]
    NotVerifiable { slot: u64 },

    #[error("Invalid update period: finalized period {finalized_period} cannot seed rotation at period {bmv_period}")]
    InvalidRotationPeriod {
        finalized_period: u64,
        bmv_period: u64,
    },

    #[error("BLS aggregation error: {0}")]
    Bls(String),
}

/// Compute the signing root for a beacon block header.
/// This is what the sync committee actually signs — not the header
/// directly, but the hash_tree_root(header) wrapped in a signing domain.
pub fn compute_signing_root(header: &BeaconBlockHeader, domain: &[u8; 32]) -> [u8; 32] {
    let header_root = hash_tree_root_header(header);
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(&header_root);
    data[32..].copy_from_slice(domain);
    sha256(&data)
}

/// Compute the domain for sync committee signing.
/// domain = domain_type + fork_data_root[:28]
pub fn compute_domain(
    domain_type: &[u8; 4],
    fork_version: &[u8; 4],
    genesis_validators_hash: &[u8; 32],
) -> [u8; 32] {
    let fork_data_root = compute_fork_data_root(fork_version, genesis_validators_hash);
    let mut domain = [0u8; 32];
    domain[..4].copy_from_slice(domain_type);
    domain[4..].copy_from_slice(&fork_data_root[..28]);
    domain
}

/// Compute the fork data root from fork version and genesis validators hash.
fn compute_fork_data_root(fork_version: &[u8; 4], genesis_validators_hash: &[u8; 32]) -> [u8; 32] {
    let mut data = [0u8; 64];
    // SSZ encode: fork_version padded to 32 bytes, then the genesis hash
    data[..4].copy_from_slice(fork_version);
    data[32..].copy_from_slice(genesis_validators_hash);
    sha256(&data)
}

/// Verify the update's aggregate signature against the given committee.
/// This is the core trust anchor — if this passes, the attested header
/// carries the weight of the committee.
///
/// Requires >= 2/3 of the 512 committee members to have signed.
/// Uses BLS signature aggregation — one aggregate verification, not 512
/// individual ones.
pub fn verify_sync_aggregate(
    update: &BlockUpdate,
    committee: &SyncCommittee,
    genesis_validators_hash: &[u8; 32],
) -> Result<(), ConsensusError> {
    if update.sync_aggregate.sync_committee_bits.len() != SYNC_COMMITTEE_SIZE / 8 {
        return Err(ConsensusError::InvalidBitsLength {
            got: update.sync_aggregate.sync_committee_bits.len(),
        });
    }

    if committee.pubkeys.len() != SYNC_COMMITTEE_SIZE {
        return Err(ConsensusError::InvalidCommitteeSize {
            got: committee.pubkeys.len(),
        });
    }

    // Check participation threshold — need at least 2/3 of committee
    let num_participants = update.sync_aggregate.num_participants();
    if num_participants < MIN_SYNC_COMMITTEE_PARTICIPANTS {
        return Err(ConsensusError::InsufficientParticipation {
            participants: num_participants,
            required: MIN_SYNC_COMMITTEE_PARTICIPANTS,
        });
    }

    let domain = compute_domain(
        &DOMAIN_SYNC_COMMITTEE,
        &SYNC_COMMITTEE_FORK_VERSION,
        genesis_validators_hash,
    );
    let signing_root = compute_signing_root(&update.attested_header, &domain);

    let participant_pubkeys: Vec<&BlsPublicKey> = update
        .sync_aggregate
        .participant_indices()
        .iter()
        .map(|&i| &committee.pubkeys[i])
        .collect();

    verify_aggregate_bls_signature(
        &participant_pubkeys,
        &signing_root,
        &update.sync_aggregate.sync_committee_signature,
    )
}

/// Verify an aggregate BLS12-381 signature.
/// Uses the blst library for actual cryptographic verification.
fn verify_aggregate_bls_signature(
    pubkeys: &[&BlsPublicKey],
    message: &[u8; 32],
    signature: &BlsSignature,
) -> Result<(), ConsensusError> {
    use blst::min_pk::{AggregatePublicKey, PublicKey, Signature};
    use blst::BLST_ERROR;

    if pubkeys.is_empty() {
        return Err(ConsensusError::InsufficientParticipation {
            participants: 0,
            required: MIN_SYNC_COMMITTEE_PARTICIPANTS,
        });
    }

    let sig = Signature::from_bytes(&signature.0)
        .map_err(|e| ConsensusError::Bls(format!("Failed to deserialize signature: {:?}", e)))?;

    let pks: Vec<PublicKey> = pubkeys
        .iter()
        .enumerate()
        .map(|(i, pk)| {
            PublicKey::from_bytes(&pk.0).map_err(|e| ConsensusError::InvalidPublicKey {
                index: i,
                reason: format!("{:?}", e),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let pk_refs: Vec<&PublicKey> = pks.iter().collect();
    let agg_pk = AggregatePublicKey::aggregate(&pk_refs, false)
        .map_err(|e| ConsensusError::Bls(format!("Failed to aggregate public keys: {:?}", e)))?;
    let agg_pk_final = agg_pk.to_public_key();

    // DST (domain separation tag) for Ethereum BLS signatures
    let dst = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

    let result = sig.verify(false, message, dst, &[], &agg_pk_final, false);
    if result != BLST_ERROR::BLST_SUCCESS {
        return Err(ConsensusError::InvalidSignature);
    }

    Ok(())
}
