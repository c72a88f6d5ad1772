use crate::consensus::sync_committee::{verify_sync_aggregate, ConsensusError};
use crate::ssz::{hash_tree_root_committee, hash_tree_root_header, verify_merkle_branch};
use crate::state::VerifierState;
use crate::types::beacon::{sync_committee_period, BlockUpdate};

/// Generalized index of the finalized checkpoint root in the beacon state.
const FINALIZED_ROOT_GINDEX: u64 = 105;
const FINALIZED_ROOT_DEPTH: usize = 6;

/// Generalized index of the next sync committee in the beacon state.
const NEXT_SYNC_COMMITTEE_GINDEX: u64 = 55;
const NEXT_SYNC_COMMITTEE_DEPTH: usize = 5;

/// Validate a block update against the verifier's trusted state.
///
/// Performs the complete consensus check:
/// 1. Temporal ordering: signature after attested, attested not before
///    finalized.
/// 2. Period window: the signature period must be one the stored
///    committees can vouch for; outside it the update is not wrong but
///    not yet verifiable.
/// 3. Finality branch: the finalized header is committed to by the
///    attested state.
/// 4. Candidate committee branch, when the update carries one.
/// 5. Aggregate signature by the committee responsible for the
///    signature period.
///
/// Read-only; a validated update is applied separately by
/// [`apply_block_update`].
pub fn validate_block_update(
    update: &BlockUpdate,
    state: &VerifierState,
) -> Result<(), ConsensusError> {
    let attested_slot = update.attested_header.slot;
    let finalized_slot = update.finalized_header.slot;

    if update.signature_slot <= attested_slot {
        return Err(ConsensusError::InvalidSlotOrder {
            signature_slot: update.signature_slot,
            attested_slot,
        });
    }
    if attested_slot < finalized_slot {
        return Err(ConsensusError::InvalidFinalityOrder {
            attested_slot,
            finalized_slot,
        });
    }

    let bmv_period = state.finalized_period();
    let signature_period = sync_committee_period(update.signature_slot);
    let is_bmv_period = signature_period == bmv_period;

    // With a next committee stored we can vouch for the following
    // period too; without one, only the current period is checkable.
    let verifiable = if state.next_sync_committee.is_some() {
        is_bmv_period || signature_period == bmv_period + 1
    } else {
        is_bmv_period
    };
    if !verifiable {
        return Err(ConsensusError::NotVerifiable {
            slot: state.finalized_header.slot,
        });
    }

    let finalized_root = hash_tree_root_header(&update.finalized_header);
    if !verify_merkle_branch(
        &finalized_root,
        &update.finality_branch,
        FINALIZED_ROOT_DEPTH,
        FINALIZED_ROOT_GINDEX,
        &update.attested_header.state_root,
    ) {
        return Err(ConsensusError::InvalidFinalityBranch);
    }

    if let Some(candidate) = &update.next_sync_committee {
        candidate
            .validate()
            .map_err(|_| ConsensusError::InvalidCommitteeSize {
                got: candidate.pubkeys.len(),
            })?;
        let candidate_root = hash_tree_root_committee(candidate);
        if !verify_merkle_branch(
            &candidate_root,
            &update.next_sync_committee_branch,
            NEXT_SYNC_COMMITTEE_DEPTH,
            NEXT_SYNC_COMMITTEE_GINDEX,
            &update.attested_header.state_root,
        ) {
            return Err(ConsensusError::InvalidNextCommitteeBranch);
        }
    }

    let committee = if is_bmv_period {
        &state.current_sync_committee
    } else {
        state
            .next_sync_committee
            .as_ref()
            .ok_or(ConsensusError::NotVerifiable {
                slot: state.finalized_header.slot,
            })?
    };

    verify_sync_aggregate(update, committee, &state.genesis_validators_hash)
}

/// Apply a validated block update to the verifier state.
///
/// Committee bookkeeping first: before any next committee is known the
/// update must belong to the stored finalized period and its candidate
/// seeds the rotation; afterwards a rotation happens exactly when the
/// update's finalized period advances by one. The finalized header
/// itself only ever moves forward.
pub fn apply_block_update(
    update: &BlockUpdate,
    state: &mut VerifierState,
) -> Result<(), ConsensusError> {
    let bmv_period = state.finalized_period();
    let finalized_period = update.finalized_header.period();

    if state.next_sync_committee.is_none() {
        if finalized_period != bmv_period {
            return Err(ConsensusError::InvalidRotationPeriod {
                finalized_period,
                bmv_period,
            });
        }
        state.next_sync_committee = update.next_sync_committee.clone();
    } else if finalized_period == bmv_period + 1 {
        if let Some(next) = state.next_sync_committee.take() {
            state.current_sync_committee = next;
        }
        state.next_sync_committee = update.next_sync_committee.clone();
    }

    if update.finalized_header.slot > state.finalized_header.slot {
        state.finalized_header = update.finalized_header.clone();
    }

    Ok(())
}
