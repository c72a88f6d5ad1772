use bmv_core::{ConsensusError, MessageError, TrieError};
use thiserror::Error;

/// Verifier failure. Every variant aborts the whole relay submission;
/// nothing is committed.
///
/// `NotVerifiable` is not a rejection of the proof itself: it tells
/// the relayer the signature period is outside what the stored
/// committees can check, and an intermediate block update must be
/// submitted first.
#[derive(Debug, Error)]
pub enum BmvError {
    #[error("Verification failed: {reason}")]
    Verification { reason: String },

    #[error("Not verifiable yet at finalized slot {slot}: supply an intermediate block update")]
    NotVerifiable { slot: u64 },
}

impl BmvError {
    pub fn verification(reason: impl Into<String>) -> Self {
        BmvError::Verification {
            reason: reason.into(),
        }
    }
}

impl From<ConsensusError> for BmvError {
    fn from(err: ConsensusError) -> Self {
        match err {
            ConsensusError::NotVerifiable { slot } => BmvError::NotVerifiable { slot },
            other => BmvError::verification(other.to_string()),
        }
    }
}

impl From<TrieError> for BmvError {
    fn from(err: TrieError) -> Self {
        BmvError::verification(err.to_string())
    }
}

impl From<MessageError> for BmvError {
    fn from(err: MessageError) -> Self {
        BmvError::verification(err.to_string())
    }
}
