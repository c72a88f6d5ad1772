//! # BMV Core
//!
//! Pure Rust verification logic for a beacon-chain BTP message
//! verifier.
//!
//! This crate contains **no host bindings** and **no persistence** —
//! it is the cryptographic heart of the verifier. Every relayed byte
//! passes through these functions before being trusted.
//!
//! ## Trust model
//!
//! - **Sync committee verification** (`consensus` module): verifies
//!   BLS12-381 aggregate signatures from the 512-member sync
//!   committee and applies finalized-header advancement under strict
//!   period-rotation rules. Trusts that 2/3+ of the committee is
//!   honest (the chain's own assumption).
//!
//! - **Proof verification** (`ssz` and `execution` modules): verifies
//!   fixed-depth hash-tree branches for beacon state and
//!   Merkle-Patricia trie proofs for transaction receipts. Zero trust
//!   assumptions beyond the verified roots.
//!
//! - **Message extraction** (`messages` module): recovers bridge
//!   events from verified receipts while enforcing gap-free message
//!   sequencing.

pub mod consensus;
pub mod execution;
pub mod messages;
pub mod rlp;
pub mod ssz;
pub mod state;
pub mod types;

// Re-export commonly used items for convenience
pub use consensus::{
    apply_block_update, validate_block_update, verify_sync_aggregate, ConsensusError,
};
pub use execution::{decode_receipt, keccak256, prove, TrieError};
pub use messages::{extract, message_event_topic, MessageError};
pub use state::VerifierState;
pub use types::{beacon::*, execution::*, proof::*};
