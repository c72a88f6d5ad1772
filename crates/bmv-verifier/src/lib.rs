//! # BMV Verifier
//!
//! The host-facing half of the beacon-chain BTP message verifier: the
//! bridge contract hands it relay submissions as opaque bytes, and it
//! returns the verified bridge message payloads.
//!
//! All cryptographic verification lives in `bmv-core`; this crate owns
//! what surrounds it: the persisted verifier state and its store seam,
//! BTP-address access control, relay message dispatch, and the
//! external call surface (`handle_relay_message`, `status`,
//! `version`, `set_sequence`, initialization).
//!
//! A relay submission is processed in arrival order: block updates
//! advance the trusted finalized header, a block proof establishes a
//! specific block as context, and message proofs extract sequenced
//! bridge events from that block's receipts. Any failure aborts the
//! whole submission; state is written back only on full success.

pub mod btp;
pub mod error;
pub mod store;
pub mod verifier;

pub use btp::BtpAddress;
pub use error::BmvError;
pub use store::{MemoryStore, StateStore, StoreError};
pub use verifier::{BmvStatus, BtpMessageVerifier, CallContext, InitConfig};
