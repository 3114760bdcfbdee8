//! Blender Ledger
//!
//! Proof-gated commitment/nullifier ledger for anonymous custody of
//! indivisible assets. A depositor locks an asset and appends a commitment
//! to a note only they know; the note can later be blindly re-committed
//! (transfer) or redeemed to any recipient (withdraw) by proving knowledge of
//! it against a recent tree root, without linking the spend to the deposit.
//!
//! # Architecture
//!
//! ```text
//!   client::prepare_deposit          client::prepare_spend
//!            │                                │  (path, signals)
//!            ▼                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Ledger                                                        │
//! │  ├── instructions::process_deposit                            │
//! │  ├── instructions::process_spend ──► ProofVerifier (external) │
//! │  ├── LedgerState                                              │
//! │  │     ├── CommitmentMerkleTree + root history                │
//! │  │     ├── NullifierRegistry                                  │
//! │  │     └── CustodyBook                                        │
//! │  └── event log (Deposited / Spent)                            │
//! └──────────────────────────────────────────────────────────────┘
//!            │ lock / release
//!            ▼
//!   AssetCustody (blender-custody-interface)
//! ```
//!
//! The event log is the persistence format; [`LedgerState::replay`] rebuilds
//! the state from it.

pub mod client;
pub mod compliance;
pub mod config;
pub mod errors;
pub mod events;
pub mod field;
pub mod groth16;
pub mod hasher;
pub mod instructions;
pub mod ledger;
pub mod merkle_tree;
pub mod note;
pub mod public_signals;
pub mod replay;
pub mod sequencer;
pub mod state;
pub mod verifier;

pub use config::LedgerConfig;
pub use errors::{LedgerError, LedgerResult};
pub use field::FieldElement;
pub use ledger::Ledger;
pub use note::{Note, NoteString};
pub use public_signals::PublicSignals;
pub use sequencer::LedgerSequencer;
pub use state::*;
pub use verifier::{Groth16ProofVerifier, ProofVerifier};
