//! Shared test helpers.
//!
//! - `prover`: Simulated prover and verifier standing in for the circuit
//! - `setup`: Ledger construction and deposit helpers

#![allow(dead_code)]

pub mod prover;
pub mod setup;

pub use prover::*;
pub use setup::*;
