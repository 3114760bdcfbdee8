//! Ledger state: commitment tree, nullifier registry and custody book.

mod commitment_tree;
mod custody_book;
mod nullifier_registry;

pub use commitment_tree::*;
pub use custody_book::*;
pub use nullifier_registry::*;

use crate::{
    config::LedgerConfig,
    errors::LedgerResult,
    hasher::Poseidon,
    merkle_tree::MerkleTree,
};

/// Everything the ledger persists.
///
/// All of it is reconstructible from the event log, see
/// [`LedgerState::replay`](crate::replay).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerState {
    /// Append-only tree of commitments
    pub tree: CommitmentMerkleTree,
    /// Retired nullifier hashes
    pub nullifiers: NullifierRegistry,
    /// Assets held in custody
    pub custody: CustodyBook,
}

impl LedgerState {
    /// Empty state for `config`.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the configuration is out of range.
    pub fn genesis(config: &LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;
        let mut tree =
            CommitmentMerkleTree::allocate(config.tree_height, config.root_history_window);
        MerkleTree::initialize::<Poseidon>(&mut tree, &config.zero_value)?;
        Ok(Self {
            tree,
            nullifiers: NullifierRegistry::new(),
            custody: CustodyBook::new(),
        })
    }
}
