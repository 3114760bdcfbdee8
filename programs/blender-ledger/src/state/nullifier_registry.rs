use std::collections::BTreeMap;

use tracing::warn;

use crate::{
    errors::{LedgerError, LedgerResult},
    field::FieldElement,
};

/// Set of retired nullifier hashes.
///
/// Each entry maps a nullifier hash to its spend sequence number (0 for the
/// first spend the ledger ever accepted, 1 for the next, ...). Entries are
/// never removed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NullifierRegistry {
    spent: BTreeMap<FieldElement, u64>,
}

impl NullifierRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `nullifier_hash` has been retired.
    pub fn is_spent(&self, nullifier_hash: &FieldElement) -> bool {
        self.spent.contains_key(nullifier_hash)
    }

    /// Retire `nullifier_hash` and return its spend sequence number.
    ///
    /// # Errors
    /// Returns `NullifierAlreadySpent` if it was retired before; the registry
    /// is left unchanged.
    pub fn mark_spent(&mut self, nullifier_hash: &FieldElement) -> LedgerResult<u64> {
        if self.is_spent(nullifier_hash) {
            warn!("nullifier already spent");
            return Err(LedgerError::NullifierAlreadySpent);
        }
        let sequence = self.spent.len() as u64;
        self.spent.insert(*nullifier_hash, sequence);
        Ok(sequence)
    }

    /// Spend sequence number of `nullifier_hash`, if retired.
    pub fn spend_index(&self, nullifier_hash: &FieldElement) -> Option<u64> {
        self.spent.get(nullifier_hash).copied()
    }

    /// Number of retired nullifiers.
    pub fn len(&self) -> usize {
        self.spent.len()
    }

    /// Whether nothing has been spent yet.
    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }

    /// Retired nullifier hashes with their sequence numbers, in hash order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldElement, &u64)> {
        self.spent.iter()
    }
}
