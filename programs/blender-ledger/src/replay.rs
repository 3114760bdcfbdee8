//! Rebuilding ledger state from the event log.
//!
//! The log is the only thing the ledger needs to persist. Replay re-runs the
//! state effects of every event without the proof or custody calls, and
//! checks each recorded leaf index, root and spend sequence number against
//! what the rebuilt state produces.

use blender_custody_interface::AssetKind;
use tracing::warn;

use crate::{
    config::LedgerConfig,
    errors::{LedgerError, LedgerResult},
    events::{DepositedEvent, LedgerEvent, SpentEvent},
    field::FieldElement,
    hasher::Poseidon,
    merkle_tree::MerkleTree,
    state::LedgerState,
};

impl LedgerState {
    /// State produced by applying `events` to genesis.
    ///
    /// # Errors
    /// - `InvalidConfig` if `config` is out of range
    /// - `ReplayMismatch` if any event cannot be applied or disagrees with
    ///   the rebuilt state
    pub fn replay(config: &LedgerConfig, events: &[LedgerEvent]) -> LedgerResult<Self> {
        let mut state = Self::genesis(config)?;
        for (position, event) in events.iter().enumerate() {
            let applied = match event {
                LedgerEvent::Deposited(e) => state.replay_deposited(e),
                LedgerEvent::Spent(e) => state.replay_spent(e),
            };
            applied.map_err(|e| {
                warn!(position, error = e.name(), "replay: event rejected");
                LedgerError::ReplayMismatch
            })?;
        }
        Ok(state)
    }

    fn replay_deposited(&mut self, event: &DepositedEvent) -> LedgerResult<()> {
        let kind = event_kind(event.asset_kind())?;
        if self.tree.contains(&event.commitment) {
            return Err(LedgerError::DuplicateCommitment);
        }
        self.custody.check_lock(&event.asset, kind)?;
        self.append_checked(&event.commitment, event.leaf_index, &event.root)?;
        self.custody.record_lock(event.asset, kind);
        Ok(())
    }

    fn replay_spent(&mut self, event: &SpentEvent) -> LedgerResult<()> {
        let kind = event_kind(event.asset_kind())?;
        self.custody.check_release(&event.asset, kind)?;
        if self.nullifiers.is_spent(&event.nullifier_hash) {
            return Err(LedgerError::NullifierAlreadySpent);
        }

        match event.new_leaf() {
            Some((new_leaf_index, new_commitment)) => {
                if self.tree.contains(&new_commitment) {
                    return Err(LedgerError::DuplicateCommitment);
                }
                self.append_checked(&new_commitment, new_leaf_index, &event.root)?;
            }
            None => {
                if self.tree.root() != event.root {
                    return Err(LedgerError::ReplayMismatch);
                }
                self.custody.record_release(&event.asset);
            }
        }

        let spend_index = self.nullifiers.mark_spent(&event.nullifier_hash)?;
        if spend_index != event.spend_index {
            return Err(LedgerError::ReplayMismatch);
        }
        Ok(())
    }

    /// Append `leaf` and require it to land at `expected_index` with
    /// `expected_root` as the resulting root.
    fn append_checked(
        &mut self,
        leaf: &FieldElement,
        expected_index: u64,
        expected_root: &FieldElement,
    ) -> LedgerResult<()> {
        let pending = MerkleTree::prepare_append::<Poseidon>(&self.tree, leaf)?;
        if pending.leaf_index() != expected_index || pending.new_root() != *expected_root {
            return Err(LedgerError::ReplayMismatch);
        }
        MerkleTree::apply_append(&mut self.tree, pending);
        Ok(())
    }
}

fn event_kind(kind: Option<AssetKind>) -> LedgerResult<AssetKind> {
    kind.ok_or(LedgerError::InvalidEventData)
}
