//! The ledger: one owner for state, event log, verifier and custody layer.

use blender_custody_interface::AssetCustody;
use tracing::warn;

use crate::{
    config::LedgerConfig,
    errors::{LedgerError, LedgerResult},
    events::{LedgerEvent, SpentEvent},
    field::FieldElement,
    hasher::Poseidon,
    instructions::{DepositRequest, ExecutionContext, SpendRequest, process_deposit, process_spend},
    merkle_tree::{AuthenticationPath, MerkleTree},
    public_signals::PUBLIC_SIGNALS_VERSION,
    state::LedgerState,
    verifier::ProofVerifier,
};

/// Proof-gated commitment/nullifier ledger.
///
/// Every transition takes `&mut self`, so at most one runs at a time; see
/// [`LedgerSequencer`](crate::sequencer::LedgerSequencer) for sharing a
/// ledger across threads. A transition that returns an error has left the
/// state, the event log and the custody layer untouched.
#[derive(Debug)]
pub struct Ledger<V, C> {
    config: LedgerConfig,
    state: LedgerState,
    events: Vec<LedgerEvent>,
    verifier: V,
    custody: C,
}

impl<V: ProofVerifier, C: AssetCustody> Ledger<V, C> {
    /// Empty ledger.
    ///
    /// # Errors
    /// - `InvalidConfig` if `config` is out of range
    /// - `SchemaVersionMismatch` if the verifier expects another signal layout
    pub fn new(config: LedgerConfig, verifier: V, custody: C) -> LedgerResult<Self> {
        check_schema(&verifier)?;
        let state = LedgerState::genesis(&config)?;
        Ok(Self {
            config,
            state,
            events: Vec::new(),
            verifier,
            custody,
        })
    }

    /// Ledger restored from its event log.
    ///
    /// `custody` must already hold the assets the log says are in custody.
    ///
    /// # Errors
    /// As [`Ledger::new`], plus `ReplayMismatch` if the log is inconsistent.
    pub fn from_events(
        config: LedgerConfig,
        verifier: V,
        custody: C,
        events: Vec<LedgerEvent>,
    ) -> LedgerResult<Self> {
        check_schema(&verifier)?;
        let state = LedgerState::replay(&config, &events)?;
        Ok(Self {
            config,
            state,
            events,
            verifier,
            custody,
        })
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Deposit one unit of an asset under `request.commitment`.
    ///
    /// Returns the leaf index of the commitment.
    ///
    /// # Errors
    /// See [`process_deposit`].
    pub fn deposit(&mut self, ctx: &ExecutionContext, request: &DepositRequest) -> LedgerResult<u64> {
        let event = process_deposit(&mut self.state, &mut self.custody, ctx, request)
            .inspect_err(|e| warn!(error = e.name(), "deposit rejected"))?;
        let leaf_index = event.leaf_index;
        self.events.push(event.into());
        Ok(leaf_index)
    }

    /// Run a transfer or withdrawal.
    ///
    /// # Errors
    /// See [`process_spend`].
    pub fn spend(&mut self, ctx: &ExecutionContext, request: &SpendRequest) -> LedgerResult<SpentEvent> {
        let event = process_spend(
            &mut self.state,
            &mut self.custody,
            &self.verifier,
            ctx,
            request,
        )
        .inspect_err(|e| warn!(error = e.name(), "spend rejected"))?;
        self.events.push(event.into());
        Ok(event)
    }

    /// Blind transfer. Returns the leaf index of the new commitment.
    ///
    /// # Errors
    /// `InvalidPublicSignals` if `request` is a withdrawal, otherwise as
    /// [`Ledger::spend`].
    pub fn transfer(&mut self, ctx: &ExecutionContext, request: &SpendRequest) -> LedgerResult<u64> {
        if request.is_withdraw {
            return Err(LedgerError::InvalidPublicSignals);
        }
        let event = self.spend(ctx, request)?;
        Ok(event.new_leaf_index)
    }

    /// Withdrawal. Returns the spend sequence number of the nullifier.
    ///
    /// # Errors
    /// `InvalidPublicSignals` if `request` is a transfer, otherwise as
    /// [`Ledger::spend`].
    pub fn withdraw(&mut self, ctx: &ExecutionContext, request: &SpendRequest) -> LedgerResult<u64> {
        if !request.is_withdraw {
            return Err(LedgerError::InvalidPublicSignals);
        }
        let event = self.spend(ctx, request)?;
        Ok(event.spend_index)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current tree root.
    pub fn current_root(&self) -> FieldElement {
        self.state.tree.root()
    }

    /// Whether a proof against `root` would pass the root check.
    pub fn is_known_root(&self, root: &FieldElement) -> bool {
        MerkleTree::is_known_root(&self.state.tree, root)
    }

    /// Whether `nullifier_hash` has been retired.
    pub fn is_spent(&self, nullifier_hash: &FieldElement) -> bool {
        self.state.nullifiers.is_spent(nullifier_hash)
    }

    /// Leaf index of `commitment`.
    pub fn leaf_index(&self, commitment: &FieldElement) -> Option<u64> {
        self.state.tree.leaf_index(commitment)
    }

    /// Authentication path for `index` against the current root.
    ///
    /// # Errors
    /// Returns `LeafIndexOutOfRange` if no leaf sits at `index`.
    pub fn auth_path(&self, index: u64) -> LedgerResult<AuthenticationPath> {
        MerkleTree::auth_path::<Poseidon>(&self.state.tree, index)
    }

    /// Authentication path for `index` against the root at `leaf_count` leaves.
    ///
    /// # Errors
    /// Returns `LeafIndexOutOfRange` unless `index < leaf_count <= next_index`.
    pub fn auth_path_at(&self, index: u64, leaf_count: u64) -> LedgerResult<AuthenticationPath> {
        MerkleTree::auth_path_at::<Poseidon>(&self.state.tree, index, leaf_count)
    }

    /// Root the tree had when it held `leaf_count` leaves.
    ///
    /// # Errors
    /// Returns `LeafIndexOutOfRange` if `leaf_count` exceeds the leaf count.
    pub fn root_at(&self, leaf_count: u64) -> LedgerResult<FieldElement> {
        MerkleTree::root_at::<Poseidon>(&self.state.tree, leaf_count)
    }

    /// Every event accepted so far, in order.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Ledger state.
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// Ledger configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The proof verifier.
    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// The custody layer.
    pub fn custody(&self) -> &C {
        &self.custody
    }

    /// Mutable access to the custody layer, for driving it from outside.
    pub fn custody_mut(&mut self) -> &mut C {
        &mut self.custody
    }
}

fn check_schema<V: ProofVerifier>(verifier: &V) -> LedgerResult<()> {
    let version = verifier.schema_version();
    if version != PUBLIC_SIGNALS_VERSION {
        warn!(
            verifier = version,
            ledger = PUBLIC_SIGNALS_VERSION,
            "ledger: verifier schema mismatch"
        );
        return Err(LedgerError::SchemaVersionMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::public_signals::PublicSignals;
    use blender_custody_interface::{AssetRef, InMemoryVault};

    struct RejectAll(u16);

    impl ProofVerifier for RejectAll {
        fn schema_version(&self) -> u16 {
            self.0
        }

        fn verify(&self, _proof: &[u8], _public_signals: &PublicSignals) -> bool {
            false
        }
    }

    fn config() -> LedgerConfig {
        LedgerConfig::default().with_tree_height(5)
    }

    #[test]
    fn test_schema_version_checked() {
        let result = Ledger::new(config(), RejectAll(2), InMemoryVault::new());
        assert!(matches!(result, Err(LedgerError::SchemaVersionMismatch)));
        assert!(Ledger::new(config(), RejectAll(1), InMemoryVault::new()).is_ok());
    }

    #[test]
    fn test_deposit_records_event() {
        let mut ledger = Ledger::new(config(), RejectAll(1), InMemoryVault::new()).unwrap();
        let initial_root = ledger.current_root();
        let asset = AssetRef::from_u64_id([1; 20], 1);
        let request = DepositRequest::new(FieldElement::from_u64(3), asset, true);

        let index = ledger.deposit(&ExecutionContext::default(), &request).unwrap();
        assert_eq!(index, 0);
        assert_eq!(ledger.events().len(), 1);
        assert_eq!(ledger.events()[0].root_after(), ledger.current_root());
        assert!(ledger.is_known_root(&initial_root));
        assert_eq!(ledger.leaf_index(&FieldElement::from_u64(3)), Some(0));
        assert_eq!(ledger.custody().held_units(&asset), 1);
    }

    #[test]
    fn test_failed_transition_appends_no_event() {
        let mut ledger = Ledger::new(config(), RejectAll(1), InMemoryVault::new()).unwrap();
        let request = DepositRequest {
            lock_value: 0,
            ..DepositRequest::new(FieldElement::from_u64(3), AssetRef::default(), false)
        };
        assert_eq!(
            ledger.deposit(&ExecutionContext::default(), &request),
            Err(LedgerError::InvalidLockValue)
        );
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_intent_must_match_entry_point() {
        let mut ledger = Ledger::new(config(), RejectAll(1), InMemoryVault::new()).unwrap();
        let withdraw = SpendRequest::withdraw(vec![], PublicSignals::default());
        assert_eq!(
            ledger.transfer(&ExecutionContext::default(), &withdraw),
            Err(LedgerError::InvalidPublicSignals)
        );
        let transfer =
            SpendRequest::transfer(vec![], PublicSignals::default(), FieldElement::from_u64(1));
        assert_eq!(
            ledger.withdraw(&ExecutionContext::default(), &transfer),
            Err(LedgerError::InvalidPublicSignals)
        );
    }
}
