//! Shared access to one ledger from many threads.
//!
//! Mutations are linearized behind a write lock: a transfer or withdrawal
//! holds it from signal validation to the appended event, so two racing
//! spends of one nullifier see each other's effect and exactly one succeeds.
//! Root and path queries take the read lock and run in parallel.

use blender_custody_interface::AssetCustody;
use parking_lot::{RwLock, RwLockReadGuard};

use crate::{
    errors::LedgerResult,
    events::{LedgerEvent, SpentEvent},
    field::FieldElement,
    instructions::{DepositRequest, ExecutionContext, SpendRequest},
    ledger::Ledger,
    merkle_tree::AuthenticationPath,
    verifier::ProofVerifier,
};

/// A [`Ledger`] behind a reader-writer lock.
#[derive(Debug)]
pub struct LedgerSequencer<V, C> {
    inner: RwLock<Ledger<V, C>>,
}

impl<V: ProofVerifier, C: AssetCustody> LedgerSequencer<V, C> {
    /// Wrap `ledger`.
    pub fn new(ledger: Ledger<V, C>) -> Self {
        Self {
            inner: RwLock::new(ledger),
        }
    }

    /// Unwrap the ledger.
    pub fn into_inner(self) -> Ledger<V, C> {
        self.inner.into_inner()
    }

    /// Submit a deposit.
    ///
    /// # Errors
    /// See [`Ledger::deposit`].
    pub fn deposit(&self, ctx: &ExecutionContext, request: &DepositRequest) -> LedgerResult<u64> {
        self.inner.write().deposit(ctx, request)
    }

    /// Submit a transfer or withdrawal.
    ///
    /// # Errors
    /// See [`Ledger::spend`].
    pub fn spend(&self, ctx: &ExecutionContext, request: &SpendRequest) -> LedgerResult<SpentEvent> {
        self.inner.write().spend(ctx, request)
    }

    /// Current root.
    pub fn current_root(&self) -> FieldElement {
        self.inner.read().current_root()
    }

    /// Whether `root` is still accepted.
    pub fn is_known_root(&self, root: &FieldElement) -> bool {
        self.inner.read().is_known_root(root)
    }

    /// Whether `nullifier_hash` has been retired.
    pub fn is_spent(&self, nullifier_hash: &FieldElement) -> bool {
        self.inner.read().is_spent(nullifier_hash)
    }

    /// Authentication path for `index` against the current root.
    ///
    /// # Errors
    /// See [`Ledger::auth_path`].
    pub fn auth_path(&self, index: u64) -> LedgerResult<AuthenticationPath> {
        self.inner.read().auth_path(index)
    }

    /// Snapshot of the event log.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.inner.read().events().to_vec()
    }

    /// Read access to the whole ledger for longer queries.
    pub fn read(&self) -> RwLockReadGuard<'_, Ledger<V, C>> {
        self.inner.read()
    }
}
