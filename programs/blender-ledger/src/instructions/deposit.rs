//! Deposit Instruction
//!
//! Appends a fresh commitment to the tree and takes one unit of the asset
//! into custody.
//!
//! # Validation & Execution Flow
//!
//! ```text
//! process_deposit(state, custody, ctx, request)
//! │
//! ├─── VALIDATION PHASE ───────────────────────────────────────────────────────
//! │
//! ├──► 1. REQUIRE commitment < r
//! ├──► 2. REQUIRE commitment ∉ tree leaves
//! ├──► 3. REQUIRE lock_value == NOTE_UNIT
//! ├──► 4. REQUIRE asset_id < 2^248 (note encoding)
//! ├──► 5. custody_book.check_lock(asset, kind)
//! ├──► 6. pending = tree.prepare_append(commitment)      (TreeFull)
//! │
//! ├─── EXECUTION PHASE ────────────────────────────────────────────────────────
//! │
//! ├──► 7. custody.lock(asset, depositor = caller)        (CustodyLayerFailure)
//! ├──► 8. tree.apply_append(pending)
//! ├──► 9. custody_book.record_lock(asset, kind)
//! └──► 10. RETURN DepositedEvent
//! ```

use blender_custody_interface::{AssetCustody, AssetKind, AssetRef, LockInstruction, NOTE_UNIT};
use tracing::{debug, warn};

use super::ExecutionContext;
use crate::{
    errors::{LedgerError, LedgerResult},
    events::DepositedEvent,
    field::FieldElement,
    hasher::Poseidon,
    merkle_tree::MerkleTree,
    note::NOTE_ELEMENT_BYTES,
    state::LedgerState,
};

/// Parameters of a deposit call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositRequest {
    /// `H(nullifier, assetAddress, assetId, secret)` of the depositor's note
    pub commitment: FieldElement,
    /// Asset being deposited
    pub asset: AssetRef,
    /// Units to lock; must be exactly one
    pub lock_value: u64,
    /// Token standard of the asset
    pub is_erc721: bool,
}

impl DepositRequest {
    /// Deposit of one unit of `asset`.
    pub fn new(commitment: FieldElement, asset: AssetRef, is_erc721: bool) -> Self {
        Self {
            commitment,
            asset,
            lock_value: NOTE_UNIT,
            is_erc721,
        }
    }

    /// Token standard of the asset.
    pub fn kind(&self) -> AssetKind {
        AssetKind::from_erc721_flag(self.is_erc721)
    }
}

/// Run a deposit against `state` and `custody`.
///
/// On error neither `state` nor `custody` has changed.
///
/// # Errors
/// - `NonCanonicalFieldElement` if the commitment is not reduced
/// - `DuplicateCommitment` if the commitment is already a leaf
/// - `InvalidLockValue` if `lock_value` is not one unit
/// - `AssetIdOutOfRange` if the asset id needs more than 31 bytes
/// - `AssetAlreadyInCustody` / `AssetCustodyMismatch` from the custody book
/// - `TreeFull` if no leaf is free
/// - `CustodyLayerFailure` if the custody layer refuses the lock
pub fn process_deposit<C: AssetCustody + ?Sized>(
    state: &mut LedgerState,
    custody: &mut C,
    ctx: &ExecutionContext,
    request: &DepositRequest,
) -> LedgerResult<DepositedEvent> {
    // =========================================================================
    // VALIDATION PHASE
    // =========================================================================

    let commitment = request.commitment;
    if !commitment.is_canonical() {
        return Err(LedgerError::NonCanonicalFieldElement);
    }
    if state.tree.contains(&commitment) {
        warn!("deposit: duplicate commitment");
        return Err(LedgerError::DuplicateCommitment);
    }
    if request.lock_value != NOTE_UNIT {
        warn!(lock_value = request.lock_value, "deposit: lock value rejected");
        return Err(LedgerError::InvalidLockValue);
    }
    if !FieldElement(request.asset.id).fits_in_bytes(NOTE_ELEMENT_BYTES) {
        return Err(LedgerError::AssetIdOutOfRange);
    }

    let kind = request.kind();
    state.custody.check_lock(&request.asset, kind)?;

    let pending = MerkleTree::prepare_append::<Poseidon>(&state.tree, &commitment)?;

    // =========================================================================
    // EXECUTION PHASE
    // =========================================================================

    custody
        .lock(&LockInstruction {
            asset: request.asset,
            kind,
            depositor: ctx.caller,
            value: request.lock_value,
        })
        .map_err(|e| {
            warn!(code = e.to_u32(), "deposit: custody refused lock");
            LedgerError::from(e)
        })?;

    let leaf_index = MerkleTree::apply_append(&mut state.tree, pending);
    state.custody.record_lock(request.asset, kind);

    debug!(leaf_index, "deposit: committed");

    Ok(DepositedEvent::new(
        commitment,
        state.tree.root(),
        leaf_index,
        ctx.timestamp,
        request.asset,
        kind,
        ctx.caller,
    ))
}
