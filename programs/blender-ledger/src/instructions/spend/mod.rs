//! Spend Instruction
//!
//! Retires a nullifier against a proof of note ownership. A transfer appends
//! a fresh commitment for the same asset; a withdrawal releases the asset to
//! the recipient and pays the relayer fee.
//!
//! # Validation & Execution Flow
//!
//! ```text
//! process_spend(state, custody, verifier, ctx, request)
//! │
//! ├─── VALIDATION PHASE ───────────────────────────────────────────────────────
//! │
//! ├──► 1. validate_spend_signals
//! │        REQUIRE every signal < r, flags ∈ {0, 1}, addresses fit 20 bytes
//! │        REQUIRE isWithdraw signal == request kind
//! │        Withdraw: newCommitment == 0, recipient != 0
//! │        Transfer: newCommitment != 0 and fresh, no payout fields
//! │        REQUIRE fee < 2^128, fee != 0 ⇒ relayer != 0
//! │
//! ├──► 2. REQUIRE root ∈ tree.root_history                  (UnknownRoot)
//! ├──► 3. REQUIRE nullifierHash ∉ registry         (NullifierAlreadySpent)
//! ├──► 4. REQUIRE verifier.verify(proof, signals) (ProofVerificationFailed)
//! ├──► 5. custody_book.check_release(asset, kind)  (AssetCustodyMismatch)
//! ├──► 6. Transfer: pending = tree.prepare_append(newCommitment) (TreeFull)
//! │
//! ├─── EXECUTION PHASE ────────────────────────────────────────────────────────
//! │
//! ├──► 7. Withdraw: custody.release(asset → recipient, fee → relayer)
//! │                                                  (CustodyLayerFailure)
//! ├──► 8. registry.mark_spent(nullifierHash)
//! ├──► 9. Transfer: tree.apply_append(pending)
//! │        Withdraw: custody_book.record_release(asset)
//! └──► 10. RETURN SpentEvent
//! ```
//!
//! Steps 1-6 only read. Step 7 is the only fallible effect and runs before the
//! first ledger write, so a refusal leaves the ledger unchanged.

mod fee;
mod validators;

pub use fee::*;
pub use validators::*;

use blender_custody_interface::{AssetCustody, ReleaseInstruction};
use tracing::{debug, warn};

use super::ExecutionContext;
use crate::{
    errors::{LedgerError, LedgerResult},
    events::SpentEvent,
    field::FieldElement,
    hasher::Poseidon,
    merkle_tree::{MerkleTree, PendingAppend},
    public_signals::PublicSignals,
    state::LedgerState,
    verifier::ProofVerifier,
};

/// Parameters of a spend call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpendRequest {
    /// Opaque proof bytes handed to the verifier
    pub proof: Vec<u8>,
    /// Public signals in schema order
    pub public_signals: PublicSignals,
    /// `true` for a withdrawal, `false` for a transfer
    pub is_withdraw: bool,
    /// Output commitment of a transfer
    pub new_commitment: Option<FieldElement>,
}

impl SpendRequest {
    /// Withdrawal request.
    pub fn withdraw(proof: Vec<u8>, public_signals: PublicSignals) -> Self {
        Self {
            proof,
            public_signals,
            is_withdraw: true,
            new_commitment: None,
        }
    }

    /// Transfer request.
    pub fn transfer(
        proof: Vec<u8>,
        public_signals: PublicSignals,
        new_commitment: FieldElement,
    ) -> Self {
        Self {
            proof,
            public_signals,
            is_withdraw: false,
            new_commitment: Some(new_commitment),
        }
    }
}

/// Run a transfer or withdrawal against `state` and `custody`.
///
/// On error neither `state` nor `custody` has changed.
///
/// # Errors
/// See the flow above. Only `UnknownRoot` is worth retrying, with a proof
/// built against a fresh root.
pub fn process_spend<C, V>(
    state: &mut LedgerState,
    custody: &mut C,
    verifier: &V,
    ctx: &ExecutionContext,
    request: &SpendRequest,
) -> LedgerResult<SpentEvent>
where
    C: AssetCustody + ?Sized,
    V: ProofVerifier + ?Sized,
{
    // =========================================================================
    // VALIDATION PHASE
    // =========================================================================

    let intent = validate_spend_signals(state, request)?;
    let signals = &request.public_signals;
    let nullifier_hash = signals.nullifier_hash;

    if !MerkleTree::is_known_root(&state.tree, &signals.root) {
        warn!("spend: unknown root");
        return Err(LedgerError::UnknownRoot);
    }

    if state.nullifiers.is_spent(&nullifier_hash) {
        warn!("spend: nullifier already spent");
        return Err(LedgerError::NullifierAlreadySpent);
    }

    if !verifier.verify(&request.proof, signals) {
        warn!("spend: proof rejected");
        return Err(LedgerError::ProofVerificationFailed);
    }

    state.custody.check_release(&intent.asset, intent.kind)?;

    let plan = match intent.action {
        SpendAction::Withdraw(payout) => Plan::Withdraw(payout),
        SpendAction::Transfer(commitment) => Plan::Transfer(
            commitment,
            MerkleTree::prepare_append::<Poseidon>(&state.tree, &commitment)?,
        ),
    };

    // =========================================================================
    // EXECUTION PHASE
    // =========================================================================

    if let Plan::Withdraw(payout) = &plan {
        custody
            .release(&ReleaseInstruction {
                asset: intent.asset,
                kind: intent.kind,
                recipient: payout.recipient,
                relayer: fee_recipient(&payout.relayer),
                fee: payout.fee,
            })
            .map_err(|e| {
                warn!(code = e.to_u32(), "spend: custody refused release");
                LedgerError::from(e)
            })?;
    }

    let spend_index = state.nullifiers.mark_spent(&nullifier_hash)?;

    let event = match plan {
        Plan::Transfer(new_commitment, pending) => {
            let new_leaf_index = MerkleTree::apply_append(&mut state.tree, pending);
            debug!(spend_index, new_leaf_index, "spend: transfer committed");
            SpentEvent::transfer(
                nullifier_hash,
                state.tree.root(),
                ctx.timestamp,
                spend_index,
                intent.asset,
                intent.kind,
                new_commitment,
                new_leaf_index,
            )
        }
        Plan::Withdraw(payout) => {
            state.custody.record_release(&intent.asset);
            debug!(spend_index, "spend: withdrawal committed");
            SpentEvent::withdrawal(
                nullifier_hash,
                state.tree.root(),
                ctx.timestamp,
                spend_index,
                intent.asset,
                intent.kind,
                payout.recipient,
                payout.relayer,
                payout.fee,
            )
        }
    };

    Ok(event)
}

/// Validated spend with its tree insertion precomputed.
enum Plan {
    Withdraw(Payout),
    Transfer(FieldElement, PendingAppend),
}
