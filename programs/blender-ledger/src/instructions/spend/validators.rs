//! Public-signal validators for spends.
//!
//! These checks read the request and the ledger state only. They run before
//! the root, nullifier and proof checks so that malformed submissions are
//! rejected without a pairing computation.

use blender_custody_interface::{Address, AssetKind, AssetRef, ZERO_ADDRESS};
use tracing::warn;

use super::{SpendRequest, fee::validate_fee};
use crate::{
    errors::{LedgerError, LedgerResult},
    field::FieldElement,
    state::LedgerState,
};

/// What a well-formed set of signals asks the ledger to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpendIntent {
    /// Asset named by the proof
    pub asset: AssetRef,
    /// Token standard of the asset
    pub kind: AssetKind,
    /// Withdrawal payout or transfer output
    pub action: SpendAction,
}

/// The effect a spend has besides retiring its nullifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpendAction {
    /// Release the asset
    Withdraw(Payout),
    /// Append a fresh commitment for the same asset
    Transfer(FieldElement),
}

/// Recipient and relayer fee of a withdrawal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    /// Account receiving the asset
    pub recipient: Address,
    /// Account receiving the fee, zero when unrelayed
    pub relayer: Address,
    /// Relayer fee
    pub fee: u128,
}

/// Decode a boolean signal.
fn flag(value: &FieldElement) -> LedgerResult<bool> {
    if *value == FieldElement::ZERO {
        Ok(false)
    } else if *value == FieldElement::from_u64(1) {
        Ok(true)
    } else {
        Err(LedgerError::InvalidPublicSignals)
    }
}

fn address(value: &FieldElement) -> LedgerResult<Address> {
    value.to_address().ok_or(LedgerError::InvalidPublicSignals)
}

/// Check the shape of the signals and their agreement with the request.
///
/// # Errors
/// - `InvalidPublicSignals` for non-canonical signals, flags other than 0/1,
///   addresses wider than 20 bytes, or a request that contradicts the signals
/// - `InvalidFee` from [`validate_fee`], or a transfer carrying a fee
/// - `DuplicateCommitment` if a transfer's output is already a leaf
pub fn validate_spend_signals(
    state: &LedgerState,
    request: &SpendRequest,
) -> LedgerResult<SpendIntent> {
    let signals = &request.public_signals;

    if signals.to_fields().iter().any(|fe| !fe.is_canonical()) {
        warn!("spend: non-canonical public signal");
        return Err(LedgerError::InvalidPublicSignals);
    }

    let is_withdraw = flag(&signals.is_withdraw)?;
    let kind = AssetKind::from_erc721_flag(flag(&signals.is_erc721)?);
    if is_withdraw != request.is_withdraw {
        warn!("spend: isWithdraw signal disagrees with request");
        return Err(LedgerError::InvalidPublicSignals);
    }

    let asset = AssetRef::new(address(&signals.asset_address)?, signals.asset_id.0);
    let recipient = address(&signals.recipient)?;
    let relayer = address(&signals.relayer)?;
    let fee = validate_fee(&signals.fee, &relayer)?;

    if is_withdraw {
        if request.new_commitment.is_some() || !signals.new_commitment.is_zero() {
            warn!("spend: withdrawal carries a new commitment");
            return Err(LedgerError::InvalidPublicSignals);
        }
        if recipient == ZERO_ADDRESS {
            warn!("spend: withdrawal without recipient");
            return Err(LedgerError::InvalidPublicSignals);
        }
        return Ok(SpendIntent {
            asset,
            kind,
            action: SpendAction::Withdraw(Payout {
                recipient,
                relayer,
                fee,
            }),
        });
    }

    let new_commitment = signals.new_commitment;
    if request.new_commitment != Some(new_commitment) || new_commitment.is_zero() {
        warn!("spend: transfer output missing or mismatched");
        return Err(LedgerError::InvalidPublicSignals);
    }
    if recipient != ZERO_ADDRESS || relayer != ZERO_ADDRESS {
        warn!("spend: transfer names a payout account");
        return Err(LedgerError::InvalidPublicSignals);
    }
    if fee != 0 {
        warn!("spend: transfer carries a fee");
        return Err(LedgerError::InvalidFee);
    }
    if state.tree.contains(&new_commitment) {
        warn!("spend: duplicate output commitment");
        return Err(LedgerError::DuplicateCommitment);
    }

    Ok(SpendIntent {
        asset,
        kind,
        action: SpendAction::Transfer(new_commitment),
    })
}
