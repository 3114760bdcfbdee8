//! Relayer fee checks.

use blender_custody_interface::{Address, ZERO_ADDRESS};
use tracing::warn;

use crate::{
    errors::{LedgerError, LedgerResult},
    field::FieldElement,
};

/// Validate the `fee` signal against the `relayer` it is paid to.
///
/// Returns the fee as an integer.
///
/// # Errors
/// Returns `InvalidFee` if the fee does not fit in `u128`, or if a non-zero
/// fee names no relayer.
pub fn validate_fee(fee: &FieldElement, relayer: &Address) -> LedgerResult<u128> {
    let Some(amount) = fee.to_u128() else {
        warn!("spend: fee wider than 128 bits");
        return Err(LedgerError::InvalidFee);
    };
    if amount != 0 && *relayer == ZERO_ADDRESS {
        warn!("spend: fee without relayer");
        return Err(LedgerError::InvalidFee);
    }
    Ok(amount)
}

/// Relayer the custody layer should pay, `None` for a direct withdrawal.
pub fn fee_recipient(relayer: &Address) -> Option<Address> {
    (*relayer != ZERO_ADDRESS).then_some(*relayer)
}
