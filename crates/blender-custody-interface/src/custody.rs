//! The custody trait invoked by the ledger.

use crate::{CustodyError, LockInstruction, ReleaseInstruction};

/// A custody layer that holds deposited assets on behalf of the ledger.
///
/// Both operations must be all-or-nothing: when an implementation returns an
/// error, it must not have moved anything. The ledger relies on this to keep
/// its own state unchanged when custody refuses an instruction.
pub trait AssetCustody {
    /// Take the asset described by `instruction` into custody.
    ///
    /// # Errors
    /// Returns a [`CustodyError`] if the asset cannot be locked.
    fn lock(&mut self, instruction: &LockInstruction) -> Result<(), CustodyError>;

    /// Release the asset described by `instruction` to its recipient and pay
    /// the relayer fee.
    ///
    /// # Errors
    /// Returns a [`CustodyError`] if the asset cannot be released.
    fn release(&mut self, instruction: &ReleaseInstruction) -> Result<(), CustodyError>;
}

impl<T: AssetCustody + ?Sized> AssetCustody for &mut T {
    fn lock(&mut self, instruction: &LockInstruction) -> Result<(), CustodyError> {
        (**self).lock(instruction)
    }

    fn release(&mut self, instruction: &ReleaseInstruction) -> Result<(), CustodyError> {
        (**self).release(instruction)
    }
}
