use std::collections::BTreeMap;

use blender_custody_interface::{AssetKind, AssetRef, Holding, NOTE_UNIT};

use crate::errors::{LedgerError, LedgerResult};

/// The ledger's own record of what it holds in custody.
///
/// Every live note stands for one unit of one asset. The book lets the ledger
/// reject spends that name an asset it never locked before any instruction
/// reaches the custody layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CustodyBook {
    holdings: BTreeMap<AssetRef, Holding>,
}

impl CustodyBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded position for `asset`.
    pub fn holding(&self, asset: &AssetRef) -> Option<Holding> {
        self.holdings.get(asset).copied()
    }

    /// Units of `asset` on record.
    pub fn held_units(&self, asset: &AssetRef) -> u64 {
        self.holdings.get(asset).map_or(0, |h| h.units)
    }

    /// Number of distinct assets on record.
    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Check that one more unit of `asset` can be locked.
    ///
    /// # Errors
    /// - `AssetAlreadyInCustody` for a unique asset that is already held
    /// - `AssetCustodyMismatch` if the asset is held under the other kind
    /// - `ArithmeticOverflow` if the unit count would overflow
    pub fn check_lock(&self, asset: &AssetRef, kind: AssetKind) -> LedgerResult<()> {
        match self.holdings.get(asset) {
            None => Ok(()),
            Some(h) if h.kind != kind => Err(LedgerError::AssetCustodyMismatch),
            Some(h) if h.kind.is_erc721() => Err(LedgerError::AssetAlreadyInCustody),
            Some(h) => h
                .units
                .checked_add(NOTE_UNIT)
                .map(|_| ())
                .ok_or(LedgerError::ArithmeticOverflow),
        }
    }

    /// Check that one unit of `asset` of the given kind is on record.
    ///
    /// # Errors
    /// Returns `AssetCustodyMismatch` if it is not.
    pub fn check_release(&self, asset: &AssetRef, kind: AssetKind) -> LedgerResult<()> {
        match self.holdings.get(asset) {
            Some(h) if h.kind == kind && h.units >= NOTE_UNIT => Ok(()),
            _ => Err(LedgerError::AssetCustodyMismatch),
        }
    }

    /// Record one locked unit. Call after `check_lock` succeeded.
    pub fn record_lock(&mut self, asset: AssetRef, kind: AssetKind) {
        let holding = self.holdings.entry(asset).or_insert(Holding { kind, units: 0 });
        holding.units = holding.units.saturating_add(NOTE_UNIT);
    }

    /// Record one released unit. Call after `check_release` succeeded.
    pub fn record_release(&mut self, asset: &AssetRef) {
        if let Some(holding) = self.holdings.get_mut(asset) {
            holding.units = holding.units.saturating_sub(NOTE_UNIT);
            if holding.units == 0 {
                self.holdings.remove(asset);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> AssetRef {
        AssetRef::from_u64_id([9u8; 20], 1)
    }

    #[test]
    fn test_unique_asset_lock_cycle() {
        let mut book = CustodyBook::new();
        assert_eq!(book.check_lock(&asset(), AssetKind::Erc721), Ok(()));
        book.record_lock(asset(), AssetKind::Erc721);

        assert_eq!(
            book.check_lock(&asset(), AssetKind::Erc721),
            Err(LedgerError::AssetAlreadyInCustody)
        );
        assert_eq!(book.check_release(&asset(), AssetKind::Erc721), Ok(()));
        assert_eq!(
            book.check_release(&asset(), AssetKind::Erc1155),
            Err(LedgerError::AssetCustodyMismatch)
        );

        book.record_release(&asset());
        assert!(book.is_empty());
        assert_eq!(
            book.check_release(&asset(), AssetKind::Erc721),
            Err(LedgerError::AssetCustodyMismatch)
        );
    }

    #[test]
    fn test_semi_fungible_units() {
        let mut book = CustodyBook::new();
        book.record_lock(asset(), AssetKind::Erc1155);
        assert_eq!(book.check_lock(&asset(), AssetKind::Erc1155), Ok(()));
        book.record_lock(asset(), AssetKind::Erc1155);
        assert_eq!(book.held_units(&asset()), 2);

        book.record_release(&asset());
        assert_eq!(book.held_units(&asset()), 1);
        assert_eq!(
            book.check_lock(&asset(), AssetKind::Erc721),
            Err(LedgerError::AssetCustodyMismatch)
        );
    }
}
