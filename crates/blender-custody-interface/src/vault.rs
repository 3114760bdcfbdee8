//! In-memory reference custody layer.

use alloc::collections::BTreeMap;

use crate::{
    Address, AssetCustody, AssetKind, AssetRef, CustodyError, LockInstruction, NOTE_UNIT,
    ReleaseInstruction,
};

/// One custodied position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Holding {
    /// Token standard of the asset
    pub kind: AssetKind,
    /// Units currently held
    pub units: u64,
}

/// Custody layer that keeps every balance in memory.
///
/// Used by simulations and tests. It follows the same rules an on-chain
/// custody contract enforces: unique assets are held at most once, releases
/// require a held unit, and a frozen vault refuses every movement.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryVault {
    holdings: BTreeMap<AssetRef, Holding>,
    delivered: BTreeMap<(Address, AssetRef), u64>,
    relayer_fees: BTreeMap<Address, u128>,
    frozen: bool,
}

impl InMemoryVault {
    /// Create an empty vault.
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze or unfreeze the vault. A frozen vault fails every lock and release.
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// Units of `asset` currently held.
    pub fn held_units(&self, asset: &AssetRef) -> u64 {
        self.holdings.get(asset).map_or(0, |h| h.units)
    }

    /// The held position for `asset`, if any.
    pub fn holding(&self, asset: &AssetRef) -> Option<Holding> {
        self.holdings.get(asset).copied()
    }

    /// Units of `asset` delivered to `recipient` so far.
    pub fn delivered_to(&self, recipient: &Address, asset: &AssetRef) -> u64 {
        self.delivered
            .get(&(*recipient, *asset))
            .copied()
            .unwrap_or(0)
    }

    /// Total fees paid out to `relayer`.
    pub fn relayer_fees(&self, relayer: &Address) -> u128 {
        self.relayer_fees.get(relayer).copied().unwrap_or(0)
    }
}

impl AssetCustody for InMemoryVault {
    fn lock(&mut self, instruction: &LockInstruction) -> Result<(), CustodyError> {
        if self.frozen {
            return Err(CustodyError::Frozen);
        }
        if instruction.value == 0
            || (instruction.kind.is_erc721() && instruction.value != NOTE_UNIT)
        {
            return Err(CustodyError::InvalidLockValue);
        }

        let units = match self.holdings.get(&instruction.asset) {
            Some(existing) if existing.kind != instruction.kind => {
                return Err(CustodyError::KindMismatch);
            }
            Some(existing) if existing.kind.is_erc721() && existing.units > 0 => {
                return Err(CustodyError::AlreadyHeld);
            }
            Some(existing) => existing
                .units
                .checked_add(instruction.value)
                .ok_or(CustodyError::ArithmeticOverflow)?,
            None => instruction.value,
        };

        self.holdings.insert(
            instruction.asset,
            Holding {
                kind: instruction.kind,
                units,
            },
        );
        Ok(())
    }

    fn release(&mut self, instruction: &ReleaseInstruction) -> Result<(), CustodyError> {
        if self.frozen {
            return Err(CustodyError::Frozen);
        }

        let holding = self
            .holdings
            .get(&instruction.asset)
            .copied()
            .filter(|h| h.units > 0)
            .ok_or(CustodyError::NotHeld)?;
        if holding.kind != instruction.kind {
            return Err(CustodyError::KindMismatch);
        }

        // Compute every new balance before touching any of them.
        let delivered_key = (instruction.recipient, instruction.asset);
        let delivered = self
            .delivered
            .get(&delivered_key)
            .copied()
            .unwrap_or(0)
            .checked_add(NOTE_UNIT)
            .ok_or(CustodyError::ArithmeticOverflow)?;
        let fee_update = match instruction.relayer {
            Some(relayer) if instruction.fee > 0 => {
                let total = self
                    .relayer_fees(&relayer)
                    .checked_add(instruction.fee)
                    .ok_or(CustodyError::ArithmeticOverflow)?;
                Some((relayer, total))
            }
            _ => None,
        };

        let remaining = holding.units - NOTE_UNIT;
        if remaining == 0 {
            self.holdings.remove(&instruction.asset);
        } else {
            self.holdings.insert(
                instruction.asset,
                Holding {
                    kind: holding.kind,
                    units: remaining,
                },
            );
        }
        self.delivered.insert(delivered_key, delivered);
        if let Some((relayer, total)) = fee_update {
            self.relayer_fees.insert(relayer, total);
        }
        Ok(())
    }
}
