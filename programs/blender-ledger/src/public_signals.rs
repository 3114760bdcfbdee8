//! Public signals of a spend proof, schema version 1.
//!
//! | Index | Signal | Notes |
//! |-------|--------|-------|
//! | 0 | root | Tree root the proof was built against |
//! | 1 | nullifierHash | `H(nullifier, assetAddress, assetId)` |
//! | 2 | recipient | 20-byte address, zero for transfers |
//! | 3 | relayer | 20-byte address, zero when unrelayed |
//! | 4 | fee | Relayer fee, fits in `u128` |
//! | 5 | assetAddress | 20-byte asset contract address |
//! | 6 | assetId | Token id |
//! | 7 | isERC721 | 1 or 0 |
//! | 8 | isWithdraw | 1 or 0 |
//! | 9 | newCommitment | Output commitment, zero for withdrawals |
//!
//! The order is fixed: the circuit exposes its public inputs in this order
//! and the verifier receives them unchanged.

use blender_custody_interface::{Address, AssetKind, AssetRef};
use bytemuck::{Pod, Zeroable};

use crate::{
    errors::{LedgerError, LedgerResult},
    field::FieldElement,
};

/// Version of the signal layout below. Bumped on any reordering.
pub const PUBLIC_SIGNALS_VERSION: u16 = 1;

/// Number of public signals.
pub const N_PUBLIC_SIGNALS: usize = 10;

/// The ten public signals in circuit order.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct PublicSignals {
    /// Tree root the membership proof was built against
    pub root: FieldElement,
    /// Poseidon hash retiring the spent note
    pub nullifier_hash: FieldElement,
    /// Withdrawal recipient address, zero for a transfer
    pub recipient: FieldElement,
    /// Relayer address, zero when no fee is paid
    pub relayer: FieldElement,
    /// Relayer fee in asset units
    pub fee: FieldElement,
    /// Asset contract address
    pub asset_address: FieldElement,
    /// Token id within the contract
    pub asset_id: FieldElement,
    /// 1 for an ERC721 asset, 0 for ERC1155
    pub is_erc721: FieldElement,
    /// 1 for a withdrawal, 0 for a transfer
    pub is_withdraw: FieldElement,
    /// Output commitment of a transfer, zero for a withdrawal
    pub new_commitment: FieldElement,
}

const _: () = assert!(core::mem::size_of::<PublicSignals>() == N_PUBLIC_SIGNALS * 32);

impl PublicSignals {
    /// Signals for a withdrawal of `asset` to `recipient`.
    #[allow(clippy::too_many_arguments)]
    pub fn withdraw(
        root: FieldElement,
        nullifier_hash: FieldElement,
        asset: &AssetRef,
        kind: AssetKind,
        recipient: &Address,
        relayer: &Address,
        fee: u128,
    ) -> Self {
        Self {
            root,
            nullifier_hash,
            recipient: FieldElement::from_address(recipient),
            relayer: FieldElement::from_address(relayer),
            fee: FieldElement::from_u128(fee),
            asset_address: FieldElement::from_address(&asset.address),
            asset_id: FieldElement(asset.id),
            is_erc721: FieldElement::from_u64(kind.is_erc721() as u64),
            is_withdraw: FieldElement::from_u64(1),
            new_commitment: FieldElement::ZERO,
        }
    }

    /// Signals for a blind transfer of `asset` into `new_commitment`.
    pub fn transfer(
        root: FieldElement,
        nullifier_hash: FieldElement,
        asset: &AssetRef,
        kind: AssetKind,
        new_commitment: FieldElement,
    ) -> Self {
        Self {
            root,
            nullifier_hash,
            recipient: FieldElement::ZERO,
            relayer: FieldElement::ZERO,
            fee: FieldElement::ZERO,
            asset_address: FieldElement::from_address(&asset.address),
            asset_id: FieldElement(asset.id),
            is_erc721: FieldElement::from_u64(kind.is_erc721() as u64),
            is_withdraw: FieldElement::ZERO,
            new_commitment,
        }
    }

    /// The signals as an ordered array, as handed to the verifier.
    pub fn to_fields(&self) -> [FieldElement; N_PUBLIC_SIGNALS] {
        bytemuck::cast(*self)
    }

    /// Rebuild from an ordered slice.
    ///
    /// # Errors
    /// Returns `InvalidPublicSignals` if the slice does not hold exactly
    /// [`N_PUBLIC_SIGNALS`] elements.
    pub fn from_fields(fields: &[FieldElement]) -> LedgerResult<Self> {
        let fields: [FieldElement; N_PUBLIC_SIGNALS] = fields
            .try_into()
            .map_err(|_| LedgerError::InvalidPublicSignals)?;
        Ok(bytemuck::cast(fields))
    }

    /// Big-endian byte form of every signal, as the pairing check consumes.
    pub fn to_be_bytes(&self) -> [[u8; 32]; N_PUBLIC_SIGNALS] {
        bytemuck::cast(*self)
    }

    /// The asset the signals name, if both fields are in range.
    pub fn asset(&self) -> Option<AssetRef> {
        let address = self.asset_address.to_address()?;
        Some(AssetRef::new(address, self.asset_id.0))
    }
}
