//! Spent event definition.

use blender_custody_interface::{Address, AssetKind, AssetRef};
use bytemuck::{Pod, Zeroable};

use super::{EventBytes, EventType};
use crate::field::FieldElement;

/// Size of [`SpentEvent`] without the discriminator.
pub const SPENT_EVENT_SIZE: usize = 232;

/// `new_leaf_index` value recorded for withdrawals.
pub const NO_NEW_LEAF: u64 = u64::MAX;

/// Event emitted when a nullifier is retired by a transfer or withdrawal.
///
/// For a transfer `new_commitment` and `new_leaf_index` name the output leaf
/// and the payout fields are zero. For a withdrawal `new_commitment` is zero
/// and `new_leaf_index` is [`NO_NEW_LEAF`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct SpentEvent {
    /// The retired nullifier hash
    pub nullifier_hash: FieldElement,
    /// Tree root after the transition
    pub root: FieldElement,
    /// Output commitment of a transfer, zero for a withdrawal
    pub new_commitment: FieldElement,
    /// Account the asset was released to
    pub recipient: Address,
    /// Relayer paid the fee
    pub relayer: Address,
    /// Relayer fee, big-endian u128
    pub fee_be: [u8; 16],
    /// Leaf index of `new_commitment`
    pub new_leaf_index: u64,
    /// Timestamp of the execution context
    pub timestamp: i64,
    /// Spend sequence number of the nullifier
    pub spend_index: u64,
    /// Asset named by the proof
    pub asset: AssetRef,
    /// `AssetKind` discriminant
    pub kind: u8,
    /// 1 for a withdrawal, 0 for a transfer
    pub is_withdraw: u8,
    /// Padding for 8-byte alignment
    pub _padding: [u8; 2],
}

const _: () = assert!(core::mem::size_of::<SpentEvent>() == SPENT_EVENT_SIZE);

impl EventBytes for SpentEvent {
    const EVENT_TYPE: EventType = EventType::Spent;
}

impl SpentEvent {
    /// Event for a withdrawal.
    #[allow(clippy::too_many_arguments)]
    pub fn withdrawal(
        nullifier_hash: FieldElement,
        root: FieldElement,
        timestamp: i64,
        spend_index: u64,
        asset: AssetRef,
        kind: AssetKind,
        recipient: Address,
        relayer: Address,
        fee: u128,
    ) -> Self {
        Self {
            nullifier_hash,
            root,
            new_commitment: FieldElement::ZERO,
            recipient,
            relayer,
            fee_be: fee.to_be_bytes(),
            new_leaf_index: NO_NEW_LEAF,
            timestamp,
            spend_index,
            asset,
            kind: kind.into(),
            is_withdraw: 1,
            _padding: [0u8; 2],
        }
    }

    /// Event for a blind transfer.
    #[allow(clippy::too_many_arguments)]
    pub fn transfer(
        nullifier_hash: FieldElement,
        root: FieldElement,
        timestamp: i64,
        spend_index: u64,
        asset: AssetRef,
        kind: AssetKind,
        new_commitment: FieldElement,
        new_leaf_index: u64,
    ) -> Self {
        Self {
            nullifier_hash,
            root,
            new_commitment,
            recipient: [0u8; 20],
            relayer: [0u8; 20],
            fee_be: [0u8; 16],
            new_leaf_index,
            timestamp,
            spend_index,
            asset,
            kind: kind.into(),
            is_withdraw: 0,
            _padding: [0u8; 2],
        }
    }

    /// Whether the spend released the asset.
    pub fn is_withdraw(&self) -> bool {
        self.is_withdraw != 0
    }

    /// Relayer fee.
    pub fn fee(&self) -> u128 {
        u128::from_be_bytes(self.fee_be)
    }

    /// Output leaf of a transfer.
    pub fn new_leaf(&self) -> Option<(u64, FieldElement)> {
        (!self.is_withdraw()).then_some((self.new_leaf_index, self.new_commitment))
    }

    /// Decoded asset kind, `None` for an unknown discriminant.
    pub fn asset_kind(&self) -> Option<AssetKind> {
        AssetKind::try_from(self.kind).ok()
    }
}
