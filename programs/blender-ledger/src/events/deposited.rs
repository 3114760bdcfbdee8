//! Deposited event definition.

use blender_custody_interface::{Address, AssetKind, AssetRef};
use bytemuck::{Pod, Zeroable};

use super::{EventBytes, EventType};
use crate::field::FieldElement;

/// Size of [`DepositedEvent`] without the discriminator.
pub const DEPOSITED_EVENT_SIZE: usize = 160;

/// Event emitted when a commitment is appended by a deposit.
///
/// Carries the root after insertion so an indexer can check its local tree
/// against the ledger without recomputing it from genesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct DepositedEvent {
    /// The commitment appended to the tree
    pub commitment: FieldElement,
    /// Tree root after the append
    pub root: FieldElement,
    /// Leaf index the commitment occupies
    pub leaf_index: u64,
    /// Timestamp of the execution context
    pub timestamp: i64,
    /// Asset locked in custody
    pub asset: AssetRef,
    /// Account the asset was pulled from
    pub depositor: Address,
    /// `AssetKind` discriminant
    pub kind: u8,
    /// Padding for 8-byte alignment
    pub _padding: [u8; 7],
}

const _: () = assert!(core::mem::size_of::<DepositedEvent>() == DEPOSITED_EVENT_SIZE);

impl EventBytes for DepositedEvent {
    const EVENT_TYPE: EventType = EventType::Deposited;
}

impl DepositedEvent {
    /// Create a deposited event.
    pub fn new(
        commitment: FieldElement,
        root: FieldElement,
        leaf_index: u64,
        timestamp: i64,
        asset: AssetRef,
        kind: AssetKind,
        depositor: Address,
    ) -> Self {
        Self {
            commitment,
            root,
            leaf_index,
            timestamp,
            asset,
            depositor,
            kind: kind.into(),
            _padding: [0u8; 7],
        }
    }

    /// Decoded asset kind, `None` for an unknown discriminant.
    pub fn asset_kind(&self) -> Option<AssetKind> {
        AssetKind::try_from(self.kind).ok()
    }
}
