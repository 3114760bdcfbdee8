//! Core types for the custody interface.

use bytemuck::{Pod, Zeroable};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Account address on the settlement layer (20 bytes).
pub type Address = [u8; 20];

/// Token id inside an asset contract (32 bytes, big-endian).
pub type AssetId = [u8; 32];

/// The all-zero address, used as "no relayer" / "no recipient".
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Units moved by a single lock or release. Every note stands for exactly one.
pub const NOTE_UNIT: u64 = 1;

/// Token standard of a custodied asset.
///
/// The discriminant is the value of the `isERC721` public signal.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, IntoPrimitive, TryFromPrimitive)]
pub enum AssetKind {
    /// Semi-fungible token; the custody layer may hold several units of one id.
    Erc1155 = 0,
    /// Unique token; at most one unit of an id can ever be held.
    Erc721 = 1,
}

impl AssetKind {
    /// Map an `isERC721` flag to the asset kind.
    pub const fn from_erc721_flag(is_erc721: bool) -> Self {
        if is_erc721 { Self::Erc721 } else { Self::Erc1155 }
    }

    /// Whether this is a unique (ERC721) asset.
    pub const fn is_erc721(self) -> bool {
        matches!(self, Self::Erc721)
    }
}

/// Identifies one asset: the contract address plus the token id inside it.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
pub struct AssetRef {
    /// Asset contract address
    pub address: Address,
    /// Token id (big-endian)
    pub id: AssetId,
}

impl AssetRef {
    /// Create an asset reference.
    pub const fn new(address: Address, id: AssetId) -> Self {
        Self { address, id }
    }

    /// Convenience constructor for small token ids.
    ///
    /// # Example
    /// ```
    /// use blender_custody_interface::AssetRef;
    ///
    /// let asset = AssetRef::from_u64_id([7u8; 20], 42);
    /// assert_eq!(asset.id[31], 42);
    /// assert_eq!(&asset.id[..24], &[0u8; 24]);
    /// ```
    pub fn from_u64_id(address: Address, id: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&id.to_be_bytes());
        Self { address, id: bytes }
    }
}

/// Instruction to take an asset into custody on deposit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockInstruction {
    /// The asset being deposited
    pub asset: AssetRef,
    /// Token standard of the asset
    pub kind: AssetKind,
    /// Account the asset is pulled from
    pub depositor: Address,
    /// Units to lock
    pub value: u64,
}

/// Instruction to hand an asset out of custody on withdraw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleaseInstruction {
    /// The asset being withdrawn
    pub asset: AssetRef,
    /// Token standard of the asset
    pub kind: AssetKind,
    /// Account receiving the asset
    pub recipient: Address,
    /// Relayer receiving the fee, if the withdrawal was relayed
    pub relayer: Option<Address>,
    /// Fee owed to the relayer, in settlement-layer base units
    pub fee: u128,
}
