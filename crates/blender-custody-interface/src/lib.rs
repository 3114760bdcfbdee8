//! Blender Custody Interface
//!
//! Shared types for communication between the Blender ledger and the asset
//! custody layer that actually holds deposited assets.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    blender-ledger                            │
//! │  • Commitment tree and root history                          │
//! │  • Nullifier registry                                        │
//! │  • Proof-gated deposit / transfer / withdraw                 │
//! │  • Issues lock / release instructions                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 AssetCustody implementation                  │
//! │  • Holds ERC721 / ERC1155 positions                          │
//! │  • Delivers released assets to recipients                    │
//! │  • Pays relayer fees                                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger never moves assets itself. Every lock and release goes through
//! [`AssetCustody`], and a refusal from the custody layer aborts the
//! transition that requested it.
//!
//! # Modules
//!
//! - [`types`]: Core types (AssetKind, AssetRef, LockInstruction, ReleaseInstruction)
//! - [`custody`]: The [`AssetCustody`] trait
//! - [`error`]: Custody error codes
//! - [`vault`]: In-memory reference implementation

#![no_std]

extern crate alloc;

mod custody;
mod error;
mod types;
mod vault;

pub use custody::*;
pub use error::*;
pub use types::*;
pub use vault::*;
