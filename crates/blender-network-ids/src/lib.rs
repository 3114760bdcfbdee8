//! Single source of truth for Blender protocol identifiers.
//!
//! Note strings embed both the protocol tag and the network identifier, so a
//! note minted against one deployment is rejected by every other one. The
//! network is selected at compile time through cargo features.
//!
//! # Feature Flags
//!
//! - `mainnet` - Use the mainnet network id (default)
//! - `devnet` - Use the devnet network id
//! - `localnet` - Use the localnet network id
//!
//! When several features are enabled (workspace feature unification), the
//! precedence is `localnet`, then `devnet`, then `mainnet`.
//!
//! # Usage
//!
//! ```rust
//! let prefix = blender_network_ids::PROTOCOL_TAG;
//! assert_eq!(prefix, "blender");
//! assert!(blender_network_ids::NETWORK_ID > 0);
//! ```

#![no_std]

// =============================================================================
// Protocol Tag
// =============================================================================

/// Leading component of every note string.
pub const PROTOCOL_TAG: &str = "blender";

// =============================================================================
// Network Identifiers
// =============================================================================

/// Mainnet network identifier.
pub const MAINNET_NETWORK_ID: u64 = 1;

/// Devnet network identifier.
pub const DEVNET_NETWORK_ID: u64 = 11_155_111;

/// Localnet network identifier.
pub const LOCALNET_NETWORK_ID: u64 = 31_337;

/// Network identifier of the current build (localnet).
#[cfg(feature = "localnet")]
pub const NETWORK_ID: u64 = LOCALNET_NETWORK_ID;

/// Network identifier of the current build (devnet).
#[cfg(all(feature = "devnet", not(feature = "localnet")))]
pub const NETWORK_ID: u64 = DEVNET_NETWORK_ID;

/// Network identifier of the current build (mainnet).
#[cfg(not(any(feature = "devnet", feature = "localnet")))]
pub const NETWORK_ID: u64 = MAINNET_NETWORK_ID;

/// Human-readable name for a known network identifier.
pub const fn network_name(network_id: u64) -> Option<&'static str> {
    match network_id {
        MAINNET_NETWORK_ID => Some("mainnet"),
        DEVNET_NETWORK_ID => Some("devnet"),
        LOCALNET_NETWORK_ID => Some("localnet"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_ids_are_distinct() {
        assert_ne!(MAINNET_NETWORK_ID, DEVNET_NETWORK_ID);
        assert_ne!(MAINNET_NETWORK_ID, LOCALNET_NETWORK_ID);
        assert_ne!(DEVNET_NETWORK_ID, LOCALNET_NETWORK_ID);
    }

    #[test]
    fn test_current_network_has_a_name() {
        assert!(
            network_name(NETWORK_ID).is_some(),
            "Selected network id should be a known network"
        );
        assert_eq!(network_name(42), None);
    }
}
