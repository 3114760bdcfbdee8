//! Ledger configuration.
//!
//! Defaults come from the compile-time constants in [`crate::state`] and the
//! network selected through the `mainnet` / `devnet` / `localnet` features.

use tracing::warn;

use crate::{
    errors::{LedgerError, LedgerResult},
    field::FieldElement,
    state::{
        COMMITMENT_TREE_HEIGHT, MAX_ROOT_HISTORY_WINDOW, MAX_TREE_HEIGHT, ROOT_HISTORY_WINDOW,
        ZERO_VALUE,
    },
};

/// Runtime parameters of one ledger instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Height of the commitment tree, `1..=32`
    pub tree_height: u8,
    /// Number of prior roots accepted besides the current one, at least 1
    pub root_history_window: u32,
    /// Empty leaf value
    pub zero_value: FieldElement,
    /// Network identifier embedded in note strings
    pub network_id: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            tree_height: COMMITMENT_TREE_HEIGHT,
            root_history_window: ROOT_HISTORY_WINDOW,
            zero_value: ZERO_VALUE,
            network_id: blender_network_ids::NETWORK_ID,
        }
    }
}

impl LedgerConfig {
    /// Override the tree height.
    pub fn with_tree_height(mut self, tree_height: u8) -> Self {
        self.tree_height = tree_height;
        self
    }

    /// Override the root history window.
    pub fn with_root_history_window(mut self, window: u32) -> Self {
        self.root_history_window = window;
        self
    }

    /// Override the network identifier.
    pub fn with_network_id(mut self, network_id: u64) -> Self {
        self.network_id = network_id;
        self
    }

    /// Check every parameter is in range.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the height, window or zero value is out of range.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.tree_height == 0 || self.tree_height > MAX_TREE_HEIGHT {
            warn!(tree_height = self.tree_height, "config: tree height out of range");
            return Err(LedgerError::InvalidConfig);
        }
        if self.root_history_window == 0 || self.root_history_window > MAX_ROOT_HISTORY_WINDOW {
            warn!(
                root_history_window = self.root_history_window,
                "config: root history window out of range"
            );
            return Err(LedgerError::InvalidConfig);
        }
        if !self.zero_value.is_canonical() {
            warn!("config: zero value not canonical");
            return Err(LedgerError::InvalidConfig);
        }
        Ok(())
    }
}
