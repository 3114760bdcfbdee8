//! Ledger transitions.
//!
//! ```text
//! instructions/
//! ├── deposit      - Append a commitment and lock the asset
//! └── spend/
//!     ├── mod      - Transfer and withdraw handler
//!     ├── validators - Public-signal checks
//!     └── fee      - Relayer fee checks
//! ```
//!
//! Every handler runs a validation phase that reads state only, then an
//! execution phase that cannot fail after its first ledger write. The only
//! fallible effect of the execution phase is the custody call, which runs
//! before any ledger mutation.

mod deposit;
mod spend;

pub use deposit::*;
pub use spend::*;

use blender_custody_interface::{Address, ZERO_ADDRESS};

/// Facts about the submission supplied by the settlement layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Block timestamp, recorded in events
    pub timestamp: i64,
    /// Account that submitted the transition
    pub caller: Address,
}

impl ExecutionContext {
    /// Context with the given timestamp and caller.
    pub fn new(timestamp: i64, caller: Address) -> Self {
        Self { timestamp, caller }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(0, ZERO_ADDRESS)
    }
}
