//! Custody error types.

use core::fmt;

/// Custody error codes shared across all custody implementations.
///
/// These error codes are returned by custody layers and can be matched by the
/// ledger or clients to understand failure reasons.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CustodyError {
    /// Asset is not held by the custody layer
    NotHeld = 0,

    /// Unique asset is already held
    AlreadyHeld = 1,

    /// Lock value is zero or not allowed for the asset kind
    InvalidLockValue = 2,

    /// Custody layer is frozen and refuses all movements
    Frozen = 3,

    /// Arithmetic overflow in balance bookkeeping
    ArithmeticOverflow = 4,

    /// Instruction kind does not match the held asset's kind
    KindMismatch = 5,
}

impl CustodyError {
    /// Convert to error code
    pub const fn to_u32(self) -> u32 {
        self as u32
    }

    /// Create from error code
    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::NotHeld),
            1 => Some(Self::AlreadyHeld),
            2 => Some(Self::InvalidLockValue),
            3 => Some(Self::Frozen),
            4 => Some(Self::ArithmeticOverflow),
            5 => Some(Self::KindMismatch),
            _ => None,
        }
    }
}

impl fmt::Display for CustodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NotHeld => "asset is not held in custody",
            Self::AlreadyHeld => "unique asset is already held in custody",
            Self::InvalidLockValue => "invalid lock value",
            Self::Frozen => "custody layer is frozen",
            Self::ArithmeticOverflow => "custody balance overflow",
            Self::KindMismatch => "asset kind mismatch",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for CustodyError {}
