//! Error types for the Blender ledger.
//!
//! # Error Code Ranges
//!
//! | Range | Category | Description |
//! |-------|----------|-------------|
//! | 0-5 | Protocol | Failures every client is expected to handle |
//! | 6-19 | Validation | Malformed requests rejected before any state change |
//! | 20-29 | Environment | Configuration, custody layer and replay failures |
//! | 100-108 | Groth16 | ZK proof verification failures |
//!
//! # Error Code Reference
//!
//! ## Protocol Errors (0-5)
//! - 0: InvalidNoteFormat
//! - 1: TreeFull
//! - 2: UnknownRoot (retryable with a fresh proof)
//! - 3: NullifierAlreadySpent
//! - 4: ProofVerificationFailed
//! - 5: AssetCustodyMismatch
//!
//! ## Validation Errors (6-19)
//! - 6: NonCanonicalFieldElement
//! - 7: DuplicateCommitment
//! - 8: InvalidPublicSignals
//! - 9: InvalidFee
//! - 10: InvalidLockValue
//! - 11: AssetAlreadyInCustody
//! - 12: AssetIdOutOfRange
//! - 13: UnknownCommitment
//! - 14: LeafIndexOutOfRange
//!
//! ## Environment Errors (20-29)
//! - 20: CustodyLayerFailure
//! - 21: SchemaVersionMismatch
//! - 22: InvalidConfig
//! - 23: HashFailure
//! - 24: ReplayMismatch
//! - 25: ArithmeticOverflow
//! - 26: InvalidVerifyingKey
//! - 27: InvalidEventData
//!
//! ## Groth16 ZK Proof Errors (100-108)
//! - 100: InvalidG1Length
//! - 101: InvalidG2Length
//! - 102: InvalidPublicInputsLength
//! - 103: PublicInputGreaterThanFieldSize
//! - 104: PreparingInputsG1MulFailed
//! - 105: PreparingInputsG1AdditionFailed
//! - 106: ProofVerificationFailed
//! - 107: InvalidG1
//! - 108: InvalidG2

use core::fmt;

use blender_custody_interface::CustodyError;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Groth16 ZK proof verification errors.
///
/// These errors use codes 100-108 and indicate failures during ZK proof
/// verification. They are useful for debugging proof generation issues.
#[repr(u32)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, IntoPrimitive, TryFromPrimitive, strum::IntoStaticStr)]
pub enum Groth16Error {
    InvalidG1Length = 100,
    InvalidG2Length = 101,
    InvalidPublicInputsLength = 102,
    PublicInputGreaterThanFieldSize = 103,
    PreparingInputsG1MulFailed = 104,
    PreparingInputsG1AdditionFailed = 105,
    ProofVerificationFailed = 106,
    /// G1 point decompression or deserialization failed
    InvalidG1 = 107,
    /// G2 point decompression failed
    InvalidG2 = 108,
}

/// Errors returned by every ledger operation.
///
/// A transition that returns any of these has left the ledger untouched.
#[repr(u32)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, IntoPrimitive, TryFromPrimitive, strum::IntoStaticStr)]
pub enum LedgerError {
    // Protocol errors
    /// Note string or payload is malformed
    InvalidNoteFormat = 0,
    /// Commitment tree has no free leaf left
    TreeFull = 1,
    /// Proof references a root outside the retained history
    UnknownRoot = 2,
    /// Nullifier hash was already retired
    NullifierAlreadySpent = 3,
    /// Proof verifier rejected the proof
    ProofVerificationFailed = 4,
    /// Asset named by the proof is not the one held in custody
    AssetCustodyMismatch = 5,
    // Validation errors
    /// Value is not reduced below the BN254 scalar field modulus
    NonCanonicalFieldElement = 6,
    /// Commitment is already a leaf of the tree
    DuplicateCommitment = 7,
    /// Public signals have the wrong shape or inconsistent flags
    InvalidPublicSignals = 8,
    /// Fee does not fit, or is paid to no relayer
    InvalidFee = 9,
    /// Deposit lock value is not exactly one unit
    InvalidLockValue = 10,
    /// Unique asset is already held in custody
    AssetAlreadyInCustody = 11,
    /// Asset id does not fit the 31-byte note encoding
    AssetIdOutOfRange = 12,
    /// Commitment was never recorded by the ledger
    UnknownCommitment = 13,
    /// Leaf index is beyond the current leaf count
    LeafIndexOutOfRange = 14,
    // Environment errors
    /// Custody layer refused the lock or release instruction
    CustodyLayerFailure = 20,
    /// Proof verifier speaks a different public-signal schema
    SchemaVersionMismatch = 21,
    /// Ledger configuration is out of range
    InvalidConfig = 22,
    /// Poseidon hashing failed
    HashFailure = 23,
    /// Event log does not reproduce the recorded state
    ReplayMismatch = 24,
    /// Counter overflow
    ArithmeticOverflow = 25,
    /// Verifying key file is malformed
    InvalidVerifyingKey = 26,
    /// Event record is truncated or carries an unknown discriminator
    InvalidEventData = 27,
}

impl LedgerError {
    /// Stable numeric code of this error.
    pub fn code(self) -> u32 {
        self.into()
    }

    /// Static variant name, used in log lines.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Whether resubmitting with a freshly built proof can succeed.
    ///
    /// Only a stale root is expected to be retried; every other error is
    /// terminal for the submission that produced it.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::UnknownRoot)
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InvalidNoteFormat => "invalid note format",
            Self::TreeFull => "commitment tree is full",
            Self::UnknownRoot => "unknown merkle root",
            Self::NullifierAlreadySpent => "nullifier already spent",
            Self::ProofVerificationFailed => "proof verification failed",
            Self::AssetCustodyMismatch => "asset does not match custody record",
            Self::NonCanonicalFieldElement => "field element is not canonical",
            Self::DuplicateCommitment => "commitment already in tree",
            Self::InvalidPublicSignals => "invalid public signals",
            Self::InvalidFee => "invalid relayer fee",
            Self::InvalidLockValue => "lock value must be exactly one unit",
            Self::AssetAlreadyInCustody => "asset already in custody",
            Self::AssetIdOutOfRange => "asset id does not fit in 31 bytes",
            Self::UnknownCommitment => "unknown commitment",
            Self::LeafIndexOutOfRange => "leaf index out of range",
            Self::CustodyLayerFailure => "custody layer refused the instruction",
            Self::SchemaVersionMismatch => "public signal schema version mismatch",
            Self::InvalidConfig => "invalid ledger configuration",
            Self::HashFailure => "poseidon hash failure",
            Self::ReplayMismatch => "event log does not match replayed state",
            Self::ArithmeticOverflow => "arithmetic overflow",
            Self::InvalidVerifyingKey => "invalid verifying key",
            Self::InvalidEventData => "malformed event record",
        };
        write!(f, "{msg} (code {})", self.code())
    }
}

impl std::error::Error for LedgerError {}

impl fmt::Display for Groth16Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &'static str = self.into();
        write!(f, "groth16 error {name} (code {})", u32::from(*self))
    }
}

impl std::error::Error for Groth16Error {}

impl From<Groth16Error> for LedgerError {
    fn from(error: Groth16Error) -> Self {
        match error {
            Groth16Error::ProofVerificationFailed
            | Groth16Error::InvalidG1
            | Groth16Error::InvalidG2
            | Groth16Error::InvalidG1Length
            | Groth16Error::InvalidG2Length
            | Groth16Error::PreparingInputsG1MulFailed
            | Groth16Error::PreparingInputsG1AdditionFailed => LedgerError::ProofVerificationFailed,
            Groth16Error::InvalidPublicInputsLength
            | Groth16Error::PublicInputGreaterThanFieldSize => LedgerError::InvalidPublicSignals,
        }
    }
}

impl From<CustodyError> for LedgerError {
    fn from(_: CustodyError) -> Self {
        LedgerError::CustodyLayerFailure
    }
}

/// Result alias used throughout the crate.
pub type LedgerResult<T> = Result<T, LedgerError>;
