//! BN254 scalar field elements in their canonical 32-byte big-endian form.
//!
//! Every commitment, nullifier hash, tree node and public signal is a
//! [`FieldElement`]. The ledger stores them as raw bytes and only converts to
//! an arithmetic representation at the hashing and pairing boundaries.

use core::fmt;

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use blender_custody_interface::Address;
use borsh::{BorshDeserialize, BorshSerialize};
use bytemuck::{Pod, Zeroable};
use num_bigint::BigUint;

/// BN254 scalar field modulus (r), big-endian.
/// r = 21888242871839275222246405745257275088548364400416034343698204186575808495617
pub const BN254_SCALAR_MODULUS: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x28, 0x33, 0xe8, 0x48, 0x79, 0xb9, 0x70, 0x91, 0x43, 0xe1, 0xf5, 0x93, 0xf0, 0x00, 0x00, 0x01,
];

/// A BN254 scalar field element, 32 bytes big-endian.
///
/// The wrapper does not enforce canonical form on construction; values coming
/// from untrusted input go through [`FieldElement::from_be_bytes_checked`] or
/// are checked with [`FieldElement::is_canonical`] before they reach state.
#[repr(transparent)]
#[derive(
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Pod,
    Zeroable,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct FieldElement(pub [u8; 32]);

impl FieldElement {
    /// The additive identity.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Embed a small integer.
    pub const fn from_u64(value: u64) -> Self {
        let be = value.to_be_bytes();
        let mut bytes = [0u8; 32];
        let mut i = 0;
        while i < 8 {
            bytes[24 + i] = be[i];
            i += 1;
        }
        Self(bytes)
    }

    /// Embed a 128-bit integer.
    pub fn from_u128(value: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[16..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Wrap raw big-endian bytes without a range check.
    pub const fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Wrap raw big-endian bytes, rejecting values `>= r`.
    ///
    /// # Errors
    /// Returns `NonCanonicalFieldElement` if the value is not reduced.
    pub fn from_be_bytes_checked(bytes: [u8; 32]) -> crate::errors::LedgerResult<Self> {
        let fe = Self(bytes);
        if !fe.is_canonical() {
            return Err(crate::errors::LedgerError::NonCanonicalFieldElement);
        }
        Ok(fe)
    }

    /// Raw big-endian bytes.
    pub const fn to_be_bytes(self) -> [u8; 32] {
        self.0
    }

    /// Borrow the raw big-endian bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether this is the zero element.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Whether the value is strictly below the scalar field modulus.
    pub fn is_canonical(&self) -> bool {
        // Lexicographic order of big-endian arrays equals numeric order.
        self.0 < BN254_SCALAR_MODULUS
    }

    /// Whether the value fits in the low `n` bytes (`value < 2^(8n)`).
    pub fn fits_in_bytes(&self, n: usize) -> bool {
        n >= 32 || self.0[..32 - n].iter().all(|b| *b == 0)
    }

    /// Parse a decimal string as produced by snarkjs and circom tooling.
    ///
    /// Returns `None` for empty input, non-digit characters or values `>= r`.
    pub fn from_decimal_str(s: &str) -> Option<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value = BigUint::parse_bytes(s.as_bytes(), 10)?;
        Self::from_biguint(&value).filter(Self::is_canonical)
    }

    /// Render as a decimal string.
    pub fn to_decimal_string(&self) -> String {
        BigUint::from_bytes_be(&self.0).to_str_radix(10)
    }

    /// Convert from a big integer, returning `None` when it exceeds 256 bits.
    pub fn from_biguint(value: &BigUint) -> Option<Self> {
        let bytes = value.to_bytes_be();
        if bytes.len() > 32 {
            return None;
        }
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(&bytes);
        Some(Self(out))
    }

    /// Arithmetic view of the element (reduced modulo r).
    pub fn to_fr(&self) -> Fr {
        Fr::from_be_bytes_mod_order(&self.0)
    }

    /// Canonical bytes of an arithmetic field element.
    pub fn from_fr(value: Fr) -> Self {
        let bytes = value.into_bigint().to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(&bytes);
        Self(out)
    }

    /// Embed a 20-byte address, right-aligned.
    pub fn from_address(address: &Address) -> Self {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(address);
        Self(bytes)
    }

    /// Extract a 20-byte address, or `None` if the value is wider than 160 bits.
    pub fn to_address(&self) -> Option<Address> {
        if !self.fits_in_bytes(20) {
            return None;
        }
        let mut address = [0u8; 20];
        address.copy_from_slice(&self.0[12..]);
        Some(address)
    }

    /// Extract a 128-bit integer, or `None` if the value is wider.
    pub fn to_u128(&self) -> Option<u128> {
        if !self.fits_in_bytes(16) {
            return None;
        }
        let mut be = [0u8; 16];
        be.copy_from_slice(&self.0[16..]);
        Some(u128::from_be_bytes(be))
    }
}

impl From<[u8; 32]> for FieldElement {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<FieldElement> for [u8; 32] {
    fn from(fe: FieldElement) -> Self {
        fe.0
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement(0x{})", hex::encode(self.0))
    }
}
