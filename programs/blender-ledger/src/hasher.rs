//! Field hashing for tree nodes, commitments and nullifier hashes.
//!
//! All hashing is circom-compatible Poseidon over the BN254 scalar field, so
//! values computed here match the ones the external circuit recomputes
//! inside the proof.

use ark_bn254::Fr;
use light_poseidon::{Poseidon as PoseidonSponge, PoseidonBytesHasher};
use tracing::warn;

use crate::{
    errors::{LedgerError, LedgerResult},
    field::FieldElement,
};

/// A hash function over field elements.
///
/// The two-input form is the tree's compression function and must be
/// order-sensitive: `hash(&[a, b]) != hash(&[b, a])` for `a != b`.
pub trait FieldHasher {
    /// Hash an ordered list of field elements.
    ///
    /// # Errors
    /// Returns `HashFailure` if the inputs are rejected (wrong arity or
    /// non-canonical values).
    fn hashv(inputs: &[FieldElement]) -> LedgerResult<FieldElement>;

    /// Tree compression: hash of a left and a right child.
    ///
    /// # Errors
    /// Returns `HashFailure` if either child is not canonical.
    fn hash_left_right(left: &FieldElement, right: &FieldElement) -> LedgerResult<FieldElement> {
        Self::hashv(&[*left, *right])
    }
}

/// Circom-compatible Poseidon (x^5 S-box, BN254 parameters).
#[derive(Clone, Copy, Debug, Default)]
pub struct Poseidon;

impl FieldHasher for Poseidon {
    fn hashv(inputs: &[FieldElement]) -> LedgerResult<FieldElement> {
        if inputs.iter().any(|fe| !fe.is_canonical()) {
            warn!("poseidon: non-canonical input");
            return Err(LedgerError::HashFailure);
        }
        let mut sponge = PoseidonSponge::<Fr>::new_circom(inputs.len()).map_err(|_| {
            warn!(arity = inputs.len(), "poseidon: unsupported arity");
            LedgerError::HashFailure
        })?;
        let slices: Vec<&[u8]> = inputs.iter().map(|fe| fe.as_bytes().as_slice()).collect();
        let out = sponge.hash_bytes_be(&slices).map_err(|_| {
            warn!("poseidon: input rejected");
            LedgerError::HashFailure
        })?;
        Ok(FieldElement(out))
    }
}

/// Note commitment: `H(nullifier, assetAddress, assetId, secret)`.
///
/// # Errors
/// Returns `HashFailure` if any input is not canonical.
pub fn note_commitment<H: FieldHasher>(
    nullifier: &FieldElement,
    asset_address: &FieldElement,
    asset_id: &FieldElement,
    secret: &FieldElement,
) -> LedgerResult<FieldElement> {
    H::hashv(&[*nullifier, *asset_address, *asset_id, *secret])
}

/// Public nullifier hash: `H(nullifier, assetAddress, assetId)`.
///
/// Leaves out the secret so it can be disclosed at spend time without
/// revealing which commitment is being spent.
///
/// # Errors
/// Returns `HashFailure` if any input is not canonical.
pub fn nullifier_hash<H: FieldHasher>(
    nullifier: &FieldElement,
    asset_address: &FieldElement,
    asset_id: &FieldElement,
) -> LedgerResult<FieldElement> {
    H::hashv(&[*nullifier, *asset_address, *asset_id])
}

/// Empty-subtree hashes: `zeros[0] = zero_value`,
/// `zeros[k] = H(zeros[k-1], zeros[k-1])`, for `k` in `0..=height`.
///
/// # Errors
/// Returns `HashFailure` if `zero_value` is not canonical.
pub fn zero_hashes<H: FieldHasher>(
    zero_value: &FieldElement,
    height: u8,
) -> LedgerResult<Vec<FieldElement>> {
    let mut zeros = Vec::with_capacity(height as usize + 1);
    let mut current = *zero_value;
    zeros.push(current);
    for _ in 0..height {
        current = H::hash_left_right(&current, &current)?;
        zeros.push(current);
    }
    Ok(zeros)
}
