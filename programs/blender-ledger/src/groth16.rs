//! Groth16 pairing check over BN254 via the alt_bn128 syscall interface.
//!
//! Points use the big-endian EIP-197 layout: G1 is `x || y` (64 bytes), G2 is
//! `x_im || x_re || y_im || y_re` (128 bytes). Compressed points are 32 and
//! 64 bytes.
//!
//! ```text
//! proof bytes ──► ProofPoints::from_bytes ──► (-A, B, C)
//!                                                 │
//! public inputs ──► fold_public_inputs ──► L      │
//!                                          ▼      ▼
//!        e(-A, B) · e(L, gamma) · e(C, delta) · e(alpha, beta) == 1
//! ```

use crate::errors::Groth16Error;
use num_bigint::BigUint;
use solana_bn254::compression::prelude::{alt_bn128_g1_decompress, alt_bn128_g2_decompress};
use solana_bn254::prelude::{
    alt_bn128_g1_addition_be, alt_bn128_g1_multiplication_be, alt_bn128_pairing_be,
};

use crate::field::FieldElement;

/// BN254 base field modulus (q), the coordinate field of G1.
/// q = 21888242871839275222246405745257275088696311157297823662689037894645226208583
const BASE_FIELD_MODULUS: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x97, 0x81, 0x6a, 0x91, 0x68, 0x71, 0xca, 0x8d, 0x3c, 0x20, 0x8c, 0x16, 0xd8, 0x7c, 0xfd, 0x47,
];

/// Size of a compressed proof: A (32) || B (64) || C (32).
pub const COMPRESSED_PROOF_LEN: usize = 128;

/// Size of an uncompressed proof: A (64) || B (128) || C (64).
pub const UNCOMPRESSED_PROOF_LEN: usize = 256;

/// Verifying key points, borrowed from their owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifyingKey<'a> {
    /// `alpha` in G1
    pub alpha_g1: &'a [u8; 64],
    /// `beta` in G2
    pub beta_g2: &'a [u8; 128],
    /// `gamma` in G2, paired with the folded inputs
    pub gamma_g2: &'a [u8; 128],
    /// `delta` in G2, paired with C
    pub delta_g2: &'a [u8; 128],
    /// `IC[0]` followed by one point per public input
    pub ic: &'a [[u8; 64]],
}

/// Uncompressed proof points with A already negated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofPoints {
    /// `-A` in G1
    pub neg_a: [u8; 64],
    /// `B` in G2
    pub b: [u8; 128],
    /// `C` in G1
    pub c: [u8; 64],
}

impl ProofPoints {
    /// Parse a compressed (128-byte) or uncompressed (256-byte) proof.
    ///
    /// # Errors
    /// - `InvalidG1Length` for any other length
    /// - `InvalidG1` / `InvalidG2` if a point fails to decompress or has an
    ///   unreduced coordinate
    pub fn from_bytes(proof: &[u8]) -> Result<Self, Groth16Error> {
        match proof.len() {
            COMPRESSED_PROOF_LEN => Self::from_compressed(proof),
            UNCOMPRESSED_PROOF_LEN => Self::from_uncompressed(proof),
            _ => Err(Groth16Error::InvalidG1Length),
        }
    }

    fn from_compressed(proof: &[u8]) -> Result<Self, Groth16Error> {
        let (a, rest) = proof.split_at(32);
        let (b, c) = rest.split_at(64);

        let a = alt_bn128_g1_decompress(a).map_err(|_| Groth16Error::InvalidG1)?;
        let b = alt_bn128_g2_decompress(b).map_err(|_| Groth16Error::InvalidG2)?;
        let c = alt_bn128_g1_decompress(c).map_err(|_| Groth16Error::InvalidG1)?;

        Ok(Self {
            neg_a: negate_g1(&a)?,
            b,
            c,
        })
    }

    fn from_uncompressed(proof: &[u8]) -> Result<Self, Groth16Error> {
        let (a, rest) = proof.split_at(64);
        let (b, c) = rest.split_at(128);

        let a: [u8; 64] = a.try_into().map_err(|_| Groth16Error::InvalidG1Length)?;
        Ok(Self {
            neg_a: negate_g1(&a)?,
            b: b.try_into().map_err(|_| Groth16Error::InvalidG2Length)?,
            c: c.try_into().map_err(|_| Groth16Error::InvalidG1Length)?,
        })
    }
}

/// Fold the public inputs into `L = IC[0] + sum(input_i * IC[i + 1])`.
///
/// # Errors
/// - `InvalidPublicInputsLength` unless `ic` has one point more than `inputs`
/// - `PublicInputGreaterThanFieldSize` for an input `>= r`
/// - `PreparingInputsG1MulFailed` / `PreparingInputsG1AdditionFailed` if the
///   curve operations fail
pub fn fold_public_inputs(
    ic: &[[u8; 64]],
    inputs: &[[u8; 32]],
) -> Result<[u8; 64], Groth16Error> {
    let Some((base, points)) = ic.split_first() else {
        return Err(Groth16Error::InvalidPublicInputsLength);
    };
    if points.len() != inputs.len() {
        return Err(Groth16Error::InvalidPublicInputsLength);
    }

    points
        .iter()
        .zip(inputs)
        .try_fold(*base, |acc, (point, input)| {
            if !FieldElement(*input).is_canonical() {
                return Err(Groth16Error::PublicInputGreaterThanFieldSize);
            }
            let term = alt_bn128_g1_multiplication_be(&[&point[..], &input[..]].concat())
                .map_err(|_| Groth16Error::PreparingInputsG1MulFailed)?;
            alt_bn128_g1_addition_be(&[&term[..], &acc[..]].concat())
                .map_err(|_| Groth16Error::PreparingInputsG1AdditionFailed)?
                .as_slice()
                .try_into()
                .map_err(|_| Groth16Error::PreparingInputsG1AdditionFailed)
        })
}

/// Check `proof` against `vk` for `inputs`.
///
/// # Errors
/// `ProofVerificationFailed` if the pairing product is not one, otherwise
/// as [`fold_public_inputs`].
pub fn verify(
    vk: &VerifyingKey<'_>,
    proof: &ProofPoints,
    inputs: &[[u8; 32]],
) -> Result<(), Groth16Error> {
    let folded = fold_public_inputs(vk.ic, inputs)?;

    let pairs: [&[u8]; 8] = [
        &proof.neg_a,
        &proof.b,
        &folded,
        vk.gamma_g2,
        &proof.c,
        vk.delta_g2,
        vk.alpha_g1,
        vk.beta_g2,
    ];
    let product = alt_bn128_pairing_be(&pairs.concat())
        .map_err(|_| Groth16Error::ProofVerificationFailed)?;

    // The syscall returns 1 as a 32-byte big-endian word on success.
    match product.split_last() {
        Some((1, high)) if high.iter().all(|b| *b == 0) => Ok(()),
        _ => Err(Groth16Error::ProofVerificationFailed),
    }
}

/// Negate a G1 point: (x, y) -> (x, q - y), with the point at infinity fixed.
///
/// # Errors
/// Returns `InvalidG1` if `y` is not reduced modulo q.
pub fn negate_g1(point: &[u8; 64]) -> Result<[u8; 64], Groth16Error> {
    let (x, y) = point.split_at(32);
    if y >= &BASE_FIELD_MODULUS[..] {
        return Err(Groth16Error::InvalidG1);
    }

    let mut negated = [0u8; 64];
    negated[..32].copy_from_slice(x);
    let y = BigUint::from_bytes_be(y);
    if y != BigUint::from(0u32) {
        let neg_y = (BigUint::from_bytes_be(&BASE_FIELD_MODULUS) - y).to_bytes_be();
        negated[64 - neg_y.len()..].copy_from_slice(&neg_y);
    }
    Ok(negated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_with_y(y: &BigUint) -> [u8; 64] {
        let bytes = y.to_bytes_be();
        let mut point = [0u8; 64];
        point[31] = 1;
        point[64 - bytes.len()..].copy_from_slice(&bytes);
        point
    }

    #[test]
    fn test_negate_zero_y_is_fixed() {
        let point = point_with_y(&BigUint::from(0u32));
        assert_eq!(negate_g1(&point).unwrap(), point);
    }

    #[test]
    fn test_negate_one_is_q_minus_one() {
        let q = BigUint::from_bytes_be(&BASE_FIELD_MODULUS);
        let negated = negate_g1(&point_with_y(&BigUint::from(1u32))).unwrap();
        assert_eq!(negated, point_with_y(&(q - BigUint::from(1u32))));
    }

    #[test]
    fn test_negate_twice_is_identity() {
        let point = point_with_y(&BigUint::from(2u32));
        let negated = negate_g1(&point).unwrap();
        assert_eq!(&negated[..32], &point[..32], "x is unchanged");
        assert_eq!(negate_g1(&negated).unwrap(), point);
    }

    #[test]
    fn test_negate_rejects_unreduced_y() {
        let mut point = [0u8; 64];
        point[32..].copy_from_slice(&BASE_FIELD_MODULUS);
        assert_eq!(negate_g1(&point), Err(Groth16Error::InvalidG1));
    }

    #[test]
    fn test_proof_length_dispatch() {
        assert_eq!(
            ProofPoints::from_bytes(&[0u8; 200]),
            Err(Groth16Error::InvalidG1Length)
        );

        let mut proof = [0u8; UNCOMPRESSED_PROOF_LEN];
        proof[63] = 2;
        proof[64] = 9;
        proof[255] = 5;
        let points = ProofPoints::from_bytes(&proof).unwrap();
        assert_eq!(points.b[0], 9);
        assert_eq!(points.c[63], 5);
        assert_ne!(points.neg_a[63], 2, "A is negated");
    }

    #[test]
    fn test_fold_checks_input_count() {
        let ic = [[0u8; 64]; 3];
        assert_eq!(
            fold_public_inputs(&ic, &[[0u8; 32]; 1]),
            Err(Groth16Error::InvalidPublicInputsLength)
        );
        assert_eq!(
            fold_public_inputs(&[], &[]),
            Err(Groth16Error::InvalidPublicInputsLength)
        );
    }

    #[test]
    fn test_fold_rejects_unreduced_input() {
        let ic = [[0u8; 64]; 2];
        assert_eq!(
            fold_public_inputs(&ic, &[[0xff; 32]]),
            Err(Groth16Error::PublicInputGreaterThanFieldSize)
        );
    }

    #[test]
    fn test_fold_without_inputs_is_base_point() {
        let mut base = [0u8; 64];
        base[31] = 1;
        base[63] = 2;
        assert_eq!(fold_public_inputs(&[base], &[]), Ok(base));
    }
}
