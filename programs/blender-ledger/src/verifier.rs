//! Proof verification seam.
//!
//! The ledger never sees the circuit. It hands the raw proof bytes and the
//! ten public signals to a [`ProofVerifier`] and acts on the boolean answer.
//! [`Groth16ProofVerifier`] is the production adapter: a BN254 Groth16 check
//! against a verifying key exported by snarkjs.

use tracing::warn;
use serde::Deserialize;

use crate::{
    errors::{LedgerError, LedgerResult},
    field::FieldElement,
    groth16::{self, ProofPoints, UNCOMPRESSED_PROOF_LEN, VerifyingKey},
    public_signals::{N_PUBLIC_SIGNALS, PUBLIC_SIGNALS_VERSION, PublicSignals},
};

/// Accept/reject oracle for spend proofs.
pub trait ProofVerifier {
    /// Public-signal schema this verifier was built for.
    fn schema_version(&self) -> u16 {
        PUBLIC_SIGNALS_VERSION
    }

    /// Whether `proof` is valid for `public_signals`.
    fn verify(&self, proof: &[u8], public_signals: &PublicSignals) -> bool;
}

impl<T: ProofVerifier + ?Sized> ProofVerifier for &T {
    fn schema_version(&self) -> u16 {
        (**self).schema_version()
    }

    fn verify(&self, proof: &[u8], public_signals: &PublicSignals) -> bool {
        (**self).verify(proof, public_signals)
    }
}

impl<T: ProofVerifier + ?Sized> ProofVerifier for Box<T> {
    fn schema_version(&self) -> u16 {
        (**self).schema_version()
    }

    fn verify(&self, proof: &[u8], public_signals: &PublicSignals) -> bool {
        (**self).verify(proof, public_signals)
    }
}

/// Groth16 verifier over BN254 with an owned verifying key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Groth16ProofVerifier {
    alpha_g1: [u8; 64],
    beta_g2: [u8; 128],
    gamma_g2: [u8; 128],
    delta_g2: [u8; 128],
    ic: Vec<[u8; 64]>,
}

impl Groth16ProofVerifier {
    /// Build from raw EIP-197 points.
    ///
    /// # Errors
    /// Returns `InvalidVerifyingKey` unless `ic` holds one point per public
    /// signal plus one.
    pub fn new(
        alpha_g1: [u8; 64],
        beta_g2: [u8; 128],
        gamma_g2: [u8; 128],
        delta_g2: [u8; 128],
        ic: Vec<[u8; 64]>,
    ) -> LedgerResult<Self> {
        if ic.len() != N_PUBLIC_SIGNALS + 1 {
            warn!(points = ic.len(), "verifying key: wrong ic length");
            return Err(LedgerError::InvalidVerifyingKey);
        }
        Ok(Self {
            alpha_g1,
            beta_g2,
            gamma_g2,
            delta_g2,
            ic,
        })
    }

    /// Load a snarkjs `verification_key.json`.
    ///
    /// # Errors
    /// Returns `InvalidVerifyingKey` on malformed JSON, a curve other than
    /// bn128, a wrong public input count or unparseable coordinates.
    pub fn from_snarkjs_json(json: &str) -> LedgerResult<Self> {
        let vk: SnarkjsVerifyingKey =
            serde_json::from_str(json).map_err(|_| LedgerError::InvalidVerifyingKey)?;
        if vk.protocol != "groth16" || vk.curve != "bn128" || vk.n_public != N_PUBLIC_SIGNALS {
            return Err(LedgerError::InvalidVerifyingKey);
        }
        let ic = vk
            .ic
            .iter()
            .map(|point| g1_from_strings(point))
            .collect::<LedgerResult<Vec<_>>>()?;
        Self::new(
            g1_from_strings(&vk.vk_alpha_1)?,
            g2_from_strings(&vk.vk_beta_2)?,
            g2_from_strings(&vk.vk_gamma_2)?,
            g2_from_strings(&vk.vk_delta_2)?,
            ic,
        )
    }

    fn key(&self) -> VerifyingKey<'_> {
        VerifyingKey {
            alpha_g1: &self.alpha_g1,
            beta_g2: &self.beta_g2,
            gamma_g2: &self.gamma_g2,
            delta_g2: &self.delta_g2,
            ic: &self.ic,
        }
    }
}

impl ProofVerifier for Groth16ProofVerifier {
    fn verify(&self, proof: &[u8], public_signals: &PublicSignals) -> bool {
        let result = ProofPoints::from_bytes(proof).and_then(|points| {
            groth16::verify(&self.key(), &points, &public_signals.to_be_bytes())
        });

        match result {
            Ok(()) => true,
            Err(e) => {
                let name: &'static str = e.into();
                warn!(error = name, "groth16: proof rejected");
                false
            }
        }
    }
}

#[derive(Deserialize)]
struct SnarkjsVerifyingKey {
    protocol: String,
    curve: String,
    #[serde(rename = "nPublic")]
    n_public: usize,
    vk_alpha_1: Vec<String>,
    vk_beta_2: Vec<Vec<String>>,
    vk_gamma_2: Vec<Vec<String>>,
    vk_delta_2: Vec<Vec<String>>,
    #[serde(rename = "IC")]
    ic: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct SnarkjsProof {
    pi_a: Vec<String>,
    pi_b: Vec<Vec<String>>,
    pi_c: Vec<String>,
}

/// Convert a snarkjs `proof.json` into the 256-byte uncompressed proof the
/// verifier accepts.
///
/// # Errors
/// Returns `ProofVerificationFailed` if the JSON or any coordinate is malformed.
pub fn proof_from_snarkjs_json(json: &str) -> LedgerResult<[u8; UNCOMPRESSED_PROOF_LEN]> {
    let proof: SnarkjsProof =
        serde_json::from_str(json).map_err(|_| LedgerError::ProofVerificationFailed)?;
    let invalid = |_| LedgerError::ProofVerificationFailed;

    let mut out = [0u8; UNCOMPRESSED_PROOF_LEN];
    out[..64].copy_from_slice(&g1_from_strings(&proof.pi_a).map_err(invalid)?);
    out[64..192].copy_from_slice(&g2_from_strings(&proof.pi_b).map_err(invalid)?);
    out[192..].copy_from_slice(&g1_from_strings(&proof.pi_c).map_err(invalid)?);
    Ok(out)
}

/// Decimal coordinate to 32 big-endian bytes. Base field coordinates may
/// exceed the scalar modulus, so only the 256-bit width is enforced here.
fn coordinate(value: &str) -> LedgerResult<[u8; 32]> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::InvalidVerifyingKey);
    }
    let parsed = num_bigint::BigUint::parse_bytes(value.as_bytes(), 10)
        .ok_or(LedgerError::InvalidVerifyingKey)?;
    FieldElement::from_biguint(&parsed)
        .map(FieldElement::to_be_bytes)
        .ok_or(LedgerError::InvalidVerifyingKey)
}

/// snarkjs G1: `[x, y, "1"]` in affine projective form.
fn g1_from_strings(point: &[String]) -> LedgerResult<[u8; 64]> {
    let [x, y, ..] = point else {
        return Err(LedgerError::InvalidVerifyingKey);
    };
    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&coordinate(x)?);
    out[32..].copy_from_slice(&coordinate(y)?);
    Ok(out)
}

/// snarkjs G2: `[[x_re, x_im], [y_re, y_im], ["1", "0"]]`, emitted here
/// imaginary part first.
fn g2_from_strings(point: &[Vec<String>]) -> LedgerResult<[u8; 128]> {
    let [x, y, ..] = point else {
        return Err(LedgerError::InvalidVerifyingKey);
    };
    let ([x_re, x_im, ..], [y_re, y_im, ..]) = (x.as_slice(), y.as_slice()) else {
        return Err(LedgerError::InvalidVerifyingKey);
    };
    let mut out = [0u8; 128];
    out[..32].copy_from_slice(&coordinate(x_im)?);
    out[32..64].copy_from_slice(&coordinate(x_re)?);
    out[64..96].copy_from_slice(&coordinate(y_im)?);
    out[96..].copy_from_slice(&coordinate(y_re)?);
    Ok(out)
}
