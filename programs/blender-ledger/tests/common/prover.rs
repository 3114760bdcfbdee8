//! Simulated proof system.
//!
//! The "proof" carries the witness in the clear:
//!
//! ```text
//! [note payload: 124 bytes][leaf_index: u64 LE][siblings: 32 bytes × height]
//! ```
//!
//! The verifier recomputes what the circuit would constrain: the nullifier
//! hash and asset fields derive from the note, and the note's commitment
//! recombines with the siblings to the claimed root. It accepts exactly the
//! statements a sound circuit would, without any zero knowledge.

use blender_ledger::{
    FieldElement, Note, ProofVerifier, PublicSignals,
    client::SpendWitness,
    hasher::Poseidon,
    merkle_tree::AuthenticationPath,
    note::NOTE_PAYLOAD_BYTES,
};

/// Builds simulated proofs from client witnesses.
pub struct SimulatedProver;

impl SimulatedProver {
    /// Proof for `witness`.
    pub fn prove(witness: &SpendWitness) -> Vec<u8> {
        Self::prove_raw(&witness.note, &witness.path)
    }

    /// Proof claiming `note` sits at the end of `path`.
    pub fn prove_raw(note: &Note, path: &AuthenticationPath) -> Vec<u8> {
        let mut proof = note.encode().expect("note encodes").to_vec();
        proof.extend_from_slice(&path.leaf_index.to_le_bytes());
        for sibling in &path.siblings {
            proof.extend_from_slice(sibling.as_bytes());
        }
        proof
    }
}

/// Verifier for [`SimulatedProver`] proofs on a tree of `height`.
#[derive(Clone, Copy, Debug)]
pub struct SimulatedVerifier {
    pub height: usize,
}

impl SimulatedVerifier {
    pub fn new(height: u8) -> Self {
        Self {
            height: height as usize,
        }
    }

    fn check(&self, proof: &[u8], signals: &PublicSignals) -> Option<bool> {
        if proof.len() != NOTE_PAYLOAD_BYTES + 8 + 32 * self.height {
            return Some(false);
        }
        let (payload, rest) = proof.split_at(NOTE_PAYLOAD_BYTES);
        let (index_bytes, sibling_bytes) = rest.split_at(8);

        let note = Note::decode(payload).ok()?;
        let leaf_index = u64::from_le_bytes(index_bytes.try_into().ok()?);
        let siblings: Vec<FieldElement> = sibling_bytes
            .chunks_exact(32)
            .map(|chunk| FieldElement(chunk.try_into().expect("32-byte chunk")))
            .collect();
        let path = AuthenticationPath {
            leaf_index,
            directions: (0..self.height).map(|i| (leaf_index >> i) & 1 == 1).collect(),
            siblings,
        };

        let commitment = note.commitment().ok()?;
        Some(
            note.nullifier_hash().ok()? == signals.nullifier_hash
                && note.asset_address == signals.asset_address
                && note.asset_id == signals.asset_id
                && path.verifies::<Poseidon>(&commitment, &signals.root),
        )
    }
}

impl ProofVerifier for SimulatedVerifier {
    fn verify(&self, proof: &[u8], public_signals: &PublicSignals) -> bool {
        self.check(proof, public_signals).unwrap_or(false)
    }
}
