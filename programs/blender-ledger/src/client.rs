//! Client-side preparation of deposits and spends.
//!
//! These helpers run on the note holder's side against a read-only view of
//! the ledger state. They repeat the checks the ledger would make so that a
//! hopeless submission is caught before a proof is generated, and they lay
//! out the witness the external prover consumes.

use blender_custody_interface::{Address, AssetRef};
use rand::{CryptoRng, RngCore};

use crate::{
    errors::{LedgerError, LedgerResult},
    field::FieldElement,
    hasher::Poseidon,
    instructions::{DepositRequest, SpendRequest, validate_fee},
    merkle_tree::{AuthenticationPath, MerkleTree},
    note::{Note, NoteString},
    public_signals::PublicSignals,
    state::LedgerState,
};

/// A fresh note and the deposit call that commits to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedDeposit {
    /// Secret note material; the only way to ever spend the deposit
    pub note: Note,
    /// Note string to hand to the depositor
    pub note_string: String,
    /// Deposit call to submit
    pub request: DepositRequest,
}

/// Generate a note for `asset` and the matching deposit request.
///
/// # Errors
/// - `AssetIdOutOfRange` if the asset id needs more than 31 bytes
/// - `HashFailure` if hashing fails
pub fn prepare_deposit<R: RngCore + CryptoRng>(
    rng: &mut R,
    asset: &AssetRef,
    is_erc721: bool,
    network_id: u64,
) -> LedgerResult<PreparedDeposit> {
    let note = Note::generate(rng, asset)?;
    let commitment = note.commitment()?;
    let note_string = NoteString::new(note, network_id).render()?;
    Ok(PreparedDeposit {
        note,
        note_string,
        request: DepositRequest::new(commitment, *asset, is_erc721),
    })
}

/// What the spend should do with the note.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpendTarget {
    /// Release the asset to `recipient`, paying `fee` to `relayer`
    Withdraw {
        /// Account receiving the asset
        recipient: Address,
        /// Fee recipient, the zero address when `fee` is zero
        relayer: Address,
        /// Units withheld for the relayer
        fee: u128,
    },
    /// Re-commit the asset under `new_commitment`
    Transfer {
        /// Commitment of the receiver's fresh note
        new_commitment: FieldElement,
    },
}

/// Private and public inputs for the external prover.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpendWitness {
    /// Note being spent
    pub note: Note,
    /// Leaf index of the note's commitment
    pub leaf_index: u64,
    /// Root the path leads to
    pub root: FieldElement,
    /// Authentication path from the commitment to `root`
    pub path: AuthenticationPath,
    /// Public signals in schema order
    pub public_signals: PublicSignals,
}

impl SpendWitness {
    /// Spend call carrying `proof` for this witness.
    pub fn into_request(self, proof: Vec<u8>) -> SpendRequest {
        if self.public_signals.is_withdraw.is_zero() {
            let new_commitment = self.public_signals.new_commitment;
            SpendRequest::transfer(proof, self.public_signals, new_commitment)
        } else {
            SpendRequest::withdraw(proof, self.public_signals)
        }
    }
}

/// Build a spend witness against the current root.
///
/// # Errors
/// See [`prepare_spend_at`].
pub fn prepare_spend(
    state: &LedgerState,
    note: &Note,
    target: SpendTarget,
) -> LedgerResult<SpendWitness> {
    prepare_spend_at(state, note, target, state.tree.next_index())
}

/// Build a spend witness against the root the tree had at `leaf_count` leaves.
///
/// # Errors
/// - `UnknownCommitment` if the note's commitment is not a leaf at that point
/// - `NullifierAlreadySpent` if the note was already spent
/// - `AssetCustodyMismatch` if the note's asset is not in custody
/// - `InvalidPublicSignals` for a withdrawal without recipient or a transfer
///   without output
/// - `InvalidFee` for a fee without relayer
pub fn prepare_spend_at(
    state: &LedgerState,
    note: &Note,
    target: SpendTarget,
    leaf_count: u64,
) -> LedgerResult<SpendWitness> {
    let commitment = note.commitment()?;
    let leaf_index = state
        .tree
        .leaf_index(&commitment)
        .filter(|index| *index < leaf_count)
        .ok_or(LedgerError::UnknownCommitment)?;

    let nullifier_hash = note.nullifier_hash()?;
    if state.nullifiers.is_spent(&nullifier_hash) {
        return Err(LedgerError::NullifierAlreadySpent);
    }

    let asset = note.asset()?;
    let kind = state
        .custody
        .holding(&asset)
        .map(|holding| holding.kind)
        .ok_or(LedgerError::AssetCustodyMismatch)?;

    let path = MerkleTree::auth_path_at::<Poseidon>(&state.tree, leaf_index, leaf_count)?;
    let root = MerkleTree::root_at::<Poseidon>(&state.tree, leaf_count)?;

    let public_signals = match target {
        SpendTarget::Withdraw {
            recipient,
            relayer,
            fee,
        } => {
            if recipient == [0u8; 20] {
                return Err(LedgerError::InvalidPublicSignals);
            }
            validate_fee(&FieldElement::from_u128(fee), &relayer)?;
            PublicSignals::withdraw(root, nullifier_hash, &asset, kind, &recipient, &relayer, fee)
        }
        SpendTarget::Transfer { new_commitment } => {
            if new_commitment.is_zero() || !new_commitment.is_canonical() {
                return Err(LedgerError::InvalidPublicSignals);
            }
            PublicSignals::transfer(root, nullifier_hash, &asset, kind, new_commitment)
        }
    };

    Ok(SpendWitness {
        note: *note,
        leaf_index,
        root,
        path,
        public_signals,
    })
}
