//! Compliance reports.
//!
//! A note holder can voluntarily disclose the history of one note: where its
//! commitment came from and how its nullifier was retired. The report is
//! built from the public event log plus the note, so anyone given the note
//! can check it independently.

use blender_custody_interface::{Address, AssetRef};

use crate::{
    errors::{LedgerError, LedgerResult},
    events::LedgerEvent,
    field::FieldElement,
    note::Note,
};

/// How a commitment entered the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// Deposited from the settlement layer
    Deposit {
        /// Leaf the commitment was appended at
        leaf_index: u64,
        /// Time of the deposit
        timestamp: i64,
        /// Account that locked the asset
        depositor: Address,
    },
    /// Output of a blind transfer
    Transfer {
        /// Leaf the commitment was appended at
        leaf_index: u64,
        /// Time of the transfer
        timestamp: i64,
    },
}

impl Origin {
    /// Leaf index of the commitment.
    pub fn leaf_index(&self) -> u64 {
        match self {
            Self::Deposit { leaf_index, .. } | Self::Transfer { leaf_index, .. } => *leaf_index,
        }
    }
}

/// How a nullifier was retired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Released to `recipient`
    Withdrawn {
        /// Time of the withdrawal
        timestamp: i64,
        /// Account that received the asset
        recipient: Address,
        /// Fee recipient, zero for a direct withdrawal
        relayer: Address,
        /// Fee paid to `relayer`
        fee: u128,
    },
    /// Moved into a new commitment
    Transferred {
        /// Time of the transfer
        timestamp: i64,
        /// Commitment the asset moved into
        new_commitment: FieldElement,
        /// Leaf of `new_commitment`
        new_leaf_index: u64,
    },
}

/// History of one note.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComplianceReport {
    /// Commitment of the note
    pub commitment: FieldElement,
    /// Nullifier hash the note retires with
    pub nullifier_hash: FieldElement,
    /// Asset the note controls
    pub asset: AssetRef,
    /// Event that created the commitment
    pub origin: Origin,
    /// `None` while the note is unspent
    pub disposition: Option<Disposition>,
}

/// Build the report for `note` from the event log.
///
/// # Errors
/// - `UnknownCommitment` if no event created the note's commitment
/// - `InvalidNoteFormat` if the note's asset address is malformed
/// - `HashFailure` if the note holds non-canonical values
pub fn report(events: &[LedgerEvent], note: &Note) -> LedgerResult<ComplianceReport> {
    let commitment = note.commitment()?;
    let nullifier_hash = note.nullifier_hash()?;
    let asset = note.asset()?;

    let origin = events
        .iter()
        .find_map(|event| match event {
            LedgerEvent::Deposited(e) if e.commitment == commitment => Some(Origin::Deposit {
                leaf_index: e.leaf_index,
                timestamp: e.timestamp,
                depositor: e.depositor,
            }),
            LedgerEvent::Spent(e) => match e.new_leaf() {
                Some((leaf_index, created)) if created == commitment => Some(Origin::Transfer {
                    leaf_index,
                    timestamp: e.timestamp,
                }),
                _ => None,
            },
            _ => None,
        })
        .ok_or(LedgerError::UnknownCommitment)?;

    let disposition = events.iter().find_map(|event| match event {
        LedgerEvent::Spent(e) if e.nullifier_hash == nullifier_hash => {
            Some(match e.new_leaf() {
                Some((new_leaf_index, new_commitment)) => Disposition::Transferred {
                    timestamp: e.timestamp,
                    new_commitment,
                    new_leaf_index,
                },
                None => Disposition::Withdrawn {
                    timestamp: e.timestamp,
                    recipient: e.recipient,
                    relayer: e.relayer,
                    fee: e.fee(),
                },
            })
        }
        _ => None,
    });

    Ok(ComplianceReport {
        commitment,
        nullifier_hash,
        asset,
        origin,
        disposition,
    })
}
