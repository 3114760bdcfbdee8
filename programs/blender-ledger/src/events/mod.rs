//! Event definitions for the ledger.
//!
//! Every accepted transition appends exactly one event to the ledger's log.
//! The log is the persistence format: replaying it from genesis rebuilds the
//! tree, the nullifier registry and the custody book.
//!
//! # Event Types
//!
//! - [`DepositedEvent`] - Emitted when a deposit appends a commitment
//! - [`SpentEvent`] - Emitted when a transfer or withdrawal retires a nullifier
//!
//! # Wire Format
//!
//! ```text
//! [discriminator: 8 bytes, u64 LE][event: Pod body]
//! ```
//!
//! A serialized log is the Borsh encoding of `Vec<Vec<u8>>`, one entry per
//! event in append order.

mod deposited;
mod spent;

pub use deposited::*;
pub use spent::*;

use borsh::{BorshDeserialize, BorshSerialize};
use bytemuck::Pod;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use tracing::warn;

use crate::{
    errors::{LedgerError, LedgerResult},
    field::FieldElement,
};

/// Event type discriminators.
///
/// Each event type has a unique u64 discriminator prepended to its serialized
/// data so indexers can tell the records apart.
#[repr(u64)]
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive, strum::IntoStaticStr,
)]
pub enum EventType {
    /// Commitment appended by a deposit
    Deposited = 1,
    /// Nullifier retired by a transfer or withdrawal
    Spent = 2,
}

/// Zero-copy events with a fixed discriminator.
pub trait EventBytes: Pod {
    /// Discriminator written in front of the body.
    const EVENT_TYPE: EventType;

    /// `[discriminator][body]`.
    fn to_event_bytes(&self) -> Vec<u8> {
        let body = bytemuck::bytes_of(self);
        let mut bytes = Vec::with_capacity(8 + body.len());
        bytes.extend_from_slice(&(Self::EVENT_TYPE as u64).to_le_bytes());
        bytes.extend_from_slice(body);
        bytes
    }

    /// Parse a body written by [`EventBytes::to_event_bytes`].
    ///
    /// # Errors
    /// Returns `InvalidEventData` if the discriminator or length is wrong.
    fn from_event_bytes(data: &[u8]) -> LedgerResult<Self> {
        let (discriminator, body) = split_discriminator(data)?;
        if discriminator != Self::EVENT_TYPE as u64 {
            return Err(LedgerError::InvalidEventData);
        }
        bytemuck::try_pod_read_unaligned(body).map_err(|_| LedgerError::InvalidEventData)
    }
}

fn split_discriminator(data: &[u8]) -> LedgerResult<(u64, &[u8])> {
    let (head, body) = data
        .split_first_chunk::<8>()
        .ok_or(LedgerError::InvalidEventData)?;
    Ok((u64::from_le_bytes(*head), body))
}

/// One record of the ledger's event log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    Deposited(DepositedEvent),
    Spent(SpentEvent),
}

impl LedgerEvent {
    /// Discriminator of this record.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Deposited(_) => EventType::Deposited,
            Self::Spent(_) => EventType::Spent,
        }
    }

    /// Tree root after the transition that produced this record.
    pub fn root_after(&self) -> FieldElement {
        match self {
            Self::Deposited(e) => e.root,
            Self::Spent(e) => e.root,
        }
    }

    /// Timestamp of the transition.
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::Deposited(e) => e.timestamp,
            Self::Spent(e) => e.timestamp,
        }
    }

    /// Serialize with the discriminator prepended.
    pub fn to_event_bytes(&self) -> Vec<u8> {
        match self {
            Self::Deposited(e) => e.to_event_bytes(),
            Self::Spent(e) => e.to_event_bytes(),
        }
    }

    /// Parse any ledger event.
    ///
    /// # Errors
    /// Returns `InvalidEventData` for an unknown discriminator or a body of
    /// the wrong size.
    pub fn from_event_bytes(data: &[u8]) -> LedgerResult<Self> {
        let (discriminator, _) = split_discriminator(data)?;
        match EventType::try_from(discriminator) {
            Ok(EventType::Deposited) => DepositedEvent::from_event_bytes(data).map(Self::Deposited),
            Ok(EventType::Spent) => SpentEvent::from_event_bytes(data).map(Self::Spent),
            Err(_) => {
                warn!(discriminator, "event: unknown discriminator");
                Err(LedgerError::InvalidEventData)
            }
        }
    }
}

impl From<DepositedEvent> for LedgerEvent {
    fn from(event: DepositedEvent) -> Self {
        Self::Deposited(event)
    }
}

impl From<SpentEvent> for LedgerEvent {
    fn from(event: SpentEvent) -> Self {
        Self::Spent(event)
    }
}

/// Serialize an event log.
///
/// # Errors
/// Returns `InvalidEventData` if Borsh serialization fails.
pub fn encode_log(events: &[LedgerEvent]) -> LedgerResult<Vec<u8>> {
    let records: Vec<Vec<u8>> = events.iter().map(LedgerEvent::to_event_bytes).collect();
    let mut out = Vec::new();
    records
        .serialize(&mut out)
        .map_err(|_| LedgerError::InvalidEventData)?;
    Ok(out)
}

/// Parse an event log written by [`encode_log`].
///
/// # Errors
/// Returns `InvalidEventData` if the framing or any record is malformed.
pub fn decode_log(mut data: &[u8]) -> LedgerResult<Vec<LedgerEvent>> {
    let records =
        Vec::<Vec<u8>>::deserialize(&mut data).map_err(|_| LedgerError::InvalidEventData)?;
    if !data.is_empty() {
        return Err(LedgerError::InvalidEventData);
    }
    records
        .iter()
        .map(|record| LedgerEvent::from_event_bytes(record))
        .collect()
}
