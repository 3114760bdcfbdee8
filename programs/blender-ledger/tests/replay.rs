//! Persisting the event log and rebuilding the ledger from it.

mod common;

use blender_ledger::{
    Ledger, LedgerState, Note,
    client::SpendTarget,
    compliance::{Disposition, Origin, report},
    errors::LedgerError,
    events::{LedgerEvent, decode_log, encode_log},
};

use common::{
    DEPOSITOR, RECIPIENT, SimulatedVerifier, TestLedger, asset, ctx, deposit_nft, new_ledger,
    proven_spend, rng, withdraw_to_recipient,
};

/// Ledger with a deposit, a transfer, a withdrawal and one unspent note.
///
/// Returns the ledger, the transferred note, its output and the unspent note.
fn busy_ledger() -> (TestLedger, Note, Note, Note) {
    let mut ledger = new_ledger(6, 4);
    let mut rng = rng(40);

    let (transferred, _) = deposit_nft(&mut ledger, &mut rng, 1);
    let (unspent, _) = deposit_nft(&mut ledger, &mut rng, 2);

    let output = Note::generate(&mut rng, &asset(1)).unwrap();
    let target = SpendTarget::Transfer {
        new_commitment: output.commitment().unwrap(),
    };
    let (_, request) = proven_spend(&ledger, &transferred, target).unwrap();
    ledger.transfer(&ctx(2_000), &request).unwrap();

    let (_, request) = proven_spend(&ledger, &output, withdraw_to_recipient(10)).unwrap();
    ledger.withdraw(&ctx(3_000), &request).unwrap();

    (ledger, transferred, output, unspent)
}

#[test]
fn test_encoded_log_replays_to_same_state() {
    let (ledger, ..) = busy_ledger();

    let bytes = encode_log(ledger.events()).unwrap();
    let events = decode_log(&bytes).unwrap();
    assert_eq!(events.as_slice(), ledger.events());

    let replayed = LedgerState::replay(ledger.config(), &events).unwrap();
    assert_eq!(&replayed, ledger.state());
}

#[test]
fn test_restored_ledger_keeps_operating() {
    let (ledger, transferred, _, unspent) = busy_ledger();
    let events = ledger.events().to_vec();

    let mut restored = Ledger::from_events(
        *ledger.config(),
        SimulatedVerifier::new(6),
        ledger.custody().clone(),
        events,
    )
    .unwrap();
    assert_eq!(restored.current_root(), ledger.current_root());
    assert!(restored.is_spent(&transferred.nullifier_hash().unwrap()));

    let (_, request) = proven_spend(&restored, &unspent, withdraw_to_recipient(0)).unwrap();
    restored.withdraw(&ctx(4_000), &request).unwrap();
    assert_eq!(restored.custody().delivered_to(&RECIPIENT, &asset(2)), 1);
}

#[test]
fn test_tampered_log_rejected() {
    let (ledger, ..) = busy_ledger();
    let mut events = ledger.events().to_vec();
    events.swap(0, 1);

    let restored = Ledger::from_events(
        *ledger.config(),
        SimulatedVerifier::new(6),
        ledger.custody().clone(),
        events,
    );
    assert_eq!(restored.err(), Some(LedgerError::ReplayMismatch));
}

#[test]
fn test_truncated_log_bytes_rejected() {
    let (ledger, ..) = busy_ledger();
    let bytes = encode_log(ledger.events()).unwrap();

    assert!(decode_log(&bytes[..bytes.len() - 1]).is_err());
}

#[test]
fn test_compliance_report_follows_note_history() {
    let (ledger, transferred, output, unspent) = busy_ledger();
    let events = ledger.events();

    let first = report(events, &transferred).unwrap();
    assert_eq!(
        first.origin,
        Origin::Deposit {
            leaf_index: 0,
            timestamp: 1_001,
            depositor: DEPOSITOR,
        }
    );
    assert_eq!(
        first.disposition,
        Some(Disposition::Transferred {
            timestamp: 2_000,
            new_commitment: output.commitment().unwrap(),
            new_leaf_index: 2,
        })
    );

    let second = report(events, &output).unwrap();
    assert_eq!(
        second.origin,
        Origin::Transfer {
            leaf_index: 2,
            timestamp: 2_000,
        }
    );
    assert!(matches!(
        second.disposition,
        Some(Disposition::Withdrawn { recipient, fee: 10, .. }) if recipient == RECIPIENT
    ));

    let third = report(events, &unspent).unwrap();
    assert_eq!(third.origin.leaf_index(), 1);
    assert_eq!(third.disposition, None);
    assert!(
        events
            .iter()
            .all(|event| !matches!(event, LedgerEvent::Spent(e) if e.nullifier_hash == third.nullifier_hash))
    );
}
