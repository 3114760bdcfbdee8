//! Spends that must be refused by the root window or the proof check.

mod common;

use blender_custody_interface::InMemoryVault;
use blender_ledger::{
    FieldElement, Ledger, LedgerConfig, Note, ProofVerifier, PublicSignals,
    client::{SpendTarget, prepare_spend, prepare_spend_at},
    errors::LedgerError,
    hasher::Poseidon,
    instructions::SpendRequest,
};

use common::{
    SimulatedProver, SimulatedVerifier, asset, ctx, deposit_nft, new_ledger, proven_spend, rng,
    withdraw_to_recipient,
};

#[test]
fn test_proof_for_foreign_nullifier_rejected() {
    let mut ledger = new_ledger(8, 30);
    let mut rng = rng(20);
    let (note, _) = deposit_nft(&mut ledger, &mut rng, 1);
    let (victim, _) = deposit_nft(&mut ledger, &mut rng, 2);

    // Prove knowledge of `note` while claiming the victim's nullifier hash
    let (witness, _) = proven_spend(&ledger, &note, withdraw_to_recipient(0)).unwrap();
    let mut signals = witness.public_signals;
    signals.nullifier_hash = victim.nullifier_hash().unwrap();
    let request = SpendRequest::withdraw(SimulatedProver::prove(&witness), signals);

    assert_eq!(
        ledger.withdraw(&ctx(5), &request),
        Err(LedgerError::ProofVerificationFailed)
    );
    assert!(!ledger.is_spent(&victim.nullifier_hash().unwrap()));
    assert_eq!(ledger.custody().held_units(&asset(2)), 1);
}

#[test]
fn test_proof_for_other_asset_rejected() {
    let mut ledger = new_ledger(8, 30);
    let mut rng = rng(21);
    let (note, _) = deposit_nft(&mut ledger, &mut rng, 1);
    deposit_nft(&mut ledger, &mut rng, 2);

    // Claim the note releases asset 2 instead of asset 1
    let (witness, _) = proven_spend(&ledger, &note, withdraw_to_recipient(0)).unwrap();
    let mut signals = witness.public_signals;
    signals.asset_id = FieldElement::from_u64(2);
    let request = SpendRequest::withdraw(SimulatedProver::prove(&witness), signals);

    assert_eq!(
        ledger.withdraw(&ctx(5), &request),
        Err(LedgerError::ProofVerificationFailed)
    );
    assert_eq!(ledger.custody().held_units(&asset(2)), 1);
}

#[test]
fn test_fabricated_root_rejected() {
    let mut ledger = new_ledger(8, 30);
    let mut rng = rng(22);
    let (note, _) = deposit_nft(&mut ledger, &mut rng, 1);

    let (witness, _) = proven_spend(&ledger, &note, withdraw_to_recipient(0)).unwrap();
    let mut signals = witness.public_signals;
    signals.root = FieldElement::from_u64(0xdead);
    let request = SpendRequest::withdraw(SimulatedProver::prove(&witness), signals);

    let err = ledger.withdraw(&ctx(5), &request).unwrap_err();
    assert_eq!(err, LedgerError::UnknownRoot);
    assert!(err.is_retryable());
}

#[test]
fn test_root_expires_after_window() {
    let window = 2;
    let mut ledger = new_ledger(8, window);
    let mut rng = rng(23);
    let (note, _) = deposit_nft(&mut ledger, &mut rng, 1);

    let (witness, stale) = proven_spend(&ledger, &note, withdraw_to_recipient(0)).unwrap();
    for id in 0..=u64::from(window) {
        deposit_nft(&mut ledger, &mut rng, 100 + id);
    }

    assert!(!ledger.is_known_root(&witness.root));
    assert!(
        witness
            .path
            .verifies::<Poseidon>(&note.commitment().unwrap(), &witness.root),
        "the path is still valid for the expired root"
    );
    assert_eq!(
        ledger.withdraw(&ctx(5), &stale),
        Err(LedgerError::UnknownRoot)
    );

    // Re-proving against the current root succeeds
    let (_, fresh) = proven_spend(&ledger, &note, withdraw_to_recipient(0)).unwrap();
    assert!(ledger.withdraw(&ctx(6), &fresh).is_ok());
}

#[test]
fn test_proof_against_recent_historical_root_accepted() {
    let mut ledger = new_ledger(8, 30);
    let mut rng = rng(24);
    let (note, _) = deposit_nft(&mut ledger, &mut rng, 1);
    for id in 0..3 {
        deposit_nft(&mut ledger, &mut rng, 10 + id);
    }

    // Prove against the root right after the note's deposit
    let witness = prepare_spend_at(ledger.state(), &note, withdraw_to_recipient(0), 1).unwrap();
    assert_eq!(witness.root, ledger.root_at(1).unwrap());
    assert_ne!(witness.root, ledger.current_root());
    let proof = SimulatedProver::prove(&witness);

    assert!(ledger.withdraw(&ctx(5), &witness.into_request(proof)).is_ok());
}

#[test]
fn test_transfer_signals_with_recipient_rejected() {
    let mut ledger = new_ledger(8, 30);
    let mut rng = rng(25);
    let (note, _) = deposit_nft(&mut ledger, &mut rng, 1);
    let output = Note::generate(&mut rng, &asset(1)).unwrap();

    let target = SpendTarget::Transfer {
        new_commitment: output.commitment().unwrap(),
    };
    let witness = prepare_spend(ledger.state(), &note, target).unwrap();
    let mut signals = witness.public_signals;
    signals.recipient = FieldElement::from_address(&[0x77; 20]);
    let request = SpendRequest::transfer(
        SimulatedProver::prove(&witness),
        signals,
        signals.new_commitment,
    );

    assert_eq!(
        ledger.transfer(&ctx(5), &request),
        Err(LedgerError::InvalidPublicSignals)
    );
}

#[test]
fn test_schema_mismatch_rejected_at_construction() {
    struct FutureVerifier;

    impl ProofVerifier for FutureVerifier {
        fn schema_version(&self) -> u16 {
            2
        }

        fn verify(&self, _proof: &[u8], _public_signals: &PublicSignals) -> bool {
            true
        }
    }

    let result = Ledger::new(LedgerConfig::default(), FutureVerifier, InMemoryVault::new());
    assert_eq!(result.err(), Some(LedgerError::SchemaVersionMismatch));

    assert!(
        Ledger::new(
            LedgerConfig::default().with_tree_height(8),
            SimulatedVerifier::new(8),
            InMemoryVault::new()
        )
        .is_ok()
    );
}
