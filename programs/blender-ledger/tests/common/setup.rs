//! Ledger setup and common flows.

use blender_custody_interface::{AssetRef, InMemoryVault};
use blender_ledger::{
    Ledger, LedgerConfig, LedgerResult, Note,
    client::{SpendTarget, SpendWitness, prepare_deposit, prepare_spend},
    instructions::{ExecutionContext, SpendRequest},
};
use rand::{SeedableRng, rngs::StdRng};

use super::{SimulatedProver, SimulatedVerifier};

pub type TestLedger = Ledger<SimulatedVerifier, InMemoryVault>;

/// Asset contract used throughout the tests.
pub const ASSET_CONTRACT: [u8; 20] = [0xa1; 20];

/// Depositor account.
pub const DEPOSITOR: [u8; 20] = [0xd0; 20];

/// Withdrawal recipient account.
pub const RECIPIENT: [u8; 20] = [0xe5; 20];

/// Relayer account.
pub const RELAYER: [u8; 20] = [0x5e; 20];

pub fn asset(id: u64) -> AssetRef {
    AssetRef::from_u64_id(ASSET_CONTRACT, id)
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn ctx(timestamp: i64) -> ExecutionContext {
    ExecutionContext::new(timestamp, DEPOSITOR)
}

/// Ledger on a tree of `height` keeping `window` prior roots.
pub fn new_ledger(height: u8, window: u32) -> TestLedger {
    let config = LedgerConfig::default()
        .with_tree_height(height)
        .with_root_history_window(window)
        .with_network_id(31337);
    Ledger::new(config, SimulatedVerifier::new(height), InMemoryVault::new())
        .expect("valid test ledger")
}

/// Deposit a fresh ERC721 note for `asset(asset_id)`.
pub fn deposit_nft(ledger: &mut TestLedger, rng: &mut StdRng, asset_id: u64) -> (Note, u64) {
    let prepared = prepare_deposit(rng, &asset(asset_id), true, 31337).expect("prepare deposit");
    let index = ledger
        .deposit(&ctx(1_000 + asset_id as i64), &prepared.request)
        .expect("deposit accepted");
    (prepared.note, index)
}

/// Withdraw target paying `fee` to the shared relayer.
pub fn withdraw_to_recipient(fee: u128) -> SpendTarget {
    SpendTarget::Withdraw {
        recipient: RECIPIENT,
        relayer: if fee == 0 { [0u8; 20] } else { RELAYER },
        fee,
    }
}

/// Witness and proven request for spending `note` against the current root.
pub fn proven_spend(
    ledger: &TestLedger,
    note: &Note,
    target: SpendTarget,
) -> LedgerResult<(SpendWitness, SpendRequest)> {
    let witness = prepare_spend(ledger.state(), note, target)?;
    let proof = SimulatedProver::prove(&witness);
    Ok((witness.clone(), witness.into_request(proof)))
}
