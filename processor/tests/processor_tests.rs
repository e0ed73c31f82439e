use std::sync::Arc;

use strata_consensus::AgentStatus;
use strata_nullables::NullStore;
use strata_processor::processors::{
    pending_outbound, AppendDepositProcessor, CrossChainProcessor, RedPunishProcessor,
    ReduceDepositProcessor, RegisterAgentProcessor, SetAliasProcessor, StopAgentProcessor,
    TransferProcessor,
};
use strata_processor::{BlockTxs, ChainContext, TransactionProcessor};
use strata_transactions::{
    ChangeDepositData, CoinData, CoinFrom, CoinTo, CrossChainData, RedPunishData, RegisterAgentData,
    SetAliasData, StopAgentData, Transaction, TxPayload,
};
use strata_types::{
    Address, Amount, AssetKey, BlockHash, BlockHeader, ChainConfig, ChainId, DepositBounds,
    ErrorCode, NodeId, Nonce, Timestamp,
};

const CHAIN: ChainId = ChainId::new(1);

fn addr(b: u8) -> Address {
    Address::new(CHAIN, [b; 20])
}

fn owner() -> Address {
    addr(1)
}

fn staking() -> AssetKey {
    AssetKey::new(CHAIN, 1)
}

fn header(height: u64) -> BlockHeader {
    BlockHeader::new(height, Timestamp::new(height * 10), BlockHash::new([height as u8; 32]))
}

fn setup() -> (Arc<NullStore>, ChainContext) {
    let mut config = ChainConfig::new(CHAIN);
    config.deposit = DepositBounds::new(Amount::from(1000u32), Amount::from(5000u32));
    config.append_min = Amount::from(100u32);
    config.reduce_min = Amount::from(100u32);
    let store = Arc::new(NullStore::new());
    let chain = ChainContext::new(config, store.clone());
    chain
        .ledger()
        .credit(&owner(), &staking(), &Amount::from(100_000u32))
        .unwrap();
    (store, chain)
}

fn input(address: Address, amount: u32, nonce: Nonce) -> CoinFrom {
    CoinFrom {
        address,
        asset: staking(),
        amount: Amount::from(amount),
        nonce,
    }
}

fn output(address: Address, amount: u32) -> CoinTo {
    CoinTo {
        address,
        asset: staking(),
        amount: Amount::from(amount),
    }
}

fn tx(payload: TxPayload, from: Vec<CoinFrom>, to: Vec<CoinTo>, time: u64) -> Transaction {
    Transaction::from_payload(CHAIN, Timestamp::new(time), &payload, CoinData::new(from, to))
}

fn tip(chain: &ChainContext) -> Nonce {
    chain.ledger().tip(&owner(), &staking()).unwrap()
}

fn register(chain: &ChainContext, deposit: u32) -> Transaction {
    tx(
        TxPayload::RegisterAgent(RegisterAgentData {
            agent_address: owner(),
            packing_address: addr(2),
            reward_address: owner(),
            deposit: Amount::from(deposit),
            commission_rate: 20,
        }),
        vec![input(owner(), deposit + 1, tip(chain))],
        vec![],
        1,
    )
}

fn append(chain: &ChainContext, agent: NodeId, amount: u32, time: u64) -> Transaction {
    tx(
        TxPayload::AppendDeposit(ChangeDepositData {
            address: owner(),
            amount: Amount::from(amount),
            agent_id: agent,
        }),
        vec![input(owner(), amount, tip(chain))],
        vec![],
        time,
    )
}

/// Validate then commit a single transaction.
fn commit_one(
    processor: &dyn TransactionProcessor,
    chain: &ChainContext,
    tx: &Transaction,
    height: u64,
) {
    let block = BlockTxs::new(vec![tx.clone()]);
    let rejected = processor.validate(chain, std::slice::from_ref(tx), &block, None);
    assert!(rejected.is_empty(), "unexpected rejection: {rejected:?}");
    processor
        .commit(chain, std::slice::from_ref(tx), &header(height))
        .unwrap();
}

fn registered(chain: &ChainContext, deposit: u32) -> NodeId {
    let reg = register(chain, deposit);
    commit_one(&RegisterAgentProcessor, chain, &reg, 1);
    NodeId::from_registration(*reg.hash())
}

fn rejection_codes(
    processor: &dyn TransactionProcessor,
    chain: &ChainContext,
    txs: &[Transaction],
) -> Vec<ErrorCode> {
    let block = BlockTxs::new(txs.to_vec());
    processor
        .validate(chain, txs, &block, None)
        .into_iter()
        .map(|r| r.code)
        .collect()
}

#[test]
fn register_locks_deposit_and_rolls_back_cleanly() {
    let (store, chain) = setup();
    let before = store.snapshot();
    let reg = register(&chain, 2000);
    commit_one(&RegisterAgentProcessor, &chain, &reg, 1);

    let id = NodeId::from_registration(*reg.hash());
    let agent = chain.agents().get_node(&id).unwrap();
    assert_eq!(agent.deposit, Amount::from(2000u32));
    assert_eq!(agent.status, AgentStatus::Active);
    assert_eq!(
        chain.ledger().current_balance(&owner(), &staking()).unwrap(),
        Amount::from(100_000u32 - 2001)
    );
    // A second registration for the same owner is refused.
    assert_eq!(
        rejection_codes(&RegisterAgentProcessor, &chain, &[register(&chain, 1500)]),
        vec![ErrorCode::AlreadyExists]
    );

    RegisterAgentProcessor
        .rollback(&chain, &[reg], &header(1))
        .unwrap();
    assert_eq!(store.snapshot(), before);
}

#[test]
fn register_outside_bounds_is_out_of_range() {
    let (_, chain) = setup();
    assert_eq!(
        rejection_codes(&RegisterAgentProcessor, &chain, &[register(&chain, 6000)]),
        vec![ErrorCode::OutOfRange]
    );
}

#[test]
fn append_and_reduce_track_deposit() {
    let (store, chain) = setup();
    let id = registered(&chain, 2000);
    let after_register = store.snapshot();

    let add = append(&chain, id, 500, 2);
    commit_one(&AppendDepositProcessor, &chain, &add, 2);
    let reduce = tx(
        TxPayload::ReduceDeposit(ChangeDepositData {
            address: owner(),
            amount: Amount::from(300u32),
            agent_id: id,
        }),
        vec![],
        vec![output(owner(), 300)],
        3,
    );
    commit_one(&ReduceDepositProcessor, &chain, &reduce, 3);

    assert_eq!(chain.agents().get_node(&id).unwrap().deposit, Amount::from(2200u32));
    assert!(chain.agents().audit_deposit(&id).unwrap().is_consistent());

    ReduceDepositProcessor.rollback(&chain, &[reduce], &header(3)).unwrap();
    AppendDepositProcessor.rollback(&chain, &[add], &header(2)).unwrap();
    assert_eq!(store.snapshot(), after_register);
}

#[test]
fn deposit_change_validation_codes() {
    let (_, chain) = setup();
    let id = registered(&chain, 2000);
    let unknown = NodeId::from_registration(strata_types::TxHash::digest(b"nobody"));

    assert_eq!(
        rejection_codes(&AppendDepositProcessor, &chain, &[append(&chain, unknown, 500, 2)]),
        vec![ErrorCode::NotFound]
    );
    assert_eq!(
        rejection_codes(&AppendDepositProcessor, &chain, &[append(&chain, id, 3500, 2)]),
        vec![ErrorCode::OutOfRange]
    );
    assert_eq!(
        rejection_codes(&AppendDepositProcessor, &chain, &[append(&chain, id, 50, 2)]),
        vec![ErrorCode::OutOfRange]
    );
    let foreign = Transaction::from_payload(
        ChainId::new(9),
        Timestamp::new(2),
        &TxPayload::Transfer,
        CoinData::default(),
    );
    assert_eq!(
        rejection_codes(&TransferProcessor, &chain, &[foreign]),
        vec![ErrorCode::ParameterError]
    );
}

#[test]
fn failed_commit_leaves_no_trace_of_the_batch() {
    let (store, chain) = setup();
    let id = registered(&chain, 1000);
    let before = store.snapshot();

    // Committed without conflict detection: the second append would take
    // the deposit to 6500 and fails inside the batch.
    let first = append(&chain, id, 3000, 2);
    let second = tx(
        TxPayload::AppendDeposit(ChangeDepositData {
            address: owner(),
            amount: Amount::from(2500u32),
            agent_id: id,
        }),
        vec![input(owner(), 2500, first.nonce())],
        vec![],
        3,
    );
    let third = tx(
        TxPayload::AppendDeposit(ChangeDepositData {
            address: owner(),
            amount: Amount::from(100u32),
            agent_id: id,
        }),
        vec![input(owner(), 100, second.nonce())],
        vec![],
        4,
    );

    let err = AppendDepositProcessor
        .commit(&chain, &[first, second, third.clone()], &header(2))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::OutOfRange);
    assert_eq!(store.snapshot(), before);
    assert_eq!(chain.agents().append_record(third.hash()).unwrap(), None);
}

#[test]
fn failed_rollback_reapplies_what_it_undid() {
    let (store, chain) = setup();
    let committed = tx(
        TxPayload::Transfer,
        vec![input(owner(), 10, tip(&chain))],
        vec![output(addr(7), 10)],
        2,
    );
    commit_one(&TransferProcessor, &chain, &committed, 2);
    let after_commit = store.snapshot();

    // Never committed: its chain tip does not match, so rolling it back fails.
    let never = tx(TxPayload::Transfer, vec![input(addr(7), 5, Nonce::GENESIS)], vec![], 3);
    let err = TransferProcessor
        .rollback(&chain, &[never, committed], &header(2))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NonceMismatch);
    assert_eq!(store.snapshot(), after_commit);
}

#[test]
fn stop_agent_releases_address() {
    let (store, chain) = setup();
    let id = registered(&chain, 2000);
    let before = store.snapshot();

    // Releasing more than the deposit would mint coins.
    let greedy = tx(
        TxPayload::StopAgent(StopAgentData { address: owner(), agent_id: id }),
        vec![],
        vec![output(owner(), 2001)],
        4,
    );
    assert_eq!(
        rejection_codes(&StopAgentProcessor, &chain, &[greedy]),
        vec![ErrorCode::ParameterError]
    );

    let stop = tx(
        TxPayload::StopAgent(StopAgentData { address: owner(), agent_id: id }),
        vec![],
        vec![output(owner(), 2000)],
        5,
    );
    commit_one(&StopAgentProcessor, &chain, &stop, 5);

    let agent = chain.agents().get_node(&id).unwrap();
    assert_eq!(agent.status, AgentStatus::Stopped);
    assert_eq!(agent.stop_height, Some(5));
    assert_eq!(chain.agents().node_for_address(&owner()).unwrap(), None);
    assert_eq!(
        rejection_codes(&StopAgentProcessor, &chain, &[stop.clone()]),
        vec![ErrorCode::AgentInactive]
    );

    StopAgentProcessor.rollback(&chain, &[stop], &header(5)).unwrap();
    assert_eq!(store.snapshot(), before);
}

#[test]
fn released_deposit_cannot_be_paid_to_a_third_party() {
    let (_, chain) = setup();
    let id = registered(&chain, 2000);

    let stop = tx(
        TxPayload::StopAgent(StopAgentData { address: owner(), agent_id: id }),
        vec![],
        vec![output(addr(9), 2000)],
        4,
    );
    assert_eq!(
        rejection_codes(&StopAgentProcessor, &chain, &[stop]),
        vec![ErrorCode::ParameterError]
    );

    let reduce = tx(
        TxPayload::ReduceDeposit(ChangeDepositData {
            address: owner(),
            amount: Amount::from(300u32),
            agent_id: id,
        }),
        vec![],
        vec![output(owner(), 100), output(addr(9), 200)],
        5,
    );
    assert_eq!(
        rejection_codes(&ReduceDepositProcessor, &chain, &[reduce]),
        vec![ErrorCode::ParameterError]
    );
}

#[test]
fn red_punish_disables_and_records() {
    let (store, chain) = setup();
    let id = registered(&chain, 2000);
    let before = store.snapshot();
    let punish = tx(
        TxPayload::RedPunish(RedPunishData { agent_id: id, reason: 2, evidence: vec![0xab; 4] }),
        vec![],
        vec![],
        7,
    );
    commit_one(&RedPunishProcessor, &chain, &punish, 7);
    assert_eq!(chain.agents().get_node(&id).unwrap().status, AgentStatus::Punished);
    assert!(chain.agents().punish_record(punish.hash()).unwrap().is_some());
    assert_eq!(
        rejection_codes(&AppendDepositProcessor, &chain, &[append(&chain, id, 500, 8)]),
        vec![ErrorCode::AgentInactive]
    );

    RedPunishProcessor.rollback(&chain, &[punish], &header(7)).unwrap();
    assert_eq!(store.snapshot(), before);
}

#[test]
fn alias_binding_is_unique() {
    let (store, chain) = setup();
    let before = store.snapshot();
    let set = tx(
        TxPayload::SetAlias(SetAliasData { address: owner(), alias: "treasury".into() }),
        vec![input(owner(), 1, tip(&chain))],
        vec![],
        2,
    );
    commit_one(&SetAliasProcessor, &chain, &set, 2);
    assert_eq!(chain.aliases().address_of("treasury").unwrap(), Some(owner()));

    let again = tx(
        TxPayload::SetAlias(SetAliasData { address: owner(), alias: "other".into() }),
        vec![input(owner(), 1, tip(&chain))],
        vec![],
        3,
    );
    assert_eq!(
        rejection_codes(&SetAliasProcessor, &chain, &[again]),
        vec![ErrorCode::AlreadyExists]
    );
    let malformed = tx(
        TxPayload::SetAlias(SetAliasData { address: addr(3), alias: "Bad Alias".into() }),
        vec![input(addr(3), 1, Nonce::GENESIS)],
        vec![],
        4,
    );
    assert_eq!(
        rejection_codes(&SetAliasProcessor, &chain, &[malformed]),
        vec![ErrorCode::ParameterError]
    );

    SetAliasProcessor.rollback(&chain, &[set], &header(2)).unwrap();
    assert_eq!(store.snapshot(), before);
}

#[test]
fn cross_chain_queues_foreign_outputs() {
    let (store, chain) = setup();
    let before = store.snapshot();
    let remote = Address::new(ChainId::new(2), [8; 20]);
    let send = tx(
        TxPayload::CrossChainTransfer(CrossChainData { target_chain: ChainId::new(2) }),
        vec![input(owner(), 100, tip(&chain))],
        vec![output(remote, 90), output(addr(4), 5)],
        2,
    );
    commit_one(&CrossChainProcessor, &chain, &send, 2);

    assert_eq!(
        pending_outbound(&chain, send.hash()).unwrap(),
        Some(vec![output(remote, 90)])
    );
    assert_eq!(
        chain.ledger().current_balance(&addr(4), &staking()).unwrap(),
        Amount::from(5u32)
    );

    CrossChainProcessor.rollback(&chain, &[send], &header(2)).unwrap();
    assert_eq!(store.snapshot(), before);
}
