use std::sync::Arc;

use proptest::prelude::*;

use strata_consensus::{AgentError, AgentManager, AgentRecord, AgentStatus, DepositRecord};
use strata_nullables::NullStore;
use strata_types::{Address, Amount, ChainId, DepositBounds, NodeId, Timestamp, TxHash};

fn agent() -> AgentRecord {
    let addr = Address::new(ChainId::new(1), [7; 20]);
    AgentRecord {
        id: NodeId::from_registration(TxHash::digest(b"register")),
        agent_address: addr,
        packing_address: addr,
        reward_address: addr,
        commission_rate: 10,
        deposit: Amount::from(1_000u32),
        initial_deposit: Amount::from(1_000u32),
        bounds: DepositBounds::new(Amount::from(1_000u32), Amount::from(5_000u32)),
        status: AgentStatus::Active,
        registered_height: 1,
        registered_time: Timestamp::new(1),
        stop_height: None,
    }
}

proptest! {
    /// Whatever totals are requested, the stored deposit never leaves the
    /// agent's bounds and rejected updates leave it untouched.
    #[test]
    fn deposit_never_leaves_bounds(totals in proptest::collection::vec(0u32..8_000, 1..30)) {
        let mgr = AgentManager::new(Arc::new(NullStore::new()));
        let a = agent();
        mgr.register_node(&a).unwrap();
        let mut current = a.deposit.clone();

        for total in totals {
            let total = Amount::from(total);
            match mgr.update_deposit(&a.id, &total) {
                Ok(updated) => {
                    prop_assert!(a.bounds.contains(&total));
                    prop_assert_eq!(&updated.deposit, &total);
                    current = total;
                }
                Err(e) => {
                    let out_of_range = matches!(e, AgentError::OutOfRange { .. });
                    prop_assert!(out_of_range);
                    prop_assert!(!a.bounds.contains(&total));
                }
            }
            let stored = mgr.get_node(&a.id).unwrap().deposit;
            prop_assert!(a.bounds.contains(&stored));
            prop_assert_eq!(&stored, &current);
        }
    }

    /// Saving then removing any set of append records, in any order and any
    /// number of times, restores the store exactly.
    #[test]
    fn append_records_remove_cleanly(
        amounts in proptest::collection::vec(1u32..1_000, 1..12),
        repeat_removals in 1usize..3,
    ) {
        let store = Arc::new(NullStore::new());
        let mgr = AgentManager::new(store.clone());
        let a = agent();
        mgr.register_node(&a).unwrap();
        let before = store.snapshot();

        let records: Vec<DepositRecord> = amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| DepositRecord {
                agent_id: a.id,
                address: a.agent_address,
                amount: Amount::from(*amount),
                tx_hash: TxHash::digest(&(i as u64).to_le_bytes()),
                height: 2,
                time: Timestamp::new(2),
            })
            .collect();
        for r in &records {
            mgr.save_append_record(r).unwrap();
        }
        prop_assert_eq!(mgr.append_records_for(&a.id).unwrap().len(), records.len());

        for _ in 0..repeat_removals {
            for r in records.iter().rev() {
                mgr.remove_append_record(&r.tx_hash).unwrap();
            }
        }
        prop_assert_eq!(store.snapshot(), before);
    }

    /// Applying appends and reduces through the manager the way processors
    /// do keeps the audit trail consistent with the recorded deposit.
    #[test]
    fn audit_matches_applied_changes(
        changes in proptest::collection::vec((any::<bool>(), 1u32..800), 1..25)
    ) {
        let mgr = AgentManager::new(Arc::new(NullStore::new()));
        let a = agent();
        mgr.register_node(&a).unwrap();

        for (i, (append, amount)) in changes.into_iter().enumerate() {
            let amount = Amount::from(amount);
            let current = mgr.get_node(&a.id).unwrap().deposit;
            let total = if append { &current + &amount } else { &current - &amount };
            if mgr.update_deposit(&a.id, &total).is_err() {
                continue;
            }
            let record = DepositRecord {
                agent_id: a.id,
                address: a.agent_address,
                amount,
                tx_hash: TxHash::digest(&(i as u64).to_be_bytes()),
                height: 3,
                time: Timestamp::new(3),
            };
            if append {
                mgr.save_append_record(&record).unwrap();
            } else {
                mgr.save_reduce_record(&record).unwrap();
            }
        }
        prop_assert!(mgr.audit_deposit(&a.id).unwrap().is_consistent());
    }
}
