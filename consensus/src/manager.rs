//! Agent and deposit state manager.
//!
//! Owns agent records, the address index of live agents, and the deposit
//! and punish audit trails. Processors mutate consensus state only through
//! this type.

use std::sync::Arc;

use strata_store::{Keyspace, KvStore, KvStoreExt};
use strata_transactions::WireCodec;
use strata_types::{Address, Amount, NodeId, TxHash};

use crate::agent::{AgentRecord, AgentStatus};
use crate::error::AgentError;
use crate::records::{DepositRecord, PunishRecord};

/// Result of [`AgentManager::audit_deposit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositAudit {
    pub recorded: Amount,
    /// `initial + appends - reduces` according to the audit trail.
    pub expected: Amount,
    pub appends: usize,
    pub reduces: usize,
}

impl DepositAudit {
    pub fn is_consistent(&self) -> bool {
        self.recorded == self.expected
    }
}

#[derive(Clone, Copy)]
enum DepositKind {
    Append,
    Reduce,
}

impl DepositKind {
    fn spaces(self) -> (Keyspace, Keyspace) {
        match self {
            Self::Append => (Keyspace::DepositAppends, Keyspace::DepositAppendsByAgent),
            Self::Reduce => (Keyspace::DepositReduces, Keyspace::DepositReducesByAgent),
        }
    }
}

fn index_key(agent: &NodeId, tx_hash: &TxHash) -> [u8; 64] {
    let mut key = [0u8; 64];
    key[..32].copy_from_slice(agent.as_bytes());
    key[32..].copy_from_slice(tx_hash.as_bytes());
    key
}

#[derive(Clone)]
pub struct AgentManager {
    store: Arc<dyn KvStore>,
}

impl AgentManager {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn find_node(&self, id: &NodeId) -> Result<Option<AgentRecord>, AgentError> {
        Ok(self.store.get_record(Keyspace::Agents, id.as_bytes())?)
    }

    pub fn get_node(&self, id: &NodeId) -> Result<AgentRecord, AgentError> {
        self.find_node(id)?.ok_or(AgentError::NotFound(*id))
    }

    /// Like [`AgentManager::get_node`] but also requires the agent to be active.
    pub fn get_active_node(&self, id: &NodeId) -> Result<AgentRecord, AgentError> {
        let agent = self.get_node(id)?;
        if !agent.is_active() {
            return Err(AgentError::Inactive {
                id: *id,
                status: agent.status,
            });
        }
        Ok(agent)
    }

    /// The live (active) agent registered by `address`, if any.
    pub fn node_for_address(&self, address: &Address) -> Result<Option<NodeId>, AgentError> {
        Ok(self
            .store
            .get_record(Keyspace::AgentAddresses, &address.to_bytes())?)
    }

    /// Every agent record, in node id order.
    pub fn agents(&self) -> Result<Vec<AgentRecord>, AgentError> {
        self.store
            .scan_prefix(Keyspace::Agents, &[])?
            .into_iter()
            .map(|(_, bytes)| Ok(strata_store::decode_record(&bytes)?))
            .collect()
    }

    pub fn register_node(&self, agent: &AgentRecord) -> Result<(), AgentError> {
        if self.find_node(&agent.id)?.is_some() {
            return Err(AgentError::AlreadyExists(format!("agent {}", agent.id)));
        }
        if self.node_for_address(&agent.agent_address)?.is_some() {
            return Err(AgentError::AlreadyExists(format!(
                "live agent for address {}",
                agent.agent_address
            )));
        }
        self.store
            .put_record(Keyspace::Agents, agent.id.as_bytes(), agent)?;
        if agent.is_active() {
            if let Err(e) = self.index_address(agent) {
                self.undo(self.store.delete(Keyspace::Agents, agent.id.as_bytes()).map(drop))?;
                return Err(e);
            }
        }
        tracing::debug!(
            agent = %agent.id,
            address = %agent.agent_address,
            deposit = %agent.deposit,
            "registered agent"
        );
        Ok(())
    }

    /// Remove an agent entirely. Only for rolling back its registration.
    pub fn remove_node(&self, id: &NodeId) -> Result<(), AgentError> {
        let Some(agent) = self.find_node(id)? else {
            return Ok(());
        };
        self.unindex_address(&agent)?;
        if let Err(e) = self.store.delete(Keyspace::Agents, id.as_bytes()) {
            if agent.is_active() {
                self.undo(self.index_address(&agent))?;
            }
            return Err(e.into());
        }
        tracing::debug!(agent = %id, "removed agent");
        Ok(())
    }

    /// Overwrite the agent's deposit. Rejects totals outside the agent's
    /// bounds with `OutOfRange`, leaving the record unchanged.
    pub fn update_deposit(
        &self,
        id: &NodeId,
        new_total: &Amount,
    ) -> Result<AgentRecord, AgentError> {
        let mut agent = self.get_node(id)?;
        if !agent.bounds.contains(new_total) {
            return Err(AgentError::OutOfRange {
                id: *id,
                total: new_total.clone(),
                min: agent.bounds.min.clone(),
                max: agent.bounds.max.clone(),
            });
        }
        agent.deposit = new_total.clone();
        self.store
            .put_record(Keyspace::Agents, id.as_bytes(), &agent)?;
        Ok(agent)
    }

    /// Change the agent's status. Returns the record as it was before.
    ///
    /// Leaving `Active` drops the address index so the owner may register
    /// again; returning to `Active` restores it.
    pub fn set_status(
        &self,
        id: &NodeId,
        status: AgentStatus,
        stop_height: Option<u64>,
    ) -> Result<AgentRecord, AgentError> {
        let previous = self.get_node(id)?;
        let mut updated = previous.clone();
        updated.status = status;
        updated.stop_height = stop_height;

        match (previous.is_active(), updated.is_active()) {
            (true, false) => self.unindex_address(&previous)?,
            (false, true) => {
                if let Some(other) = self.node_for_address(&updated.agent_address)? {
                    if other != *id {
                        return Err(AgentError::AlreadyExists(format!(
                            "live agent {other} for address {}",
                            updated.agent_address
                        )));
                    }
                }
                self.index_address(&updated)?
            }
            _ => {}
        }

        if let Err(e) = self
            .store
            .put_record(Keyspace::Agents, id.as_bytes(), &updated)
        {
            match (previous.is_active(), updated.is_active()) {
                (true, false) => self.undo(self.index_address(&previous))?,
                (false, true) => self.undo(self.unindex_address(&previous))?,
                _ => {}
            }
            return Err(e.into());
        }
        tracing::debug!(agent = %id, from = %previous.status, to = %status, "agent status changed");
        Ok(previous)
    }

    pub fn save_append_record(&self, record: &DepositRecord) -> Result<(), AgentError> {
        self.save_deposit_record(DepositKind::Append, record)
    }

    /// Idempotent: removing an absent record succeeds.
    pub fn remove_append_record(&self, tx_hash: &TxHash) -> Result<(), AgentError> {
        self.remove_deposit_record(DepositKind::Append, tx_hash)
    }

    pub fn save_reduce_record(&self, record: &DepositRecord) -> Result<(), AgentError> {
        self.save_deposit_record(DepositKind::Reduce, record)
    }

    /// Idempotent: removing an absent record succeeds.
    pub fn remove_reduce_record(&self, tx_hash: &TxHash) -> Result<(), AgentError> {
        self.remove_deposit_record(DepositKind::Reduce, tx_hash)
    }

    pub fn append_record(&self, tx_hash: &TxHash) -> Result<Option<DepositRecord>, AgentError> {
        self.deposit_record(DepositKind::Append, tx_hash)
    }

    pub fn reduce_record(&self, tx_hash: &TxHash) -> Result<Option<DepositRecord>, AgentError> {
        self.deposit_record(DepositKind::Reduce, tx_hash)
    }

    pub fn append_records_for(&self, agent: &NodeId) -> Result<Vec<DepositRecord>, AgentError> {
        self.deposit_records_for(DepositKind::Append, agent)
    }

    pub fn reduce_records_for(&self, agent: &NodeId) -> Result<Vec<DepositRecord>, AgentError> {
        self.deposit_records_for(DepositKind::Reduce, agent)
    }

    pub fn save_punish_record(&self, record: &PunishRecord) -> Result<(), AgentError> {
        Ok(self.store.put(
            Keyspace::PunishRecords,
            record.tx_hash.as_bytes(),
            &record.to_bytes(),
        )?)
    }

    /// Idempotent: removing an absent record succeeds.
    pub fn remove_punish_record(&self, tx_hash: &TxHash) -> Result<(), AgentError> {
        self.store.delete(Keyspace::PunishRecords, tx_hash.as_bytes())?;
        Ok(())
    }

    pub fn punish_record(&self, tx_hash: &TxHash) -> Result<Option<PunishRecord>, AgentError> {
        match self.store.get(Keyspace::PunishRecords, tx_hash.as_bytes())? {
            Some(bytes) => Ok(Some(PunishRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Compare the recorded deposit with `initial + appends - reduces`.
    pub fn audit_deposit(&self, id: &NodeId) -> Result<DepositAudit, AgentError> {
        let agent = self.get_node(id)?;
        let appends = self.append_records_for(id)?;
        let reduces = self.reduce_records_for(id)?;
        let added: Amount = appends.iter().map(|r| r.amount.clone()).sum();
        let removed: Amount = reduces.iter().map(|r| r.amount.clone()).sum();
        Ok(DepositAudit {
            recorded: agent.deposit,
            expected: &(&agent.initial_deposit + &added) - &removed,
            appends: appends.len(),
            reduces: reduces.len(),
        })
    }

    fn save_deposit_record(
        &self,
        kind: DepositKind,
        record: &DepositRecord,
    ) -> Result<(), AgentError> {
        let (records, index) = kind.spaces();
        self.store
            .put(records, record.tx_hash.as_bytes(), &record.to_bytes())?;
        if let Err(e) = self
            .store
            .put(index, &index_key(&record.agent_id, &record.tx_hash), &[])
        {
            self.undo(self.store.delete(records, record.tx_hash.as_bytes()).map(drop))?;
            return Err(e.into());
        }
        Ok(())
    }

    fn remove_deposit_record(&self, kind: DepositKind, tx_hash: &TxHash) -> Result<(), AgentError> {
        let (records, index) = kind.spaces();
        let Some(record) = self.deposit_record(kind, tx_hash)? else {
            return Ok(());
        };
        self.store
            .delete(index, &index_key(&record.agent_id, tx_hash))?;
        if let Err(e) = self.store.delete(records, tx_hash.as_bytes()) {
            self.undo(self.store.put(index, &index_key(&record.agent_id, tx_hash), &[]))?;
            return Err(e.into());
        }
        Ok(())
    }

    fn deposit_record(
        &self,
        kind: DepositKind,
        tx_hash: &TxHash,
    ) -> Result<Option<DepositRecord>, AgentError> {
        let (records, _) = kind.spaces();
        match self.store.get(records, tx_hash.as_bytes())? {
            Some(bytes) => Ok(Some(DepositRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn deposit_records_for(
        &self,
        kind: DepositKind,
        agent: &NodeId,
    ) -> Result<Vec<DepositRecord>, AgentError> {
        let (_, index) = kind.spaces();
        let mut out = Vec::new();
        for (key, _) in self.store.scan_prefix(index, agent.as_bytes())? {
            let mut hash = [0u8; 32];
            hash.copy_from_slice(&key[32..]);
            let tx_hash = TxHash::new(hash);
            let record = self.deposit_record(kind, &tx_hash)?.ok_or_else(|| {
                AgentError::Corrupt(format!("index entry for {tx_hash} has no record"))
            })?;
            out.push(record);
        }
        Ok(out)
    }

    fn index_address(&self, agent: &AgentRecord) -> Result<(), AgentError> {
        Ok(self.store.put_record(
            Keyspace::AgentAddresses,
            &agent.agent_address.to_bytes(),
            &agent.id,
        )?)
    }

    /// Drop the address index entry if it still points at this agent.
    fn unindex_address(&self, agent: &AgentRecord) -> Result<(), AgentError> {
        if self.node_for_address(&agent.agent_address)? == Some(agent.id) {
            self.store
                .delete(Keyspace::AgentAddresses, &agent.agent_address.to_bytes())?;
        }
        Ok(())
    }

    fn undo<E: std::fmt::Display>(&self, result: Result<(), E>) -> Result<(), AgentError> {
        result.map_err(|e| {
            tracing::error!(error = %e, "failed to undo partial agent write");
            AgentError::Corrupt(format!("undo of partial write failed: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_nullables::NullStore;
    use strata_types::{ChainId, DepositBounds, Timestamp};

    fn setup() -> (Arc<NullStore>, AgentManager) {
        let store = Arc::new(NullStore::new());
        (store.clone(), AgentManager::new(store))
    }

    fn agent(seed: u8, deposit: u32) -> AgentRecord {
        let addr = Address::new(ChainId::new(1), [seed; 20]);
        AgentRecord {
            id: NodeId::from_registration(TxHash::digest(&[seed])),
            agent_address: addr,
            packing_address: addr,
            reward_address: addr,
            commission_rate: 20,
            deposit: Amount::from(deposit),
            initial_deposit: Amount::from(deposit),
            bounds: DepositBounds::new(Amount::from(1000u32), Amount::from(5000u32)),
            status: AgentStatus::Active,
            registered_height: 1,
            registered_time: Timestamp::new(100),
            stop_height: None,
        }
    }

    fn deposit(agent: &AgentRecord, seed: u8, amount: u32) -> DepositRecord {
        DepositRecord {
            agent_id: agent.id,
            address: agent.agent_address,
            amount: Amount::from(amount),
            tx_hash: TxHash::digest(&[seed, 0xdd]),
            height: 2,
            time: Timestamp::new(200),
        }
    }

    #[test]
    fn register_and_get() {
        let (_, mgr) = setup();
        let a = agent(1, 1000);
        mgr.register_node(&a).unwrap();
        assert_eq!(mgr.get_node(&a.id).unwrap(), a);
        assert_eq!(mgr.node_for_address(&a.agent_address).unwrap(), Some(a.id));
        assert!(matches!(mgr.register_node(&a), Err(AgentError::AlreadyExists(_))));
    }

    #[test]
    fn missing_agent_is_not_found() {
        let (_, mgr) = setup();
        let err = mgr.get_node(&agent(9, 1000).id).unwrap_err();
        assert_eq!(err.code(), strata_types::ErrorCode::NotFound);
    }

    #[test]
    fn update_deposit_enforces_bounds() {
        let (_, mgr) = setup();
        let a = agent(1, 1000);
        mgr.register_node(&a).unwrap();
        mgr.update_deposit(&a.id, &Amount::from(5000u32)).unwrap();
        let err = mgr.update_deposit(&a.id, &Amount::from(5001u32)).unwrap_err();
        assert_eq!(err.code(), strata_types::ErrorCode::OutOfRange);
        assert!(mgr.update_deposit(&a.id, &Amount::from(999u32)).is_err());
        assert_eq!(mgr.get_node(&a.id).unwrap().deposit, Amount::from(5000u32));
    }

    #[test]
    fn stopping_frees_address_and_reverting_restores_it() {
        let (_, mgr) = setup();
        let a = agent(1, 1000);
        mgr.register_node(&a).unwrap();

        let before = mgr.set_status(&a.id, AgentStatus::Stopped, Some(7)).unwrap();
        assert_eq!(before.status, AgentStatus::Active);
        assert_eq!(mgr.node_for_address(&a.agent_address).unwrap(), None);
        assert!(matches!(
            mgr.get_active_node(&a.id),
            Err(AgentError::Inactive { .. })
        ));

        mgr.set_status(&a.id, before.status, before.stop_height).unwrap();
        assert_eq!(mgr.get_node(&a.id).unwrap(), a);
        assert_eq!(mgr.node_for_address(&a.agent_address).unwrap(), Some(a.id));
    }

    #[test]
    fn remove_node_undoes_registration() {
        let (store, mgr) = setup();
        let before = store.snapshot();
        let a = agent(1, 1000);
        mgr.register_node(&a).unwrap();
        mgr.remove_node(&a.id).unwrap();
        mgr.remove_node(&a.id).unwrap();
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn append_record_removal_is_idempotent() {
        let (store, mgr) = setup();
        let a = agent(1, 1000);
        mgr.register_node(&a).unwrap();
        let before = store.snapshot();

        let rec = deposit(&a, 1, 300);
        mgr.save_append_record(&rec).unwrap();
        assert_eq!(mgr.append_record(&rec.tx_hash).unwrap(), Some(rec.clone()));
        assert_eq!(mgr.append_records_for(&a.id).unwrap(), vec![rec.clone()]);

        mgr.remove_append_record(&rec.tx_hash).unwrap();
        mgr.remove_append_record(&rec.tx_hash).unwrap();
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn audit_tracks_appends_and_reduces() {
        let (_, mgr) = setup();
        let a = agent(1, 1000);
        mgr.register_node(&a).unwrap();
        mgr.save_append_record(&deposit(&a, 1, 3000)).unwrap();
        mgr.save_reduce_record(&deposit(&a, 2, 500)).unwrap();
        mgr.update_deposit(&a.id, &Amount::from(3500u32)).unwrap();

        let audit = mgr.audit_deposit(&a.id).unwrap();
        assert!(audit.is_consistent());
        assert_eq!((audit.appends, audit.reduces), (1, 1));

        mgr.update_deposit(&a.id, &Amount::from(4000u32)).unwrap();
        assert!(!mgr.audit_deposit(&a.id).unwrap().is_consistent());
    }

    #[test]
    fn punish_record_roundtrip_and_idempotent_removal() {
        let (_, mgr) = setup();
        let rec = PunishRecord {
            agent_id: agent(1, 1000).id,
            reason: 2,
            evidence: vec![1, 2, 3],
            tx_hash: TxHash::digest(b"punish"),
            height: 9,
            time: Timestamp::new(900),
        };
        mgr.save_punish_record(&rec).unwrap();
        assert_eq!(mgr.punish_record(&rec.tx_hash).unwrap(), Some(rec.clone()));
        mgr.remove_punish_record(&rec.tx_hash).unwrap();
        mgr.remove_punish_record(&rec.tx_hash).unwrap();
        assert_eq!(mgr.punish_record(&rec.tx_hash).unwrap(), None);
    }

    #[test]
    fn half_saved_record_is_undone() {
        let (store, mgr) = setup();
        let a = agent(1, 1000);
        store.fail_writes_to(Keyspace::DepositAppendsByAgent);
        assert!(mgr.save_append_record(&deposit(&a, 1, 10)).is_err());
        store.clear_faults();
        assert_eq!(mgr.append_record(&deposit(&a, 1, 10).tx_hash).unwrap(), None);
    }
}
