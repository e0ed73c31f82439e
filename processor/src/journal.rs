//! Reversible state changes and the journal that undoes them.
//!
//! Processors never call the state owners directly while committing or
//! rolling back. Each change is expressed as a [`Compensation`] and run
//! through [`Journal::perform`], which records the change that reverses it.
//! Unwinding a journal replays those reversals newest first, so a failed
//! batch returns to its starting state without any per-type undo code.

use strata_consensus::{AgentRecord, AgentStatus, DepositRecord, PunishRecord};
use strata_store::Keyspace;
use strata_types::{Address, Amount, AssetKey, NodeId, Nonce, TxHash};

use crate::context::ChainContext;
use crate::error::ProcessorError;

/// One reversible change to chain state.
///
/// Applying a change yields the change that reverses it, or `None` when
/// it turned out to be a no-op (removing something already absent).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Compensation {
    AppendEntry {
        account: Address,
        asset: AssetKey,
        from_nonce: Nonce,
        nonce: Nonce,
        delta: Amount,
    },
    RetractTip {
        account: Address,
        asset: AssetKey,
    },
    Credit {
        account: Address,
        asset: AssetKey,
        amount: Amount,
    },
    RevertCredit {
        account: Address,
        asset: AssetKey,
        amount: Amount,
    },
    RegisterAgent(Box<AgentRecord>),
    RemoveAgent(NodeId),
    SetDeposit {
        agent: NodeId,
        total: Amount,
    },
    SetStatus {
        agent: NodeId,
        status: AgentStatus,
        stop_height: Option<u64>,
    },
    SaveAppendRecord(DepositRecord),
    RemoveAppendRecord(TxHash),
    SaveReduceRecord(DepositRecord),
    RemoveReduceRecord(TxHash),
    SavePunishRecord(PunishRecord),
    RemovePunishRecord(TxHash),
    SetAlias {
        address: Address,
        alias: String,
    },
    RemoveAlias {
        address: Address,
        alias: String,
    },
    PutOutbox {
        tx_hash: TxHash,
        bytes: Vec<u8>,
    },
    DeleteOutbox(TxHash),
}

impl Compensation {
    /// Apply this change and return its inverse.
    pub fn apply(&self, chain: &ChainContext) -> Result<Option<Compensation>, ProcessorError> {
        let ledger = chain.ledger();
        let agents = chain.agents();
        let inverse = match self {
            Self::AppendEntry {
                account,
                asset,
                from_nonce,
                nonce,
                delta,
            } => {
                ledger.append_entry(account, asset, from_nonce, nonce, delta.clone())?;
                Some(Self::RetractTip {
                    account: *account,
                    asset: *asset,
                })
            }
            Self::RetractTip { account, asset } => {
                let entry = ledger.retract_tip(account, asset)?;
                Some(Self::AppendEntry {
                    account: entry.account,
                    asset: entry.asset,
                    from_nonce: entry.from_nonce,
                    nonce: entry.nonce,
                    delta: entry.delta,
                })
            }
            Self::Credit {
                account,
                asset,
                amount,
            } => {
                ledger.credit(account, asset, amount)?;
                Some(Self::RevertCredit {
                    account: *account,
                    asset: *asset,
                    amount: amount.clone(),
                })
            }
            Self::RevertCredit {
                account,
                asset,
                amount,
            } => {
                ledger.revert_credit(account, asset, amount)?;
                Some(Self::Credit {
                    account: *account,
                    asset: *asset,
                    amount: amount.clone(),
                })
            }
            Self::RegisterAgent(record) => {
                agents.register_node(record)?;
                Some(Self::RemoveAgent(record.id))
            }
            Self::RemoveAgent(id) => {
                let existing = agents.find_node(id)?;
                agents.remove_node(id)?;
                existing.map(|record| Self::RegisterAgent(Box::new(record)))
            }
            Self::SetDeposit { agent, total } => {
                let previous = agents.get_node(agent)?.deposit;
                agents.update_deposit(agent, total)?;
                Some(Self::SetDeposit {
                    agent: *agent,
                    total: previous,
                })
            }
            Self::SetStatus {
                agent,
                status,
                stop_height,
            } => {
                let previous = agents.set_status(agent, *status, *stop_height)?;
                Some(Self::SetStatus {
                    agent: *agent,
                    status: previous.status,
                    stop_height: previous.stop_height,
                })
            }
            Self::SaveAppendRecord(record) => {
                agents.save_append_record(record)?;
                Some(Self::RemoveAppendRecord(record.tx_hash))
            }
            Self::RemoveAppendRecord(tx_hash) => {
                let existing = agents.append_record(tx_hash)?;
                agents.remove_append_record(tx_hash)?;
                existing.map(Self::SaveAppendRecord)
            }
            Self::SaveReduceRecord(record) => {
                agents.save_reduce_record(record)?;
                Some(Self::RemoveReduceRecord(record.tx_hash))
            }
            Self::RemoveReduceRecord(tx_hash) => {
                let existing = agents.reduce_record(tx_hash)?;
                agents.remove_reduce_record(tx_hash)?;
                existing.map(Self::SaveReduceRecord)
            }
            Self::SavePunishRecord(record) => {
                agents.save_punish_record(record)?;
                Some(Self::RemovePunishRecord(record.tx_hash))
            }
            Self::RemovePunishRecord(tx_hash) => {
                let existing = agents.punish_record(tx_hash)?;
                agents.remove_punish_record(tx_hash)?;
                existing.map(Self::SavePunishRecord)
            }
            Self::SetAlias { address, alias } => {
                chain.aliases().set_alias(address, alias)?;
                Some(Self::RemoveAlias {
                    address: *address,
                    alias: alias.clone(),
                })
            }
            Self::RemoveAlias { address, alias } => {
                let bound = chain.aliases().alias_of(address)?.as_deref() == Some(alias.as_str());
                chain.aliases().remove_alias(address, alias)?;
                bound.then(|| Self::SetAlias {
                    address: *address,
                    alias: alias.clone(),
                })
            }
            Self::PutOutbox { tx_hash, bytes } => {
                let store = chain.store();
                let previous = store.get(Keyspace::CrossChainOutbox, tx_hash.as_bytes())?;
                store.put(Keyspace::CrossChainOutbox, tx_hash.as_bytes(), bytes)?;
                Some(match previous {
                    Some(bytes) => Self::PutOutbox {
                        tx_hash: *tx_hash,
                        bytes,
                    },
                    None => Self::DeleteOutbox(*tx_hash),
                })
            }
            Self::DeleteOutbox(tx_hash) => {
                let store = chain.store();
                let previous = store.get(Keyspace::CrossChainOutbox, tx_hash.as_bytes())?;
                store.delete(Keyspace::CrossChainOutbox, tx_hash.as_bytes())?;
                previous.map(|bytes| Self::PutOutbox {
                    tx_hash: *tx_hash,
                    bytes,
                })
            }
        };
        Ok(inverse)
    }
}

/// Inverses of every change performed so far, oldest first.
#[derive(Debug, Default)]
pub struct Journal {
    compensations: Vec<Compensation>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `change` and remember how to reverse it.
    pub fn perform(
        &mut self,
        chain: &ChainContext,
        change: Compensation,
    ) -> Result<(), ProcessorError> {
        if let Some(inverse) = change.apply(chain)? {
            self.compensations.push(inverse);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.compensations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compensations.is_empty()
    }

    pub fn compensations(&self) -> &[Compensation] {
        &self.compensations
    }

    /// Move every compensation of `later` after the ones already recorded.
    pub fn append(&mut self, mut later: Journal) {
        self.compensations.append(&mut later.compensations);
    }

    /// Reverse every recorded change, newest first.
    ///
    /// A failure here means state is left partially reversed, so it is
    /// reported as corruption rather than as the underlying error.
    pub fn unwind(self, chain: &ChainContext) -> Result<(), ProcessorError> {
        let total = self.compensations.len();
        for (undone, compensation) in self.compensations.into_iter().rev().enumerate() {
            if let Err(e) = compensation.apply(chain) {
                tracing::error!(
                    chain = %chain.chain_id(),
                    undone,
                    total,
                    error = %e,
                    "compensation failed while unwinding"
                );
                return Err(ProcessorError::StateCorruption(format!(
                    "compensation {compensation:?} failed after {undone} of {total}: {e}"
                )));
            }
        }
        tracing::debug!(chain = %chain.chain_id(), total, "journal unwound");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_nullables::NullStore;
    use strata_types::{ChainConfig, ChainId};

    fn setup() -> (Arc<NullStore>, ChainContext) {
        let store = Arc::new(NullStore::new());
        (store.clone(), ChainContext::new(ChainConfig::new(ChainId::new(1)), store))
    }

    fn account() -> (Address, AssetKey) {
        (Address::new(ChainId::new(1), [3; 20]), AssetKey::new(ChainId::new(1), 1))
    }

    #[test]
    fn unwind_restores_ledger() {
        let (store, chain) = setup();
        let (account, asset) = account();
        let before = store.snapshot();

        let mut journal = Journal::new();
        journal
            .perform(&chain, Compensation::Credit { account, asset, amount: Amount::from(50u32) })
            .unwrap();
        journal
            .perform(
                &chain,
                Compensation::AppendEntry {
                    account,
                    asset,
                    from_nonce: Nonce::GENESIS,
                    nonce: Nonce::new([1; 8]),
                    delta: Amount::from(-20i32),
                },
            )
            .unwrap();
        assert_eq!(journal.len(), 2);
        assert_eq!(chain.ledger().current_balance(&account, &asset).unwrap(), Amount::from(30u32));

        journal.unwind(&chain).unwrap();
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn retract_inverse_reappends_same_entry() {
        let (_, chain) = setup();
        let (account, asset) = account();
        let nonce = Nonce::new([4; 8]);
        chain
            .ledger()
            .append_entry(&account, &asset, &Nonce::GENESIS, &nonce, Amount::from(-5i32))
            .unwrap();

        let inverse = Compensation::RetractTip { account, asset }.apply(&chain).unwrap();
        assert_eq!(
            inverse,
            Some(Compensation::AppendEntry {
                account,
                asset,
                from_nonce: Nonce::GENESIS,
                nonce,
                delta: Amount::from(-5i32),
            })
        );
    }

    #[test]
    fn removing_absent_records_has_no_inverse() {
        let (_, chain) = setup();
        let hash = TxHash::digest(b"missing");
        assert_eq!(Compensation::RemoveAppendRecord(hash).apply(&chain).unwrap(), None);
        assert_eq!(Compensation::DeleteOutbox(hash).apply(&chain).unwrap(), None);
        let mut journal = Journal::new();
        journal.perform(&chain, Compensation::RemovePunishRecord(hash)).unwrap();
        assert!(journal.is_empty());
    }

    #[test]
    fn failed_unwind_is_state_corruption() {
        let (store, chain) = setup();
        let (account, asset) = account();
        let mut journal = Journal::new();
        journal
            .perform(&chain, Compensation::Credit { account, asset, amount: Amount::from(1u32) })
            .unwrap();
        store.fail_writes_to(Keyspace::LedgerAccounts);
        let err = journal.unwind(&chain).unwrap_err();
        assert!(err.is_fatal());
    }
}
