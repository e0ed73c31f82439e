//! Logical keyspaces. Each maps to one database in a persistent backend.

use std::fmt;

/// A named keyspace inside the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Keyspace {
    /// Balance entries: `account ++ asset ++ nonce` → entry.
    LedgerEntries,
    /// Per (account, asset) chain state: `account ++ asset` → state.
    LedgerAccounts,
    /// Alias string → address.
    Aliases,
    /// Address → alias string.
    AliasOwners,
    /// Node id → agent record.
    Agents,
    /// Agent address → node id of its live registration.
    AgentAddresses,
    /// Deposit-append tx hash → audit record.
    DepositAppends,
    /// `node id ++ tx hash` → empty (index of appends per node).
    DepositAppendsByAgent,
    /// Deposit-reduce tx hash → audit record.
    DepositReduces,
    /// `node id ++ tx hash` → empty (index of reductions per node).
    DepositReducesByAgent,
    /// Punish tx hash → punish record.
    PunishRecords,
    /// Cross-chain tx hash → outbound coin outputs awaiting relay.
    CrossChainOutbox,
    /// Block height → header and committed transactions, kept for reorgs.
    AppliedBlocks,
    /// Internal bookkeeping (schema version).
    Meta,
}

impl Keyspace {
    pub const ALL: [Keyspace; 14] = [
        Keyspace::LedgerEntries,
        Keyspace::LedgerAccounts,
        Keyspace::Aliases,
        Keyspace::AliasOwners,
        Keyspace::Agents,
        Keyspace::AgentAddresses,
        Keyspace::DepositAppends,
        Keyspace::DepositAppendsByAgent,
        Keyspace::DepositReduces,
        Keyspace::DepositReducesByAgent,
        Keyspace::PunishRecords,
        Keyspace::CrossChainOutbox,
        Keyspace::AppliedBlocks,
        Keyspace::Meta,
    ];

    /// Database name used by persistent backends.
    pub fn name(&self) -> &'static str {
        match self {
            Keyspace::LedgerEntries => "ledger_entries",
            Keyspace::LedgerAccounts => "ledger_accounts",
            Keyspace::Aliases => "aliases",
            Keyspace::AliasOwners => "alias_owners",
            Keyspace::Agents => "agents",
            Keyspace::AgentAddresses => "agent_addresses",
            Keyspace::DepositAppends => "deposit_appends",
            Keyspace::DepositAppendsByAgent => "deposit_appends_by_agent",
            Keyspace::DepositReduces => "deposit_reduces",
            Keyspace::DepositReducesByAgent => "deposit_reduces_by_agent",
            Keyspace::PunishRecords => "punish_records",
            Keyspace::CrossChainOutbox => "cross_chain_outbox",
            Keyspace::AppliedBlocks => "applied_blocks",
            Keyspace::Meta => "meta",
        }
    }
}

impl fmt::Display for Keyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
