//! Transaction type tags and the fixed commit priority.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric tag carried by every transaction.
///
/// The set is open on the wire: a tag without a registered processor is
/// decoded fine and rejected later with a configuration error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxType(u16);

impl TxType {
    pub const TRANSFER: Self = Self(2);
    pub const SET_ALIAS: Self = Self(3);
    pub const REGISTER_AGENT: Self = Self(4);
    pub const RED_PUNISH: Self = Self(8);
    pub const STOP_AGENT: Self = Self(9);
    pub const CROSS_CHAIN: Self = Self(10);
    pub const APPEND_DEPOSIT: Self = Self(28);
    pub const REDUCE_DEPOSIT: Self = Self(29);

    /// Order in which type batches are committed within a block. Types that
    /// disable agents go first so later types observe the disabled state.
    pub const COMMIT_ORDER: [TxType; 8] = [
        Self::RED_PUNISH,
        Self::STOP_AGENT,
        Self::REGISTER_AGENT,
        Self::APPEND_DEPOSIT,
        Self::REDUCE_DEPOSIT,
        Self::SET_ALIAS,
        Self::TRANSFER,
        Self::CROSS_CHAIN,
    ];

    pub const fn new(tag: u16) -> Self {
        Self(tag)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn name(&self) -> Option<&'static str> {
        Some(match *self {
            Self::TRANSFER => "transfer",
            Self::SET_ALIAS => "set_alias",
            Self::REGISTER_AGENT => "register_agent",
            Self::RED_PUNISH => "red_punish",
            Self::STOP_AGENT => "stop_agent",
            Self::CROSS_CHAIN => "cross_chain_transfer",
            Self::APPEND_DEPOSIT => "append_deposit",
            Self::REDUCE_DEPOSIT => "reduce_deposit",
            _ => return None,
        })
    }

    /// Position in [`TxType::COMMIT_ORDER`]; `None` for unknown tags.
    pub fn commit_priority(&self) -> Option<usize> {
        Self::COMMIT_ORDER.iter().position(|t| t == self)
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "type-{}", self.0),
        }
    }
}

impl From<u16> for TxType {
    fn from(tag: u16) -> Self {
        Self(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabling_types_commit_before_deposit_changes() {
        let punish = TxType::RED_PUNISH.commit_priority().unwrap();
        let stop = TxType::STOP_AGENT.commit_priority().unwrap();
        let append = TxType::APPEND_DEPOSIT.commit_priority().unwrap();
        let reduce = TxType::REDUCE_DEPOSIT.commit_priority().unwrap();
        assert!(punish < append && stop < append && stop < reduce);
    }

    #[test]
    fn unknown_tag_has_no_priority() {
        let unknown = TxType::new(999);
        assert_eq!(unknown.commit_priority(), None);
        assert_eq!(unknown.to_string(), "type-999");
    }

    #[test]
    fn every_known_tag_is_ordered_once() {
        for t in TxType::COMMIT_ORDER {
            assert!(t.name().is_some());
            assert_eq!(TxType::COMMIT_ORDER.iter().filter(|x| **x == t).count(), 1);
        }
    }
}
