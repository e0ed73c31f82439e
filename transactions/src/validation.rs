//! Stateless structural validation.

use std::collections::HashSet;

use crate::error::TransactionError;
use crate::Transaction;

pub const MAX_REMARK_LEN: usize = 100;

/// Check a transaction's coin data and remark without touching state.
///
/// Stateful checks (nonces, balances, agent status) are done by the
/// per-type processors against the ledger and agent manager.
pub fn validate_structure(tx: &Transaction) -> Result<(), TransactionError> {
    if tx.remark().len() > MAX_REMARK_LEN {
        return Err(TransactionError::RemarkTooLong {
            len: tx.remark().len(),
            max: MAX_REMARK_LEN,
        });
    }

    let coin = tx.coin_data();
    let mut seen = HashSet::with_capacity(coin.from.len());
    for input in &coin.from {
        if !input.amount.is_positive() {
            return Err(TransactionError::NonPositiveAmount);
        }
        // One debit per account chain: a second one would need a nonce
        // produced by this same transaction.
        if !seen.insert((input.address, input.asset)) {
            return Err(TransactionError::DuplicateInput {
                address: input.address,
                asset: input.asset,
            });
        }
    }
    if coin.to.iter().any(|output| !output.amount.is_positive()) {
        return Err(TransactionError::NonPositiveAmount);
    }

    Ok(())
}

/// [`validate_structure`] plus a requirement that something is debited.
pub fn validate_spending(tx: &Transaction) -> Result<(), TransactionError> {
    validate_structure(tx)?;
    if tx.coin_data().from.is_empty() {
        return Err(TransactionError::NoInputs);
    }
    Ok(())
}
