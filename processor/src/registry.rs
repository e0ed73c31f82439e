//! Static mapping from type tag to processor, built once at startup.

use std::collections::BTreeMap;
use std::sync::Arc;

use strata_transactions::TxType;

use crate::error::ProcessorError;
use crate::processor::TransactionProcessor;
use crate::processors::{
    AppendDepositProcessor, CrossChainProcessor, RedPunishProcessor, ReduceDepositProcessor,
    RegisterAgentProcessor, SetAliasProcessor, StopAgentProcessor, TransferProcessor,
};

#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    processors: BTreeMap<TxType, Arc<dyn TransactionProcessor>>,
}

impl ProcessorRegistry {
    /// An empty registry. Every type is unknown until registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a processor for every built-in transaction type.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        let processors: [Arc<dyn TransactionProcessor>; 8] = [
            Arc::new(TransferProcessor),
            Arc::new(SetAliasProcessor),
            Arc::new(RegisterAgentProcessor),
            Arc::new(RedPunishProcessor),
            Arc::new(StopAgentProcessor),
            Arc::new(CrossChainProcessor),
            Arc::new(AppendDepositProcessor),
            Arc::new(ReduceDepositProcessor),
        ];
        for processor in processors {
            // Each built-in type appears once above.
            let tx_type = processor.tx_type();
            registry.processors.insert(tx_type, processor);
        }
        registry
    }

    pub fn register(
        &mut self,
        processor: Arc<dyn TransactionProcessor>,
    ) -> Result<(), ProcessorError> {
        let tx_type = processor.tx_type();
        if self.processors.contains_key(&tx_type) {
            return Err(ProcessorError::DuplicateProcessor(tx_type));
        }
        self.processors.insert(tx_type, processor);
        Ok(())
    }

    pub fn get(&self, tx_type: TxType) -> Result<&Arc<dyn TransactionProcessor>, ProcessorError> {
        self.processors
            .get(&tx_type)
            .ok_or(ProcessorError::UnknownType(tx_type))
    }

    pub fn contains(&self, tx_type: TxType) -> bool {
        self.processors.contains_key(&tx_type)
    }

    /// Registered types in commit order.
    pub fn types(&self) -> Vec<TxType> {
        let mut types: Vec<TxType> = self.processors.keys().copied().collect();
        types.sort_by_key(|t| (t.commit_priority().unwrap_or(usize::MAX), *t));
        types
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}
