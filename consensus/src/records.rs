//! Audit records for deposit changes and penalties.
//!
//! Stored in the wire format so they can be re-derived byte for byte from
//! the originating transaction.

use strata_transactions::{CodecError, Decoder, Encoder, WireCodec};
use strata_types::{Address, Amount, NodeId, Timestamp, TxHash};

/// One deposit increase or decrease.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositRecord {
    pub agent_id: NodeId,
    pub address: Address,
    /// Always positive; the keyspace it is stored in gives the direction.
    pub amount: Amount,
    pub tx_hash: TxHash,
    pub height: u64,
    pub time: Timestamp,
}

impl WireCodec for DepositRecord {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.agent_id);
        enc.put(&self.address);
        enc.put(&self.amount);
        enc.put(&self.tx_hash);
        enc.put_u64(self.height);
        enc.put(&self.time);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            agent_id: dec.get()?,
            address: dec.get()?,
            amount: dec.get()?,
            tx_hash: dec.get()?,
            height: dec.get_u64()?,
            time: dec.get()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PunishRecord {
    pub agent_id: NodeId,
    pub reason: u8,
    pub evidence: Vec<u8>,
    pub tx_hash: TxHash,
    pub height: u64,
    pub time: Timestamp,
}

impl WireCodec for PunishRecord {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.agent_id);
        enc.put_u8(self.reason);
        enc.put_bytes(&self.evidence);
        enc.put(&self.tx_hash);
        enc.put_u64(self.height);
        enc.put(&self.time);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            agent_id: dec.get()?,
            reason: dec.get_u8()?,
            evidence: dec.get_bytes()?,
            tx_hash: dec.get()?,
            height: dec.get_u64()?,
            time: dec.get()?,
        })
    }
}
