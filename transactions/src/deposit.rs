use serde::{Deserialize, Serialize};
use strata_types::{Address, Amount, NodeId};

use crate::codec::{Decoder, Encoder, WireCodec};
use crate::error::CodecError;

/// Payload shared by deposit-append and deposit-reduce transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDepositData {
    /// The agent owner's address.
    pub address: Address,
    /// Always positive; the transaction type gives the direction.
    pub amount: Amount,
    pub agent_id: NodeId,
}

impl WireCodec for ChangeDepositData {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.address);
        enc.put(&self.amount);
        enc.put(&self.agent_id);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            address: dec.get()?,
            amount: dec.get()?,
            agent_id: dec.get()?,
        })
    }
}
