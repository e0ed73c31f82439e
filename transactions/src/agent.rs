use serde::{Deserialize, Serialize};
use strata_types::{Address, Amount};

use crate::codec::{Decoder, Encoder, WireCodec};
use crate::error::CodecError;

/// Register a consensus agent. The node id becomes the hash of this transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterAgentData {
    /// Owner address; the deposit is locked from and later returned to it.
    pub agent_address: Address,
    /// Address that signs produced blocks.
    pub packing_address: Address,
    pub reward_address: Address,
    pub deposit: Amount,
    /// Commission rate in percent.
    pub commission_rate: u8,
}

impl WireCodec for RegisterAgentData {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.agent_address);
        enc.put(&self.packing_address);
        enc.put(&self.reward_address);
        enc.put(&self.deposit);
        enc.put_u8(self.commission_rate);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            agent_address: dec.get()?,
            packing_address: dec.get()?,
            reward_address: dec.get()?,
            deposit: dec.get()?,
            commission_rate: dec.get_u8()?,
        })
    }
}
