use serde::{Deserialize, Serialize};
use strata_types::{Address, NodeId};

use crate::codec::{Decoder, Encoder, WireCodec};
use crate::error::CodecError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopAgentData {
    pub address: Address,
    pub agent_id: NodeId,
}

impl WireCodec for StopAgentData {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.address);
        enc.put(&self.agent_id);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            address: dec.get()?,
            agent_id: dec.get()?,
        })
    }
}
