use serde::{Deserialize, Serialize};
use strata_types::NodeId;

use crate::codec::{Decoder, Encoder, WireCodec};
use crate::error::CodecError;

/// Severe penalty: the agent is disabled and its deposit stays locked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedPunishData {
    pub agent_id: NodeId,
    pub reason: u8,
    #[serde(with = "crate::hex_bytes")]
    pub evidence: Vec<u8>,
}

impl WireCodec for RedPunishData {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.agent_id);
        enc.put_u8(self.reason);
        enc.put_bytes(&self.evidence);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            agent_id: dec.get()?,
            reason: dec.get_u8()?,
            evidence: dec.get_bytes()?,
        })
    }
}
