use serde::{Deserialize, Serialize};
use strata_types::ChainId;

use crate::codec::{Decoder, Encoder, WireCodec};
use crate::error::CodecError;

/// Cross-chain transfer. Outputs whose address lives on `target_chain` are
/// held in the outbox for relay; outputs on the local chain are credited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainData {
    pub target_chain: ChainId,
}

impl WireCodec for CrossChainData {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.target_chain);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            target_chain: dec.get()?,
        })
    }
}
