//! Coin data: the debits and credits attached to every transaction.

use serde::{Deserialize, Serialize};
use strata_types::{Address, Amount, AssetKey, Nonce};

use crate::codec::{Decoder, Encoder, WireCodec};
use crate::error::CodecError;

/// A debit. `nonce` is the sender's chain tip the spend builds on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinFrom {
    pub address: Address,
    pub asset: AssetKey,
    pub amount: Amount,
    pub nonce: Nonce,
}

/// A credit. Credits do not consume nonces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinTo {
    pub address: Address,
    pub asset: AssetKey,
    pub amount: Amount,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinData {
    #[serde(default)]
    pub from: Vec<CoinFrom>,
    #[serde(default)]
    pub to: Vec<CoinTo>,
}

impl CoinData {
    pub fn new(from: Vec<CoinFrom>, to: Vec<CoinTo>) -> Self {
        Self { from, to }
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_empty() && self.to.is_empty()
    }
}

impl WireCodec for CoinFrom {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.address);
        enc.put(&self.asset);
        enc.put(&self.amount);
        enc.put(&self.nonce);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            address: dec.get()?,
            asset: dec.get()?,
            amount: dec.get()?,
            nonce: dec.get()?,
        })
    }
}

impl WireCodec for CoinTo {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.address);
        enc.put(&self.asset);
        enc.put(&self.amount);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            address: dec.get()?,
            asset: dec.get()?,
            amount: dec.get()?,
        })
    }
}

impl WireCodec for CoinData {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_list(&self.from);
        enc.put_list(&self.to);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            from: dec.get_list()?,
            to: dec.get_list()?,
        })
    }
}
