//! The transaction envelope.

use strata_types::{ChainId, Nonce, Timestamp, TxHash};

use crate::codec::{Decoder, Encoder, WireCodec};
use crate::coin::CoinData;
use crate::error::CodecError;
use crate::payload::TxPayload;
use crate::TxType;

/// A transaction as carried in a block.
///
/// The hash is the Blake2b-256 digest of the wire encoding and is computed
/// once at construction. The nonce the transaction produces on every account
/// chain it debits is the hash suffix, so it depends only on declared fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    tx_type: TxType,
    chain_id: ChainId,
    time: Timestamp,
    payload: Vec<u8>,
    coin_data: CoinData,
    remark: Vec<u8>,
    hash: TxHash,
}

impl Transaction {
    pub fn new(
        tx_type: TxType,
        chain_id: ChainId,
        time: Timestamp,
        payload: Vec<u8>,
        coin_data: CoinData,
        remark: Vec<u8>,
    ) -> Self {
        let mut tx = Self {
            tx_type,
            chain_id,
            time,
            payload,
            coin_data,
            remark,
            hash: TxHash::ZERO,
        };
        tx.hash = TxHash::digest(&tx.to_bytes());
        tx
    }

    pub fn from_payload(
        chain_id: ChainId,
        time: Timestamp,
        payload: &TxPayload,
        coin_data: CoinData,
    ) -> Self {
        Self::new(
            payload.tx_type(),
            chain_id,
            time,
            payload.encode(),
            coin_data,
            Vec::new(),
        )
    }

    /// Same transaction with a remark attached (changes the hash).
    pub fn with_remark(self, remark: Vec<u8>) -> Self {
        Self::new(
            self.tx_type,
            self.chain_id,
            self.time,
            self.payload,
            self.coin_data,
            remark,
        )
    }

    pub fn tx_type(&self) -> TxType {
        self.tx_type
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn time(&self) -> Timestamp {
        self.time
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn coin_data(&self) -> &CoinData {
        &self.coin_data
    }

    pub fn remark(&self) -> &[u8] {
        &self.remark
    }

    pub fn hash(&self) -> &TxHash {
        &self.hash
    }

    /// The nonce this transaction produces on each chain it debits.
    pub fn nonce(&self) -> Nonce {
        self.hash.nonce()
    }

    /// Decode the payload as `T`.
    pub fn payload_as<T: WireCodec>(&self) -> Result<T, CodecError> {
        T::from_bytes(&self.payload)
    }
}

impl WireCodec for Transaction {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u16(self.tx_type.as_u16());
        enc.put(&self.chain_id);
        enc.put(&self.time);
        enc.put_bytes(&self.payload);
        enc.put(&self.coin_data);
        enc.put_bytes(&self.remark);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let tx_type = TxType::new(dec.get_u16()?);
        let chain_id = dec.get()?;
        let time = dec.get()?;
        let payload = dec.get_bytes()?;
        let coin_data = dec.get()?;
        let remark = dec.get_bytes()?;
        Ok(Self::new(tx_type, chain_id, time, payload, coin_data, remark))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::{CoinFrom, CoinTo};
    use crate::deposit::ChangeDepositData;
    use strata_types::{Address, Amount, AssetKey, NodeId};

    fn sample() -> Transaction {
        let chain = ChainId::new(1);
        let owner = Address::new(chain, [9; 20]);
        let asset = AssetKey::new(chain, 1);
        let payload = TxPayload::AppendDeposit(ChangeDepositData {
            address: owner,
            amount: Amount::from(500u32),
            agent_id: NodeId::from_registration(TxHash::digest(b"reg")),
        });
        let coin = CoinData::new(
            vec![CoinFrom {
                address: owner,
                asset,
                amount: Amount::from(500u32),
                nonce: Nonce::GENESIS,
            }],
            vec![CoinTo {
                address: owner,
                asset,
                amount: Amount::from(1u32),
            }],
        );
        Transaction::from_payload(chain, Timestamp::new(1_700_000_000), &payload, coin)
    }

    #[test]
    fn wire_roundtrip_preserves_hash() {
        let tx = sample();
        let decoded = Transaction::from_bytes(&tx.to_bytes()).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.hash(), tx.hash());
    }

    #[test]
    fn nonce_is_hash_suffix() {
        let tx = sample();
        assert_eq!(&tx.nonce().as_bytes()[..], &tx.hash().as_bytes()[24..]);
    }

    #[test]
    fn remark_changes_hash() {
        let tx = sample();
        let remarked = tx.clone().with_remark(b"memo".to_vec());
        assert_ne!(tx.hash(), remarked.hash());
        assert_eq!(remarked.remark(), b"memo");
    }

    #[test]
    fn payload_decodes_as_declared_struct() {
        let tx = sample();
        let data: ChangeDepositData = tx.payload_as().unwrap();
        assert_eq!(data.amount, Amount::from(500u32));
    }

    #[test]
    fn truncated_envelope_fails() {
        let bytes = sample().to_bytes();
        assert!(Transaction::from_bytes(&bytes[..bytes.len() - 2]).is_err());
    }
}
