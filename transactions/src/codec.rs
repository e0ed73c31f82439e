//! Fixed-width binary wire codec.
//!
//! Integers are little-endian. Chain and asset ids are 16-bit, nonces are
//! 8 raw bytes, addresses are 22 raw bytes. Variable-length fields (byte
//! strings, UTF-8 strings, amounts, lists) carry a compact-size length prefix:
//! one byte below `0xfd`, otherwise a marker byte followed by a u16, u32 or u64.

use strata_types::{Address, Amount, AssetKey, ChainId, NodeId, Nonce, Timestamp, TxHash};

use crate::error::CodecError;

/// Types with a canonical wire representation.
pub trait WireCodec: Sized {
    fn encode(&self, enc: &mut Encoder);

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError>;

    fn to_bytes(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        self.encode(&mut enc);
        enc.into_bytes()
    }

    /// Decode a complete value; trailing bytes are an error.
    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut dec = Decoder::new(bytes);
        let value = Self::decode(&mut dec)?;
        dec.finish()?;
        Ok(value)
    }
}

#[derive(Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_varint(&mut self, v: u64) {
        if v < 0xfd {
            self.put_u8(v as u8);
        } else if v <= u16::MAX as u64 {
            self.put_u8(0xfd);
            self.put_u16(v as u16);
        } else if v <= u32::MAX as u64 {
            self.put_u8(0xfe);
            self.put_u32(v as u32);
        } else {
            self.put_u8(0xff);
            self.put_u64(v);
        }
    }

    /// Raw bytes with no length prefix.
    pub fn put_fixed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Length-prefixed bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.put_varint(bytes.len() as u64);
        self.put_fixed(bytes);
    }

    pub fn put_str(&mut self, s: &str) {
        self.put_bytes(s.as_bytes());
    }

    pub fn put<T: WireCodec>(&mut self, value: &T) {
        value.encode(self);
    }

    /// Length-prefixed list.
    pub fn put_list<T: WireCodec>(&mut self, items: &[T]) {
        self.put_varint(items.len() as u64);
        for item in items {
            item.encode(self);
        }
    }
}

/// Cursor over an input slice. Every read advances the cursor.
pub struct Decoder<'a> {
    cursor: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { cursor: bytes }
    }

    pub fn remaining(&self) -> usize {
        self.cursor.len()
    }

    pub fn finish(&self) -> Result<(), CodecError> {
        if self.cursor.is_empty() {
            Ok(())
        } else {
            Err(CodecError::TrailingBytes(self.cursor.len()))
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.cursor.len() < n {
            return Err(CodecError::UnexpectedEof {
                needed: n,
                remaining: self.cursor.len(),
            });
        }
        let (head, tail) = self.cursor.split_at(n);
        self.cursor = tail;
        Ok(head)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.take(N)?);
        Ok(arr)
    }

    pub fn get_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn get_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub fn get_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn get_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    pub fn get_varint(&mut self) -> Result<u64, CodecError> {
        match self.get_u8()? {
            0xfd => self.get_u16().map(u64::from),
            0xfe => self.get_u32().map(u64::from),
            0xff => self.get_u64(),
            b => Ok(u64::from(b)),
        }
    }

    /// A length prefix, checked against the bytes actually left.
    fn get_len(&mut self) -> Result<usize, CodecError> {
        let len = self.get_varint()?;
        if len > self.cursor.len() as u64 {
            return Err(CodecError::LengthOverflow {
                declared: len,
                remaining: self.cursor.len(),
            });
        }
        Ok(len as usize)
    }

    pub fn get_fixed<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        self.take_array()
    }

    pub fn get_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.get_len()?;
        Ok(self.take(len)?.to_vec())
    }

    pub fn get_str(&mut self) -> Result<String, CodecError> {
        String::from_utf8(self.get_bytes()?).map_err(|_| CodecError::InvalidUtf8)
    }

    pub fn get<T: WireCodec>(&mut self) -> Result<T, CodecError> {
        T::decode(self)
    }

    pub fn get_list<T: WireCodec>(&mut self) -> Result<Vec<T>, CodecError> {
        // Every element takes at least one byte, so the count is bounded by the input.
        let count = self.get_len()?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(T::decode(self)?);
        }
        Ok(items)
    }
}

impl WireCodec for ChainId {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u16(self.as_u16());
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        dec.get_u16().map(ChainId::new)
    }
}

impl WireCodec for AssetKey {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u16(self.chain_id.as_u16());
        enc.put_u16(self.asset_id);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let chain_id = ChainId::new(dec.get_u16()?);
        let asset_id = dec.get_u16()?;
        Ok(AssetKey::new(chain_id, asset_id))
    }
}

impl WireCodec for Address {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_fixed(&self.to_bytes());
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let raw: [u8; Address::LEN] = dec.get_fixed()?;
        Address::from_bytes(&raw).map_err(|e| CodecError::Invalid {
            field: "address",
            reason: e.to_string(),
        })
    }
}

impl WireCodec for Nonce {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_fixed(self.as_bytes());
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        dec.get_fixed().map(Nonce::new)
    }
}

impl WireCodec for TxHash {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_fixed(self.as_bytes());
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        dec.get_fixed().map(TxHash::new)
    }
}

impl WireCodec for NodeId {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_fixed(self.as_bytes());
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        dec.get::<TxHash>().map(NodeId::from_registration)
    }
}

impl WireCodec for Timestamp {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u64(self.as_secs());
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        dec.get_u64().map(Timestamp::new)
    }
}

impl WireCodec for Amount {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_bytes(&self.to_signed_bytes_le());
    }

    /// Only the minimal two's-complement form is accepted, so every amount
    /// has exactly one encoding.
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let bytes = dec.get_bytes()?;
        let amount = Amount::from_signed_bytes_le(&bytes);
        if amount.to_signed_bytes_le() != bytes {
            return Err(CodecError::Invalid {
                field: "amount",
                reason: format!("non-canonical encoding {}", hex::encode(&bytes)),
            });
        }
        Ok(amount)
    }
}
