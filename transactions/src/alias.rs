use serde::{Deserialize, Serialize};
use strata_types::Address;

use crate::codec::{Decoder, Encoder, WireCodec};
use crate::error::CodecError;

pub const ALIAS_MIN_LEN: usize = 1;
pub const ALIAS_MAX_LEN: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAliasData {
    pub address: Address,
    pub alias: String,
}

impl SetAliasData {
    /// Lowercase ASCII letters, digits and `_`, not starting or ending with `_`.
    pub fn alias_is_well_formed(&self) -> bool {
        let a = self.alias.as_bytes();
        (ALIAS_MIN_LEN..=ALIAS_MAX_LEN).contains(&a.len())
            && a.iter()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'_')
            && a.first() != Some(&b'_')
            && a.last() != Some(&b'_')
    }
}

impl WireCodec for SetAliasData {
    fn encode(&self, enc: &mut Encoder) {
        enc.put(&self.address);
        enc.put_str(&self.alias);
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            address: dec.get()?,
            alias: dec.get_str()?,
        })
    }
}
