#![no_main]

use libfuzzer_sys::fuzz_target;
use strata_transactions::{TxPayload, TxType};

// First byte picks the transaction type, the rest is the payload.
fuzz_target!(|data: &[u8]| {
    let Some((&kind, bytes)) = data.split_first() else {
        return;
    };
    let tx_type = TxType::new(u16::from(kind % 12));
    if let Ok(payload) = TxPayload::decode(tx_type, bytes) {
        assert_eq!(payload.tx_type(), tx_type);
        let _ = TxPayload::decode(tx_type, &payload.encode());
    }
});
