#![no_main]

use libfuzzer_sys::fuzz_target;
use strata_transactions::{Transaction, WireCodec};

// Decoding arbitrary bytes must never panic, and whatever decodes must
// encode back to the same bytes with the same hash.
fuzz_target!(|data: &[u8]| {
    if let Ok(tx) = Transaction::from_bytes(data) {
        let encoded = tx.to_bytes();
        let again = Transaction::from_bytes(&encoded).expect("re-encoded transaction must decode");
        assert_eq!(again, tx);
        assert_eq!(again.hash(), tx.hash());
    }
});
