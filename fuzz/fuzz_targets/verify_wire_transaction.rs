#![no_main]
use concordat::core::ledger::contract;
use concordat::core::ledger::transaction::WireTransaction;
use concordat::core::types::decode_canonical_limited;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(tx) = decode_canonical_limited::<WireTransaction>(data, 1 << 20) {
        // Verification of any decodable transaction must not panic, and the
        // verdict must be stable across repeated runs on the same input.
        let first = contract::verify(&tx);
        let second = contract::verify(&tx);
        assert_eq!(first, second);
    }
});
