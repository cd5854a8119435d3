#![no_main]
use concordat::core::ledger::transaction::SignedTransaction;
use concordat::core::types::decode_canonical_limited;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Canonical decoding of untrusted bytes must never panic; malformed or
    // oversized input is an Err, nothing more.
    let _ = decode_canonical_limited::<SignedTransaction>(data, 1 << 20);
});
