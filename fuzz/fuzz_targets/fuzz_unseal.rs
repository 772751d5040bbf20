#![no_main]

use harp_container::{unseal, RecipientSecretKey, UnsealOptions};
use libfuzzer_sys::fuzz_target;

// Fixed P-384 scalar so the fuzzer exercises the full unseal path
// (decode, point validation, derivation, recipient lookup) instead of
// stopping at key parsing.
const SCALAR: [u8; 48] = [
    0x74, 0x65, 0x72, 0x6d, 0x69, 0x6e, 0x69, 0x73, 0x74, 0x69, 0x63, 0x2d, 0x62, 0x75, 0x66,
    0x66, 0x70, 0x1a, 0x36, 0xe7, 0x93, 0x03, 0x2c, 0x42, 0xd4, 0x10, 0xbd, 0x74, 0x0e, 0xdf,
    0xa5, 0xf5, 0x96, 0x64, 0x6f, 0xeb, 0x22, 0xbd, 0x23, 0xb3, 0x1b, 0x10, 0x92, 0x2b, 0x5a,
    0x2f, 0x54, 0x4a,
];

fuzz_target!(|data: &[u8]| {
    let secret = match RecipientSecretKey::from_bytes(&SCALAR) {
        Ok(secret) => secret,
        Err(_) => return,
    };
    // Unsealing arbitrary bytes must fail cleanly, never panic.
    let _ = unseal(data, &secret, &UnsealOptions::default());
});
