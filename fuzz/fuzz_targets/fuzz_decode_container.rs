#![no_main]

use harp_container::Container;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(container) = Container::from_bytes(data) {
        // The codec is total and canonical: anything that decodes must
        // re-encode to the identical byte string.
        assert_eq!(container.to_bytes(), data);
    }
});
