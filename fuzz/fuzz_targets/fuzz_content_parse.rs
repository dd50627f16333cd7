#![no_main]

//! Fuzz target for the handshake content framing.
//!
//! Reading contents from arbitrary bytes must never panic; every parsed
//! message must survive a write/read roundtrip.

use libfuzzer_sys::fuzz_target;

use codtls::message::{read_content, write_content};

fuzz_target!(|data: &[u8]| {
    let mut input = data;
    // Consume frames until the buffer errors out or runs dry.
    while let Ok((message, rest)) = read_content(input) {
        let mut wire = Vec::new();
        write_content(&mut wire, &message);
        let (reparsed, leftover) = read_content(&wire).expect("reframed message");
        assert!(leftover.is_empty());
        assert_eq!(reparsed, message);

        if rest.len() == input.len() {
            break;
        }
        input = rest;
    }
});
