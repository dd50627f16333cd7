#![no_main]

//! Fuzz target for the receive pipeline.
//!
//! `unprotect` must never raise on hostile datagrams, with or without an
//! installed key block.

use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

use codtls::{Config, Engine, InMemoryPskStore, InMemorySessionStore, SessionStoreExt};

fuzz_target!(|data: &[u8]| {
    let engine = Engine::new(
        Arc::new(Config::default()),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(InMemoryPskStore::new()),
    );
    let peer = "127.0.0.1".parse().unwrap();

    // Epoch 0 session.
    let received = engine.unprotect(data, peer, 1024);
    assert!(received.payload.len() <= 1024);

    // Epoch 1 session with a key block installed.
    engine.sessions().with(peer, |s| {
        s.set_key_block(b"ABCDEFGHIJKLMNOPABCDEFGHIJKLMNOPABCDABCD")
            .unwrap();
        s.increase_epoch().unwrap();
    });
    let received = engine.unprotect(data, peer, 1024);
    assert!(received.payload.len() <= 1024);
});
