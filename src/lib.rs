#![forbid(unsafe_code)]
#![warn(clippy::all)]

//! A compact, DTLS-inspired secure transport for CoAP-style UDP nodes.
//!
//! The crate provides the protocol engine: a record layer with
//! variable-width header fields, AES-128-CCM-8 record protection, a
//! PSK + ECDHE client handshake over a request/response channel, and
//! per-peer session state with epoch and sequence-window bookkeeping.
//! Session and PSK storage are injected through the [`SessionStore`] and
//! [`PskStore`] traits; in-memory implementations ship with the crate.

mod config;
mod engine;
mod error;
mod handshake;
mod listener;
mod psk;
mod record;
mod session;
mod socket;
mod util;

pub mod crypto;
pub mod message;

pub use config::{Config, ConfigBuilder, DEFAULT_PORT, HELLO_PROBE};
pub use engine::{Engine, Received};
pub use error::{CryptoError, Error, HandshakeError, RecordError, SessionError};
pub use handshake::{run_client_handshake, HandshakeState, HandshakeTransport};
pub use listener::NodeListener;
pub use psk::{InMemoryPskStore, PskEntry, PskStore, UUID_LEN};
pub use record::{
    ContentType, Epoch, ProtocolVersion, Record, RecordLength, SequenceNumber, MAX_SEQUENCE,
};
pub use session::{
    InMemorySessionStore, KeyBlock, Session, SessionStore, SessionStoreExt, KEY_BLOCK_LEN,
};
pub use socket::SecureSocket;
