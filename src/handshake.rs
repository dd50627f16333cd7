//! Client-side handshake orchestration.
//!
//! The exchange runs over a request/response channel (a CoAP-style POST in
//! practice), three flights deep:
//!
//! 1. ClientHello without cookie -> HelloVerifyRequest
//! 2. ClientHello with cookie -> ServerHello + ServerKeyExchange +
//!    ServerHelloDone
//! 3. ClientKeyExchange + ChangeCipherSpec + protected Finished ->
//!    ChangeCipherSpec + protected Finished
//!
//! The pre-master secret combines the PSK selected by the server's hint
//! with the ECDHE shared secret; the Finished values MAC the running
//! transcript. Neither a failed attempt nor a retry needs cleanup: the
//! session is simply left in handshake mode without a key block.

use std::io;
use std::net::IpAddr;

use log::{debug, trace};
use zeroize::Zeroize;

use crate::crypto::{ecdh, prf};
use crate::engine::Engine;
use crate::error::{Error, HandshakeError, SessionError};
use crate::message::{
    self, ChangeCipherSpec, ClientHello, Finished, KeyExchange, Message, Random,
};
use crate::psk::PskStore;
use crate::session::{SessionStoreExt, KEY_BLOCK_LEN};

/// Length of the master secret.
const MASTER_SECRET_LEN: usize = 48;
/// Length of a finished verification value.
const FINISHED_LEN: usize = 12;

/// The transport the handshake runs over. Implementations wrap whatever
/// request/response mechanism reaches the peer; the engine imposes no
/// timeout of its own, a non-responding peer is the implementation's
/// concern.
pub trait HandshakeTransport {
    /// CoAP-style GET of the peer's device identifier.
    fn fetch_uuid(&mut self, peer: IpAddr) -> io::Result<Vec<u8>>;

    /// One request/response round trip on the handshake channel.
    fn exchange(&mut self, peer: IpAddr, request: &[u8]) -> io::Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientState {
    Init,
    SentHello1,
    SentHello2,
    KeyExchanged,
    Finished,
}

/// Ephemeral secrets of one handshake attempt.
pub struct HandshakeState {
    client_random: Random,
    server_random: Option<Random>,
    private_scalar: [u8; ecdh::SCALAR_LEN],
    psk: Option<Vec<u8>>,
    master_secret: Option<[u8; MASTER_SECRET_LEN]>,
    transcript: Vec<u8>,
}

impl HandshakeState {
    pub fn new() -> Self {
        HandshakeState {
            client_random: Random::new(),
            server_random: None,
            private_scalar: ecdh::generate_scalar(),
            psk: None,
            master_secret: None,
            transcript: Vec::new(),
        }
    }

    pub fn client_random(&self) -> Random {
        self.client_random
    }

    pub fn set_server_random(&mut self, random: Random) {
        self.server_random = Some(random);
    }

    /// Select the PSK the server hinted at. False if the store knows no
    /// such device.
    pub fn choose_psk(&mut self, store: &dyn PskStore, hint: &[u8]) -> bool {
        match store.get(hint) {
            Some(psk) => {
                self.psk = Some(psk);
                true
            }
            None => false,
        }
    }

    /// Our ephemeral public point, uncompressed.
    pub fn public_point(&self) -> Result<Vec<u8>, Error> {
        Ok(ecdh::base_mult(&self.private_scalar)?)
    }

    /// Complete the ECDHE exchange with the server's public point and
    /// derive the master secret. Requires the PSK and server random.
    pub fn set_server_point(&mut self, point: &[u8]) -> Result<(), Error> {
        let psk = self.psk.as_ref().ok_or(HandshakeError::MissingPsk)?;
        let server_random = self
            .server_random
            .ok_or(HandshakeError::MissingServerRandom)?;

        let shared = ecdh::scalar_mult(&self.private_scalar, point)?;

        // Pre-master secret: 0x0010 || PSK || 0x0020 || X coordinate.
        let mut pre_master = Vec::with_capacity(4 + psk.len() + 32);
        pre_master.extend_from_slice(&[0x00, 0x10]);
        pre_master.extend_from_slice(psk);
        pre_master.extend_from_slice(&[0x00, 0x20]);
        pre_master.extend_from_slice(&shared[1..33]);

        let mut seed = [0u8; 64];
        seed[..32].copy_from_slice(&self.client_random.to_bytes());
        seed[32..].copy_from_slice(&server_random.to_bytes());

        let mut derived = prf::derive(&pre_master, "master secret", &seed, MASTER_SECRET_LEN);
        let mut master = [0u8; MASTER_SECRET_LEN];
        master.copy_from_slice(&derived);
        self.master_secret = Some(master);

        pre_master.zeroize();
        derived.zeroize();
        Ok(())
    }

    /// The 40-byte key block for the next epoch. Requires the master
    /// secret.
    pub fn key_block(&self) -> Result<[u8; KEY_BLOCK_LEN], HandshakeError> {
        let master = self
            .master_secret
            .as_ref()
            .ok_or(HandshakeError::MissingMasterSecret)?;
        let server_random = self
            .server_random
            .ok_or(HandshakeError::MissingServerRandom)?;

        let mut seed = [0u8; 64];
        seed[..32].copy_from_slice(&server_random.to_bytes());
        seed[32..].copy_from_slice(&self.client_random.to_bytes());

        let derived = prf::derive(master, "key expansion", &seed, KEY_BLOCK_LEN);
        let mut block = [0u8; KEY_BLOCK_LEN];
        block.copy_from_slice(&derived);
        Ok(block)
    }

    /// Append exchanged handshake bytes to the running transcript.
    pub fn add_transcript(&mut self, data: &[u8]) {
        self.transcript.extend_from_slice(data);
    }

    /// The finished verification value for `label` ("client finished" or
    /// "server finished") over the current transcript.
    pub fn finished(&self, label: &str) -> Result<[u8; FINISHED_LEN], HandshakeError> {
        let master = self
            .master_secret
            .as_ref()
            .ok_or(HandshakeError::MissingMasterSecret)?;
        let psk = self.psk.as_ref().ok_or(HandshakeError::MissingPsk)?;

        let seed = prf::mac(psk, &self.transcript);
        let derived = prf::derive(master, label, &seed, FINISHED_LEN);
        let mut value = [0u8; FINISHED_LEN];
        value.copy_from_slice(&derived);
        Ok(value)
    }
}

impl Default for HandshakeState {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for HandshakeState {
    fn drop(&mut self) {
        self.private_scalar.zeroize();
        if let Some(psk) = self.psk.as_mut() {
            psk.zeroize();
        }
        if let Some(master) = self.master_secret.as_mut() {
            master.zeroize();
        }
    }
}

/// Run a full client handshake with `peer` over `transport`.
///
/// On success the session holds the fresh key block at epoch 1 and
/// handshake mode is off. On failure the error names the step that went
/// wrong and the session is left restartable.
pub fn run_client_handshake(
    engine: &Engine,
    transport: &mut dyn HandshakeTransport,
    peer: IpAddr,
) -> Result<(), Error> {
    let peer = peer.to_canonical();
    let mut state = ClientState::Init;
    debug!("starting handshake with {} ({:?})", peer, state);

    engine.sessions().with(peer, |s| s.enable_handshake());

    // Pre-flight: fetch the device identifier and make sure we share a
    // key at all before doing any cryptography.
    let uuid = transport
        .fetch_uuid(peer)
        .map_err(HandshakeError::Transport)?;
    if engine.psks().get(&uuid).is_none() {
        return Err(HandshakeError::UnknownPeer.into());
    }

    let mut secrets = HandshakeState::new();
    let mut hello = ClientHello::new(secrets.client_random());

    // Flight 1: ClientHello without cookie.
    let mut msg = Vec::new();
    message::write_content(&mut msg, &Message::ClientHello(hello));
    state = ClientState::SentHello1;
    trace!("handshake {:?} with {}", state, peer);

    let response = transport
        .exchange(peer, &msg)
        .map_err(HandshakeError::Transport)?;
    let (content, _) = message::read_content(&response)?;
    let Message::HelloVerifyRequest(verify) = content else {
        return Err(HandshakeError::UnexpectedMessage {
            expected: "HelloVerifyRequest",
        }
        .into());
    };

    // Flight 2: ClientHello with the server's cookie. From here on the
    // exchange is part of the finished transcript.
    hello.cookie = Some(verify.cookie);
    msg.clear();
    message::write_content(&mut msg, &Message::ClientHello(hello));
    secrets.add_transcript(&msg);
    state = ClientState::SentHello2;
    trace!("handshake {:?} with {}", state, peer);

    let response = transport
        .exchange(peer, &msg)
        .map_err(HandshakeError::Transport)?;
    secrets.add_transcript(&response);

    let (content, rest) = message::read_content(&response)?;
    let Message::ServerHello(server_hello) = content else {
        return Err(HandshakeError::UnexpectedMessage {
            expected: "ServerHello",
        }
        .into());
    };
    let (content, rest) = message::read_content(rest)?;
    let Message::ServerKeyExchange(server_kx) = content else {
        return Err(HandshakeError::UnexpectedMessage {
            expected: "ServerKeyExchange",
        }
        .into());
    };
    let (content, _) = message::read_content(rest)?;
    let Message::ServerHelloDone(_) = content else {
        return Err(HandshakeError::UnexpectedMessage {
            expected: "ServerHelloDone",
        }
        .into());
    };

    secrets.set_server_random(server_hello.random);
    engine
        .sessions()
        .with(peer, |s| s.set_session_id(server_hello.session_id.to_vec()));

    if !secrets.choose_psk(engine.psks(), &server_kx.psk_hint) {
        return Err(HandshakeError::PskMissing.into());
    }
    secrets.set_server_point(&server_kx.point)?;
    let key_block = secrets.key_block()?;

    // Flight 3: ClientKeyExchange and ChangeCipherSpec in the clear, the
    // Finished inside a protected record at the new epoch.
    msg.clear();
    let key_exchange = KeyExchange::new(server_kx.psk_hint.clone(), secrets.public_point()?)?;
    let mut frame = Vec::new();
    message::write_content(&mut frame, &Message::ClientKeyExchange(key_exchange));
    secrets.add_transcript(&frame);
    msg.extend_from_slice(&frame);

    let client_verify = secrets.finished("client finished")?;
    message::write_content(&mut msg, &Message::ChangeCipherSpec(ChangeCipherSpec));

    frame.clear();
    message::write_content(
        &mut frame,
        &Message::Finished(Finished::new(client_verify.to_vec())),
    );
    secrets.add_transcript(&frame);
    let expected_server_verify = secrets.finished("server finished")?;

    engine.sessions().with(peer, |s| -> Result<(), SessionError> {
        s.set_key_block(&key_block)?;
        s.increase_epoch()
    })?;
    let protected = engine.protect(&frame, peer, None)?;
    msg.extend_from_slice(&protected);
    state = ClientState::KeyExchanged;
    trace!("handshake {:?} with {}", state, peer);

    let response = transport
        .exchange(peer, &msg)
        .map_err(HandshakeError::Transport)?;

    // The server answers with its own ChangeCipherSpec and a protected
    // Finished record.
    let (content, rest) = message::read_content(&response)?;
    let Message::ChangeCipherSpec(_) = content else {
        return Err(HandshakeError::UnexpectedMessage {
            expected: "ChangeCipherSpec",
        }
        .into());
    };

    let received = engine.unprotect(rest, peer, rest.len());
    if received.payload.is_empty() {
        return Err(HandshakeError::BadServerFinished.into());
    }
    let (content, _) = message::read_content(&received.payload)?;
    let Message::Finished(server_finished) = content else {
        return Err(HandshakeError::UnexpectedMessage {
            expected: "Finished",
        }
        .into());
    };
    if server_finished.verify_data != expected_server_verify {
        return Err(HandshakeError::BadServerFinished.into());
    }

    engine.sessions().with(peer, |s| s.disable_handshake());
    state = ClientState::Finished;
    debug!("handshake {:?} with {} complete", state, peer);
    Ok(())
}
