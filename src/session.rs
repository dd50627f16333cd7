//! Per-peer session state: epoch, sequence counters, key blocks and the
//! handshake-mode flag, behind an injectable store abstraction.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use log::debug;
use zeroize::Zeroize;

use crate::error::SessionError;
use crate::util::lock;

/// Key material for one epoch: write key, read key, write IV salt, read IV
/// salt, in that order.
pub const KEY_BLOCK_LEN: usize = 40;

/// How far below the last accepted sequence number a record may fall.
const SEQ_WINDOW_BEHIND: u64 = 9;
/// How far ahead of the last accepted sequence number a record may run.
const SEQ_WINDOW_AHEAD: u64 = 101;

/// 40 bytes of key material derived from the master secret.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyBlock([u8; KEY_BLOCK_LEN]);

impl KeyBlock {
    pub fn new(bytes: &[u8]) -> Result<Self, SessionError> {
        let block = bytes
            .try_into()
            .map_err(|_| SessionError::KeyBlockLength(bytes.len()))?;
        Ok(KeyBlock(block))
    }

    pub fn write_key(&self) -> &[u8; 16] {
        self.0[..16].try_into().expect("fixed key block layout")
    }

    pub fn read_key(&self) -> &[u8; 16] {
        self.0[16..32].try_into().expect("fixed key block layout")
    }

    pub fn write_iv(&self) -> &[u8; 4] {
        self.0[32..36].try_into().expect("fixed key block layout")
    }

    pub fn read_iv(&self) -> &[u8; 4] {
        self.0[36..40].try_into().expect("fixed key block layout")
    }

    pub fn as_bytes(&self) -> &[u8; KEY_BLOCK_LEN] {
        &self.0
    }
}

impl Drop for KeyBlock {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for KeyBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyBlock(..)")
    }
}

/// State for one peer. Created lazily with the defaults below on first
/// reference; epoch 0 is the unencrypted handshake phase.
#[derive(Debug, Default)]
pub struct Session {
    epoch: u16,
    read_sequence: u64,
    write_sequence: u64,
    key_block: Option<KeyBlock>,
    key_block_pending: Option<KeyBlock>,
    handshake: bool,
    session_id: Option<Vec<u8>>,
}

impl Session {
    pub fn epoch(&self) -> u16 {
        self.epoch
    }

    /// Whether `num` falls into the acceptance window around the last
    /// accepted read sequence number: `read - 9 ..= read + 101`.
    ///
    /// This tolerates reordering and recovered losses; it does not reject
    /// duplicates inside the window.
    pub fn check_seq(&self, num: u64) -> bool {
        num + SEQ_WINDOW_BEHIND >= self.read_sequence
            && num <= self.read_sequence + SEQ_WINDOW_AHEAD
    }

    /// Record the sequence number of the last accepted record.
    pub fn set_read_seq(&mut self, num: u64) {
        self.read_sequence = num;
    }

    /// The sequence number for the next outgoing record; pre-incremented,
    /// so the first record of an epoch carries 1.
    pub fn next_write_seq(&mut self) -> u64 {
        self.write_sequence += 1;
        self.write_sequence
    }

    /// Stage a pending key block for the next epoch.
    pub fn set_key_block(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        self.key_block_pending = Some(KeyBlock::new(bytes)?);
        Ok(())
    }

    /// The active key block, if any epoch bump installed one.
    pub fn key_block(&self) -> Option<&KeyBlock> {
        self.key_block.as_ref()
    }

    /// Promote the pending key block, reset both sequence counters and
    /// advance the epoch by one. Fails without side effects if no pending
    /// block is staged.
    pub fn increase_epoch(&mut self) -> Result<(), SessionError> {
        let pending = self
            .key_block_pending
            .take()
            .ok_or(SessionError::NoPendingKeyBlock)?;
        let epoch = self.epoch.checked_add(1).ok_or(SessionError::EpochWrap)?;
        self.epoch = epoch;
        self.read_sequence = 0;
        self.write_sequence = 0;
        self.key_block = Some(pending);
        debug!("epoch advanced to {}", self.epoch);
        Ok(())
    }

    /// Tag outgoing records as handshake messages.
    pub fn enable_handshake(&mut self) {
        self.handshake = true;
    }

    pub fn disable_handshake(&mut self) {
        self.handshake = false;
    }

    pub fn is_handshake(&self) -> bool {
        self.handshake
    }

    pub fn session_id(&self) -> Option<&[u8]> {
        self.session_id.as_deref()
    }

    /// Attach the opaque session id assigned during the handshake, usable
    /// as a secondary lookup key.
    pub fn set_session_id(&mut self, id: Vec<u8>) {
        self.session_id = Some(id);
    }
}

/// Store for per-peer sessions, keyed by normalized peer address.
///
/// Implementations must serialize access per peer: `update` runs the
/// closure with exclusive access to that peer's session and persists any
/// mutation before returning. The closure is invoked exactly once.
pub trait SessionStore: Send + Sync {
    /// Run `f` against the session for `peer`, creating a default session
    /// first if none exists.
    fn update(&self, peer: IpAddr, f: &mut dyn FnMut(&mut Session));

    /// Secondary lookup: resolve a previously assigned session id to the
    /// peer it belongs to.
    fn peer_by_id(&self, id: &[u8]) -> Option<IpAddr>;

    /// Drop the peer's session entirely, invalidating any session-id index
    /// entry along with it.
    fn remove(&self, peer: IpAddr);
}

/// Typed convenience over the object-safe [`SessionStore::update`].
pub trait SessionStoreExt: SessionStore {
    fn with<T>(&self, peer: IpAddr, f: impl FnOnce(&mut Session) -> T) -> T {
        let mut f = Some(f);
        let mut out = None;
        self.update(peer, &mut |session| {
            if let Some(f) = f.take() {
                out = Some(f(session));
            }
        });
        // The store contract is to invoke the closure exactly once.
        out.expect("SessionStore::update must invoke the closure")
    }
}

impl<S: SessionStore + ?Sized> SessionStoreExt for S {}

/// Process-local session store.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<IpAddr, Arc<Mutex<Session>>>>,
    by_id: Mutex<HashMap<Vec<u8>, IpAddr>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn update(&self, peer: IpAddr, f: &mut dyn FnMut(&mut Session)) {
        let entry = {
            let mut sessions = lock(&self.sessions);
            Arc::clone(sessions.entry(peer).or_default())
        };
        let mut session = lock(&entry);
        f(&mut session);
        if let Some(id) = session.session_id() {
            lock(&self.by_id).insert(id.to_vec(), peer);
        }
    }

    fn peer_by_id(&self, id: &[u8]) -> Option<IpAddr> {
        lock(&self.by_id).get(id).copied()
    }

    fn remove(&self, peer: IpAddr) {
        let entry = lock(&self.sessions).remove(&peer);
        if let Some(entry) = entry {
            let session = lock(&entry);
            if let Some(id) = session.session_id() {
                lock(&self.by_id).remove(id);
            }
        }
    }
}
