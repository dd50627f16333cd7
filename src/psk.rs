//! Pre-shared keys, keyed by the 16-byte device UUID that doubles as the
//! PSK hint on the wire.

use std::sync::Mutex;

use zeroize::Zeroize;

use crate::util::lock;

pub const UUID_LEN: usize = 16;

/// One registered device, as reported by [`PskStore::list`]. The `psk`
/// field is the key a handshake would use right now: the pending key if one
/// is staged, the active key otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PskEntry {
    pub handle: u64,
    pub uuid: [u8; UUID_LEN],
    pub psk: Vec<u8>,
    pub description: String,
}

impl Drop for PskEntry {
    fn drop(&mut self) {
        self.psk.zeroize();
    }
}

/// Store for pre-shared keys.
///
/// The first `set` for a UUID installs the active key. Every later `set`
/// stages a pending key instead, which `get` prefers, until some external
/// rotation decides otherwise. The store is an external resource; callers
/// must treat every access as potentially slow or failing.
pub trait PskStore: Send + Sync {
    /// Key for the given hint; `None` if the hint matches no device.
    fn get(&self, hint: &[u8]) -> Option<Vec<u8>>;

    /// Register or re-key a device.
    fn set(&self, uuid: [u8; UUID_LEN], psk: &[u8], description: &str);

    /// Remove a device by its store handle. Both the active and any pending
    /// key are lost.
    fn delete(&self, handle: u64) -> bool;

    /// All registered devices.
    fn list(&self) -> Vec<PskEntry>;
}

struct StoredPsk {
    handle: u64,
    uuid: [u8; UUID_LEN],
    psk: Vec<u8>,
    psk_pending: Option<Vec<u8>>,
    description: String,
}

impl StoredPsk {
    fn current(&self) -> &[u8] {
        self.psk_pending.as_deref().unwrap_or(&self.psk)
    }
}

impl Drop for StoredPsk {
    fn drop(&mut self) {
        self.psk.zeroize();
        if let Some(pending) = self.psk_pending.as_mut() {
            pending.zeroize();
        }
    }
}

/// Process-local PSK store; everything is lost on restart.
#[derive(Default)]
pub struct InMemoryPskStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: Vec<StoredPsk>,
    next_handle: u64,
}

impl InMemoryPskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PskStore for InMemoryPskStore {
    fn get(&self, hint: &[u8]) -> Option<Vec<u8>> {
        let uuid: [u8; UUID_LEN] = hint.try_into().ok()?;
        let inner = lock(&self.inner);
        let entry = inner.entries.iter().find(|e| e.uuid == uuid)?;
        Some(entry.current().to_vec())
    }

    fn set(&self, uuid: [u8; UUID_LEN], psk: &[u8], description: &str) {
        let mut inner = lock(&self.inner);
        match inner.entries.iter_mut().find(|e| e.uuid == uuid) {
            Some(entry) => entry.psk_pending = Some(psk.to_vec()),
            None => {
                inner.next_handle += 1;
                let handle = inner.next_handle;
                inner.entries.push(StoredPsk {
                    handle,
                    uuid,
                    psk: psk.to_vec(),
                    psk_pending: None,
                    description: description.to_string(),
                });
            }
        }
    }

    fn delete(&self, handle: u64) -> bool {
        let mut inner = lock(&self.inner);
        let before = inner.entries.len();
        inner.entries.retain(|e| e.handle != handle);
        inner.entries.len() != before
    }

    fn list(&self) -> Vec<PskEntry> {
        let inner = lock(&self.inner);
        inner
            .entries
            .iter()
            .map(|e| PskEntry {
                handle: e.handle,
                uuid: e.uuid,
                psk: e.current().to_vec(),
                description: e.description.clone(),
            })
            .collect()
    }
}
