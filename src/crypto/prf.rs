//! CMAC-chained pseudo-random function.
//!
//! PRF(secret, label, seed) = P_CMAC(secret, label + seed)
//!
//! P_CMAC(secret, seed) = CMAC(secret, A(1) + seed) +
//!                        CMAC(secret, A(2) + seed) + ...
//!
//! A() is defined as:
//!       A(0) = seed
//!       A(i) = CMAC(secret, A(i-1))
//!
//! The MAC is AES-128-CMAC. Secrets that are not AES-128 key sized are
//! first compressed with CMAC under the all-zero key (RFC 4615).

use aes::Aes128;
use cmac::{Cmac, Mac};
use zeroize::Zeroize;

pub const MAC_LEN: usize = 16;

/// AES-CMAC over the concatenation of `parts`.
fn aes_cmac(key: &[u8; MAC_LEN], parts: &[&[u8]]) -> [u8; MAC_LEN] {
    let mut mac = Cmac::<Aes128>::new(key.into());
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().into()
}

/// Turn an arbitrary-length secret into an AES-128-CMAC key (RFC 4615).
fn prf_key(secret: &[u8]) -> [u8; MAC_LEN] {
    match secret.try_into() {
        Ok(key) => key,
        Err(_) => aes_cmac(&[0u8; MAC_LEN], &[secret]),
    }
}

/// Keyed MAC over `data`, with the same secret handling as the PRF. Used
/// for the handshake transcript digest feeding the finished values.
pub fn mac(secret: &[u8], data: &[u8]) -> [u8; MAC_LEN] {
    aes_cmac(&prf_key(secret), &[data])
}

/// Streaming PRF state. `take` produces any number of bytes; the chain is
/// only advanced as output is consumed.
pub struct Prf {
    key: [u8; MAC_LEN],
    seed: Vec<u8>,
    a: Vec<u8>,
    pending: Vec<u8>,
}

impl Prf {
    pub fn new(secret: &[u8], label: &str, seed: &[u8]) -> Prf {
        let mut labeled = Vec::with_capacity(label.len() + seed.len());
        labeled.extend_from_slice(label.as_bytes());
        labeled.extend_from_slice(seed);
        Prf {
            key: prf_key(secret),
            a: labeled.clone(),
            seed: labeled,
            pending: Vec::new(),
        }
    }

    /// The next `n` bytes of the pseudo-random stream.
    pub fn take(&mut self, n: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            if self.pending.is_empty() {
                self.fill();
            }
            let used = (n - out.len()).min(self.pending.len());
            out.extend_from_slice(&self.pending[..used]);
            self.pending.drain(..used);
        }
        out
    }

    fn fill(&mut self) {
        self.a = aes_cmac(&self.key, &[&self.a]).to_vec();
        let block = aes_cmac(&self.key, &[&self.a, &self.seed]);
        self.pending.extend_from_slice(&block);
    }
}

impl Drop for Prf {
    fn drop(&mut self) {
        self.key.zeroize();
        self.a.zeroize();
        self.pending.zeroize();
    }
}

/// One-shot PRF output of exactly `out_len` bytes.
pub fn derive(secret: &[u8], label: &str, seed: &[u8], out_len: usize) -> Vec<u8> {
    Prf::new(secret, label, seed).take(out_len)
}
