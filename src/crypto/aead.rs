//! AES-128-CCM with an 8-byte tag, the fixed record protection of the
//! single supported cipher suite.

use aes::Aes128;
use ccm::aead::{Aead, KeyInit, Payload};
use ccm::consts::{U12, U8};
use ccm::Ccm;

use crate::error::CryptoError;

type AesCcm8 = Ccm<Aes128, U8, U12>;

pub const KEY_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
/// Tag appended to every ciphertext (CCM-8).
pub const TAG_LEN: usize = 8;

/// Encrypt and authenticate; the tag is appended to the ciphertext.
pub fn seal(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    AesCcm8::new(key.into())
        .encrypt(
            nonce.into(),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Aead)
}

/// Verify and decrypt. Any authentication failure is reported as a plain
/// [`CryptoError::Aead`]; no plaintext is ever released for a bad tag.
pub fn open(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    AesCcm8::new(key.into())
        .decrypt(
            nonce.into(),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Aead)
}
