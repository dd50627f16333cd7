//! Cryptographic primitives: the CMAC-chained PRF, P-256 scalar
//! multiplication for the ECDHE exchange, and AES-128-CCM-8 record
//! protection.

pub mod aead;
pub mod ecdh;
pub mod prf;
