//! The per-datagram record header.
//!
//! Unlike a classic DTLS record, every header field picks its own encoding:
//! a compact symbolic code packed into the 16-bit base header, or an
//! explicit big-endian value appended after it. The base header carries a
//! 2-3 bit selector per field, in the fixed order type, version, epoch,
//! sequence number, length; explicit bytes follow in the same order.
//!
//! Encoding always produces the most compact representation that fits the
//! value. Decoding accepts every documented selector combination and leaves
//! the remaining input intact, so several records can be read from one
//! buffer back to back.

use tinyvec::ArrayVec;

use crate::error::RecordError;
use crate::util::{be_value, min_be_bytes};

/// Base value of the 16-bit header; the two bits between the epoch and
/// sequence selectors are always set on the wire.
const HEADER_BASE: u16 = 0x00C0;

/// Largest sequence number that fits the 48-bit wire encoding.
pub const MAX_SEQUENCE: u64 = (1 << 48) - 1;

/// Worst-case encoded header size: base (2) + type (1) + version (2) +
/// epoch (2) + sequence (6) + length (2).
pub const MAX_HEADER_LEN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Alert,
    Handshake,
    ApplicationData,
    /// Explicit 8-bit extension value.
    Raw(u8),
}

impl ContentType {
    /// The numeric type carried in the additional authenticated data.
    /// Symbolic codes are offset by 20 so they cannot collide with
    /// explicit 8-bit values.
    pub fn numeric(&self) -> u8 {
        match self {
            ContentType::Alert => 21,
            ContentType::Handshake => 22,
            ContentType::ApplicationData => 23,
            ContentType::Raw(value) => *value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    V1_0,
    V1_2,
    /// Explicit 16-bit version value.
    Raw(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Epoch {
    /// Omitted from the wire, assumed from context.
    Implicit,
    Value(u16),
}

impl Epoch {
    /// Canonical value for nonce derivation; implicit counts as 0.
    pub fn canonical(&self) -> u16 {
        match self {
            Epoch::Implicit => 0,
            Epoch::Value(value) => *value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceNumber {
    /// No sequence number on the wire.
    None,
    /// Omitted from the wire, assumed from context.
    Implicit,
    Value(u64),
}

impl SequenceNumber {
    /// Canonical value for nonce/AAD derivation; absent counts as 0.
    pub fn canonical(&self) -> u64 {
        match self {
            SequenceNumber::None | SequenceNumber::Implicit => 0,
            SequenceNumber::Value(value) => *value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLength {
    /// Payload is the rest of the datagram.
    Implicit,
    Value(u16),
}

/// One record header. `serialize` emits the header only; the caller appends
/// the (possibly encrypted) payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub content_type: ContentType,
    pub version: ProtocolVersion,
    pub epoch: Epoch,
    pub sequence_number: SequenceNumber,
    pub length: RecordLength,
}

impl Record {
    pub fn new(content_type: ContentType, epoch: Epoch, sequence_number: SequenceNumber) -> Self {
        Record {
            content_type,
            version: ProtocolVersion::V1_2,
            epoch,
            sequence_number,
            length: RecordLength::Implicit,
        }
    }

    /// Parse one record from the front of `input`.
    ///
    /// Returns the header, its payload and the remaining input after the
    /// payload. With an implicit length the payload is everything that is
    /// left and the remainder is empty.
    pub fn parse(input: &[u8]) -> Result<(Record, &[u8], &[u8]), RecordError> {
        let (header, mut input) = take(input, 2)?;
        let header = be_value(header) as u16;

        let type_selector = (header >> 13) as u8;
        let content_type = match type_selector {
            0 => {
                let (value, rest) = take(input, 1)?;
                input = rest;
                ContentType::Raw(value[0])
            }
            1 => ContentType::Alert,
            2 => ContentType::Handshake,
            3 => ContentType::ApplicationData,
            _ => {
                return Err(RecordError::InvalidSelector {
                    field: "type",
                    selector: type_selector,
                })
            }
        };

        let version_selector = ((header >> 11) & 0x03) as u8;
        let version = match version_selector {
            0 => ProtocolVersion::V1_0,
            1 => {
                let (value, rest) = take(input, 2)?;
                input = rest;
                ProtocolVersion::Raw(be_value(value) as u16)
            }
            2 => ProtocolVersion::V1_2,
            _ => {
                return Err(RecordError::InvalidSelector {
                    field: "version",
                    selector: version_selector,
                })
            }
        };

        let epoch_selector = ((header >> 8) & 0x07) as u8;
        let epoch = match epoch_selector {
            0..=4 => Epoch::Value(epoch_selector as u16),
            5 | 6 => {
                let (value, rest) = take(input, epoch_selector as usize - 4)?;
                input = rest;
                Epoch::Value(be_value(value) as u16)
            }
            _ => Epoch::Implicit,
        };

        let seq_selector = ((header >> 2) & 0x07) as u8;
        let sequence_number = match seq_selector {
            0 => SequenceNumber::None,
            7 => SequenceNumber::Implicit,
            _ => {
                let (value, rest) = take(input, seq_selector as usize)?;
                input = rest;
                SequenceNumber::Value(be_value(value))
            }
        };

        let length_selector = (header & 0x03) as u8;
        let length = match length_selector {
            0 => RecordLength::Value(0),
            1 | 2 => {
                let (value, rest) = take(input, length_selector as usize)?;
                input = rest;
                RecordLength::Value(be_value(value) as u16)
            }
            _ => RecordLength::Implicit,
        };

        let record = Record {
            content_type,
            version,
            epoch,
            sequence_number,
            length,
        };

        let (payload, rest) = match length {
            RecordLength::Implicit => (input, &input[input.len()..]),
            RecordLength::Value(len) => take(input, len as usize)?,
        };

        Ok((record, payload, rest))
    }

    /// Append the encoded header to `out`, picking the most compact
    /// encoding per field.
    pub fn serialize(&self, out: &mut Vec<u8>) -> Result<(), RecordError> {
        let mut header = HEADER_BASE;
        let mut trailer: ArrayVec<[u8; 13]> = ArrayVec::new();

        match self.content_type {
            ContentType::Alert => header |= 1 << 13,
            ContentType::Handshake => header |= 2 << 13,
            ContentType::ApplicationData => header |= 3 << 13,
            ContentType::Raw(value) => trailer.push(value),
        }

        match self.version {
            ProtocolVersion::V1_0 => {}
            ProtocolVersion::V1_2 => header |= 2 << 11,
            ProtocolVersion::Raw(value) => {
                header |= 1 << 11;
                trailer.extend_from_slice(&value.to_be_bytes());
            }
        }

        match self.epoch {
            Epoch::Implicit => header |= 7 << 8,
            Epoch::Value(value) if value < 5 => header |= value << 8,
            Epoch::Value(value) => {
                let bytes = min_be_bytes(value as u64, 2);
                header |= (4 + bytes.len() as u16) << 8;
                trailer.extend_from_slice(&bytes);
            }
        }

        match self.sequence_number {
            SequenceNumber::None => {}
            SequenceNumber::Implicit => header |= 7 << 2,
            SequenceNumber::Value(0) => {
                // Zero still travels explicitly, as a single zero byte.
                header |= 1 << 2;
                trailer.push(0);
            }
            SequenceNumber::Value(value) => {
                if value > MAX_SEQUENCE {
                    return Err(RecordError::SequenceTooBig(value));
                }
                let bytes = min_be_bytes(value, 6);
                header |= (bytes.len() as u16) << 2;
                trailer.extend_from_slice(&bytes);
            }
        }

        match self.length {
            RecordLength::Implicit => header |= 3,
            RecordLength::Value(0) => {}
            RecordLength::Value(value) => {
                let bytes = min_be_bytes(value as u64, 2);
                header |= bytes.len() as u16;
                trailer.extend_from_slice(&bytes);
            }
        }

        out.extend_from_slice(&header.to_be_bytes());
        out.extend_from_slice(&trailer);
        Ok(())
    }

    /// 12-byte AEAD nonce: 4-byte IV salt, 2-byte epoch, 6-byte sequence
    /// number. Implicit or absent fields count as zero.
    pub fn nonce(&self, iv: &[u8; 4]) -> [u8; 12] {
        let mut nonce = [0u8; 12];
        nonce[..4].copy_from_slice(iv);
        nonce[4..6].copy_from_slice(&self.epoch.canonical().to_be_bytes());
        nonce[6..].copy_from_slice(&self.sequence_number.canonical().to_be_bytes()[2..]);
        nonce
    }

    /// Additional authenticated data: 6-byte sequence number, numeric
    /// content type, the fixed version marker `FE FD` and the 2-byte
    /// plaintext length.
    pub fn additional_data(&self, payload_len: u16) -> [u8; 11] {
        let mut aad = [0u8; 11];
        aad[..6].copy_from_slice(&self.sequence_number.canonical().to_be_bytes()[2..]);
        aad[6] = self.content_type.numeric();
        aad[7] = 0xFE;
        aad[8] = 0xFD;
        aad[9..].copy_from_slice(&payload_len.to_be_bytes());
        aad
    }
}

fn take(input: &[u8], n: usize) -> Result<(&[u8], &[u8]), RecordError> {
    if input.len() < n {
        return Err(RecordError::Truncated);
    }
    Ok(input.split_at(n))
}
