//! Handshake content codec: TLV framing plus the concrete message types.
//!
//! Each content starts with one header byte: the message-type id in the
//! top 6 bits and the number of explicit big-endian length bytes (0-3) in
//! the bottom 2. Missing length bytes are zero on the left, so a zero
//! length body is a bare header byte. Several contents can be framed back
//! to back in one buffer.

mod alert;
mod change_cipher_spec;
mod client_hello;
mod finished;
mod hello_verify;
mod id;
mod key_exchange;
mod named_curve;
mod random;
mod server_hello;
mod server_hello_done;

pub use alert::{Alert, AlertDescription, AlertLevel};
pub use change_cipher_spec::ChangeCipherSpec;
pub use client_hello::{ClientHello, SUITE_SUFFIX, VERSION_MARKER};
pub use finished::Finished;
pub use hello_verify::HelloVerifyRequest;
pub use id::{Cookie, InvalidLength, SessionId};
pub use key_exchange::KeyExchange;
pub use named_curve::{CurveType, NamedCurve};
pub use random::Random;
pub use server_hello::ServerHello;
pub use server_hello_done::ServerHelloDone;

use nom::IResult;

use crate::error::HandshakeError;
use crate::util::{be_value, min_be_bytes};

/// One handshake content, tagged by its wire type id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    ClientHello(ClientHello),
    ServerHello(ServerHello),
    HelloVerifyRequest(HelloVerifyRequest),
    ServerKeyExchange(KeyExchange),
    ServerHelloDone(ServerHelloDone),
    ClientKeyExchange(KeyExchange),
    Finished(Finished),
    ChangeCipherSpec(ChangeCipherSpec),
    Alert(Alert),
}

impl Message {
    pub fn type_id(&self) -> u8 {
        match self {
            Message::ClientHello(_) => 1,
            Message::ServerHello(_) => 2,
            Message::HelloVerifyRequest(_) => 3,
            Message::ServerKeyExchange(_) => 12,
            Message::ServerHelloDone(_) => 14,
            Message::ClientKeyExchange(_) => 16,
            Message::Finished(_) => 20,
            Message::ChangeCipherSpec(_) => 32,
            Message::Alert(_) => 33,
        }
    }

    fn parse_body(id: u8, body: &[u8]) -> Result<Message, HandshakeError> {
        match id {
            1 => parsed("ClientHello", ClientHello::parse(body)).map(Message::ClientHello),
            2 => parsed("ServerHello", ServerHello::parse(body)).map(Message::ServerHello),
            3 => parsed("HelloVerifyRequest", HelloVerifyRequest::parse(body))
                .map(Message::HelloVerifyRequest),
            12 => parsed("ServerKeyExchange", KeyExchange::parse(body))
                .map(Message::ServerKeyExchange),
            14 => parsed("ServerHelloDone", ServerHelloDone::parse(body))
                .map(Message::ServerHelloDone),
            16 => parsed("ClientKeyExchange", KeyExchange::parse(body))
                .map(Message::ClientKeyExchange),
            20 => parsed("Finished", Finished::parse(body)).map(Message::Finished),
            32 => parsed("ChangeCipherSpec", ChangeCipherSpec::parse(body))
                .map(Message::ChangeCipherSpec),
            33 => parsed("Alert", Alert::parse(body)).map(Message::Alert),
            _ => Err(HandshakeError::UnknownContentType(id)),
        }
    }

    fn serialize_body(&self, output: &mut Vec<u8>) {
        match self {
            Message::ClientHello(m) => m.serialize(output),
            Message::ServerHello(m) => m.serialize(output),
            Message::HelloVerifyRequest(m) => m.serialize(output),
            Message::ServerKeyExchange(m) => m.serialize(output),
            Message::ServerHelloDone(m) => m.serialize(output),
            Message::ClientKeyExchange(m) => m.serialize(output),
            Message::Finished(m) => m.serialize(output),
            Message::ChangeCipherSpec(m) => m.serialize(output),
            Message::Alert(m) => m.serialize(output),
        }
    }
}

fn parsed<T>(name: &'static str, result: IResult<&[u8], T>) -> Result<T, HandshakeError> {
    match result {
        Ok((_, value)) => Ok(value),
        Err(_) => Err(HandshakeError::MalformedContent(name)),
    }
}

/// Read one content from the front of `buffer`, returning the message and
/// the untouched remainder.
pub fn read_content(buffer: &[u8]) -> Result<(Message, &[u8]), HandshakeError> {
    let (&header, buffer) = buffer
        .split_first()
        .ok_or(HandshakeError::TruncatedContent)?;

    let len_bytes = (header & 0x03) as usize;
    if buffer.len() < len_bytes {
        return Err(HandshakeError::TruncatedContent);
    }
    let (len_raw, buffer) = buffer.split_at(len_bytes);
    let length = be_value(len_raw) as usize;

    let id = header >> 2;
    if !is_known(id) {
        return Err(HandshakeError::UnknownContentType(id));
    }

    if buffer.len() < length {
        return Err(HandshakeError::TruncatedContent);
    }
    let (body, rest) = buffer.split_at(length);

    Ok((Message::parse_body(id, body)?, rest))
}

/// Frame `message` and append it to `buffer`.
pub fn write_content(buffer: &mut Vec<u8>, message: &Message) {
    let mut body = Vec::new();
    message.serialize_body(&mut body);

    let length = min_be_bytes(body.len() as u64, 4);
    // Record payloads max out at 64 KiB, so three length bytes always
    // suffice.
    debug_assert!(length.len() <= 3);

    buffer.push(message.type_id() << 2 | length.len() as u8);
    buffer.extend_from_slice(&length);
    buffer.extend_from_slice(&body);
}

fn is_known(id: u8) -> bool {
    matches!(id, 1 | 2 | 3 | 12 | 14 | 16 | 20 | 32 | 33)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOKIE: &[u8] = b"ABCDEFGH";

    fn verify_frame() -> Vec<u8> {
        // HelloVerifyRequest (id 3), one length byte, 11 byte body:
        // version + cookie length prefix + 8 byte cookie.
        let mut frame = vec![0x0D, 0x0B, 0x03, 0x03, 0x08];
        frame.extend_from_slice(COOKIE);
        frame
    }

    #[test]
    fn read_consumes_exactly_one_content() {
        for n in 1..=3usize {
            let buffer = verify_frame().repeat(n);
            let (message, rest) = read_content(&buffer).unwrap();
            let Message::HelloVerifyRequest(verify) = message else {
                panic!("wrong message type");
            };
            assert_eq!(&*verify.cookie, COOKIE);
            assert_eq!(rest.len(), (n - 1) * verify_frame().len());
        }

        let mut buffer = verify_frame();
        buffer.push(b'A');
        let (_, rest) = read_content(&buffer).unwrap();
        assert_eq!(rest, b"A");
    }

    #[test]
    fn read_rejects_short_body() {
        let mut buffer = verify_frame();
        buffer.truncate(buffer.len() - 2);
        assert!(matches!(
            read_content(&buffer),
            Err(HandshakeError::TruncatedContent)
        ));
    }

    #[test]
    fn read_rejects_unknown_type() {
        let mut buffer = verify_frame();
        buffer[0] = 0xFD; // id 63
        assert!(matches!(
            read_content(&buffer),
            Err(HandshakeError::UnknownContentType(63))
        ));
    }

    #[test]
    fn finished_frame_fixture() {
        let mut buffer = Vec::new();
        let finished = Message::Finished(Finished::new(b"Hallo Welt!".to_vec()));
        write_content(&mut buffer, &finished);
        assert_eq!(buffer, b"\x51\x0BHallo Welt!");

        write_content(&mut buffer, &finished);
        assert_eq!(buffer, b"\x51\x0BHallo Welt!\x51\x0BHallo Welt!");

        let (first, rest) = read_content(&buffer).unwrap();
        assert_eq!(first, finished);
        let (second, rest) = read_content(rest).unwrap();
        assert_eq!(second, finished);
        assert!(rest.is_empty());
    }

    #[test]
    fn zero_length_body_is_a_bare_header_byte() {
        let mut buffer = Vec::new();
        write_content(&mut buffer, &Message::ServerHelloDone(ServerHelloDone));
        assert_eq!(buffer, [0x38]); // 14 << 2, no length bytes

        let (message, rest) = read_content(&buffer).unwrap();
        assert_eq!(message, Message::ServerHelloDone(ServerHelloDone));
        assert!(rest.is_empty());
    }

    #[test]
    fn change_cipher_spec_frame() {
        let mut buffer = Vec::new();
        write_content(&mut buffer, &Message::ChangeCipherSpec(ChangeCipherSpec));
        assert_eq!(buffer, [0x81, 0x01, 0x01]); // 32 << 2 | 1, length 1, value 1
    }

    #[test]
    fn empty_input_is_truncated() {
        assert!(matches!(
            read_content(&[]),
            Err(HandshakeError::TruncatedContent)
        ));
    }
}
