use nom::bytes::complete::take;
use nom::IResult;

use super::client_hello::VERSION_MARKER;
use super::{Random, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerHello {
    pub random: Random,
    /// Opaque id assigned by the server, kept as a secondary session key.
    pub session_id: SessionId,
}

impl ServerHello {
    pub fn new(random: Random, session_id: SessionId) -> Self {
        ServerHello { random, session_id }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], ServerHello> {
        let (input, _version) = take(2_usize)(input)?;
        let (input, random) = Random::parse(input)?;
        let (input, session_id) = SessionId::parse(input)?;

        Ok((input, ServerHello { random, session_id }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&VERSION_MARKER);
        self.random.serialize(output);
        self.session_id.serialize(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let hello = ServerHello::new(
            Random {
                gmt_unix_time: 1,
                random_bytes: [0x42; 28],
            },
            SessionId::try_new(b"ABCDEFGH").unwrap(),
        );

        let mut wire = Vec::new();
        hello.serialize(&mut wire);
        assert_eq!(wire.len(), 2 + 32 + 1 + 8);

        let (rest, parsed) = ServerHello::parse(&wire).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, hello);
    }

    #[test]
    fn zero_length_session_id_is_rejected() {
        let mut wire = Vec::new();
        ServerHello::new(
            Random {
                gmt_unix_time: 1,
                random_bytes: [0x42; 28],
            },
            SessionId::try_new(b"A").unwrap(),
        )
        .serialize(&mut wire);
        wire.truncate(34);
        wire.push(0); // session id length 0

        assert!(ServerHello::parse(&wire).is_err());
    }
}
