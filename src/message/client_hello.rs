use nom::bytes::complete::take;
use nom::combinator::rest;
use nom::IResult;

use super::{Cookie, Random};

/// Fixed 2-byte version marker sent in hello messages.
pub const VERSION_MARKER: [u8; 2] = [0xFE, 0xFD];

/// The single advertised suite and extension set, byte for byte:
/// one PSK-ECDHE-AES-128-CCM-8 cipher suite, no compression, the
/// elliptic-curves extension naming secp256r1 and the point-formats
/// extension naming uncompressed points.
pub const SUITE_SUFFIX: [u8; 22] = [
    0x00, 0x02, // cipher suites length
    0xFF, 0x01, // TLS_PSK_ECDH_WITH_AES_128_CCM_8
    0x01, // compression methods length
    0x00, // no compression
    0x00, 0x0E, // extensions length
    0x00, 0x0A, // supported elliptic curves extension
    0x00, 0x04, // extension length
    0x00, 0x02, // curve array length
    0x00, 0x23, // secp256r1
    0x00, 0x0B, // supported point formats extension
    0x00, 0x02, // extension length
    0x01, // format array length
    0x00, // uncompressed point
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientHello {
    pub random: Random,
    /// Absent on the first flight; echoed from the HelloVerifyRequest on
    /// the second.
    pub cookie: Option<Cookie>,
}

impl ClientHello {
    pub fn new(random: Random) -> Self {
        ClientHello {
            random,
            cookie: None,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], ClientHello> {
        let (input, _version) = take(2_usize)(input)?;
        let (input, random) = Random::parse(input)?;
        let (input, cookie) = Cookie::parse(input)?;
        // The advertised suite suffix is fixed and not interpreted.
        let (input, _) = rest(input)?;

        let cookie = if cookie.is_empty() { None } else { Some(cookie) };

        Ok((input, ClientHello { random, cookie }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&VERSION_MARKER);
        self.random.serialize(output);
        match &self.cookie {
            Some(cookie) => {
                output.push(cookie.len() as u8);
                output.extend_from_slice(cookie);
            }
            None => output.push(0),
        }
        output.extend_from_slice(&SUITE_SUFFIX);
    }
}
