use nom::bytes::complete::take;
use nom::combinator::rest;
use nom::error::{Error, ErrorKind};
use nom::{Err, IResult};

use super::client_hello::VERSION_MARKER;
use super::Cookie;

/// Server's stateless-cookie challenge. Only the cookie is of interest on
/// parse; the version and length prefix are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelloVerifyRequest {
    pub cookie: Cookie,
}

impl HelloVerifyRequest {
    pub fn new(cookie: Cookie) -> Self {
        HelloVerifyRequest { cookie }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], HelloVerifyRequest> {
        // Version (2 bytes) and cookie length (1 byte).
        let (input, _header) = take(3_usize)(input)?;
        let (input, data) = rest(input)?;
        let cookie = Cookie::try_new(data)
            .map_err(|_| Err::Failure(Error::new(input, ErrorKind::LengthValue)))?;

        Ok((input, HelloVerifyRequest { cookie }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&VERSION_MARKER);
        self.cookie.serialize(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let request = HelloVerifyRequest::new(Cookie::try_new(b"ABCDEFGH").unwrap());

        let mut wire = Vec::new();
        request.serialize(&mut wire);
        assert_eq!(wire.len(), 2 + 1 + 8);

        let (rest, parsed) = HelloVerifyRequest::parse(&wire).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, request);
    }

    #[test]
    fn too_short_for_the_header() {
        assert!(HelloVerifyRequest::parse(&[0xFE, 0xFD]).is_err());
    }
}
