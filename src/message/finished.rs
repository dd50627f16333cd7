use nom::combinator::rest;
use nom::error::{Error, ErrorKind};
use nom::{Err, IResult};

/// Opaque handshake verification value; the PRF output over the
/// transcript digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    pub verify_data: Vec<u8>,
}

impl Finished {
    pub fn new(verify_data: Vec<u8>) -> Self {
        Finished { verify_data }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Finished> {
        if input.len() < 2 {
            return Err(Err::Failure(Error::new(input, ErrorKind::LengthValue)));
        }
        let (input, verify_data) = rest(input)?;

        Ok((
            input,
            Finished {
                verify_data: verify_data.to_vec(),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.verify_data);
    }
}
