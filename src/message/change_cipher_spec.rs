use nom::error::{Error, ErrorKind};
use nom::number::complete::be_u8;
use nom::{Err, IResult};

/// Single-byte marker switching the connection to the freshly negotiated
/// key block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeCipherSpec;

impl ChangeCipherSpec {
    pub fn parse(input: &[u8]) -> IResult<&[u8], ChangeCipherSpec> {
        let (input, value) = be_u8(input)?;
        if value != 0x01 {
            return Err(Err::Failure(Error::new(input, ErrorKind::Verify)));
        }
        Ok((input, ChangeCipherSpec))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(0x01);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_0x01_is_valid() {
        assert!(ChangeCipherSpec::parse(&[0x01]).is_ok());
        assert!(ChangeCipherSpec::parse(&[0x00]).is_err());
        assert!(ChangeCipherSpec::parse(&[]).is_err());
    }
}
