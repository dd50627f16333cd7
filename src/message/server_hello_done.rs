use nom::IResult;

/// Empty marker closing the server's second flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerHelloDone;

impl ServerHelloDone {
    pub fn parse(input: &[u8]) -> IResult<&[u8], ServerHelloDone> {
        Ok((input, ServerHelloDone))
    }

    pub fn serialize(&self, _output: &mut Vec<u8>) {}
}
