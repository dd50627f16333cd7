use nom::bytes::complete::take;
use nom::error::{Error, ErrorKind};
use nom::number::complete::{be_u16, be_u8};
use nom::{Err, IResult};

use super::{CurveType, NamedCurve};
use crate::error::HandshakeError;

/// Shared body of ServerKeyExchange and ClientKeyExchange: the PSK hint,
/// the curve identifier and the sender's ephemeral public point.
///
/// Wire form: hint length (2) + hint + curve type (1) + named curve (2) +
/// point length (1) + point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExchange {
    pub psk_hint: Vec<u8>,
    pub curve_type: CurveType,
    pub named_curve: NamedCurve,
    pub point: Vec<u8>,
}

impl KeyExchange {
    /// Key exchange over the transport's fixed curve.
    pub fn new(psk_hint: Vec<u8>, point: Vec<u8>) -> Result<Self, HandshakeError> {
        if psk_hint.is_empty() || psk_hint.len() > u16::MAX as usize {
            return Err(HandshakeError::PskHintLength(psk_hint.len()));
        }
        if point.is_empty() || point.len() > u8::MAX as usize {
            return Err(HandshakeError::PointLength(point.len()));
        }
        Ok(KeyExchange {
            psk_hint,
            curve_type: CurveType::NamedCurve,
            named_curve: NamedCurve::Secp256r1,
            point,
        })
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], KeyExchange> {
        let (input, hint_len) = be_u16(input)?;
        if hint_len == 0 {
            return Err(Err::Failure(Error::new(input, ErrorKind::LengthValue)));
        }
        let (input, psk_hint) = take(hint_len as usize)(input)?;
        let (input, curve_type) = CurveType::parse(input)?;
        let (input, named_curve) = NamedCurve::parse(input)?;
        let (input, point_len) = be_u8(input)?;
        if point_len == 0 {
            return Err(Err::Failure(Error::new(input, ErrorKind::LengthValue)));
        }
        let (input, point) = take(point_len as usize)(input)?;

        Ok((
            input,
            KeyExchange {
                psk_hint: psk_hint.to_vec(),
                curve_type,
                named_curve,
                point: point.to_vec(),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&(self.psk_hint.len() as u16).to_be_bytes());
        output.extend_from_slice(&self.psk_hint);
        output.push(self.curve_type.as_u8());
        output.extend_from_slice(&self.named_curve.as_u16().to_be_bytes());
        output.push(self.point.len() as u8);
        output.extend_from_slice(&self.point);
    }
}
