use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

/// Named curves as identified on this wire.
///
/// The code points are the ones existing peers use (hex-coded decimals of
/// the RFC 4492 registry, so secp256r1 is `0x0023`); they must stay
/// bit-exact for interoperability. Only P-256 (Secp256r1) is supported for
/// key exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedCurve {
    Sect163k1,
    Sect163r1,
    Sect163r2,
    Sect193r1,
    Sect193r2,
    Sect233k1,
    Sect233r1,
    Sect239k1,
    Sect283k1,
    Sect283r1,
    Sect409k1,
    Sect409r1,
    Sect571k1,
    Sect571r1,
    Secp160k1,
    Secp160r1,
    Secp160r2,
    Secp192k1,
    Secp192r1,
    Secp224k1,
    Secp224r1,
    Secp256k1,
    /// secp256r1 / P-256, the curve this transport uses.
    Secp256r1,
    Secp384r1,
    Secp521r1,
    ArbitraryExplicitPrimeCurves,
    ArbitraryExplicitChar2Curves,
    Unknown(u16),
}

impl NamedCurve {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0001 => NamedCurve::Sect163k1,
            0x0002 => NamedCurve::Sect163r1,
            0x0003 => NamedCurve::Sect163r2,
            0x0004 => NamedCurve::Sect193r1,
            0x0005 => NamedCurve::Sect193r2,
            0x0006 => NamedCurve::Sect233k1,
            0x0007 => NamedCurve::Sect233r1,
            0x0008 => NamedCurve::Sect239k1,
            0x0009 => NamedCurve::Sect283k1,
            0x0010 => NamedCurve::Sect283r1,
            0x0011 => NamedCurve::Sect409k1,
            0x0012 => NamedCurve::Sect409r1,
            0x0013 => NamedCurve::Sect571k1,
            0x0014 => NamedCurve::Sect571r1,
            0x0015 => NamedCurve::Secp160k1,
            0x0016 => NamedCurve::Secp160r1,
            0x0017 => NamedCurve::Secp160r2,
            0x0018 => NamedCurve::Secp192k1,
            0x0019 => NamedCurve::Secp192r1,
            0x0020 => NamedCurve::Secp224k1,
            0x0021 => NamedCurve::Secp224r1,
            0x0022 => NamedCurve::Secp256k1,
            0x0023 => NamedCurve::Secp256r1,
            0x0024 => NamedCurve::Secp384r1,
            0x0025 => NamedCurve::Secp521r1,
            0xFF01 => NamedCurve::ArbitraryExplicitPrimeCurves,
            0xFF02 => NamedCurve::ArbitraryExplicitChar2Curves,
            _ => NamedCurve::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            NamedCurve::Sect163k1 => 0x0001,
            NamedCurve::Sect163r1 => 0x0002,
            NamedCurve::Sect163r2 => 0x0003,
            NamedCurve::Sect193r1 => 0x0004,
            NamedCurve::Sect193r2 => 0x0005,
            NamedCurve::Sect233k1 => 0x0006,
            NamedCurve::Sect233r1 => 0x0007,
            NamedCurve::Sect239k1 => 0x0008,
            NamedCurve::Sect283k1 => 0x0009,
            NamedCurve::Sect283r1 => 0x0010,
            NamedCurve::Sect409k1 => 0x0011,
            NamedCurve::Sect409r1 => 0x0012,
            NamedCurve::Sect571k1 => 0x0013,
            NamedCurve::Sect571r1 => 0x0014,
            NamedCurve::Secp160k1 => 0x0015,
            NamedCurve::Secp160r1 => 0x0016,
            NamedCurve::Secp160r2 => 0x0017,
            NamedCurve::Secp192k1 => 0x0018,
            NamedCurve::Secp192r1 => 0x0019,
            NamedCurve::Secp224k1 => 0x0020,
            NamedCurve::Secp224r1 => 0x0021,
            NamedCurve::Secp256k1 => 0x0022,
            NamedCurve::Secp256r1 => 0x0023,
            NamedCurve::Secp384r1 => 0x0024,
            NamedCurve::Secp521r1 => 0x0025,
            NamedCurve::ArbitraryExplicitPrimeCurves => 0xFF01,
            NamedCurve::ArbitraryExplicitChar2Curves => 0xFF02,
            NamedCurve::Unknown(value) => *value,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], NamedCurve> {
        let (input, value) = be_u16(input)?;
        Ok((input, NamedCurve::from_u16(value)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveType {
    ExplicitPrime,
    ExplicitChar2,
    NamedCurve,
    Unknown(u8),
}

impl CurveType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => CurveType::ExplicitPrime,
            2 => CurveType::ExplicitChar2,
            3 => CurveType::NamedCurve,
            _ => CurveType::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            CurveType::ExplicitPrime => 1,
            CurveType::ExplicitChar2 => 2,
            CurveType::NamedCurve => 3,
            CurveType::Unknown(value) => *value,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], CurveType> {
        let (input, value) = be_u8(input)?;
        Ok((input, CurveType::from_u8(value)))
    }
}
