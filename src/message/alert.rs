use nom::number::complete::be_u8;
use nom::IResult;

/// Alert severity. Every alert this engine emits is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Warning,
    Fatal,
    Unknown(u8),
}

impl AlertLevel {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => AlertLevel::Warning,
            2 => AlertLevel::Fatal,
            _ => AlertLevel::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            AlertLevel::Warning => 1,
            AlertLevel::Fatal => 2,
            AlertLevel::Unknown(value) => *value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDescription {
    CloseNotify,
    UnexpectedMessage,
    BadRecordMac,
    HandshakeFailure,
    DecodeError,
    Unknown(u8),
}

impl AlertDescription {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => AlertDescription::CloseNotify,
            10 => AlertDescription::UnexpectedMessage,
            20 => AlertDescription::BadRecordMac,
            40 => AlertDescription::HandshakeFailure,
            50 => AlertDescription::DecodeError,
            _ => AlertDescription::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            AlertDescription::CloseNotify => 0,
            AlertDescription::UnexpectedMessage => 10,
            AlertDescription::BadRecordMac => 20,
            AlertDescription::HandshakeFailure => 40,
            AlertDescription::DecodeError => 50,
            AlertDescription::Unknown(value) => *value,
        }
    }
}

/// Two-byte level/description pair. On the record layer the pair travels
/// bare as the payload of an alert-typed record; on the handshake channel
/// it is TLV-framed like any other content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    pub level: AlertLevel,
    pub description: AlertDescription,
}

impl Alert {
    pub fn new(level: AlertLevel, description: AlertDescription) -> Self {
        Alert { level, description }
    }

    pub fn fatal(description: AlertDescription) -> Self {
        Alert::new(AlertLevel::Fatal, description)
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Alert> {
        let (input, level) = be_u8(input)?;
        let (input, description) = be_u8(input)?;
        Ok((
            input,
            Alert {
                level: AlertLevel::from_u8(level),
                description: AlertDescription::from_u8(description),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(self.level.as_u8());
        output.push(self.description.as_u8());
    }

    pub fn to_bytes(self) -> [u8; 2] {
        [self.level.as_u8(), self.description.as_u8()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_decode_error_wire_form() {
        let alert = Alert::fatal(AlertDescription::DecodeError);
        assert_eq!(alert.to_bytes(), [0x02, 0x32]);

        let (rest, parsed) = Alert::parse(&[0x02, 0x32]).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, alert);
    }

    #[test]
    fn unknown_codes_pass_through() {
        let (_, parsed) = Alert::parse(&[9, 77]).unwrap();
        assert_eq!(parsed.level, AlertLevel::Unknown(9));
        assert_eq!(parsed.description, AlertDescription::Unknown(77));
        assert_eq!(parsed.to_bytes(), [9, 77]);
    }
}
