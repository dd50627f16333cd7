use thiserror::Error;

/// Top-level error for the transport engine.
///
/// The four inner enums follow the failure taxonomy of the protocol: record
/// decoding, session bookkeeping, handshake progress and cryptographic
/// operations. Remote protocol violations never surface here; those are
/// answered with an alert on the wire and an empty payload to the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Malformed or unencodable record headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Truncated record")]
    Truncated,

    #[error("Invalid {field} selector {selector}")]
    InvalidSelector { field: &'static str, selector: u8 },

    #[error("Too big sequence number (max 48 bits) {0}")]
    SequenceTooBig(u64),

    #[error("Too big record payload (max 65_535) {0}")]
    PayloadTooBig(usize),
}

/// Caller-side misuse of the per-peer session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Key blocks have to be 40 bytes long, got {0}")]
    KeyBlockLength(usize),

    #[error("No pending key block to promote for this epoch")]
    NoPendingKeyBlock,

    #[error("No active key block for a protected record")]
    NoActiveKeyBlock,

    #[error("Epoch is not allowed to wrap")]
    EpochWrap,
}

/// Failures that abort a handshake attempt with a distinguishable cause.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("Handshake transport: {0}")]
    Transport(#[source] std::io::Error),

    #[error("Unknown handshake content type {0}")]
    UnknownContentType(u8),

    #[error("Truncated handshake content")]
    TruncatedContent,

    #[error("Malformed {0} content")]
    MalformedContent(&'static str),

    #[error("Expected {expected}")]
    UnexpectedMessage { expected: &'static str },

    #[error("No pre-shared key for the peer's device identifier")]
    UnknownPeer,

    #[error("No pre-shared key matching the PSK hint")]
    PskMissing,

    #[error("Pre-shared key not chosen yet")]
    MissingPsk,

    #[error("Server random not received yet")]
    MissingServerRandom,

    #[error("Master secret not derived yet")]
    MissingMasterSecret,

    #[error("Server finished value does not verify")]
    BadServerFinished,

    #[error("PSK hint length {0} not in 1..=65535")]
    PskHintLength(usize),

    #[error("Public point length {0} not in 1..=255")]
    PointLength(usize),
}

/// Failures of the cryptographic primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Invalid scalar for the curve")]
    InvalidScalar,

    #[error("Invalid curve point encoding")]
    InvalidPoint,

    #[error("Scalar multiplication yields the point at infinity")]
    DegeneratePoint,

    #[error("AEAD failure")]
    Aead,
}
