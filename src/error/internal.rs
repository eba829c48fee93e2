//! Detailed error kinds used for diagnostics.
//!
//! These never escape the crate. They are logged at debug level right before
//! the simplified public [`Error`](super::Error) variant is returned.

use std::fmt;

/// Why a BER or message decode failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecodeErrorKind {
    UnexpectedTag { expected: u8, actual: u8 },
    TruncatedData,
    InvalidLength,
    IndefiniteLength,
    LengthTooLong { octets: usize },
    LengthExceedsMax { length: usize, max: usize },
    ZeroLengthInteger,
    Integer64TooLong { length: usize },
    IntegerOverflow,
    OidTooLong { count: usize, max: usize },
    InvalidNull,
    InvalidIpAddressLength { length: usize },
    UnknownVersion(i32),
    UnknownPduType(u8),
    UnknownSecurityModel(i32),
    InvalidMsgFlags,
    TlvOverflow,
    NegativeEngineValue { field: &'static str, value: i32 },
    InvalidMsgId(i32),
    MsgMaxSizeOutOfRange(i32),
    ResponseIdMismatch { expected: i32, actual: i32 },
    EmptyResponse,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, got 0x{:02X}", expected, actual)
            }
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::InvalidLength => write!(f, "invalid length encoding"),
            Self::IndefiniteLength => write!(f, "indefinite length encoding not supported"),
            Self::LengthTooLong { octets } => {
                write!(f, "length encoding uses {} octets (max 4)", octets)
            }
            Self::LengthExceedsMax { length, max } => {
                write!(f, "length {} exceeds maximum {}", length, max)
            }
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::Integer64TooLong { length } => {
                write!(f, "64-bit integer encoding is {} bytes (max 9)", length)
            }
            Self::IntegerOverflow => write!(f, "integer overflow"),
            Self::OidTooLong { count, max } => {
                write!(f, "OID has {} arcs (max {})", count, max)
            }
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IpAddress is {} bytes (expected 4)", length)
            }
            Self::UnknownVersion(v) => write!(f, "unknown SNMP version {}", v),
            Self::UnknownPduType(t) => write!(f, "unknown PDU type 0x{:02X}", t),
            Self::UnknownSecurityModel(m) => write!(f, "unknown security model {}", m),
            Self::InvalidMsgFlags => write!(f, "invalid msgFlags"),
            Self::TlvOverflow => write!(f, "TLV extends past end of data"),
            Self::NegativeEngineValue { field, value } => {
                write!(f, "{} is negative ({})", field, value)
            }
            Self::InvalidMsgId(v) => write!(f, "msgID {} out of range", v),
            Self::MsgMaxSizeOutOfRange(v) => write!(f, "msgMaxSize {} out of range", v),
            Self::ResponseIdMismatch { expected, actual } => {
                write!(f, "response ID {} does not match request {}", actual, expected)
            }
            Self::EmptyResponse => write!(f, "response carried no varbinds"),
        }
    }
}

/// Why a privacy operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CryptoErrorKind {
    InvalidKeyLength,
    InvalidPrivParamsLength { expected: usize, actual: usize },
    InvalidCiphertextLength { length: usize, block_size: usize },
    CipherError,
}

impl fmt::Display for CryptoErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKeyLength => write!(f, "invalid privacy key length"),
            Self::InvalidPrivParamsLength { expected, actual } => write!(
                f,
                "privacy parameters are {} bytes (expected {})",
                actual, expected
            ),
            Self::InvalidCiphertextLength { length, block_size } => write!(
                f,
                "ciphertext length {} is not a multiple of {}",
                length, block_size
            ),
            Self::CipherError => write!(f, "cipher operation failed"),
        }
    }
}

/// Why message authentication failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthErrorKind {
    HmacMismatch,
    WrongMacLength { expected: usize, actual: usize },
    AuthParamsNotFound,
    NotAuthenticated,
    RejectedByAgent(&'static str),
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HmacMismatch => write!(f, "HMAC verification failed"),
            Self::WrongMacLength { expected, actual } => {
                write!(f, "MAC is {} bytes (expected {})", actual, expected)
            }
            Self::AuthParamsNotFound => write!(f, "authentication parameters not found"),
            Self::NotAuthenticated => write!(f, "response was not authenticated"),
            Self::RejectedByAgent(counter) => write!(f, "agent reported {}", counter),
        }
    }
}
