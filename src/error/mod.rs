//! Error types for ups-snmp.
//!
//! Every fallible operation returns [`Result`], whose error is a boxed
//! [`Error`]. Variants fall into four categories:
//!
//! - configuration validation ([`Error::Config`]),
//! - transport failures (network, timeout, SNMP protocol, authentication, ...),
//! - reading type mismatches ([`Error::TypeMismatch`]),
//! - device enumeration failures ([`Error::Enumeration`]).
//!
//! ```rust
//! use ups_snmp::{Error, Result};
//!
//! fn describe(result: Result<()>) -> String {
//!     match result {
//!         Ok(()) => "ok".into(),
//!         Err(e) if e.is_transport() => format!("transport: {}", e),
//!         Err(e) => match &*e {
//!             Error::Config(msg) => format!("bad config: {}", msg),
//!             other => other.to_string(),
//!         },
//!     }
//! }
//! ```

pub(crate) mod internal;

use std::net::SocketAddr;
use std::time::Duration;

use crate::oid::Oid;

/// Placeholder target address used when no target is known.
pub(crate) const UNKNOWN_TARGET: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)), 0);

/// Result type alias using the library's boxed Error type.
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// Reason a walk operation was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAbortReason {
    /// Agent returned an OID that is not greater than the previous OID.
    NonIncreasing,
}

impl std::fmt::Display for WalkAbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonIncreasing => write!(f, "non-increasing OID"),
        }
    }
}

/// The main error type for all ups-snmp operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Network failure (connection refused, unreachable, socket closed, ...).
    #[error("network error communicating with {target}: {source}")]
    Network {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// No response within the configured timeout.
    #[error("timeout after {elapsed:?} waiting for {target}")]
    Timeout {
        target: SocketAddr,
        elapsed: Duration,
    },

    /// SNMP protocol error from agent.
    #[error("SNMP error from {target}: {status} at index {index}")]
    Snmp {
        target: SocketAddr,
        status: ErrorStatus,
        index: u32,
        oid: Option<Oid>,
    },

    /// Authentication failed or the agent rejected our credentials.
    #[error("authentication failed for {target}")]
    Auth { target: SocketAddr },

    /// The agent does not recognise the engine ID we sent.
    #[error("unknown engine ID reported by {target}")]
    UnknownEngineId { target: SocketAddr },

    /// The agent's clock is outside the USM time window, even after resync.
    #[error("message not in time window for {target}")]
    NotInTimeWindow { target: SocketAddr },

    /// Encryption or decryption of the scoped PDU failed.
    #[error("privacy processing failed for {target}")]
    Crypto { target: SocketAddr },

    /// Malformed response from agent.
    #[error("malformed response from {target}")]
    MalformedResponse { target: SocketAddr },

    /// Walk aborted due to agent misbehavior.
    #[error("walk aborted for {target}: {reason}")]
    WalkAborted {
        target: SocketAddr,
        reason: WalkAbortReason,
    },

    /// Invalid OID format.
    #[error("invalid OID: {0}")]
    InvalidOid(Box<str>),

    /// Invalid configuration. Displays as the bare message.
    #[error("{0}")]
    Config(Box<str>),

    /// A reading had a different type than its quantity handler expects.
    #[error("expected {expected} {quantity} reading, got type: {actual_type}, value: {value}")]
    TypeMismatch {
        quantity: Box<str>,
        expected: &'static str,
        actual_type: &'static str,
        value: Box<str>,
    },

    /// A table's device enumeration strategy failed.
    #[error("device enumeration failed for {table}: {message}")]
    Enumeration { table: Box<str>, message: Box<str> },
}

impl Error {
    /// Box this error (convenience for constructing boxed errors).
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Shorthand for a boxed [`Error::Config`].
    pub fn config(msg: impl Into<Box<str>>) -> Box<Self> {
        Self::Config(msg.into()).boxed()
    }

    /// Whether this error came from the SNMP session (socket, protocol, security).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Timeout { .. }
                | Self::Snmp { .. }
                | Self::Auth { .. }
                | Self::UnknownEngineId { .. }
                | Self::NotInTimeWindow { .. }
                | Self::Crypto { .. }
                | Self::MalformedResponse { .. }
                | Self::WalkAborted { .. }
                | Self::InvalidOid(_)
        )
    }
}

/// SNMP protocol error status codes (RFC 3416).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorStatus {
    NoError,
    TooBig,
    NoSuchName,
    BadValue,
    ReadOnly,
    GenErr,
    NoAccess,
    WrongType,
    WrongLength,
    WrongEncoding,
    WrongValue,
    NoCreation,
    InconsistentValue,
    ResourceUnavailable,
    CommitFailed,
    UndoFailed,
    AuthorizationError,
    NotWritable,
    InconsistentName,
    /// Unknown or future error status code.
    Unknown(i32),
}

impl ErrorStatus {
    /// Create from raw status code.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::TooBig,
            2 => Self::NoSuchName,
            3 => Self::BadValue,
            4 => Self::ReadOnly,
            5 => Self::GenErr,
            6 => Self::NoAccess,
            7 => Self::WrongType,
            8 => Self::WrongLength,
            9 => Self::WrongEncoding,
            10 => Self::WrongValue,
            11 => Self::NoCreation,
            12 => Self::InconsistentValue,
            13 => Self::ResourceUnavailable,
            14 => Self::CommitFailed,
            15 => Self::UndoFailed,
            16 => Self::AuthorizationError,
            17 => Self::NotWritable,
            18 => Self::InconsistentName,
            other => {
                tracing::warn!(target: "ups_snmp::error", { snmp.error_status = other }, "unknown SNMP error status");
                Self::Unknown(other)
            }
        }
    }

    /// Convert to raw status code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::NoError => 0,
            Self::TooBig => 1,
            Self::NoSuchName => 2,
            Self::BadValue => 3,
            Self::ReadOnly => 4,
            Self::GenErr => 5,
            Self::NoAccess => 6,
            Self::WrongType => 7,
            Self::WrongLength => 8,
            Self::WrongEncoding => 9,
            Self::WrongValue => 10,
            Self::NoCreation => 11,
            Self::InconsistentValue => 12,
            Self::ResourceUnavailable => 13,
            Self::CommitFailed => 14,
            Self::UndoFailed => 15,
            Self::AuthorizationError => 16,
            Self::NotWritable => 17,
            Self::InconsistentName => 18,
            Self::Unknown(code) => *code,
        }
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NoError => "noError",
            Self::TooBig => "tooBig",
            Self::NoSuchName => "noSuchName",
            Self::BadValue => "badValue",
            Self::ReadOnly => "readOnly",
            Self::GenErr => "genErr",
            Self::NoAccess => "noAccess",
            Self::WrongType => "wrongType",
            Self::WrongLength => "wrongLength",
            Self::WrongEncoding => "wrongEncoding",
            Self::WrongValue => "wrongValue",
            Self::NoCreation => "noCreation",
            Self::InconsistentValue => "inconsistentValue",
            Self::ResourceUnavailable => "resourceUnavailable",
            Self::CommitFailed => "commitFailed",
            Self::UndoFailed => "undoFailed",
            Self::AuthorizationError => "authorizationError",
            Self::NotWritable => "notWritable",
            Self::InconsistentName => "inconsistentName",
            Self::Unknown(code) => return write!(f, "unknown({})", code),
        };
        f.write_str(name)
    }
}
