//! SNMPv3 User-based Security Model (RFC 3414, RFC 3826).
//!
//! - USM security parameters encoding/decoding
//! - Key localization (password-to-key derivation)
//! - Authentication (HMAC-MD5-96, HMAC-SHA-96)
//! - Privacy (DES-CBC, AES-128-CFB)
//! - Engine discovery and time synchronization

pub mod auth;
mod engine;
mod privacy;
mod usm;

pub use auth::LocalizedKey;
pub use engine::{
    DEFAULT_MSG_MAX_SIZE, EngineState, MAX_ENGINE_TIME, TIME_WINDOW, is_decryption_error_report,
    is_not_in_time_window_report, is_unknown_engine_id_report, is_unknown_user_name_report,
    is_unsupported_sec_level_report, is_wrong_digest_report, parse_discovery_response, report_oids,
};
pub use privacy::{PrivKey, SaltCounter};
pub use usm::UsmSecurityParams;

use crate::error::{Error, Result};

/// Authentication protocol identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AuthProtocol {
    /// HMAC-MD5-96 (RFC 3414)
    Md5,
    /// HMAC-SHA-96 (RFC 3414)
    Sha1,
}

impl AuthProtocol {
    /// Truncated MAC length carried in msgAuthenticationParameters.
    pub fn mac_len(self) -> usize {
        12
    }
}

impl std::fmt::Display for AuthProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Md5 => write!(f, "MD5"),
            Self::Sha1 => write!(f, "SHA"),
        }
    }
}

impl std::str::FromStr for AuthProtocol {
    type Err = Box<Error>;

    /// Case-insensitive: `"md5"`, `"MD5"`, `"sha"`, `"SHA"`.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MD5" => Ok(Self::Md5),
            "SHA" => Ok(Self::Sha1),
            other => Err(Error::config(format!(
                "Unsupported authentication protocol [{}]",
                other
            ))),
        }
    }
}

/// Privacy protocol identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrivProtocol {
    /// DES-CBC (RFC 3414)
    Des,
    /// AES-128-CFB (RFC 3826)
    Aes128,
}

impl std::fmt::Display for PrivProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Des => write!(f, "DES"),
            Self::Aes128 => write!(f, "AES"),
        }
    }
}

impl std::str::FromStr for PrivProtocol {
    type Err = Box<Error>;

    /// Case-insensitive: `"des"`, `"DES"`, `"aes"`, `"AES"`.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DES" => Ok(Self::Des),
            "AES" => Ok(Self::Aes128),
            other => Err(Error::config(format!(
                "Unsupported privacy protocol [{}]",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_names_are_case_insensitive() {
        assert_eq!("md5".parse::<AuthProtocol>().unwrap(), AuthProtocol::Md5);
        assert_eq!("Sha".parse::<AuthProtocol>().unwrap(), AuthProtocol::Sha1);
        assert_eq!("des".parse::<PrivProtocol>().unwrap(), PrivProtocol::Des);
        assert_eq!("AES".parse::<PrivProtocol>().unwrap(), PrivProtocol::Aes128);
    }

    #[test]
    fn test_unknown_protocols_report_upper_cased_name() {
        let err = "sha256".parse::<AuthProtocol>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported authentication protocol [SHA256]");

        let err = "aes256".parse::<PrivProtocol>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported privacy protocol [AES256]");

        let err = "".parse::<PrivProtocol>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported privacy protocol []");
    }

    #[test]
    fn test_display_matches_parameter_names() {
        for p in [AuthProtocol::Md5, AuthProtocol::Sha1] {
            assert_eq!(p.to_string().parse::<AuthProtocol>().unwrap(), p);
        }
        for p in [PrivProtocol::Des, PrivProtocol::Aes128] {
            assert_eq!(p.to_string().parse::<PrivProtocol>().unwrap(), p);
        }
    }
}
