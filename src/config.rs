//! Connection and credential configuration.
//!
//! [`SecurityParameters`] and [`ConnectionConfig`] are validated once at
//! construction and immutable afterwards. The flat string-keyed parameter bag
//! used by device descriptors is converted only at the boundary, by
//! [`ConnectionConfig::from_params`] and [`ConnectionConfig::to_params`].

use std::collections::BTreeMap;
use std::time::Duration;

use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::v3::{AuthProtocol, PrivProtocol};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default max-repetitions for GETBULK.
pub const DEFAULT_MAX_REPETITIONS: u32 = 25;

/// Parameter bag keys.
pub mod keys {
    pub const VERSION: &str = "version";
    pub const ENDPOINT: &str = "endpoint";
    pub const PORT: &str = "port";
    pub const USER_NAME: &str = "userName";
    pub const AUTH_PROTOCOL: &str = "authenticationProtocol";
    pub const AUTH_PASSPHRASE: &str = "authenticationPassphrase";
    pub const PRIV_PROTOCOL: &str = "privacyProtocol";
    pub const PRIV_PASSPHRASE: &str = "privacyPassphrase";
    pub const CONTEXT_NAME: &str = "contextName";
    pub const MAX_REPETITIONS: &str = "maxRepetitions";
    pub const OID: &str = "oid";
}

/// SNMPv3 USM credentials.
///
/// Only authPriv is supported, so both protocols are required. Empty user
/// names and passphrases are accepted.
#[derive(Clone)]
pub struct SecurityParameters {
    user_name: String,
    auth_protocol: AuthProtocol,
    auth_passphrase: Zeroizing<String>,
    priv_protocol: PrivProtocol,
    priv_passphrase: Zeroizing<String>,
}

impl SecurityParameters {
    /// Validate and build credentials.
    ///
    /// ```rust
    /// use ups_snmp::SecurityParameters;
    /// use ups_snmp::v3::{AuthProtocol, PrivProtocol};
    ///
    /// let ok = SecurityParameters::new(
    ///     "simulator",
    ///     Some(AuthProtocol::Sha1),
    ///     "auctoritas",
    ///     Some(PrivProtocol::Aes128),
    ///     "privatus",
    /// );
    /// assert!(ok.is_ok());
    ///
    /// let err = SecurityParameters::new("u", None, "", Some(PrivProtocol::Des), "")
    ///     .unwrap_err();
    /// assert_eq!(err.to_string(), "Unsupported authentication protocol [NONE]");
    /// ```
    pub fn new(
        user_name: impl Into<String>,
        auth_protocol: Option<AuthProtocol>,
        auth_passphrase: impl Into<String>,
        priv_protocol: Option<PrivProtocol>,
        priv_passphrase: impl Into<String>,
    ) -> Result<Self> {
        let auth_protocol = auth_protocol
            .ok_or_else(|| Error::config("Unsupported authentication protocol [NONE]"))?;
        let priv_protocol =
            priv_protocol.ok_or_else(|| Error::config("Unsupported privacy protocol [NONE]"))?;

        Ok(Self {
            user_name: user_name.into(),
            auth_protocol,
            auth_passphrase: Zeroizing::new(auth_passphrase.into()),
            priv_protocol,
            priv_passphrase: Zeroizing::new(priv_passphrase.into()),
        })
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn auth_protocol(&self) -> AuthProtocol {
        self.auth_protocol
    }

    pub fn auth_passphrase(&self) -> &str {
        &self.auth_passphrase
    }

    pub fn priv_protocol(&self) -> PrivProtocol {
        self.priv_protocol
    }

    pub fn priv_passphrase(&self) -> &str {
        &self.priv_passphrase
    }
}

impl std::fmt::Debug for SecurityParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityParameters")
            .field("user_name", &self.user_name)
            .field("auth_protocol", &self.auth_protocol)
            .field("auth_passphrase", &"[REDACTED]")
            .field("priv_protocol", &self.priv_protocol)
            .field("priv_passphrase", &"[REDACTED]")
            .finish()
    }
}

/// Everything needed to open an SNMPv3 session against one agent.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    version: String,
    endpoint: String,
    port: u16,
    context_name: String,
    timeout: Duration,
    max_repetitions: u32,
    security: SecurityParameters,
}

impl ConnectionConfig {
    /// Validate and build a connection config.
    ///
    /// Checks run in order: version (must be `v3`, any case), then the
    /// presence of credentials, then a non-empty endpoint.
    pub fn new(
        version: &str,
        endpoint: impl Into<String>,
        port: u16,
        security: Option<SecurityParameters>,
        context_name: impl Into<String>,
    ) -> Result<Self> {
        let version_upper = version.to_ascii_uppercase();
        if version_upper != "V3" {
            return Err(Error::config(format!("Version [{}] unsupported", version)));
        }

        let security = security.ok_or_else(|| Error::config("securityParameters is nil"))?;

        let endpoint = endpoint.into();
        if endpoint.is_empty() {
            return Err(Error::config(
                "endpoint is an empty string, but should not be",
            ));
        }

        Ok(Self {
            version: version_upper,
            endpoint,
            port,
            context_name: context_name.into(),
            timeout: DEFAULT_TIMEOUT,
            max_repetitions: DEFAULT_MAX_REPETITIONS,
            security,
        })
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override GETBULK max-repetitions. Zero is clamped to one.
    pub fn with_max_repetitions(mut self, max_repetitions: u32) -> Self {
        self.max_repetitions = max_repetitions.max(1);
        self
    }

    /// Build from a flat parameter bag.
    ///
    /// `port` is parsed strictly and its parse error text is returned as-is.
    /// Protocol names are case-insensitive. A missing `contextName` means the
    /// empty context.
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use ups_snmp::ConnectionConfig;
    ///
    /// let mut params = BTreeMap::new();
    /// params.insert("version".to_string(), "v3".to_string());
    /// params.insert("endpoint".to_string(), "127.0.0.1".to_string());
    /// params.insert("port".to_string(), "Z".to_string());
    /// params.insert("authenticationProtocol".to_string(), "SHA".to_string());
    /// params.insert("privacyProtocol".to_string(), "AES".to_string());
    ///
    /// let err = ConnectionConfig::from_params(&params).unwrap_err();
    /// assert_eq!(err.to_string(), "invalid digit found in string");
    /// ```
    pub fn from_params(params: &BTreeMap<String, String>) -> Result<Self> {
        let get = |key: &str| params.get(key).map(String::as_str).unwrap_or("");

        let port: u16 = get(keys::PORT)
            .parse()
            .map_err(|e: std::num::ParseIntError| Error::config(e.to_string()))?;

        let auth_protocol: AuthProtocol = get(keys::AUTH_PROTOCOL).parse()?;
        let priv_protocol: PrivProtocol = get(keys::PRIV_PROTOCOL).parse()?;

        let security = SecurityParameters::new(
            get(keys::USER_NAME),
            Some(auth_protocol),
            get(keys::AUTH_PASSPHRASE),
            Some(priv_protocol),
            get(keys::PRIV_PASSPHRASE),
        )?;

        let mut config = Self::new(
            get(keys::VERSION),
            get(keys::ENDPOINT),
            port,
            Some(security),
            get(keys::CONTEXT_NAME),
        )?;

        if let Some(raw) = params.get(keys::MAX_REPETITIONS) {
            let max_repetitions: u32 = raw
                .parse()
                .map_err(|e: std::num::ParseIntError| Error::config(e.to_string()))?;
            config = config.with_max_repetitions(max_repetitions);
        }

        Ok(config)
    }

    /// Inverse of [`from_params`](Self::from_params).
    ///
    /// `maxRepetitions` is only emitted when it differs from the default.
    pub fn to_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        let mut put = |key: &str, value: String| {
            params.insert(key.to_string(), value);
        };

        put(keys::VERSION, self.version.clone());
        put(keys::ENDPOINT, self.endpoint.clone());
        put(keys::PORT, self.port.to_string());
        put(keys::USER_NAME, self.security.user_name.clone());
        put(keys::AUTH_PROTOCOL, self.security.auth_protocol.to_string());
        put(
            keys::AUTH_PASSPHRASE,
            self.security.auth_passphrase.as_str().to_string(),
        );
        put(keys::PRIV_PROTOCOL, self.security.priv_protocol.to_string());
        put(
            keys::PRIV_PASSPHRASE,
            self.security.priv_passphrase.as_str().to_string(),
        );
        put(keys::CONTEXT_NAME, self.context_name.clone());
        if self.max_repetitions != DEFAULT_MAX_REPETITIONS {
            put(keys::MAX_REPETITIONS, self.max_repetitions.to_string());
        }

        params
    }

    /// Normalized version string (`"V3"`).
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn context_name(&self) -> &str {
        &self.context_name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_repetitions(&self) -> u32 {
        self.max_repetitions
    }

    pub fn security(&self) -> &SecurityParameters {
        &self.security
    }
}

/// Merge two parameter bags, failing on the first duplicate key.
pub(crate) fn merge_params(
    base: &BTreeMap<String, String>,
    extra: &BTreeMap<String, String>,
) -> std::result::Result<BTreeMap<String, String>, String> {
    let mut merged = base.clone();
    for (key, value) in extra {
        if merged.contains_key(key) {
            return Err(format!(
                "Key {} already in merged map: {:?}",
                key,
                merged.keys().collect::<Vec<_>>()
            ));
        }
        merged.insert(key.clone(), value.clone());
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn security() -> SecurityParameters {
        SecurityParameters::new(
            "simulator",
            Some(AuthProtocol::Sha1),
            "auctoritas",
            Some(PrivProtocol::Aes128),
            "privatus",
        )
        .unwrap()
    }

    fn params() -> BTreeMap<String, String> {
        [
            ("version", "v3"),
            ("endpoint", "127.0.0.1"),
            ("port", "1024"),
            ("userName", "simulator"),
            ("authenticationProtocol", "SHA"),
            ("authenticationPassphrase", "auctoritas"),
            ("privacyProtocol", "AES"),
            ("privacyPassphrase", "privatus"),
            ("contextName", "public"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_all_protocol_combinations_construct() {
        for auth in [AuthProtocol::Md5, AuthProtocol::Sha1] {
            for privacy in [PrivProtocol::Des, PrivProtocol::Aes128] {
                let sp = SecurityParameters::new("", Some(auth), "", Some(privacy), "").unwrap();
                assert_eq!(sp.auth_protocol(), auth);
                assert_eq!(sp.priv_protocol(), privacy);
                assert_eq!(sp.user_name(), "");
            }
        }
    }

    #[test]
    fn test_missing_protocols_rejected() {
        let err =
            SecurityParameters::new("u", Some(AuthProtocol::Md5), "", None, "").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported privacy protocol [NONE]");
        assert!(matches!(*err, Error::Config(_)));

        let err = SecurityParameters::new("u", None, "", None, "").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported authentication protocol [NONE]");
    }

    #[test]
    fn test_debug_redacts_passphrases() {
        let debug = format!("{:?}", security());
        assert!(debug.contains("simulator"));
        assert!(!debug.contains("auctoritas"));
        assert!(!debug.contains("privatus"));
    }

    #[test]
    fn test_new_checks_version_first() {
        let err = ConnectionConfig::new("v2c", "", 161, None, "").unwrap_err();
        assert_eq!(err.to_string(), "Version [v2c] unsupported");

        let err = ConnectionConfig::new("V3", "", 161, None, "").unwrap_err();
        assert_eq!(err.to_string(), "securityParameters is nil");

        let err = ConnectionConfig::new("v3", "", 161, Some(security()), "").unwrap_err();
        assert_eq!(
            err.to_string(),
            "endpoint is an empty string, but should not be"
        );
    }

    #[test]
    fn test_new_defaults() {
        let config = ConnectionConfig::new("v3", "ups", 161, Some(security()), "").unwrap();
        assert_eq!(config.version(), "V3");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_repetitions(), 25);
        assert_eq!(config.context_name(), "");
    }

    #[test]
    fn test_from_params() {
        let config = ConnectionConfig::from_params(&params()).unwrap();
        assert_eq!(config.endpoint(), "127.0.0.1");
        assert_eq!(config.port(), 1024);
        assert_eq!(config.context_name(), "public");
        assert_eq!(config.security().auth_protocol(), AuthProtocol::Sha1);
        assert_eq!(config.security().priv_protocol(), PrivProtocol::Aes128);
        assert_eq!(config.security().priv_passphrase(), "privatus");
    }

    #[test]
    fn test_from_params_validation_messages() {
        let mut bag = params();
        bag.insert("version".into(), "v2c".into());
        let err = ConnectionConfig::from_params(&bag).unwrap_err();
        assert_eq!(err.to_string(), "Version [v2c] unsupported");

        let mut bag = params();
        bag.remove("version");
        let err = ConnectionConfig::from_params(&bag).unwrap_err();
        assert_eq!(err.to_string(), "Version [] unsupported");

        let mut bag = params();
        bag.remove("endpoint");
        let err = ConnectionConfig::from_params(&bag).unwrap_err();
        assert_eq!(
            err.to_string(),
            "endpoint is an empty string, but should not be"
        );

        let mut bag = params();
        bag.insert("port".into(), "Z".into());
        let err = ConnectionConfig::from_params(&bag).unwrap_err();
        assert_eq!(err.to_string(), "invalid digit found in string");

        let mut bag = params();
        bag.insert("authenticationProtocol".into(), "sha256".into());
        let err = ConnectionConfig::from_params(&bag).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported authentication protocol [SHA256]");

        let mut bag = params();
        bag.remove("privacyProtocol");
        let err = ConnectionConfig::from_params(&bag).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported privacy protocol []");
    }

    #[test]
    fn test_from_params_without_context_name() {
        let mut bag = params();
        bag.remove("contextName");
        let config = ConnectionConfig::from_params(&bag).unwrap();
        assert_eq!(config.context_name(), "");
    }

    #[test]
    fn test_params_round_trip() {
        let mut bag = params();
        bag.insert("version".into(), "V3".into());
        let config = ConnectionConfig::from_params(&bag).unwrap();
        assert_eq!(config.to_params(), bag);

        bag.insert("maxRepetitions".into(), "10".into());
        let config = ConnectionConfig::from_params(&bag).unwrap();
        assert_eq!(config.max_repetitions(), 10);
        assert_eq!(config.to_params(), bag);
    }

    #[test]
    fn test_merge_params_rejects_duplicates() {
        let a: BTreeMap<_, _> = [("a".to_string(), "1".to_string())].into();
        let b: BTreeMap<_, _> = [("b".to_string(), "2".to_string())].into();
        let merged = merge_params(&a, &b).unwrap();
        assert_eq!(merged.len(), 2);

        let err = merge_params(&merged, &a).unwrap_err();
        assert!(err.starts_with("Key a already in merged map:"));
    }
}
