//! Authentication key derivation and HMAC operations (RFC 3414).
//!
//! - Password-to-key derivation (1MB expansion + hash)
//! - Key localization (binding key to engine ID)
//! - HMAC-96 authentication for message integrity

use digest::{Digest, KeyInit, Mac, OutputSizeUser};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::AuthProtocol;

/// Minimum password length accepted by net-snmp.
///
/// Shorter passwords are accepted here but logged at `WARN`.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication key bound to one engine ID.
///
/// Key material is zeroed when the key is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LocalizedKey {
    key: Vec<u8>,
    #[zeroize(skip)]
    protocol: AuthProtocol,
}

impl LocalizedKey {
    /// Derive a localized key from a password and engine ID.
    ///
    /// RFC 3414 Section A.2: expand the password to 1MB, hash it to get the
    /// master key, then hash `master_key || engine_id || master_key`.
    ///
    /// An empty password yields an all-zero master key.
    pub fn from_password(protocol: AuthProtocol, password: &[u8], engine_id: &[u8]) -> Self {
        if password.len() < MIN_PASSWORD_LENGTH {
            tracing::warn!(
                target: "ups_snmp::v3",
                password_len = password.len(),
                min_len = MIN_PASSWORD_LENGTH,
                "SNMPv3 password is shorter than recommended minimum"
            );
        }
        let master_key = password_to_key(protocol, password);
        Self {
            key: localize_key(protocol, &master_key, engine_id),
            protocol,
        }
    }

    /// Wrap an already-localized key.
    pub fn from_bytes(protocol: AuthProtocol, key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            protocol,
        }
    }

    pub fn protocol(&self) -> AuthProtocol {
        self.protocol
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn mac_len(&self) -> usize {
        self.protocol.mac_len()
    }

    /// HMAC over `data`, truncated to 12 bytes.
    pub fn compute_hmac(&self, data: &[u8]) -> Vec<u8> {
        match self.protocol {
            AuthProtocol::Md5 => truncated_hmac::<hmac::Hmac<md5::Md5>>(&self.key, data),
            AuthProtocol::Sha1 => truncated_hmac::<hmac::Hmac<sha1::Sha1>>(&self.key, data),
        }
    }

    /// Constant-time MAC check.
    pub fn verify_hmac(&self, data: &[u8], expected: &[u8]) -> bool {
        let computed = self.compute_hmac(data);
        computed.len() == expected.len() && bool::from(computed.ct_eq(expected))
    }
}

impl std::fmt::Debug for LocalizedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalizedKey")
            .field("protocol", &self.protocol)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Password to key transformation (RFC 3414 Section A.2.1).
pub(crate) fn password_to_key(protocol: AuthProtocol, password: &[u8]) -> Vec<u8> {
    match protocol {
        AuthProtocol::Md5 => password_to_key_impl::<md5::Md5>(password),
        AuthProtocol::Sha1 => password_to_key_impl::<sha1::Sha1>(password),
    }
}

fn password_to_key_impl<D>(password: &[u8]) -> Vec<u8>
where
    D: Digest + Default,
{
    const EXPANSION_SIZE: usize = 1_048_576;

    if password.is_empty() {
        return vec![0u8; <D as OutputSizeUser>::output_size()];
    }

    let mut hasher = D::new();
    let mut buf = [0u8; 64];
    let mut cycle = password.iter().copied().cycle();
    let mut count = 0;

    while count < EXPANSION_SIZE {
        for byte in &mut buf {
            // cycle over a non-empty slice never ends
            *byte = cycle.next().unwrap_or_default();
        }
        hasher.update(buf);
        count += buf.len();
    }

    hasher.finalize().to_vec()
}

/// Key localization (RFC 3414 Section A.2.2).
pub(crate) fn localize_key(protocol: AuthProtocol, master_key: &[u8], engine_id: &[u8]) -> Vec<u8> {
    match protocol {
        AuthProtocol::Md5 => localize_key_impl::<md5::Md5>(master_key, engine_id),
        AuthProtocol::Sha1 => localize_key_impl::<sha1::Sha1>(master_key, engine_id),
    }
}

fn localize_key_impl<D>(master_key: &[u8], engine_id: &[u8]) -> Vec<u8>
where
    D: Digest + Default,
{
    let mut hasher = D::new();
    hasher.update(master_key);
    hasher.update(engine_id);
    hasher.update(master_key);
    hasher.finalize().to_vec()
}

fn truncated_hmac<M>(key: &[u8], data: &[u8]) -> Vec<u8>
where
    M: Mac + KeyInit,
{
    let mut mac = <M as KeyInit>::new_from_slice(key).expect("HMAC can take key of any size");
    Mac::update(&mut mac, data);
    let result = mac.finalize().into_bytes();
    result[..12].to_vec()
}

/// Fill the zeroed authentication parameters of an encoded message with its MAC.
///
/// The HMAC covers the whole message with the placeholder still zeroed.
pub fn authenticate_message(
    key: &LocalizedKey,
    message: &mut [u8],
    auth_offset: usize,
    auth_len: usize,
) {
    let mac = key.compute_hmac(message);
    if let Some(slot) = message.get_mut(auth_offset..auth_offset + auth_len) {
        slot.copy_from_slice(&mac[..auth_len.min(mac.len())]);
    }
}

/// Verify the MAC of an incoming message.
pub fn verify_message(
    key: &LocalizedKey,
    message: &[u8],
    auth_offset: usize,
    auth_len: usize,
) -> bool {
    let Some(received_mac) = message.get(auth_offset..auth_offset + auth_len) else {
        return false;
    };

    let mut msg_copy = message.to_vec();
    msg_copy[auth_offset..auth_offset + auth_len].fill(0);

    key.verify_hmac(&msg_copy, received_mac)
}
