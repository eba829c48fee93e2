//! Privacy (encryption) protocols for SNMPv3 (RFC 3414, RFC 3826).
//!
//! # Salt/IV Construction
//!
//! ## DES-CBC
//! - Salt (privParameters): engineBoots (4 bytes) || counter (4 bytes)
//! - IV: pre-IV XOR salt (pre-IV is the last 8 bytes of the 16-byte privKey)
//!
//! ## AES-CFB-128
//! - Salt (privParameters): 64-bit counter
//! - IV: engineBoots (4 bytes) || engineTime (4 bytes) || salt (8 bytes)
//!   (concatenation, not XOR)

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::auth::{localize_key, password_to_key};
use super::{AuthProtocol, PrivProtocol};
use crate::error::internal::CryptoErrorKind;
use crate::error::{Error, Result, UNKNOWN_TARGET};

/// Random non-zero u64 for salt initialization.
///
/// Falls back to the wall clock if the OS random source is unavailable.
fn random_nonzero_u64() -> u64 {
    let mut buf = [0u8; 8];
    let val = match getrandom::fill(&mut buf) {
        Ok(()) => u64::from_ne_bytes(buf),
        Err(e) => {
            tracing::warn!(target: "ups_snmp::v3", error = %e, "getrandom failed, seeding salt from clock");
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(1)
        }
    };
    val.max(1)
}

fn crypto_error(kind: CryptoErrorKind) -> Box<Error> {
    tracing::debug!(target: "ups_snmp::v3", { kind = %kind }, "privacy processing failed");
    Error::Crypto {
        target: UNKNOWN_TARGET,
    }
    .boxed()
}

/// Thread-safe salt counter shared across encryptions of one session.
pub struct SaltCounter(AtomicU64);

impl SaltCounter {
    /// Counter initialized from cryptographic randomness.
    pub fn new() -> Self {
        Self(AtomicU64::new(random_nonzero_u64()))
    }

    /// Counter starting at `value`.
    pub fn from_value(value: u64) -> Self {
        Self(AtomicU64::new(value))
    }

    /// Next salt value. Never zero: zero is skipped on wraparound.
    pub fn next(&self) -> u64 {
        let val = self.0.fetch_add(1, Ordering::SeqCst);
        if val == 0 {
            self.0.fetch_add(1, Ordering::SeqCst)
        } else {
            val
        }
    }
}

impl Default for SaltCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Privacy key for encryption/decryption operations.
///
/// Derived like an authentication key (RFC 3414 A.2) using the session's
/// authentication hash. DES uses the first 8 bytes as key and the next 8 as
/// pre-IV; AES-128 uses the first 16 bytes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivKey {
    key: Vec<u8>,
    #[zeroize(skip)]
    protocol: PrivProtocol,
}

impl PrivKey {
    /// Derive a privacy key from a password and engine ID.
    pub fn from_password(
        auth_protocol: AuthProtocol,
        priv_protocol: PrivProtocol,
        password: &[u8],
        engine_id: &[u8],
    ) -> Self {
        let master = password_to_key(auth_protocol, password);
        Self {
            key: localize_key(auth_protocol, &master, engine_id),
            protocol: priv_protocol,
        }
    }

    /// Wrap raw localized key bytes.
    pub fn from_bytes(protocol: PrivProtocol, key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            protocol,
        }
    }

    pub fn protocol(&self) -> PrivProtocol {
        self.protocol
    }

    /// Encrypt a serialized scoped PDU, returning `(ciphertext, privParameters)`.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        engine_boots: u32,
        engine_time: u32,
        salt_counter: &SaltCounter,
    ) -> Result<(Bytes, Bytes)> {
        let salt = salt_counter.next();
        match self.protocol {
            PrivProtocol::Des => self.encrypt_des(plaintext, engine_boots, salt),
            PrivProtocol::Aes128 => self.encrypt_aes(plaintext, engine_boots, engine_time, salt),
        }
    }

    /// Decrypt using the privParameters carried by the message.
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        engine_boots: u32,
        engine_time: u32,
        priv_params: &[u8],
    ) -> Result<Bytes> {
        if priv_params.len() != 8 {
            return Err(crypto_error(CryptoErrorKind::InvalidPrivParamsLength {
                expected: 8,
                actual: priv_params.len(),
            }));
        }

        match self.protocol {
            PrivProtocol::Des => self.decrypt_des(ciphertext, priv_params),
            PrivProtocol::Aes128 => {
                self.decrypt_aes(ciphertext, engine_boots, engine_time, priv_params)
            }
        }
    }

    fn des_parts(&self) -> Result<(&[u8], &[u8])> {
        match (self.key.get(..8), self.key.get(8..16)) {
            (Some(key), Some(pre_iv)) => Ok((key, pre_iv)),
            _ => Err(crypto_error(CryptoErrorKind::InvalidKeyLength)),
        }
    }

    /// DES-CBC encryption (RFC 3414 Section 8.1.1).
    fn encrypt_des(&self, plaintext: &[u8], engine_boots: u32, salt_int: u64) -> Result<(Bytes, Bytes)> {
        use cbc::cipher::{BlockEncryptMut, KeyIvInit};
        type DesCbc = cbc::Encryptor<des::Des>;

        let (key, pre_iv) = self.des_parts()?;

        // lower 32 bits of the counter follow engineBoots
        let mut salt = [0u8; 8];
        salt[..4].copy_from_slice(&engine_boots.to_be_bytes());
        salt[4..].copy_from_slice(&(salt_int as u32).to_be_bytes());

        let mut iv = [0u8; 8];
        for (i, b) in iv.iter_mut().enumerate() {
            *b = pre_iv[i] ^ salt[i];
        }

        // zero-pad to the block size
        let padded_len = plaintext.len().div_ceil(8) * 8;
        let mut buffer = vec![0u8; padded_len];
        buffer[..plaintext.len()].copy_from_slice(plaintext);

        let cipher = DesCbc::new_from_slices(key, &iv)
            .map_err(|_| crypto_error(CryptoErrorKind::InvalidKeyLength))?;
        let ciphertext = cipher
            .encrypt_padded_mut::<cbc::cipher::block_padding::NoPadding>(&mut buffer, padded_len)
            .map_err(|_| crypto_error(CryptoErrorKind::CipherError))?;

        Ok((
            Bytes::copy_from_slice(ciphertext),
            Bytes::copy_from_slice(&salt),
        ))
    }

    /// DES-CBC decryption (RFC 3414 Section 8.1.1).
    fn decrypt_des(&self, ciphertext: &[u8], priv_params: &[u8]) -> Result<Bytes> {
        use cbc::cipher::{BlockDecryptMut, KeyIvInit};
        type DesCbc = cbc::Decryptor<des::Des>;

        if !ciphertext.len().is_multiple_of(8) {
            return Err(crypto_error(CryptoErrorKind::InvalidCiphertextLength {
                length: ciphertext.len(),
                block_size: 8,
            }));
        }

        let (key, pre_iv) = self.des_parts()?;
        let mut iv = [0u8; 8];
        for (i, b) in iv.iter_mut().enumerate() {
            *b = pre_iv[i] ^ priv_params[i];
        }

        let cipher = DesCbc::new_from_slices(key, &iv)
            .map_err(|_| crypto_error(CryptoErrorKind::InvalidKeyLength))?;
        let mut buffer = ciphertext.to_vec();
        let plaintext = cipher
            .decrypt_padded_mut::<cbc::cipher::block_padding::NoPadding>(&mut buffer)
            .map_err(|_| crypto_error(CryptoErrorKind::CipherError))?;

        Ok(Bytes::copy_from_slice(plaintext))
    }

    fn aes_iv(engine_boots: u32, engine_time: u32, salt: &[u8]) -> [u8; 16] {
        let mut iv = [0u8; 16];
        iv[..4].copy_from_slice(&engine_boots.to_be_bytes());
        iv[4..8].copy_from_slice(&engine_time.to_be_bytes());
        iv[8..].copy_from_slice(salt);
        iv
    }

    /// AES-CFB-128 encryption (RFC 3826 Section 3.1).
    fn encrypt_aes(
        &self,
        plaintext: &[u8],
        engine_boots: u32,
        engine_time: u32,
        salt: u64,
    ) -> Result<(Bytes, Bytes)> {
        use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
        type Aes128Cfb = cfb_mode::Encryptor<aes::Aes128>;

        let key = self
            .key
            .get(..16)
            .ok_or_else(|| crypto_error(CryptoErrorKind::InvalidKeyLength))?;
        let salt_bytes = salt.to_be_bytes();
        let iv = Self::aes_iv(engine_boots, engine_time, &salt_bytes);

        let mut buffer = plaintext.to_vec();
        let cipher = Aes128Cfb::new_from_slices(key, &iv)
            .map_err(|_| crypto_error(CryptoErrorKind::InvalidKeyLength))?;
        cipher.encrypt(&mut buffer);

        Ok((Bytes::from(buffer), Bytes::copy_from_slice(&salt_bytes)))
    }

    /// AES-CFB-128 decryption (RFC 3826 Section 3.1.4).
    fn decrypt_aes(
        &self,
        ciphertext: &[u8],
        engine_boots: u32,
        engine_time: u32,
        priv_params: &[u8],
    ) -> Result<Bytes> {
        use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
        type Aes128Cfb = cfb_mode::Decryptor<aes::Aes128>;

        let key = self
            .key
            .get(..16)
            .ok_or_else(|| crypto_error(CryptoErrorKind::InvalidKeyLength))?;
        let iv = Self::aes_iv(engine_boots, engine_time, priv_params);

        let mut buffer = ciphertext.to_vec();
        let cipher = Aes128Cfb::new_from_slices(key, &iv)
            .map_err(|_| crypto_error(CryptoErrorKind::InvalidKeyLength))?;
        cipher.decrypt(&mut buffer);

        Ok(Bytes::from(buffer))
    }
}

impl std::fmt::Debug for PrivKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivKey")
            .field("protocol", &self.protocol)
            .field("key", &"[REDACTED]")
            .finish()
    }
}
