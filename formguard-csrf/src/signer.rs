//! Keyed-hash signing of the fallback cookie.
//!
//! Wire format: `<hex hmac>_<base64(payload)>`. The HMAC covers the exact
//! payload bytes, so verification recomputes it over the decoded bytes
//! before anything is deserialized.

use crate::compare::constant_time_eq;
use crate::error::{CookieError, CsrfError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;

/// Separator between the hash and the encoded payload.
pub const SEPARATOR: char = '_';

/// Supported HMAC hash functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Length of the hex-encoded digest.
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha384 => 96,
            Self::Sha512 => 128,
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = CsrfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            other => Err(CsrfError::Configuration(format!(
                "unsupported hash algorithm '{}' for CSRF cookie signing",
                other
            ))),
        }
    }
}

/// HMAC signer for fallback cookie payloads.
#[derive(Clone)]
pub struct CookieSigner {
    secret: Vec<u8>,
    algorithm: HashAlgorithm,
}

impl fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieSigner")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl CookieSigner {
    /// Create a signer. An empty secret is a configuration error.
    pub fn new(secret: impl Into<Vec<u8>>, algorithm: HashAlgorithm) -> Result<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(CsrfError::Configuration(
                "CSRF cookie secret must not be empty".to_string(),
            ));
        }
        Ok(Self { secret, algorithm })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hex HMAC of `payload`. Deterministic.
    pub fn sign(&self, payload: &[u8]) -> String {
        match self.algorithm {
            HashAlgorithm::Sha256 => hmac_hex::<Hmac<Sha256>>(&self.secret, payload),
            HashAlgorithm::Sha384 => hmac_hex::<Hmac<Sha384>>(&self.secret, payload),
            HashAlgorithm::Sha512 => hmac_hex::<Hmac<Sha512>>(&self.secret, payload),
        }
    }

    /// Check `candidate` against the HMAC of `payload` in constant time.
    pub fn verify(&self, payload: &[u8], candidate: &str) -> bool {
        constant_time_eq(self.sign(payload).as_bytes(), candidate.as_bytes())
    }

    /// Produce the signed cookie value for `payload`.
    pub fn seal(&self, payload: &[u8]) -> String {
        format!("{}{}{}", self.sign(payload), SEPARATOR, STANDARD.encode(payload))
    }

    /// Split, decode and verify a signed cookie value, returning the payload
    /// bytes only if the signature holds.
    pub fn open(&self, cookie: &str) -> std::result::Result<Vec<u8>, CookieError> {
        let (hash, encoded) = cookie
            .split_once(SEPARATOR)
            .ok_or(CookieError::MissingSeparator)?;

        let payload = STANDARD.decode(encoded)?;

        if !self.verify(&payload, hash) {
            return Err(CookieError::SignatureMismatch);
        }

        Ok(payload)
    }
}

fn hmac_hex<M: Mac + KeyInit>(secret: &[u8], data: &[u8]) -> String {
    let mut mac = <M as Mac>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}
