use crate::compare::constant_time_eq;
use crate::error::{CsrfError, Result};
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::error;

/// Number of random bytes behind every token.
pub const TOKEN_BYTES: usize = 32;

/// Opaque CSRF token: 32 random bytes as lowercase hex.
///
/// Equality is timing-safe and `Debug` never prints the value.
#[derive(Clone)]
pub struct Token(String);

impl Token {
    /// Wrap an already issued token value, e.g. one read back from storage.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(self.0.as_bytes(), other.0.as_bytes())
    }
}

impl Eq for Token {}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// Produces fresh tokens from the operating system's CSPRNG.
///
/// If the OS source fails, generation is refused unless degraded mode was
/// explicitly enabled, in which case a process-seeded PRNG is used and every
/// use is logged at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenGenerator {
    allow_degraded: bool,
}

static DEGRADED_COUNTER: AtomicU64 = AtomicU64::new(0);

impl TokenGenerator {
    pub fn new(allow_degraded: bool) -> Self {
        Self { allow_degraded }
    }

    /// Generate a new token.
    pub fn generate(&self) -> Result<Token> {
        self.generate_with(|buf| OsRng.try_fill_bytes(buf))
    }

    fn generate_with<F>(&self, fill: F) -> Result<Token>
    where
        F: FnOnce(&mut [u8]) -> std::result::Result<(), rand::Error>,
    {
        let mut bytes = [0u8; TOKEN_BYTES];

        if let Err(e) = fill(&mut bytes) {
            if !self.allow_degraded {
                return Err(CsrfError::EntropyUnavailable(e.to_string()));
            }
            error!(
                reason = %e,
                "OS random source failed; issuing CSRF token from degraded PRNG"
            );
            degraded_rng().fill_bytes(&mut bytes);
        }

        Ok(Token(hex::encode(bytes)))
    }
}

/// PRNG seeded from process-unique state. Not cryptographically sound.
fn degraded_rng() -> StdRng {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(nanos.to_le_bytes());
    hasher.update(DEGRADED_COUNTER.fetch_add(1, Ordering::Relaxed).to_le_bytes());

    let mut seed = [0u8; 32];
    seed.copy_from_slice(&hasher.finalize());
    StdRng::from_seed(seed)
}
