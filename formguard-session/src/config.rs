//! Session configuration.

use crate::error::{SessionError, SessionResult};
use std::time::Duration;

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Default session TTL
    pub default_ttl: Duration,
    /// Maximum session TTL (for security)
    pub max_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),  // 1 hour
            max_ttl: Duration::from_secs(86400 * 7), // 7 days
        }
    }
}

impl SessionConfig {
    /// Create a configuration with the given default TTL.
    ///
    /// # Examples
    ///
    /// ```
    /// use formguard_session::SessionConfig;
    /// use std::time::Duration;
    ///
    /// let config = SessionConfig::new(Duration::from_secs(600)).unwrap();
    /// assert_eq!(config.default_ttl, Duration::from_secs(600));
    /// ```
    pub fn new(default_ttl: Duration) -> SessionResult<Self> {
        Self::default().with_default_ttl(default_ttl).validated()
    }

    /// Set the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the maximum TTL.
    pub fn with_max_ttl(mut self, ttl: Duration) -> Self {
        self.max_ttl = ttl;
        self
    }

    /// Clamp a requested TTL to the configured maximum.
    pub fn clamp_ttl(&self, ttl: Option<Duration>) -> Duration {
        ttl.unwrap_or(self.default_ttl).min(self.max_ttl)
    }

    fn validated(self) -> SessionResult<Self> {
        if self.default_ttl.is_zero() {
            return Err(SessionError::Config(
                "default TTL must be greater than zero".to_string(),
            ));
        }
        if self.default_ttl > self.max_ttl {
            return Err(SessionError::Config(
                "default TTL exceeds maximum TTL".to_string(),
            ));
        }
        Ok(self)
    }
}
