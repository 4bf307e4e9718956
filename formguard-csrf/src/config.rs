use crate::error::{CsrfError, Result, SESSION_EXPIRED_MESSAGE};
use crate::signer::{CookieSigner, HashAlgorithm};
use crate::token::TokenGenerator;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// CSRF protection configuration
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Keyed hash used to sign the fallback cookie
    pub hash_algorithm: String,

    /// Secret key for cookie signing
    pub secret: String,

    /// Cookie path
    pub cookie_path: String,

    /// Cookie name for the fallback cookie
    pub cookie_name: String,

    /// Form field name and session key for the token
    pub field_name: String,

    /// Cookie secure flag (HTTPS only)
    pub cookie_secure: bool,

    /// Cookie SameSite policy
    pub cookie_same_site: SameSite,

    /// Fall back to a process-seeded PRNG when the OS source fails
    pub allow_degraded_entropy: bool,

    /// Text shown to the user after a rejected submission
    pub session_expired_message: String,
}

/// Cookie SameSite attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl fmt::Debug for CsrfConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrfConfig")
            .field("hash_algorithm", &self.hash_algorithm)
            .field("secret", &"<redacted>")
            .field("cookie_path", &self.cookie_path)
            .field("cookie_name", &self.cookie_name)
            .field("field_name", &self.field_name)
            .field("cookie_secure", &self.cookie_secure)
            .field("cookie_same_site", &self.cookie_same_site)
            .field("allow_degraded_entropy", &self.allow_degraded_entropy)
            .field("session_expired_message", &self.session_expired_message)
            .finish()
    }
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::default().as_str().to_string(),
            secret: String::new(),
            cookie_path: "/".to_string(),
            cookie_name: "FORMGUARD_CSRF".to_string(),
            field_name: "csrf_token".to_string(),
            cookie_secure: false,
            cookie_same_site: SameSite::Lax,
            allow_degraded_entropy: false,
            session_expired_message: SESSION_EXPIRED_MESSAGE.to_string(),
        }
    }
}

impl CsrfConfig {
    /// Create a new CSRF configuration
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }

    /// Generate a random hex secret key
    pub fn generate_secret() -> String {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Parse configuration from TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CsrfError::Configuration(format!("TOML parse error: {}", e)))
    }

    /// Parse configuration from JSON
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| CsrfError::Configuration(format!("JSON parse error: {}", e)))
    }

    /// Load configuration from a `.toml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CsrfError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::from_toml_str(&content),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&content),
            _ => Err(CsrfError::Configuration(format!(
                "Unsupported config format: {}",
                path.display()
            ))),
        }
    }

    /// Load configuration from `<PREFIX>_*` environment variables.
    ///
    /// A `.env` file in the working directory is read first if present.
    /// `<PREFIX>_SECRET` is required.
    pub fn from_env(prefix: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let var = |key: &str| env::var(format!("{}_{}", prefix, key)).ok();

        let secret = var("SECRET").ok_or_else(|| {
            CsrfError::Configuration(format!("{}_SECRET is not set", prefix))
        })?;

        let mut config = Self::new(secret);
        if let Some(algorithm) = var("HASH_ALGORITHM") {
            config.hash_algorithm = algorithm;
        }
        if let Some(path) = var("COOKIE_PATH") {
            config.cookie_path = path;
        }
        if let Some(name) = var("COOKIE_NAME") {
            config.cookie_name = name;
        }
        if let Some(name) = var("FIELD_NAME") {
            config.field_name = name;
        }
        if let Some(message) = var("SESSION_EXPIRED_MESSAGE") {
            config.session_expired_message = message;
        }
        Ok(config)
    }

    /// Set hash algorithm
    pub fn with_hash_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.hash_algorithm = algorithm.into();
        self
    }

    /// Set cookie path
    pub fn with_cookie_path(mut self, path: impl Into<String>) -> Self {
        self.cookie_path = path.into();
        self
    }

    /// Set cookie name
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set field name
    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    /// Set cookie secure flag
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Set cookie SameSite policy
    pub fn with_cookie_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie_same_site = same_site;
        self
    }

    /// Allow the degraded entropy fallback
    pub fn with_degraded_entropy(mut self, allow: bool) -> Self {
        self.allow_degraded_entropy = allow;
        self
    }

    /// Set the rejection text, e.g. a translated message
    pub fn with_session_expired_message(mut self, message: impl Into<String>) -> Self {
        self.session_expired_message = message.into();
        self
    }
}

/// Validated, process-wide CSRF settings.
///
/// Built once at startup and shared (typically behind an `Arc`) by every
/// request's [`CsrfGuard`](crate::CsrfGuard).
#[derive(Debug, Clone)]
pub struct CsrfSettings {
    pub(crate) signer: CookieSigner,
    pub(crate) generator: TokenGenerator,
    pub(crate) cookie_name: String,
    pub(crate) cookie_path: String,
    pub(crate) field_name: String,
    pub(crate) cookie_secure: bool,
    pub(crate) cookie_same_site: SameSite,
    pub(crate) session_expired_message: String,
}

impl CsrfSettings {
    /// Validate a configuration.
    ///
    /// Fails with [`CsrfError::Configuration`] if the hash algorithm is not
    /// available or the secret is empty; the fallback cookie cannot be
    /// integrity-protected in either case.
    pub fn new(config: CsrfConfig) -> Result<Self> {
        let algorithm: HashAlgorithm = config.hash_algorithm.parse()?;

        if config.secret.is_empty() {
            return Err(CsrfError::Configuration(
                "CSRF cookie secret must not be empty".to_string(),
            ));
        }
        if config.secret.len() < 32 {
            warn!(
                length = config.secret.len(),
                "CSRF cookie secret is shorter than 32 bytes"
            );
        }
        if config.field_name.is_empty() || config.cookie_name.is_empty() {
            return Err(CsrfError::Configuration(
                "CSRF field and cookie names must not be empty".to_string(),
            ));
        }

        let signer = CookieSigner::new(config.secret.into_bytes(), algorithm)?;
        debug!(algorithm = algorithm.as_str(), "CSRF settings initialised");

        Ok(Self {
            signer,
            generator: TokenGenerator::new(config.allow_degraded_entropy),
            cookie_name: config.cookie_name,
            cookie_path: config.cookie_path,
            field_name: config.field_name,
            cookie_secure: config.cookie_secure,
            cookie_same_site: config.cookie_same_site,
            session_expired_message: config.session_expired_message,
        })
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Text to show the user for `err`.
    ///
    /// A token mismatch uses the configured session-expired message; other
    /// errors fall back to [`CsrfError::user_message`].
    pub fn user_message<'a>(&'a self, err: &CsrfError) -> &'a str {
        match err {
            CsrfError::TokenMismatch => &self.session_expired_message,
            other => other.user_message(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn signer(&self) -> &CookieSigner {
        &self.signer
    }
}
