//! Where the current token lives: the session when one exists, otherwise a
//! signed, session-scoped cookie.

use crate::compare::tokens_match;
use crate::config::CsrfSettings;
use crate::context::{CookieTransport, IncomingRequest, SessionContext, SetCookie};
use crate::error::{CookieError, Result};
use crate::token::Token;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage backend selected for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Unresolved,
    SessionBacked,
    CookieBacked,
}

/// Request-scoped token storage.
///
/// The backend is resolved on every access: a session, once seen, always
/// wins and the cookie is neither read nor written for it.
#[derive(Debug)]
pub struct TokenStore {
    settings: Arc<CsrfSettings>,
    backend: Backend,
    cookie_token: Option<Token>,
    cookie_scheduled: bool,
}

impl TokenStore {
    pub fn new(settings: Arc<CsrfSettings>) -> Self {
        Self {
            settings,
            backend: Backend::Unresolved,
            cookie_token: None,
            cookie_scheduled: false,
        }
    }

    pub fn settings(&self) -> &CsrfSettings {
        &self.settings
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Whether a fallback cookie has been written for this response.
    pub fn cookie_scheduled(&self) -> bool {
        self.cookie_scheduled
    }

    /// Return the stored token, issuing and storing a new one if there is
    /// none yet.
    pub fn get_or_create<C>(&mut self, ctx: &mut C) -> Result<Token>
    where
        C: SessionContext + CookieTransport + ?Sized,
    {
        match self.resolve(ctx) {
            Backend::SessionBacked => {
                if let Some(value) = ctx
                    .session_get(&self.settings.field_name)
                    .filter(|v| !v.is_empty())
                {
                    return Ok(Token::from_stored(value));
                }
                let token = self.settings.generator.generate()?;
                ctx.session_set(&self.settings.field_name, token.as_str());
                debug!("CSRF token issued into session");
                Ok(token)
            }
            _ => {
                if let Some(token) = &self.cookie_token {
                    return Ok(token.clone());
                }
                let token = self.settings.generator.generate()?;
                self.schedule_cookie(ctx, &token)?;
                self.cookie_token = Some(token.clone());
                debug!("CSRF token issued into fallback cookie");
                Ok(token)
            }
        }
    }

    /// Make `token` the stored token in whichever backend is now active.
    ///
    /// Used when a token was already handed out this request and the
    /// backend may have changed since, e.g. a session was started.
    pub fn persist<C>(&mut self, ctx: &mut C, token: &Token) -> Result<()>
    where
        C: SessionContext + CookieTransport + ?Sized,
    {
        match self.resolve(ctx) {
            Backend::SessionBacked => {
                let field = &self.settings.field_name;
                let current = ctx.session_get(field).map(Token::from_stored);
                if current.as_ref() != Some(token) {
                    ctx.session_set(field, token.as_str());
                    debug!("CSRF token moved into newly active session");
                }
                Ok(())
            }
            _ => {
                self.cookie_token = Some(token.clone());
                self.schedule_cookie(ctx, token)
            }
        }
    }

    /// Compare a presented token with the stored one.
    ///
    /// Fails closed: a missing, malformed or tampered fallback cookie means
    /// there is no stored token and nothing matches.
    pub fn validate_against<C>(&mut self, ctx: &C, presented: Option<&str>) -> bool
    where
        C: SessionContext + IncomingRequest + ?Sized,
    {
        let stored = match self.resolve(ctx) {
            Backend::SessionBacked => ctx.session_get(&self.settings.field_name),
            _ => match self.read_cookie(ctx) {
                Ok(token) => Some(token),
                Err(CookieError::Missing) => {
                    debug!("No CSRF fallback cookie on request");
                    None
                }
                Err(e) => {
                    warn!(reason = %e, "Rejected CSRF fallback cookie");
                    None
                }
            },
        };

        tokens_match(presented, stored.as_deref())
    }

    fn resolve<C: SessionContext + ?Sized>(&mut self, ctx: &C) -> Backend {
        let backend = if ctx.session_active() {
            Backend::SessionBacked
        } else {
            Backend::CookieBacked
        };

        if backend != self.backend {
            debug!(from = ?self.backend, to = ?backend, "CSRF token backend resolved");
            self.backend = backend;
        }
        backend
    }

    fn schedule_cookie<C: CookieTransport + ?Sized>(
        &mut self,
        ctx: &mut C,
        token: &Token,
    ) -> Result<()> {
        if self.cookie_scheduled {
            debug!("CSRF fallback cookie already scheduled for this response");
            return Ok(());
        }

        let payload = encode_payload(&self.settings.field_name, token)?;

        ctx.write_cookie(SetCookie {
            name: self.settings.cookie_name.clone(),
            value: self.settings.signer.seal(&payload),
            path: self.settings.cookie_path.clone(),
            secure: self.settings.cookie_secure,
            same_site: self.settings.cookie_same_site,
        });
        self.cookie_scheduled = true;
        Ok(())
    }

    fn read_cookie<C: IncomingRequest + ?Sized>(
        &self,
        ctx: &C,
    ) -> std::result::Result<String, CookieError> {
        let cookie = ctx
            .incoming_cookie(&self.settings.cookie_name)
            .filter(|c| !c.is_empty())
            .ok_or(CookieError::Missing)?;

        let payload = self.settings.signer.open(&cookie)?;
        decode_payload(&self.settings.field_name, &payload)
    }
}

/// Serialize the cookie payload: a JSON object holding the token.
fn encode_payload(field: &str, token: &Token) -> Result<Vec<u8>> {
    let mut record = BTreeMap::new();
    record.insert(field, token.as_str());
    Ok(serde_json::to_vec(&record)?)
}

fn decode_payload(field: &str, payload: &[u8]) -> std::result::Result<String, CookieError> {
    let record: BTreeMap<String, serde_json::Value> = serde_json::from_slice(payload)?;
    record
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or(CookieError::MissingToken)
}
