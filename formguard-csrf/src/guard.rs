use crate::config::CsrfSettings;
use crate::context::{CookieTransport, CsrfContext, SessionContext};
use crate::error::{CsrfError, Result};
use crate::form::{Form, hidden_input_html};
use crate::store::TokenStore;
use crate::token::Token;
use http::Method;
use std::sync::Arc;
use tracing::debug;

/// Per-request CSRF protection.
///
/// Create one guard per inbound request. The first token handed out is
/// fixed for the guard's lifetime, so every form in a response carries the
/// same value.
#[derive(Debug)]
pub struct CsrfGuard {
    store: TokenStore,
    issued: Option<Token>,
}

impl CsrfGuard {
    pub fn new(settings: Arc<CsrfSettings>) -> Self {
        Self {
            store: TokenStore::new(settings),
            issued: None,
        }
    }

    /// Name of the POST field that carries the token.
    pub fn field_name(&self) -> &str {
        self.store.settings().field_name()
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Text to show the user after `check` fails with `err`.
    pub fn user_message<'a>(&'a self, err: &CsrfError) -> &'a str {
        self.store.settings().user_message(err)
    }

    /// The token to embed in outgoing forms.
    pub fn embed_value<C>(&mut self, ctx: &mut C) -> Result<Token>
    where
        C: SessionContext + CookieTransport + ?Sized,
    {
        if let Some(token) = &self.issued {
            self.store.persist(ctx, token)?;
            return Ok(token.clone());
        }

        let token = self.store.get_or_create(ctx)?;
        self.issued = Some(token.clone());
        Ok(token)
    }

    /// A new POST form with the token already embedded.
    pub fn form<C>(&mut self, ctx: &mut C) -> Result<Form>
    where
        C: SessionContext + CookieTransport + ?Sized,
    {
        let token = self.embed_value(ctx)?;
        Ok(Form::with_token(self.field_name(), token.as_str()))
    }

    /// A hidden input carrying the token, for hand-written forms.
    pub fn token_html<C>(&mut self, ctx: &mut C) -> Result<String>
    where
        C: SessionContext + CookieTransport + ?Sized,
    {
        let token = self.embed_value(ctx)?;
        Ok(hidden_input_html(self.field_name(), token.as_str()))
    }

    /// Verify that the request carries the stored token in its POST body.
    ///
    /// With `post_only`, non-POST requests pass without inspection. On a
    /// mismatch a security warning naming the remote address is raised, the
    /// session is terminated and [`CsrfError::TokenMismatch`] is returned;
    /// the caller must stop handling the request and show
    /// [`CsrfGuard::user_message`].
    pub fn check<C>(&mut self, ctx: &mut C, post_only: bool) -> Result<()>
    where
        C: CsrfContext + ?Sized,
    {
        if post_only && *ctx.method() != Method::POST {
            return Ok(());
        }

        let presented = ctx.post_field(self.field_name());

        if self.store.validate_against(ctx, presented.as_deref()) {
            debug!("CSRF token accepted");
            return Ok(());
        }

        let remote_addr = ctx.remote_addr().unwrap_or("unknown").to_string();
        ctx.security_warning(&format!(
            "Possible CSRF attack from IP address {}",
            remote_addr
        ));
        ctx.terminate_session();

        Err(CsrfError::TokenMismatch)
    }
}
