//! In-memory request/response pair implementing [`CsrfContext`].
//!
//! [`CsrfContext`]: crate::CsrfContext

use crate::context::{CookieTransport, IncomingRequest, SecuritySink, SessionContext, SetCookie};
use formguard_session::Session;
use http::header::COOKIE;
use http::{Method, Request};
use std::collections::HashMap;
use tracing::warn;

/// One request's worth of state owned by the framework.
pub struct Exchange {
    method: Method,
    remote_addr: Option<String>,
    post_fields: Vec<(String, String)>,
    cookies: HashMap<String, String>,
    session: Option<Session>,
    outgoing: Vec<SetCookie>,
    warnings: Vec<String>,
    terminated_session: Option<String>,
}

impl Exchange {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            remote_addr: None,
            post_fields: Vec::new(),
            cookies: HashMap::new(),
            session: None,
            outgoing: Vec::new(),
            warnings: Vec::new(),
            terminated_session: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    /// Build from an `http::Request` whose body is
    /// `application/x-www-form-urlencoded`.
    pub fn from_request<B: AsRef<[u8]>>(request: &Request<B>) -> Self {
        let mut exchange = Self::new(request.method().clone())
            .with_form_body(request.body().as_ref());

        for header in request.headers().get_all(COOKIE) {
            match header.to_str() {
                Ok(value) => exchange = exchange.with_cookie_header(value),
                Err(_) => warn!("Ignoring non-ASCII Cookie header"),
            }
        }

        exchange
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Parse a urlencoded body. Only POST bodies populate form fields.
    pub fn with_form_body(mut self, body: &[u8]) -> Self {
        if self.method != Method::POST || body.is_empty() {
            return self;
        }

        match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
            Ok(fields) => self.post_fields.extend(fields),
            Err(e) => warn!(error = %e, "Ignoring malformed form body"),
        }
        self
    }

    pub fn with_form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if self.method == Method::POST {
            self.post_fields.push((name.into(), value.into()));
        }
        self
    }

    /// Parse a `Cookie` request header (`a=1; b="2"`).
    pub fn with_cookie_header(mut self, header: &str) -> Self {
        for pair in header.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                self.cookies
                    .insert(name.trim().to_string(), unquote(value.trim()).to_string());
            }
        }
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Start a session mid-request (e.g. after login).
    pub fn start_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Hand the session back to the framework for persisting.
    pub fn take_session(&mut self) -> Option<Session> {
        self.session.take()
    }

    /// Cookies scheduled for the response.
    pub fn outgoing_cookies(&self) -> &[SetCookie] {
        &self.outgoing
    }

    /// `Set-Cookie` header values for the response.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.outgoing.iter().map(SetCookie::header_value).collect()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// ID of the session that was terminated, so the framework can delete
    /// it from its store.
    pub fn terminated_session(&self) -> Option<&str> {
        self.terminated_session.as_deref()
    }
}

impl IncomingRequest for Exchange {
    fn method(&self) -> &Method {
        &self.method
    }

    fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    fn post_field(&self, name: &str) -> Option<String> {
        self.post_fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    fn incoming_cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }
}

impl SessionContext for Exchange {
    fn session_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_expired())
    }

    fn session_get(&self, key: &str) -> Option<String> {
        self.session.as_ref().and_then(|s| s.get::<String>(key))
    }

    fn session_set(&mut self, key: &str, value: &str) {
        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.set(key, value) {
                warn!(error = %e, "Failed to write session value");
            }
        }
    }
}

impl CookieTransport for Exchange {
    fn write_cookie(&mut self, cookie: SetCookie) {
        self.outgoing.push(cookie);
    }
}

impl SecuritySink for Exchange {
    fn security_warning(&mut self, message: &str) {
        warn!(target: "formguard::security", "{}", message);
        self.warnings.push(message.to_string());
    }

    fn terminate_session(&mut self) {
        if let Some(session) = self.session.take() {
            self.terminated_session = Some(session.id);
        }
    }
}

/// Strip one pair of surrounding DQUOTEs from a cookie value.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_post_fields_from_body() {
        let exchange = Exchange::post().with_form_body(b"name=alice&csrf_token=abc%20123");
        assert_eq!(exchange.post_field("csrf_token").as_deref(), Some("abc 123"));
        assert_eq!(exchange.post_field("name").as_deref(), Some("alice"));
        assert_eq!(exchange.post_field("missing"), None);
    }

    #[test]
    fn test_get_has_no_post_fields() {
        let exchange = Exchange::get()
            .with_form_body(b"csrf_token=abc")
            .with_form_field("csrf_token", "abc");
        assert_eq!(exchange.post_field("csrf_token"), None);
    }

    #[test]
    fn test_cookie_header_parsing() {
        let exchange = Exchange::get().with_cookie_header("a=1; FORMGUARD_CSRF=ab_cd==; b=2");
        assert_eq!(exchange.incoming_cookie("FORMGUARD_CSRF").as_deref(), Some("ab_cd=="));
        assert_eq!(exchange.incoming_cookie("b").as_deref(), Some("2"));
    }

    #[test]
    fn test_quoted_cookie_value() {
        let exchange =
            Exchange::get().with_cookie_header(r#"FORMGUARD_CSRF="ab_cd=="; a=""; b="x"#);
        assert_eq!(exchange.incoming_cookie("FORMGUARD_CSRF").as_deref(), Some("ab_cd=="));
        assert_eq!(exchange.incoming_cookie("a").as_deref(), Some(""));
        assert_eq!(exchange.incoming_cookie("b").as_deref(), Some("\"x"));
    }

    #[test]
    fn test_from_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/edit_entry_handler.php?csrf_token=fromquery")
            .header(COOKIE, "FORMGUARD_CSRF=x_y")
            .body(b"csrf_token=frombody".to_vec())
            .unwrap();

        let exchange = Exchange::from_request(&request);
        assert_eq!(*exchange.method(), Method::POST);
        assert_eq!(exchange.post_field("csrf_token").as_deref(), Some("frombody"));
        assert_eq!(exchange.incoming_cookie("FORMGUARD_CSRF").as_deref(), Some("x_y"));
    }

    #[test]
    fn test_session_slot() {
        let mut exchange = Exchange::get();
        assert!(!exchange.session_active());
        exchange.session_set("k", "ignored");

        exchange.start_session(Session::new("s1", Duration::from_secs(60)));
        assert!(exchange.session_active());
        exchange.session_set("k", "v");
        assert_eq!(exchange.session_get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_terminate_session() {
        let mut exchange = Exchange::post().with_session(Session::new("s1", Duration::from_secs(60)));
        exchange.terminate_session();

        assert!(!exchange.session_active());
        assert_eq!(exchange.terminated_session(), Some("s1"));
    }
}
