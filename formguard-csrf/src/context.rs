//! What the guard needs from the surrounding request framework.
//!
//! A framework adapter implements the four traits below for its
//! request-scoped context; [`CsrfContext`] is implemented automatically for
//! anything that provides all four.

use crate::config::SameSite;
use http::Method;
use tracing::warn;

/// Read access to the inbound request.
pub trait IncomingRequest {
    fn method(&self) -> &Method;

    fn remote_addr(&self) -> Option<&str>;

    /// Value of a field in the POST body. Query string and headers must not
    /// be consulted.
    fn post_field(&self, name: &str) -> Option<String>;

    fn incoming_cookie(&self, name: &str) -> Option<String>;
}

/// The server-side session, if one exists for this request.
pub trait SessionContext {
    fn session_active(&self) -> bool;

    fn session_get(&self, key: &str) -> Option<String>;

    fn session_set(&mut self, key: &str, value: &str);
}

/// Outgoing `Set-Cookie` headers.
pub trait CookieTransport {
    fn write_cookie(&mut self, cookie: SetCookie);
}

/// Reactions to a suspected forgery.
pub trait SecuritySink {
    fn security_warning(&mut self, message: &str) {
        warn!(target: "formguard::security", "{}", message);
    }

    /// Log the user out.
    fn terminate_session(&mut self);
}

/// Everything the guard touches during one request.
pub trait CsrfContext: IncomingRequest + SessionContext + CookieTransport + SecuritySink {}

impl<T> CsrfContext for T where T: IncomingRequest + SessionContext + CookieTransport + SecuritySink {}

/// A session-scoped cookie to send with the response.
///
/// No `Expires`/`Max-Age` is ever set: the cookie ends with the browser
/// session.
#[derive(Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub secure: bool,
    pub same_site: SameSite,
}

impl SetCookie {
    /// Render as a `Set-Cookie` header value.
    pub fn header_value(&self) -> String {
        let mut cookie = format!("{}={}; Path={}", self.name, self.value, self.path);

        if self.secure {
            cookie.push_str("; Secure");
        }

        cookie.push_str("; HttpOnly");
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        cookie
    }
}

impl std::fmt::Debug for SetCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetCookie")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value() {
        let cookie = SetCookie {
            name: "FORMGUARD_CSRF".to_string(),
            value: "ab_cd".to_string(),
            path: "/app/".to_string(),
            secure: true,
            same_site: SameSite::Strict,
        };

        assert_eq!(
            cookie.header_value(),
            "FORMGUARD_CSRF=ab_cd; Path=/app/; Secure; HttpOnly; SameSite=Strict"
        );
    }

    #[test]
    fn test_session_scoped() {
        let cookie = SetCookie {
            name: "c".to_string(),
            value: "v".to_string(),
            path: "/".to_string(),
            secure: false,
            same_site: SameSite::Lax,
        };
        let header = cookie.header_value();
        assert!(!header.contains("Expires"));
        assert!(!header.contains("Max-Age"));
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn test_debug_hides_value() {
        let cookie = SetCookie {
            name: "c".to_string(),
            value: "secret-value".to_string(),
            path: "/".to_string(),
            secure: false,
            same_site: SameSite::Lax,
        };
        assert!(!format!("{:?}", cookie).contains("secret-value"));
    }
}
