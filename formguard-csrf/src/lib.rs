//! # formguard CSRF protection
//!
//! Synchronizer-token CSRF protection for form-based applications.
//!
//! ## Features
//!
//! - ✅ **Session-backed tokens** - Stored in the server-side session when one exists
//! - ✅ **Signed cookie fallback** - HMAC-signed, session-scoped cookie otherwise
//! - ✅ **Timing-safe comparison** - No early exit on mismatch
//! - ✅ **One token per response** - Memoized for every form in a request
//! - ✅ **Fail closed** - Malformed or tampered cookies never validate
//!
//! ## Quick Start
//!
//! ```rust
//! use formguard_csrf::{CsrfConfig, CsrfGuard, CsrfSettings, Exchange};
//! use std::sync::Arc;
//!
//! // Once, at startup
//! let settings = Arc::new(CsrfSettings::new(CsrfConfig::new("change-me")).unwrap());
//!
//! // Rendering a page: no session, so the token goes into a signed cookie
//! let mut page = Exchange::get();
//! let mut guard = CsrfGuard::new(settings.clone());
//! let form = guard.form(&mut page).unwrap();
//! let token = form.hidden_value("csrf_token").unwrap().to_string();
//! let cookie = page.outgoing_cookies()[0].clone();
//!
//! // Handling the submission
//! let mut submit = Exchange::post()
//!     .with_cookie(cookie.name, cookie.value)
//!     .with_form_field("csrf_token", token);
//! let mut guard = CsrfGuard::new(settings);
//! assert!(guard.check(&mut submit, false).is_ok());
//! ```
//!
//! ## Rejections
//!
//! ```rust
//! use formguard_csrf::{CsrfConfig, CsrfError, CsrfGuard, CsrfSettings, Exchange};
//! use std::sync::Arc;
//!
//! let settings = Arc::new(CsrfSettings::new(CsrfConfig::new("change-me")).unwrap());
//! let mut request = Exchange::post()
//!     .with_remote_addr("198.51.100.4")
//!     .with_form_field("csrf_token", "forged");
//!
//! let err = CsrfGuard::new(settings).check(&mut request, false).unwrap_err();
//! assert!(matches!(err, CsrfError::TokenMismatch));
//! assert_eq!(err.status_code(), http::StatusCode::FORBIDDEN);
//! ```

pub mod compare;
pub mod config;
pub mod context;
pub mod error;
pub mod exchange;
pub mod form;
pub mod guard;
pub mod signer;
pub mod store;
pub mod token;

pub use compare::{constant_time_eq, tokens_match};
pub use config::{CsrfConfig, CsrfSettings, SameSite};
pub use context::{
    CookieTransport, CsrfContext, IncomingRequest, SecuritySink, SessionContext, SetCookie,
};
pub use error::{CookieError, CsrfError, Result, SESSION_EXPIRED_MESSAGE};
pub use exchange::Exchange;
pub use form::{Form, hidden_input_html};
pub use guard::CsrfGuard;
pub use signer::{CookieSigner, HashAlgorithm};
pub use store::{Backend, TokenStore};
pub use token::{Token, TokenGenerator};
