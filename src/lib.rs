// formguard - CSRF protection for form-based web applications
//
// Tokens live in the server-side session when the request has one, and in an
// HMAC-signed, session-scoped cookie when it does not.

// Re-export the CSRF core
pub use formguard_csrf::*;

// Re-export session storage
pub use formguard_session;

pub mod prelude {
    pub use formguard_csrf::{
        CsrfConfig, CsrfContext, CsrfError, CsrfGuard, CsrfSettings, Exchange, Form, Token,
    };
    pub use formguard_session::{MemorySessionStore, Session, SessionConfig, SessionStore};
}
