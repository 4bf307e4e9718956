//! Session storage for formguard.
//!
//! A [`Session`] is the server-side key/value slot a request framework
//! loads before handling a request and persists afterwards. When a
//! session is present, the CSRF guard keeps its token in it; otherwise the
//! guard falls back to a signed cookie.
//!
//! # Examples
//!
//! ```
//! use formguard_session::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SessionError> {
//!     let store = MemorySessionStore::new(SessionConfig::default());
//!
//!     let mut session = store.create(None).await?;
//!     session.set("username", "alice")?;
//!     store.save(&session).await?;
//!
//!     if let Some(session) = store.get(&session.id).await? {
//!         let username: Option<String> = session.get("username");
//!         assert_eq!(username.as_deref(), Some("alice"));
//!     }
//!
//!     // Logout
//!     store.delete(&session.id).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod traits;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use memory::MemorySessionStore;
pub use traits::{Session, SessionStore, generate_session_id};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::SessionConfig;
    pub use crate::error::{SessionError, SessionResult};
    pub use crate::memory::MemorySessionStore;
    pub use crate::traits::{Session, SessionStore, generate_session_id};
}
