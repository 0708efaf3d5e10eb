//! Sign-in state
//!
//! The backend issues a JWT on login. [`SessionStore`] persists it together
//! with the decoded user profile; [`tokens`] handles claim decoding.

pub mod session;
pub mod tokens;

pub use session::SessionStore;
