//! Models stored in the admin session.

pub mod session;

pub use session::{AuthSession, keys as session_keys};
