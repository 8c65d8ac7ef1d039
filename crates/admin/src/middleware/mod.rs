//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with in-memory store)
//! 4. Rejected-session cleanup (signs out when the backend refuses a token)
//!
//! Route guarding happens per handler through the [`auth::RequireSession`]
//! extractor.

pub mod auth;
pub mod session;

pub use auth::{OptionalSession, RequireSession, clear_rejected_session};
pub use session::create_session_layer;
