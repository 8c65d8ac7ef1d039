//! Business logic services for admin.
//!
//! # Services
//!
//! - `catalog` - Cached product and category queries and mutations
//! - `session_gate` - Authentication state machine over the cookie session

pub mod catalog;
pub mod session_gate;

pub use catalog::{CatalogCounts, CatalogError, CatalogService, QueryKey};
pub use session_gate::{AuthEvent, AuthState, SessionGate, Transition};
