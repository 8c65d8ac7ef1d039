//! Storefront Admin Core - Shared types library.
//!
//! This crate provides the catalog types used by the admin dashboard:
//! - typed identifiers for products and categories
//! - the `Category` and `Product` view models
//! - validated inputs for create/update mutations
//! - the `Email` type used for sign-in
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Mapping
//! from the backend's row shape lives in the admin crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
