//! Storefront Admin library.
//!
//! This crate provides the admin dashboard as a library,
//! allowing it to be tested and reused.
//!
//! # Layers
//!
//! - [`backend`] - hosted database and auth service clients
//! - [`services`] - cached catalog queries and mutations, session gate
//! - [`components`] - list view-state, forms, notices, page chrome
//! - [`routes`] - axum handlers and askama templates
//!
//! # Security
//!
//! The browser only holds a session cookie. Access and refresh tokens for
//! the hosted service stay in the server-side session store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod components;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
