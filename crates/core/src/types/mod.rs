//! Core types for the storefront admin.

pub mod catalog;
pub mod email;
pub mod id;

pub use catalog::{Category, CategoryInput, Product, ProductInput};
pub use email::{Email, EmailError};
pub use id::*;
