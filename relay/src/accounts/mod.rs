//! Accounts
//!
//! Registration, lookup and field validation. [`AccountDirectory`] is also
//! the identity provider the relationship engine resolves handles through.

pub mod directory;
pub mod validation;

pub use directory::{AccountDirectory, NewAccount};
pub use validation::{validate_email, validate_password, validate_username};
