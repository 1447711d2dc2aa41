//! Authentication module for the lingua server
//!
//! Password credentials (scrypt + constant-time comparison), stateless
//! HS256 bearer tokens, and the request extractor that resolves a token
//! back to the live user record.

pub mod credential;
pub mod extractor;
pub mod handlers;
mod service;
mod store;
pub mod token;

pub use credential::{derive_credential, verify_credential, Credential};
pub use extractor::AuthenticatedUser;
pub use service::{AuthResponse, AuthService};
pub use store::UserStore;
pub use token::{Claims, TokenAuthenticator};

#[cfg(test)]
pub(crate) use store::MockUserStore;
