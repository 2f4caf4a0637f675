//! Auth module: domain types, token bookkeeping and the register/login flows.
//!
//! Passwords are argon2 hashes; sessions are HS256 JWTs whose `jti` is a
//! persisted token row, so revocation survives restarts.

pub mod domain;
pub mod errors;
pub mod service;
pub mod token;

pub use domain::{AuthSession, AuthUser, LoginInput, RegisterInput};
pub use errors::AuthError;
pub use service::AuthService;
pub use token::{Claims, TokenService};
