//! `eventdesk-auth`: authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how to
//! hash passwords, mint and verify tokens, and check roles, nothing more.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{AuthzError, authorize_role};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use password::{PasswordError, hash_password, verify_password};
pub use roles::Role;
pub use token::{Hs256Jwt, JwtIssuer, JwtValidator, TokenError};
pub use user::{NewUser, User, UserSummary, normalize_email};
