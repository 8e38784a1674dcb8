//! Password hashing (bcrypt).
//!
//! Both functions are CPU-bound by design of the algorithm; async callers should
//! run them on a blocking thread.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt cost {0} is out of range (4..=31)")]
    InvalidCost(u32),

    #[error("failed to hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(plain: &str, cost: u32) -> Result<String, PasswordError> {
    if !(4..=31).contains(&cost) {
        return Err(PasswordError::InvalidCost(cost));
    }
    Ok(bcrypt::hash(plain, cost)?)
}

/// Check a plaintext password against a stored hash.
///
/// A corrupt stored hash is treated as a mismatch.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    match bcrypt::verify(plain, hash) {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash could not be parsed");
            false
        }
    }
}
