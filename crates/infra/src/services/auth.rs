use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use eventdesk_auth::{JwtIssuer, NewUser, Role, User, hash_password, normalize_email, verify_password};
use eventdesk_core::{DomainError, UserId};

use super::{ServiceError, ServiceResult};
use crate::store::{StoreError, UserStore};

/// Same message for unknown email and wrong password.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// What registration hands back: never the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredUser {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginToken {
    pub token: String,
}

/// Registration and login.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn JwtIssuer>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<dyn JwtIssuer>, bcrypt_cost: u32) -> Self {
        Self {
            users,
            tokens,
            bcrypt_cost,
        }
    }

    pub async fn register(&self, new: NewUser) -> ServiceResult<RegisteredUser> {
        if self.users.find_user_by_email(&new.email).await?.is_some() {
            return Err(user_exists());
        }

        let cost = self.bcrypt_cost;
        let plain = new.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&plain, cost))
            .await
            .map_err(|e| ServiceError::internal(format!("hashing task failed: {e}")))?
            .map_err(|e| ServiceError::internal(e.to_string()))?;

        let user = User::register(new, password_hash, Utc::now());
        let user = match self.users.insert_user(user).await {
            Ok(user) => user,
            // Lost a race with a concurrent registration for the same email.
            Err(StoreError::Duplicate(_)) => return Err(user_exists()),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(RegisteredUser {
            id: user.id,
            email: user.email,
            role: user.role,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<LoginToken> {
        let Some(user) = self.users.find_user_by_email(&normalize_email(email)).await? else {
            return Err(invalid_credentials());
        };

        let plain = password.to_string();
        let hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
            .await
            .map_err(|e| ServiceError::internal(format!("verification task failed: {e}")))?;
        if !verified {
            return Err(invalid_credentials());
        }

        let token = self
            .tokens
            .issue(user.id, user.role, Utc::now())
            .map_err(|e| ServiceError::internal(e.to_string()))?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(LoginToken { token })
    }
}

fn user_exists() -> ServiceError {
    DomainError::conflict("User already exists").into()
}

fn invalid_credentials() -> ServiceError {
    DomainError::unauthorized(INVALID_CREDENTIALS).into()
}
