use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::credential::{derive_credential, verify_credential};
use crate::auth::store::UserStore;
use crate::auth::token::{bearer_token, TokenAuthenticator};
use crate::db::models::{Role, User, UserProfile};
use crate::error::AuthError;
use crate::Result;

// Verified against when the email is unknown, so both failure paths pay for one derivation.
const DECOY_SALT: &str = "00000000000000000000000000000000";

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenAuthenticator,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt_secret: &str, token_ttl: Duration) -> Self {
        Self {
            users,
            tokens: TokenAuthenticator::new(jwt_secret, token_ttl),
        }
    }

    pub fn tokens(&self) -> &TokenAuthenticator {
        &self.tokens
    }

    fn respond(&self, user: &User) -> Result<AuthResponse> {
        Ok(AuthResponse {
            token: self.tokens.issue(user.id, user.role)?,
            user: user.profile(),
        })
    }

    /// Exchanges email and password for a token. Unknown email and wrong password look the same.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let user = self.users.find_by_email(email).await?;

        let (hash, salt) = match &user {
            Some(user) => (user.password_hash.clone(), user.salt.clone()),
            None => (String::new(), DECOY_SALT.to_string()),
        };
        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || {
            if hash.is_empty() {
                let _ = derive_credential(&password, Some(salt.as_str()));
                return false;
            }
            verify_credential(&password, &hash, &salt)
        })
        .await?;

        match user {
            Some(user) if verified => {
                info!("Login succeeded for user {}", user.id);
                self.respond(&user)
            }
            _ => {
                warn!("Login rejected for email: {}", email);
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    /// Creates a learner account and signs it in.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthResponse> {
        let plaintext = password.to_string();
        let credential = tokio::task::spawn_blocking(move || derive_credential(&plaintext, None)).await??;

        let user = User::new(
            email.to_string(),
            name.to_string(),
            Role::Learner,
            credential.hash,
            credential.salt,
        );
        let created = self.users.create_user(&user).await?;
        info!("Registered user {}", created.id);

        self.respond(&created)
    }

    /// Resolves an `Authorization` header value to the live user record.
    pub async fn authenticate_request(&self, header: Option<&str>) -> Result<User> {
        let token = bearer_token(header)?;
        let claims = self.tokens.verify(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::UserNotFound)?;

        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::UserNotFound.into())
    }
}
