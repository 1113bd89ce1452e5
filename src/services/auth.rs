//! Authentication service: login, logout and token validation

use std::sync::{Arc, OnceLock};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::{AuthConfig, BootstrapConfig},
    error::{AppError, AppResult},
    models::user::{Identity, Role, User, UserClaims},
    repository::users::UsersRepository,
    services::redis::TokenStore,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials.";
const UNAUTHENTICATED: &str = "Unauthenticated.";

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Stand-in hash verified when the email is unknown; a miss does the same
/// argon2 work as a wrong password
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("visitdesk-dummy-password").ok())
        .as_deref()
}

#[derive(Clone)]
pub struct AuthService {
    users: UsersRepository,
    config: AuthConfig,
    tokens: Arc<dyn TokenStore>,
}

impl AuthService {
    pub fn new(users: UsersRepository, config: AuthConfig, tokens: Arc<dyn TokenStore>) -> Self {
        Self { users, config, tokens }
    }

    /// Authenticate by email and password, returning a bearer token
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let Some(user) = self.users.get_by_email(email).await? else {
            if let Some(hash) = dummy_hash() {
                verify_password(hash, password)?;
            }
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(&user.password, password)? {
            tracing::info!("Failed login for {}", user.id);
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.issue_token(user.id, user.role).await?;
        tracing::info!("User {} logged in", user.id);
        Ok((token, user))
    }

    /// Revoke every token issued to this user so far
    pub async fn logout(&self, identity: &Identity) -> AppResult<()> {
        let gen = self.tokens.revoke(identity.id).await?;
        tracing::info!("User {} logged out (token generation {})", identity.id, gen);
        Ok(())
    }

    /// Account of the authenticated caller
    pub async fn me(&self, identity: &Identity) -> AppResult<User> {
        self.users
            .get_by_id(identity.id)
            .await?
            .ok_or_else(|| AppError::Authentication(UNAUTHENTICATED.to_string()))
    }

    /// Sign a token carrying the user's current generation
    pub async fn issue_token(&self, user_id: uuid::Uuid, role: Role) -> AppResult<String> {
        let gen = self.tokens.generation(user_id).await?;
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user_id,
            role,
            gen,
            exp: now + (self.config.jwt_expiration_hours as i64 * 3600),
            iat: now,
        };
        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Decode a bearer token and reject it if revoked
    pub async fn validate_token(&self, token: &str) -> AppResult<Identity> {
        let claims = UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|_| AppError::Authentication(UNAUTHENTICATED.to_string()))?;

        let current = self.tokens.generation(claims.sub).await?;
        if claims.gen != current {
            tracing::debug!("Rejected revoked token for {}", claims.sub);
            return Err(AppError::Authentication(UNAUTHENTICATED.to_string()));
        }

        Ok(claims.identity())
    }

    /// Create the configured admin account if no user has that email yet
    pub async fn ensure_bootstrap_admin(&self, bootstrap: &BootstrapConfig) -> AppResult<()> {
        let (Some(email), Some(password)) = (&bootstrap.admin_email, &bootstrap.admin_password) else {
            return Ok(());
        };

        if self.users.get_by_email(email).await?.is_some() {
            tracing::debug!("Bootstrap admin {} already exists", email);
            return Ok(());
        }

        let hash = hash_password(password)?;
        let user = self
            .users
            .create(&bootstrap.admin_name, email, &hash, Role::Admin)
            .await?;
        tracing::info!("Created bootstrap admin {} ({})", user.email, user.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    use super::*;
    use crate::services::redis::memory::MemoryTokenStore;

    fn service() -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        AuthService::new(
            UsersRepository::new(pool),
            AuthConfig::default(),
            Arc::new(MemoryTokenStore::default()),
        )
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("password").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "password").unwrap());
        assert!(!verify_password(&hash, "wrong").unwrap());
        assert!(verify_password("not-a-hash", "password").is_err());
    }

    #[test]
    fn test_dummy_hash_is_stable_and_rejects_input() {
        let hash = dummy_hash().unwrap();
        assert!(hash.starts_with("$argon2"));
        assert_eq!(dummy_hash(), Some(hash));
        assert!(!verify_password(hash, "password123").unwrap());
        assert!(!verify_password(hash, "").unwrap());
    }

    #[tokio::test]
    async fn test_issued_token_validates() {
        let auth = service();
        let id = Uuid::now_v7();
        let token = auth.issue_token(id, Role::Staff).await.unwrap();
        let identity = auth.validate_token(&token).await.unwrap();
        assert_eq!(identity, Identity { id, role: Role::Staff });
    }

    #[tokio::test]
    async fn test_logout_revokes_earlier_tokens() {
        let auth = service();
        let id = Uuid::now_v7();
        let first = auth.issue_token(id, Role::Admin).await.unwrap();
        let second = auth.issue_token(id, Role::Admin).await.unwrap();

        auth.logout(&Identity { id, role: Role::Admin }).await.unwrap();

        for token in [first, second] {
            assert!(matches!(
                auth.validate_token(&token).await,
                Err(AppError::Authentication(_))
            ));
        }

        // New login after logout works again
        let fresh = auth.issue_token(id, Role::Admin).await.unwrap();
        assert!(auth.validate_token(&fresh).await.is_ok());
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let auth = service();
        assert!(matches!(
            auth.validate_token("not.a.token").await,
            Err(AppError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_bootstrap_without_credentials_is_noop() {
        // No email/password configured: never touches the database
        service()
            .ensure_bootstrap_admin(&BootstrapConfig::default())
            .await
            .unwrap();
    }
}
