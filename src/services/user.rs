//! User service: registration, login, sessions, and password recovery.

use crate::config::AuthConfig;
use crate::db::repositories::{ResetTokenRepository, SessionRepository, UserRepository};
use crate::models::{NewUser, PasswordResetToken, Session, User};
use crate::services::mailer::Mailer;
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Shortest password the service accepts.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Longest username the service accepts.
const MAX_USERNAME_LENGTH: usize = 150;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Reset token missing, expired, or issued to another user
    #[error("Invalid reset token")]
    InvalidResetToken,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for account management and authentication.
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    reset_repo: Arc<dyn ResetTokenRepository>,
    mailer: Arc<Mailer>,
    session_days: i64,
    reset_token_hours: i64,
    base_url: String,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        reset_repo: Arc<dyn ResetTokenRepository>,
        mailer: Arc<Mailer>,
        auth: &AuthConfig,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            reset_repo,
            mailer,
            session_days: auth.session_days,
            reset_token_hours: auth.reset_token_hours,
            base_url: base_url.into(),
        }
    }

    /// Register a new user.
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        self.validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        let created = self
            .user_repo
            .create(&NewUser {
                username: input.username,
                email: input.email,
                password_hash,
            })
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = created.id, username = %created.username, "Registered new user");

        Ok(created)
    }

    /// Login with a username or email plus password, returning a fresh session.
    pub async fn login(&self, input: LoginInput) -> Result<Session, UserServiceError> {
        let user = self
            .find_user_by_username_or_email(&input.username_or_email)
            .await?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError(
                    "Invalid username or password".to_string(),
                )
            })?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;

        if !password_valid {
            return Err(UserServiceError::AuthenticationError(
                "Invalid username or password".to_string(),
            ));
        }

        self.create_session(user.id).await
    }

    /// Logout (invalidate a session).
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    /// Validate a session token and return the associated user.
    ///
    /// Expired sessions are removed on sight and read as not logged in.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.session_repo.delete(token).await;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;

        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?;

        Ok(user)
    }

    /// Change a logged-in user's password after checking the old one.
    pub async fn change_password(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError("Unknown user".to_string())
            })?;

        let old_valid = verify_password(old_password, &user.password_hash)
            .context("Failed to verify password")?;
        if !old_valid {
            return Err(UserServiceError::AuthenticationError(
                "Current password is incorrect".to_string(),
            ));
        }

        self.validate_password(new_password)?;

        let password_hash = hash_password(new_password).context("Failed to hash password")?;
        self.user_repo
            .update_password(user_id, &password_hash)
            .await
            .context("Failed to update password")?;

        Ok(())
    }

    /// Start a password reset for the account behind `email`.
    ///
    /// Always succeeds from the caller's point of view. Whether the address
    /// belongs to an account is never revealed; a mail only goes out when it
    /// does.
    pub async fn start_password_reset(&self, email: &str) -> Result<(), UserServiceError> {
        let Some(user) = self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to get user by email")?
        else {
            tracing::debug!("Password reset requested for unknown address");
            return Ok(());
        };

        // A new request supersedes any outstanding token.
        self.reset_repo
            .delete_for_user(user.id)
            .await
            .context("Failed to clear old reset tokens")?;

        let now = Utc::now();
        let token = PasswordResetToken {
            token: Uuid::new_v4().to_string(),
            user_id: user.id,
            expires_at: now + Duration::hours(self.reset_token_hours),
            created_at: now,
        };
        self.reset_repo
            .create(&token)
            .await
            .context("Failed to store reset token")?;

        let reset_url = format!(
            "{}/auth/reset/{}/{}/",
            self.base_url.trim_end_matches('/'),
            user.id,
            token.token
        );
        self.mailer
            .send_password_reset(&user.email, &reset_url)
            .await
            .context("Failed to send reset mail")?;

        tracing::info!(user_id = user.id, "Sent password reset mail");

        Ok(())
    }

    /// Check that a reset link is still usable.
    pub async fn verify_reset_token(
        &self,
        user_id: i64,
        token: &str,
    ) -> Result<bool, UserServiceError> {
        let Some(stored) = self
            .reset_repo
            .get(token)
            .await
            .context("Failed to get reset token")?
        else {
            return Ok(false);
        };

        Ok(stored.user_id == user_id && !stored.is_expired())
    }

    /// Complete a password reset, consuming the token.
    ///
    /// Every session the user had is dropped so a leaked cookie dies with
    /// the old password.
    pub async fn confirm_password_reset(
        &self,
        user_id: i64,
        token: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError> {
        let stored = self
            .reset_repo
            .get(token)
            .await
            .context("Failed to get reset token")?
            .ok_or(UserServiceError::InvalidResetToken)?;

        if stored.user_id != user_id || stored.is_expired() {
            return Err(UserServiceError::InvalidResetToken);
        }

        self.validate_password(new_password)?;

        let password_hash = hash_password(new_password).context("Failed to hash password")?;
        self.user_repo
            .update_password(user_id, &password_hash)
            .await
            .context("Failed to update password")?;

        self.reset_repo
            .delete(token)
            .await
            .context("Failed to consume reset token")?;
        self.session_repo
            .delete_by_user(user_id)
            .await
            .context("Failed to clear sessions")?;

        tracing::info!(user_id, "Password reset completed");

        Ok(())
    }

    /// Delete expired sessions and reset tokens.
    ///
    /// Maintenance operation, called periodically from the background sweep.
    pub async fn cleanup_expired(&self) -> Result<u64, UserServiceError> {
        let sessions = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        let tokens = self
            .reset_repo
            .delete_expired()
            .await
            .context("Failed to delete expired reset tokens")?;

        Ok(sessions + tokens)
    }

    fn validate_register_input(&self, input: &RegisterInput) -> Result<(), UserServiceError> {
        let username = input.username.trim();
        if username.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }

        if username.len() > MAX_USERNAME_LENGTH {
            return Err(UserServiceError::ValidationError(
                "Username is too long".to_string(),
            ));
        }

        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_'))
        {
            return Err(UserServiceError::ValidationError(
                "Username may only contain letters, digits and ./@/+/-/_ characters".to_string(),
            ));
        }

        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        self.validate_password(&input.password)
    }

    fn validate_password(&self, password: &str) -> Result<(), UserServiceError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(UserServiceError::ValidationError(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
            )));
        }

        Ok(())
    }

    async fn find_user_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> Result<Option<User>, UserServiceError> {
        if let Some(user) = self
            .user_repo
            .get_by_username(username_or_email)
            .await
            .context("Failed to get user by username")?
        {
            return Ok(Some(user));
        }

        let user = self
            .user_repo
            .get_by_email(username_or_email)
            .await
            .context("Failed to get user by email")?;

        Ok(user)
    }

    async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(self.session_days),
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(created)
    }
}

/// Input for user registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username_or_email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(username_or_email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username_or_email: username_or_email.into(),
            password: password.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailConfig;
    use crate::db::repositories::{
        SqlxResetTokenRepository, SqlxSessionRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};

    struct TestHarness {
        service: UserService,
        reset_repo: Arc<dyn ResetTokenRepository>,
        session_repo: Arc<dyn SessionRepository>,
    }

    async fn setup_test_service() -> TestHarness {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let reset_repo = SqlxResetTokenRepository::boxed(pool.clone());
        let mailer = Arc::new(Mailer::new(MailConfig {
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            from: "byline@example.com".to_string(),
        }));
        let service = UserService::new(
            user_repo,
            session_repo.clone(),
            reset_repo.clone(),
            mailer,
            &AuthConfig::default(),
            "http://localhost:8080",
        );

        TestHarness {
            service,
            reset_repo,
            session_repo,
        }
    }

    async fn register_alice(service: &UserService) -> User {
        service
            .register(RegisterInput::new(
                "alice",
                "alice@example.com",
                "password123",
            ))
            .await
            .expect("Failed to register")
    }

    #[tokio::test]
    async fn test_register_user() {
        let harness = setup_test_service().await;

        let user = register_alice(&harness.service).await;

        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_duplicate_username_fails() {
        let harness = setup_test_service().await;
        register_alice(&harness.service).await;

        let result = harness
            .service
            .register(RegisterInput::new(
                "alice",
                "other@example.com",
                "password456",
            ))
            .await;

        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_fails() {
        let harness = setup_test_service().await;
        register_alice(&harness.service).await;

        let result = harness
            .service
            .register(RegisterInput::new(
                "bob",
                "alice@example.com",
                "password456",
            ))
            .await;

        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let harness = setup_test_service().await;

        let cases = [
            RegisterInput::new("", "a@example.com", "password123"),
            RegisterInput::new("spaces in name", "a@example.com", "password123"),
            RegisterInput::new("alice", "not-an-email", "password123"),
            RegisterInput::new("alice", "a@example.com", "short"),
        ];

        for input in cases {
            let result = harness.service.register(input).await;
            assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
        }
    }

    #[tokio::test]
    async fn test_login_by_username() {
        let harness = setup_test_service().await;
        let user = register_alice(&harness.service).await;

        let session = harness
            .service
            .login(LoginInput::new("alice", "password123"))
            .await
            .expect("Login should succeed");

        assert_eq!(session.user_id, user.id);
        assert!(!session.is_expired());
    }

    #[tokio::test]
    async fn test_login_by_email() {
        let harness = setup_test_service().await;
        let user = register_alice(&harness.service).await;

        let session = harness
            .service
            .login(LoginInput::new("alice@example.com", "password123"))
            .await
            .expect("Login should succeed");

        assert_eq!(session.user_id, user.id);
    }

    #[tokio::test]
    async fn test_login_wrong_password_fails() {
        let harness = setup_test_service().await;
        register_alice(&harness.service).await;

        let result = harness
            .service
            .login(LoginInput::new("alice", "wrong_password"))
            .await;

        assert!(matches!(
            result,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_login_unknown_user_fails() {
        let harness = setup_test_service().await;

        let result = harness
            .service
            .login(LoginInput::new("nobody", "password123"))
            .await;

        assert!(matches!(
            result,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_validate_session_roundtrip() {
        let harness = setup_test_service().await;
        let user = register_alice(&harness.service).await;
        let session = harness
            .service
            .login(LoginInput::new("alice", "password123"))
            .await
            .unwrap();

        let resolved = harness
            .service
            .validate_session(&session.id)
            .await
            .unwrap()
            .expect("Session should resolve to a user");
        assert_eq!(resolved.id, user.id);

        harness.service.logout(&session.id).await.unwrap();
        let after_logout = harness.service.validate_session(&session.id).await.unwrap();
        assert!(after_logout.is_none());
    }

    #[tokio::test]
    async fn test_validate_session_expired_is_removed() {
        let harness = setup_test_service().await;
        let user = register_alice(&harness.service).await;

        let expired = Session {
            id: "expired-token".to_string(),
            user_id: user.id,
            expires_at: Utc::now() - Duration::hours(1),
            created_at: Utc::now() - Duration::days(31),
        };
        harness.session_repo.create(&expired).await.unwrap();

        let resolved = harness
            .service
            .validate_session("expired-token")
            .await
            .unwrap();
        assert!(resolved.is_none());
        assert!(harness
            .session_repo
            .get_by_id("expired-token")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_change_password() {
        let harness = setup_test_service().await;
        let user = register_alice(&harness.service).await;

        harness
            .service
            .change_password(user.id, "password123", "new_password456")
            .await
            .expect("Change should succeed");

        assert!(harness
            .service
            .login(LoginInput::new("alice", "new_password456"))
            .await
            .is_ok());
        assert!(harness
            .service
            .login(LoginInput::new("alice", "password123"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_change_password_wrong_old_fails() {
        let harness = setup_test_service().await;
        let user = register_alice(&harness.service).await;

        let result = harness
            .service
            .change_password(user.id, "wrong_old", "new_password456")
            .await;

        assert!(matches!(
            result,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_start_reset_for_unknown_email_is_silent() {
        let harness = setup_test_service().await;

        let result = harness
            .service
            .start_password_reset("nobody@example.com")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_start_reset_replaces_old_token() {
        let harness = setup_test_service().await;
        let user = register_alice(&harness.service).await;

        let old = PasswordResetToken {
            token: "old-token".to_string(),
            user_id: user.id,
            expires_at: Utc::now() + Duration::hours(24),
            created_at: Utc::now(),
        };
        harness.reset_repo.create(&old).await.unwrap();

        harness
            .service
            .start_password_reset("alice@example.com")
            .await
            .unwrap();

        assert!(harness.reset_repo.get("old-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_confirm_reset_updates_password_and_consumes_token() {
        let harness = setup_test_service().await;
        let user = register_alice(&harness.service).await;
        let session = harness
            .service
            .login(LoginInput::new("alice", "password123"))
            .await
            .unwrap();

        let token = PasswordResetToken {
            token: "reset-token".to_string(),
            user_id: user.id,
            expires_at: Utc::now() + Duration::hours(24),
            created_at: Utc::now(),
        };
        harness.reset_repo.create(&token).await.unwrap();

        assert!(harness
            .service
            .verify_reset_token(user.id, "reset-token")
            .await
            .unwrap());

        harness
            .service
            .confirm_password_reset(user.id, "reset-token", "brand_new_pass1")
            .await
            .expect("Confirm should succeed");

        // Token is single use and old sessions are gone.
        assert!(harness
            .reset_repo
            .get("reset-token")
            .await
            .unwrap()
            .is_none());
        assert!(harness
            .service
            .validate_session(&session.id)
            .await
            .unwrap()
            .is_none());
        assert!(harness
            .service
            .login(LoginInput::new("alice", "brand_new_pass1"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_confirm_reset_rejects_expired_token() {
        let harness = setup_test_service().await;
        let user = register_alice(&harness.service).await;

        let token = PasswordResetToken {
            token: "stale-token".to_string(),
            user_id: user.id,
            expires_at: Utc::now() - Duration::hours(1),
            created_at: Utc::now() - Duration::hours(25),
        };
        harness.reset_repo.create(&token).await.unwrap();

        assert!(!harness
            .service
            .verify_reset_token(user.id, "stale-token")
            .await
            .unwrap());

        let result = harness
            .service
            .confirm_password_reset(user.id, "stale-token", "brand_new_pass1")
            .await;
        assert!(matches!(result, Err(UserServiceError::InvalidResetToken)));
    }

    #[tokio::test]
    async fn test_confirm_reset_rejects_wrong_user() {
        let harness = setup_test_service().await;
        let alice = register_alice(&harness.service).await;

        let token = PasswordResetToken {
            token: "alice-token".to_string(),
            user_id: alice.id,
            expires_at: Utc::now() + Duration::hours(24),
            created_at: Utc::now(),
        };
        harness.reset_repo.create(&token).await.unwrap();

        let result = harness
            .service
            .confirm_password_reset(alice.id + 1, "alice-token", "brand_new_pass1")
            .await;
        assert!(matches!(result, Err(UserServiceError::InvalidResetToken)));
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let harness = setup_test_service().await;
        let user = register_alice(&harness.service).await;

        harness
            .session_repo
            .create(&Session {
                id: "dead-session".to_string(),
                user_id: user.id,
                expires_at: Utc::now() - Duration::hours(1),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        harness
            .reset_repo
            .create(&PasswordResetToken {
                token: "dead-token".to_string(),
                user_id: user.id,
                expires_at: Utc::now() - Duration::hours(1),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let removed = harness.service.cleanup_expired().await.unwrap();
        assert_eq!(removed, 2);
    }
}
