//! Registration, authentication and account service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    config::{AuthConfig, BootstrapConfig},
    error::{AppError, AppResult},
    models::user::{RegistrationForm, User, UserClaims, UserRow},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by username and password and return a JWT token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let row = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !Self::verify_password(&row, password)? {
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        self.repository.users.touch_last_login(row.id).await?;
        let token = self.create_token_for_user(&row)?;
        tracing::info!("User '{}' logged in", row.username);

        Ok((token, row.into()))
    }

    /// Token lifetime in seconds
    pub fn token_lifetime(&self) -> u64 {
        self.config.session_ttl_seconds()
    }

    fn create_token_for_user(&self, user: &UserRow) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            is_superuser: user.is_superuser,
            sid: Uuid::new_v4().to_string(),
            exp: now + self.config.session_ttl_seconds() as i64,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Self-service registration; never creates a superuser
    pub async fn register(&self, form: RegistrationForm) -> AppResult<User> {
        form.validate()?;

        let hash = Self::hash_password(&form.password1)?;
        match self.repository.users.create(&form.username, &hash, false).await {
            Ok(user) => {
                tracing::info!("Registered user '{}' (id={})", user.username, user.id);
                Ok(user)
            }
            Err(AppError::Conflict(_)) => {
                let mut error = ValidationError::new("unique");
                error.message = Some("A user with that username already exists.".into());
                let mut errors = ValidationErrors::new();
                errors.add("username", error);
                Err(AppError::InvalidForm(errors))
            }
            Err(e) => Err(e),
        }
    }

    /// Create the configured superuser when no account has that username yet
    pub async fn ensure_superuser(&self, bootstrap: &BootstrapConfig) -> AppResult<()> {
        if self
            .repository
            .users
            .get_by_username(&bootstrap.superuser_username)
            .await?
            .is_some()
        {
            return Ok(());
        }

        let hash = Self::hash_password(&bootstrap.superuser_password)?;
        let user = self
            .repository
            .users
            .create(&bootstrap.superuser_username, &hash, true)
            .await?;
        tracing::info!("Created superuser '{}'", user.username);
        Ok(())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Verify user password
    fn verify_password(user: &UserRow, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::MockRepository;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".into(),
            jwt_expiration_hours: 2,
        }
    }

    fn row(password: &str, is_superuser: bool) -> UserRow {
        UserRow {
            id: 11,
            username: "ada".into(),
            password_hash: UsersService::hash_password(password).unwrap(),
            is_superuser,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    fn user(username: &str, is_superuser: bool) -> User {
        User {
            id: 12,
            username: username.into(),
            is_superuser,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    #[tokio::test]
    async fn login_issues_token_with_fresh_session() {
        let stored = row("analytical", true);
        let mut repo = MockRepository::new();
        repo.users
            .expect_get_by_username()
            .withf(|name: &str| name == "ada")
            .returning(move |_| Ok(Some(stored.clone())));
        repo.users.expect_touch_last_login().times(2).returning(|_| Ok(()));

        let service = UsersService::new(repo.build(), config());
        let (token, user) = service.authenticate("ada", "analytical").await.unwrap();
        let (second, _) = service.authenticate("ada", "analytical").await.unwrap();

        let claims = UserClaims::from_token(&token, "test-secret").unwrap();
        let second = UserClaims::from_token(&second, "test-secret").unwrap();
        assert_eq!(claims.user_id, user.id);
        assert!(claims.is_superuser);
        assert_eq!(claims.exp - claims.iat, 7200);
        assert_ne!(claims.sid, second.sid);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let stored = row("analytical", false);
        let mut repo = MockRepository::new();
        repo.users
            .expect_get_by_username()
            .returning(move |_| Ok(Some(stored.clone())));
        repo.users.expect_touch_last_login().never();

        let service = UsersService::new(repo.build(), config());
        let result = service.authenticate("ada", "difference").await;
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let mut repo = MockRepository::new();
        repo.users.expect_get_by_username().returning(|_| Ok(None));

        let service = UsersService::new(repo.build(), config());
        let result = service.authenticate("nobody", "whatever1").await;
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[tokio::test]
    async fn registration_creates_regular_account() {
        let mut repo = MockRepository::new();
        repo.users
            .expect_create()
            .withf(|name: &str, hash: &str, is_superuser: &bool| {
                name == "grace" && hash.starts_with("$argon2") && !*is_superuser
            })
            .times(1)
            .returning(|name, _, su| Ok(user(name, su)));

        let service = UsersService::new(repo.build(), config());
        let form = RegistrationForm {
            username: "grace".into(),
            password1: "cobol-1959".into(),
            password2: "cobol-1959".into(),
        };
        let created = service.register(form).await.unwrap();
        assert!(!created.is_superuser);
    }

    #[tokio::test]
    async fn taken_username_is_a_form_error() {
        let mut repo = MockRepository::new();
        repo.users
            .expect_create()
            .returning(|name, _, _| Err(AppError::Conflict(format!("Username '{}' is already taken", name))));

        let service = UsersService::new(repo.build(), config());
        let form = RegistrationForm {
            username: "grace".into(),
            password1: "cobol-1959".into(),
            password2: "cobol-1959".into(),
        };
        match service.register(form).await {
            Err(AppError::InvalidForm(errors)) => {
                assert!(errors.field_errors().contains_key("username"))
            }
            other => panic!("expected form error, got {:?}", other.map(|u| u.id)),
        }
    }

    #[tokio::test]
    async fn bootstrap_skips_existing_superuser() {
        let stored = row("analytical", true);
        let mut repo = MockRepository::new();
        repo.users
            .expect_get_by_username()
            .returning(move |_| Ok(Some(stored.clone())));
        repo.users.expect_create().never();

        let service = UsersService::new(repo.build(), config());
        let bootstrap = BootstrapConfig {
            superuser_username: "ada".into(),
            superuser_password: "analytical".into(),
        };
        service.ensure_superuser(&bootstrap).await.unwrap();
    }
}
