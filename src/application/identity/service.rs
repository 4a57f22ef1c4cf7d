//! User management service: application-layer orchestration
//!
//! All user-related business logic lives here.
//! HTTP handlers should be thin wrappers that delegate to this service.

use std::sync::Arc;

use tracing::{info, warn};
use validator::ValidateEmail;

use crate::domain::{
    authorize, normalize_email, Action, Actor, DomainError, DomainResult, NewUser,
    RepositoryProvider, Resource, User, UserPatch, UserRole,
};
use crate::infrastructure::crypto::jwt::{create_token, JwtConfig};
use crate::infrastructure::crypto::password::PasswordHasher;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Authentication result returned after a successful login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

/// Self-service registration request
#[derive(Debug, Clone)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

/// Administrator created on first start when no users exist
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

/// User service orchestrating all identity / user-management use-cases.
pub struct UserService {
    repos: Arc<dyn RepositoryProvider>,
    jwt_config: JwtConfig,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, jwt_config: JwtConfig) -> Self {
        Self::with_hasher(repos, jwt_config, PasswordHasher::default())
    }

    pub fn with_hasher(
        repos: Arc<dyn RepositoryProvider>,
        jwt_config: JwtConfig,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            repos,
            jwt_config,
            hasher,
        }
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }

    // ── Authentication ──────────────────────────────────────────

    /// Authenticate by email + password and return a JWT.
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<AuthResult> {
        let email = normalize_email(email);
        let Some(user) = self.repos.users().find_by_email(&email).await? else {
            return Err(DomainError::NotFound {
                entity: "User",
                field: "email",
                value: email,
            });
        };

        let valid = self
            .hasher
            .verify(password, &user.password_hash)
            .unwrap_or(false);
        if !valid {
            warn!(user_id = user.id, "Sign-in rejected: invalid password");
            return Err(DomainError::Unauthorized("Invalid password".into()));
        }

        let token = create_token(&user, &self.jwt_config)
            .map_err(|e| DomainError::Crypto(format!("Failed to create token: {}", e)))?;

        info!(user_id = user.id, role = %user.role, "User signed in");
        Ok(AuthResult {
            token,
            token_type: "Bearer".into(),
            expires_in: self.jwt_config.expiration_hours * 3600,
            user,
        })
    }

    // ── Registration ────────────────────────────────────────────

    /// Register a new customer. Self-service sign-up never grants admin.
    pub async fn register(&self, request: SignUp) -> DomainResult<User> {
        let user = self
            .create_user(
                request.name,
                request.email,
                request.password,
                request.phone,
                UserRole::Customer,
            )
            .await?;

        info!(user_id = user.id, "New user registered");
        Ok(user)
    }

    /// Create the configured administrator if the directory is empty.
    pub async fn seed_admin(&self, seed: AdminSeed) -> DomainResult<Option<User>> {
        if self.repos.users().count().await? > 0 {
            return Ok(None);
        }

        let admin = self
            .create_user(seed.name, seed.email, seed.password, seed.phone, UserRole::Admin)
            .await?;
        info!(user_id = admin.id, email = %admin.email, "Default administrator created");
        Ok(Some(admin))
    }

    async fn create_user(
        &self,
        name: String,
        email: String,
        password: String,
        phone: String,
        role: UserRole,
    ) -> DomainResult<User> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation("Name is required".into()));
        }
        if phone.trim().is_empty() {
            return Err(DomainError::Validation("Phone is required".into()));
        }
        let email = validate_email(&email)?;
        if password.len() < MIN_PASSWORD_LEN {
            return Err(DomainError::Validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }

        if self.repos.users().find_by_email(&email).await?.is_some() {
            return Err(DomainError::Conflict("User already exists".into()));
        }

        let password_hash = self
            .hasher
            .hash(&password)
            .map_err(|e| DomainError::Crypto(format!("Failed to hash password: {}", e)))?;

        self.repos
            .users()
            .create(NewUser {
                name: name.trim().to_string(),
                email,
                password_hash,
                phone: phone.trim().to_string(),
                role,
            })
            .await
    }

    // ── Queries ─────────────────────────────────────────────────

    pub async fn list_users(&self, actor: &Actor) -> DomainResult<Vec<User>> {
        authorize(actor, Action::Read, Resource::UserDirectory)?;
        self.repos.users().find_all().await
    }

    pub async fn get_user(&self, actor: &Actor, id: i32) -> DomainResult<User> {
        authorize(actor, Action::Read, Resource::User { id })?;
        self.repos
            .users()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    // ── Commands (mutations) ────────────────────────────────────

    /// Update profile fields. Only admins may touch `role`.
    pub async fn update_user(&self, actor: &Actor, id: i32, mut patch: UserPatch) -> DomainResult<User> {
        authorize(actor, Action::Update, Resource::User { id })?;
        if patch.role.is_some() {
            authorize(actor, Action::Update, Resource::UserRole)?;
        }

        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(DomainError::Validation("Name is required".into()));
            }
        }
        if let Some(email) = &patch.email {
            patch.email = Some(validate_email(email)?);
        }

        let user = self.repos.users().update(id, patch).await?;
        info!(user_id = id, actor_id = actor.id, "User updated");
        Ok(user)
    }

    /// Delete a user. Blocked while they hold an active booking.
    pub async fn delete_user(&self, actor: &Actor, id: i32) -> DomainResult<()> {
        authorize(actor, Action::Delete, Resource::User { id })?;

        self.repos.users().delete(id).await?;
        info!(user_id = id, actor_id = actor.id, "User deleted");
        Ok(())
    }
}

/// Normalize and check an email address.
fn validate_email(email: &str) -> DomainResult<String> {
    let email = normalize_email(email);
    if !email.validate_email() {
        return Err(DomainError::Validation("Invalid email format".into()));
    }
    Ok(email)
}
