use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::repository::UserRepository;
use crate::domain::types::User;
use crate::error::AuthServiceError;

// ── RegisterUser ─────────────────────────────────────────────────────────────

pub struct RegisterUserInput {
    pub full_name: String,
    pub username: String,
    pub role: String,
}

pub struct RegisterUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> RegisterUserUseCase<R> {
    pub async fn execute(&self, input: RegisterUserInput) -> Result<User, AuthServiceError> {
        let username = input.username.trim();
        let role = input.role.trim();
        let full_name = input.full_name.trim();
        if username.is_empty() || role.is_empty() || full_name.is_empty() {
            return Err(AuthServiceError::MissingData);
        }
        if self.repo.find_by_username(username).await?.is_some() {
            return Err(AuthServiceError::UserAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            username: username.to_owned(),
            role: role.to_owned(),
            full_name: full_name.to_owned(),
            created_at: now,
            updated_at: now,
        };
        self.repo.create(&user).await?;
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }
}

// ── GetUser ──────────────────────────────────────────────────────────────────

pub struct GetUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> GetUserUseCase<R> {
    pub async fn execute(&self, user_id: Uuid) -> Result<User, AuthServiceError> {
        self.repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::IdentityNotFound)
    }
}
