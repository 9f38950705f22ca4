use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use axum_login::{AuthUser, AuthnBackend, UserId};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, SqlErr,
};
use serde::{Deserialize, Serialize};
use tokio::task;
use tracing::debug;
use uuid::Uuid;

use crate::entities::user;
use crate::error::AppError;

impl AuthUser for user::Model {
    type Id = Uuid;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn session_auth_hash(&self) -> &[u8] {
        self.password_hash.as_bytes()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// What the client gets back about the signed-in user.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&user::Model> for UserProfile {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Seaorm(#[from] sea_orm::DbErr),

    #[error("Password hashing failed: {0}")]
    PasswordHash(argon2::password_hash::Error),

    #[error(transparent)]
    TaskJoin(#[from] task::JoinError),
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Seaorm(db) => AppError::Database(db),
            other => AppError::Internal(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Backend {
    db: DatabaseConnection,
}

impl Backend {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account. Returns `None` when the email is already taken.
    pub async fn register(
        &self,
        name: String,
        email: String,
        password: String,
    ) -> Result<Option<user::Model>, BackendError> {
        let email = email.trim().to_lowercase();
        let exists = user::Entity::find()
            .filter(user::Column::Email.eq(email.clone()))
            .one(&self.db)
            .await?
            .is_some();
        if exists {
            return Ok(None);
        }

        let password_hash = task::spawn_blocking(move || hash_password(&password))
            .await?
            .map_err(BackendError::PasswordHash)?;

        let now = Utc::now().naive_utc();
        let inserted = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.trim().to_string()),
            email: Set(email),
            password_hash: Set(password_hash),
            session_token: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await;

        match inserted {
            Ok(user) => Ok(Some(user)),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Rotates the opaque token handed to the client after sign-in.
    pub async fn issue_token(&self, user: user::Model) -> Result<String, BackendError> {
        let token = Uuid::new_v4().simple().to_string();
        let mut model = user.into_active_model();
        model.session_token = Set(Some(token.clone()));
        model.updated_at = Set(Utc::now().naive_utc());
        model.update(&self.db).await?;
        Ok(token)
    }
}

#[async_trait]
impl AuthnBackend for Backend {
    type User = user::Model;
    type Credentials = Credentials;
    type Error = BackendError;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let user = user::Entity::find()
            .filter(user::Column::Email.eq(creds.email.trim().to_lowercase()))
            .one(&self.db)
            .await?;

        let Some(user) = user else {
            debug!("login rejected: unknown email");
            return Ok(None);
        };

        // Verifying the password is CPU heavy; keep it off the async workers.
        let hash = user.password_hash.clone();
        let valid = task::spawn_blocking(move || verify_password(&creds.password, &hash)).await?;

        Ok(valid.then_some(user))
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        let user = user::Entity::find_by_id(*user_id).one(&self.db).await?;
        Ok(user)
    }
}

pub type AuthSession = axum_login::AuthSession<Backend>;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
