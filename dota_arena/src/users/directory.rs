//! Lookup of chat users and their bound accounts.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::errors::{UserError, UserResult};
use super::models::{AccountId, User, UserId};

/// Directory of chat users
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a user by chat id
    async fn find(&self, user_id: UserId) -> UserResult<Option<User>>;

    /// Bind (or rebind) a chat user to a game account
    async fn bind_account(
        &self,
        user_id: UserId,
        account_id: AccountId,
        display_name: &str,
    ) -> UserResult<User>;

    /// Name shown for a user in brackets and standings
    async fn display_name(&self, user_id: UserId) -> UserResult<String> {
        self.find(user_id)
            .await?
            .map(|user| user.display_name)
            .ok_or(UserError::UnknownUser(user_id))
    }
}

/// PostgreSQL implementation of `UserDirectory`
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: Arc<PgPool>,
}

impl PgUserDirectory {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find(&self, user_id: UserId) -> UserResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, display_name, account_id, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        Ok(Some(User {
            id: r.try_get("id")?,
            display_name: r.try_get("display_name")?,
            account_id: r.try_get("account_id")?,
            created_at: r.try_get::<NaiveDateTime, _>("created_at")?.and_utc(),
        }))
    }

    async fn bind_account(
        &self,
        user_id: UserId,
        account_id: AccountId,
        display_name: &str,
    ) -> UserResult<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, display_name, account_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET display_name = EXCLUDED.display_name, account_id = EXCLUDED.account_id
            RETURNING id, display_name, account_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(display_name)
        .bind(account_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        log::info!("User {} bound to account {}", user_id, account_id);

        Ok(User {
            id: row.try_get("id")?,
            display_name: row.try_get("display_name")?,
            account_id: row.try_get("account_id")?,
            created_at: row.try_get::<NaiveDateTime, _>("created_at")?.and_utc(),
        })
    }
}

/// In-process user directory
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find(&self, user_id: UserId) -> UserResult<Option<User>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn bind_account(
        &self,
        user_id: UserId,
        account_id: AccountId,
        display_name: &str,
    ) -> UserResult<User> {
        let mut users = self.users.write().await;
        let created_at = users
            .get(&user_id)
            .map_or_else(Utc::now, |existing| existing.created_at);

        let user = User {
            id: user_id,
            display_name: display_name.to_string(),
            account_id: Some(account_id),
            created_at,
        };
        users.insert(user_id, user.clone());

        Ok(user)
    }
}
