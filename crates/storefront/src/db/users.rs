//! User repository for database operations.
//!
//! There is no sign-in. Requests either name a user id directly or fall back
//! to the oldest user, which is created on first use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use corner_shop_core::{User, UserId};

use super::{PgStore, RepositoryError, UserStore, conflict_on_unique};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, created_at
            FROM shop.users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(User::from))
    }

    #[instrument(skip(self))]
    async fn ensure_user(&self, id: UserId) -> Result<User, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.users (id, created_at)
            VALUES ($1, now())
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(id)
        .execute(self.pool())
        .await?;

        self.find_user(id).await?.ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self))]
    async fn default_user(&self) -> Result<User, RepositoryError> {
        let existing = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, created_at
            FROM shop.users
            ORDER BY created_at, id
            LIMIT 1
            ",
        )
        .fetch_optional(self.pool())
        .await?;

        if let Some(row) = existing {
            return Ok(row.into());
        }

        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO shop.users (id, created_at)
            VALUES ($1, now())
            RETURNING id, created_at
            ",
        )
        .bind(UserId::generate())
        .fetch_one(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "user"))?;

        let user = User::from(row);
        info!(user_id = %user.id, "Created default user");
        Ok(user)
    }

    async fn clear_users(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.users")
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
