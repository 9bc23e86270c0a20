use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use toeic_core::model::{User, UserId};

use super::SqliteRepository;
use crate::repository::{AuthStore, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl AuthStore for SqliteRepository {
    async fn load_user(&self) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, username, email
            FROM auth_identity
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw_id: i64 = row.try_get("user_id").map_err(ser)?;
        let id = u64::try_from(raw_id)
            .map_err(|_| StorageError::Serialization(format!("invalid user_id: {raw_id}")))?;

        Ok(Some(User {
            id: UserId::new(id),
            username: row.try_get("username").map_err(ser)?,
            email: row.try_get("email").map_err(ser)?,
        }))
    }

    async fn save_user(&self, user: &User) -> Result<(), StorageError> {
        let user_id = i64::try_from(user.id.value())
            .map_err(|_| StorageError::Serialization("user_id overflow".into()))?;

        sqlx::query(
            r"
            INSERT INTO auth_identity (id, user_id, username, email, saved_at)
            VALUES (1, ?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                user_id = excluded.user_id,
                username = excluded.username,
                email = excluded.email,
                saved_at = excluded.saved_at
            ",
        )
        .bind(user_id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn clear_user(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM auth_identity WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
