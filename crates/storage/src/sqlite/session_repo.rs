use finzo_core::model::UserId;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, id_i64, ser, user_id_from_i64};
use crate::repository::{SessionStore, StorageError};

#[async_trait::async_trait]
impl SessionStore for SqliteRepository {
    async fn current_user(&self) -> Result<Option<UserId>, StorageError> {
        let row = sqlx::query("SELECT user_id FROM app_session WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        match row {
            Some(row) => Ok(Some(user_id_from_i64(row.try_get("user_id").map_err(ser)?)?)),
            None => Ok(None),
        }
    }

    async fn sign_in(&self, user_id: UserId) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO app_session (id, user_id)
            VALUES (1, ?1)
            ON CONFLICT(id) DO UPDATE SET user_id = excluded.user_id
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM app_session WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
