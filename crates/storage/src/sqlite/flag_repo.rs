use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{FlagKey, FlagRecord, FlagRepository, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl FlagRepository for SqliteRepository {
    async fn get_flag(&self, key: FlagKey) -> Result<Option<FlagRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT value, updated_at
            FROM app_flags
            WHERE key = ?1
            ",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let value: String = row.try_get("value").map_err(ser)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(ser)?;
        Ok(Some(FlagRecord { value, updated_at }))
    }

    async fn set_flag(
        &self,
        key: FlagKey,
        value: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO app_flags (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key.as_str())
        .bind(value)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn clear_flag(&self, key: FlagKey) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM app_flags WHERE key = ?1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
