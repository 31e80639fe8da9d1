//! Key-value operations backing checkpoints.

use async_trait::async_trait;
use tokio_rusqlite::{params, rusqlite};

use super::{KeyValueStore, StateDb};
use crate::Error;

#[async_trait]
impl KeyValueStore for StateDb {
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>, Error> {
        let key = key.to_string();
        let raw = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result =
                    conn.query_row("SELECT value_json FROM key_value WHERE key = ?1", params![key], |row| row.get(0));

                match result {
                    Ok(json) => Ok(Some(json)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        raw.map(|json| serde_json::from_str(&json).map_err(Error::from)).transpose()
    }

    async fn set_value(&self, key: &str, value: &serde_json::Value) -> Result<(), Error> {
        let key = key.to_string();
        let json = serde_json::to_string(value)?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO key_value (key, value_json, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET
                        value_json = excluded.value_json,
                        updated_at = excluded.updated_at",
                    params![key, json, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_value(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM key_value WHERE key = ?1", params![key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}
