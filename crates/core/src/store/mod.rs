//! SQLite-backed run state.
//!
//! Two collaborators live here behind traits so the run controller does
//! not depend on SQLite:
//!
//! - [`KeyValueStore`]: named JSON values (the checkpoint and the
//!   completion record)
//! - [`ResultSink`]: the append-only dataset of output rows
//!
//! [`StateDb`] implements both over a tokio-rusqlite connection.
//! Only one run may hold the state at a time; this module does not lock.

pub mod connection;
pub mod dataset;
pub mod kv;
pub mod migrations;

use async_trait::async_trait;

pub use crate::Error;
use crate::record::DatasetItem;

pub use connection::StateDb;
pub use dataset::DatasetCounts;

/// Named JSON values that survive between runs.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `None` when the key was never written or was deleted.
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>, Error>;

    /// Insert or overwrite a value.
    async fn set_value(&self, key: &str, value: &serde_json::Value) -> Result<(), Error>;

    /// Remove a value. Returns whether it existed.
    async fn delete_value(&self, key: &str) -> Result<bool, Error>;
}

/// Append-only output store. Order of pushes is preserved; nothing is
/// deduplicated.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn push(&self, item: &DatasetItem) -> Result<(), Error>;
}
