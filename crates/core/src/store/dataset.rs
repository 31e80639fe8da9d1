//! Append-only dataset of output rows.

use async_trait::async_trait;
use tokio_rusqlite::params;

use super::{ResultSink, StateDb};
use crate::Error;
use crate::record::DatasetItem;

#[async_trait]
impl ResultSink for StateDb {
    async fn push(&self, item: &DatasetItem) -> Result<(), Error> {
        let json = serde_json::to_string(item)?;
        let url = item.record.url().to_string();
        let batch = item.batch as i64;
        let failed = item.record.is_failure() as i32;
        let processed_at = item.processed_at.clone();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO dataset (url, batch, failed, item_json, processed_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![url, batch, failed, json, processed_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

/// Per-batch totals for status output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetCounts {
    pub total: u64,
    pub failed: u64,
}

impl StateDb {
    /// All rows in insertion order.
    pub async fn list_items(&self) -> Result<Vec<DatasetItem>, Error> {
        let rows = self
            .conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT item_json FROM dataset ORDER BY id ASC")?;
                let rows = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|json| serde_json::from_str(&json).map_err(Error::from))
            .collect()
    }

    pub async fn count_items(&self) -> Result<DatasetCounts, Error> {
        self.conn
            .call(|conn| -> Result<DatasetCounts, Error> {
                let (total, failed): (i64, i64) = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(failed), 0) FROM dataset",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok(DatasetCounts { total: total as u64, failed: failed as u64 })
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ExtractionResult, FailureRecord, ProfileRecord};
    use chrono::Utc;

    fn profile(url: &str) -> DatasetItem {
        let record = ProfileRecord { full_name: "Jane Doe".into(), ..ProfileRecord::empty(url) };
        DatasetItem::new(ExtractionResult::Profile(record), 1, Utc::now())
    }

    fn failure(url: &str) -> DatasetItem {
        DatasetItem::new(ExtractionResult::Failure(FailureRecord::new(url, "FETCH_TIMEOUT: slow")), 1, Utc::now())
    }

    #[tokio::test]
    async fn test_push_preserves_order() {
        let db = StateDb::open_in_memory().await.unwrap();
        db.push(&profile("https://a.test")).await.unwrap();
        db.push(&failure("https://b.test")).await.unwrap();
        db.push(&profile("https://c.test")).await.unwrap();

        let items = db.list_items().await.unwrap();
        let urls: Vec<_> = items.iter().map(|item| item.record.url().to_string()).collect();
        assert_eq!(urls, vec!["https://a.test", "https://b.test", "https://c.test"]);
        assert!(items[1].record.is_failure());
        assert_eq!(items[0].record.profile().full_name, "Jane Doe");
    }

    #[tokio::test]
    async fn test_duplicates_are_kept() {
        let db = StateDb::open_in_memory().await.unwrap();
        db.push(&profile("https://a.test")).await.unwrap();
        db.push(&profile("https://a.test")).await.unwrap();
        assert_eq!(db.count_items().await.unwrap(), DatasetCounts { total: 2, failed: 0 });
    }

    #[tokio::test]
    async fn test_counts_failures() {
        let db = StateDb::open_in_memory().await.unwrap();
        assert_eq!(db.count_items().await.unwrap(), DatasetCounts::default());
        db.push(&failure("https://a.test")).await.unwrap();
        db.push(&profile("https://b.test")).await.unwrap();
        assert_eq!(db.count_items().await.unwrap(), DatasetCounts { total: 2, failed: 1 });
    }
}
