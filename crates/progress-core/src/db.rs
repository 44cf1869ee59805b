//! Persistent storage for progress samples using redb.
//!
//! # Table design
//!
//! A single `SAMPLES` table keyed by the tuple
//! ```text
//! ( item_id: &str, timestamp: &str )
//! ```
//!
//! Tuple keys order by their first element, then their second. Timestamps are
//! stored in the fixed-width `Stamp` encoding, so a range scan starting at
//! `(item_id, "")` yields one item's samples in chronological order and a
//! full scan yields items ascending with each item's latest sample last.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProgressError, Result};
use crate::types::{ItemId, Sample, Stamp};

/// Key: (item id, encoded timestamp)
/// Value: JSON-encoded `SampleRecord`
const SAMPLES: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("samples");

#[derive(Debug, Serialize, Deserialize)]
struct SampleRecord {
    progress_percentage: u8,
}

fn store_err(e: impl Display) -> ProgressError {
    ProgressError::Store(e.to_string())
}

fn decode(item: &str, ts: &str, value: &[u8]) -> Result<Sample> {
    let record: SampleRecord = serde_json::from_slice(value)?;
    Ok(Sample {
        item_id: ItemId::parse(item)?,
        timestamp: Stamp::parse(ts)?,
        progress_percentage: record.progress_percentage,
    })
}

// ---------------------------------------------------------------------------
// SampleDb
// ---------------------------------------------------------------------------

/// Persistent store for `Sample` records.
pub struct SampleDb {
    db: Database,
}

impl SampleDb {
    /// Open or create the redb database at `path`.
    ///
    /// Creates parent directories and the `SAMPLES` table if missing.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            crate::io::ensure_dir(parent)?;
        }
        let db = Database::create(path).map_err(store_err)?;
        // Ensure the table exists before any reads
        let wt = db.begin_write().map_err(store_err)?;
        wt.open_table(SAMPLES).map_err(store_err)?;
        wt.commit().map_err(store_err)?;
        debug!(path = %path.display(), "opened sample store");
        Ok(Self { db })
    }

    /// Insert or overwrite the sample at `(item_id, timestamp)`.
    pub fn put_sample(&self, sample: &Sample) -> Result<()> {
        let ts = sample.timestamp.encode();
        let value = serde_json::to_vec(&SampleRecord {
            progress_percentage: sample.progress_percentage,
        })?;
        let wt = self.db.begin_write().map_err(store_err)?;
        {
            let mut table = wt.open_table(SAMPLES).map_err(store_err)?;
            table
                .insert((sample.item_id.as_str(), ts.as_str()), value.as_slice())
                .map_err(store_err)?;
        }
        wt.commit().map_err(store_err)?;
        debug!(item = %sample.item_id, ts = %ts, pct = sample.progress_percentage, "put sample");
        Ok(())
    }

    /// All samples for `item`, ascending by timestamp.
    pub fn list_samples(&self, item: &ItemId) -> Result<Vec<Sample>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(SAMPLES).map_err(store_err)?;

        let mut result = Vec::new();
        for entry in table.range((item.as_str(), "")..).map_err(store_err)? {
            let (k, v) = entry.map_err(store_err)?;
            let (id, ts) = k.value();
            if id != item.as_str() {
                break;
            }
            result.push(decode(id, ts, v.value())?);
        }
        Ok(result)
    }

    /// Distinct item ids, ascending.
    pub fn list_item_ids(&self) -> Result<Vec<ItemId>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(SAMPLES).map_err(store_err)?;

        let mut ids: Vec<ItemId> = Vec::new();
        for entry in table.iter().map_err(store_err)? {
            let (k, _) = entry.map_err(store_err)?;
            let (id, _) = k.value();
            if ids.last().map(|last| last.as_str()) != Some(id) {
                ids.push(ItemId::parse(id)?);
            }
        }
        Ok(ids)
    }

    /// Whether any sample exists for `item`.
    pub fn contains_item(&self, item: &ItemId) -> Result<bool> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(SAMPLES).map_err(store_err)?;
        let mut range = table.range((item.as_str(), "")..).map_err(store_err)?;
        match range.next() {
            Some(entry) => {
                let (k, _) = entry.map_err(store_err)?;
                Ok(k.value().0 == item.as_str())
            }
            None => Ok(false),
        }
    }

    /// The latest sample of every item, ordered by item id.
    pub fn latest_samples(&self) -> Result<Vec<Sample>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(SAMPLES).map_err(store_err)?;

        let mut latest: BTreeMap<String, Sample> = BTreeMap::new();
        for entry in table.iter().map_err(store_err)? {
            let (k, v) = entry.map_err(store_err)?;
            let (id, ts) = k.value();
            // Later keys within an item carry later timestamps.
            latest.insert(id.to_string(), decode(id, ts, v.value())?);
        }
        Ok(latest.into_values().collect())
    }

    /// Delete every sample for `item`. Returns the number of rows removed.
    pub fn delete_all_samples(&self, item: &ItemId) -> Result<usize> {
        let wt = self.db.begin_write().map_err(store_err)?;
        let removed = {
            let mut table = wt.open_table(SAMPLES).map_err(store_err)?;
            let mut stamps = Vec::new();
            for entry in table.range((item.as_str(), "")..).map_err(store_err)? {
                let (k, _) = entry.map_err(store_err)?;
                let (id, ts) = k.value();
                if id != item.as_str() {
                    break;
                }
                stamps.push(ts.to_string());
            }
            for ts in &stamps {
                table
                    .remove((item.as_str(), ts.as_str()))
                    .map_err(store_err)?;
            }
            stamps.len()
        };
        wt.commit().map_err(store_err)?;
        debug!(item = %item, removed, "deleted samples");
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
