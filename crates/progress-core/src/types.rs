use crate::error::{ProgressError, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, SubsecRound, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// ItemId
// ---------------------------------------------------------------------------

const MAX_ITEM_ID_LEN: usize = 128;

static ITEM_ID_RE: OnceLock<Regex> = OnceLock::new();

fn item_id_re() -> &'static Regex {
    ITEM_ID_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap())
}

/// Identifier of a tracked item.
///
/// Ids double as content-store key prefixes (`{id}/index.html`), so they are
/// restricted to characters that are safe in a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.len() > MAX_ITEM_ID_LEN || !item_id_re().is_match(trimmed) {
            return Err(ProgressError::InvalidItemId(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ItemId {
    type Error = ProgressError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// Stamp
// ---------------------------------------------------------------------------

/// Storage encoding: fixed width (27 chars), zero padded, always UTC.
pub const STAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
const STAMP_LEN: usize = 27;

/// A UTC instant truncated to microseconds.
///
/// The encoded form sorts lexicographically in chronological order, which is
/// what the sample table uses as its sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Stamp(DateTime<Utc>);

impl Stamp {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.trunc_subsecs(6))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() != STAMP_LEN {
            return Err(ProgressError::InvalidTimestamp(raw.to_string()));
        }
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.fZ")
            .map_err(|_| ProgressError::InvalidTimestamp(raw.to_string()))?;
        Ok(Self(naive.and_utc()))
    }

    pub fn encode(&self) -> String {
        self.0.format(STAMP_FORMAT).to_string()
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Human-readable form shifted into `offset`, e.g. `2026-03-01 09:30:00 -03:00`.
    pub fn display(&self, offset: FixedOffset) -> String {
        self.0
            .with_timezone(&offset)
            .format("%Y-%m-%d %H:%M:%S %:z")
            .to_string()
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

// ---------------------------------------------------------------------------
// Sample
// ---------------------------------------------------------------------------

/// One timestamped percentage observation for an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub item_id: ItemId,
    pub timestamp: Stamp,
    pub progress_percentage: u8,
}

impl Sample {
    pub fn new(item_id: ItemId, timestamp: Stamp, progress_percentage: i64) -> Result<Self> {
        let pct = u8::try_from(progress_percentage)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or(ProgressError::InvalidPercentage(progress_percentage))?;
        Ok(Self {
            item_id,
            timestamp,
            progress_percentage: pct,
        })
    }
}
