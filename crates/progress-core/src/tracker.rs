//! The user-facing workflows: each operation reads the sample store, renders
//! the affected pages and publishes them.
//!
//! Operations are one-shot and not transactional across stores. A sample
//! written before a failed upload stays written; the next
//! [`Tracker::update_all_pages`] brings the published site back in line.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::chart::render_chart;
use crate::db::SampleDb;
use crate::error::{ProgressError, Result};
use crate::paths::{self, HOMEPAGE_KEY};
use crate::publish::Publisher;
use crate::render::{render_homepage, render_item_page, DisplayOptions, Homepage, ItemPage};
use crate::staging::Staging;
use crate::types::{ItemId, Sample, Stamp};

/// Literal the user must type to confirm deleting an item.
pub const DELETE_CONFIRMATION: &str = "DELETE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Confirmation did not match; nothing was touched.
    Cancelled,
    Deleted { samples: usize, objects: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedUrls {
    pub homepage: String,
    pub items: Vec<(ItemId, String)>,
}

pub struct Tracker {
    db: SampleDb,
    publisher: Publisher,
    display: DisplayOptions,
    staging_root: Option<PathBuf>,
}

impl Tracker {
    pub fn new(db: SampleDb, publisher: Publisher, display: DisplayOptions) -> Self {
        Self {
            db,
            publisher,
            display,
            staging_root: None,
        }
    }

    /// Stage rendered pages under `root` instead of the system temp directory.
    pub fn with_staging_root(mut self, root: PathBuf) -> Self {
        self.staging_root = Some(root);
        self
    }

    pub fn item_ids(&self) -> Result<Vec<ItemId>> {
        self.db.list_item_ids()
    }

    pub fn samples(&self, item: &ItemId) -> Result<Vec<Sample>> {
        self.db.list_samples(item)
    }

    pub fn item_url(&self, item: &ItemId) -> String {
        self.publisher.url_for(&paths::item_page_key(item))
    }

    pub fn homepage_url(&self) -> String {
        self.publisher.url_for(HOMEPAGE_KEY)
    }

    fn staging(&self) -> Result<Staging> {
        Staging::new(self.staging_root.as_deref())
    }

    // -----------------------------------------------------------------------
    // Workflows
    // -----------------------------------------------------------------------

    /// Record `pct` for an existing item, then republish its page and the
    /// homepage. Returns the item page URL.
    pub fn write_progress(&self, item: &ItemId, pct: i64, at: Stamp) -> Result<String> {
        let sample = Sample::new(item.clone(), at, pct)?;
        if !self.db.contains_item(item)? {
            return Err(ProgressError::ItemNotFound(item.to_string()));
        }
        self.db.put_sample(&sample)?;

        let staging = self.staging()?;
        self.publish_item_page(&staging, item)?;
        self.publish_homepage(&staging)?;

        info!(item = %item, pct = sample.progress_percentage, "recorded progress");
        Ok(self.item_url(item))
    }

    /// Start tracking a new item at 0%. Existing ids are rejected so a
    /// repeated create never adds a stray zero sample to an item's history.
    pub fn create_item(&self, raw_id: &str, at: Stamp) -> Result<ItemId> {
        let item = ItemId::parse(raw_id)?;
        if self.db.contains_item(&item)? {
            return Err(ProgressError::ItemExists(item.to_string()));
        }
        self.db.put_sample(&Sample::new(item.clone(), at, 0)?)?;

        let staging = self.staging()?;
        self.publish_item_page(&staging, &item)?;
        self.publish_homepage(&staging)?;

        info!(item = %item, "created item");
        Ok(item)
    }

    /// Delete every sample and published object of `item` when
    /// `confirmation` is exactly [`DELETE_CONFIRMATION`].
    pub fn delete_item(&self, item: &ItemId, confirmation: &str) -> Result<DeleteOutcome> {
        if confirmation != DELETE_CONFIRMATION {
            debug!(item = %item, "delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }
        if !self.db.contains_item(item)? {
            return Err(ProgressError::ItemNotFound(item.to_string()));
        }

        let samples = self.db.delete_all_samples(item)?;
        let objects = self.publisher.delete_prefix(item)?;
        self.regenerate_homepage()?;

        info!(item = %item, samples, objects, "deleted item");
        Ok(DeleteOutcome::Deleted { samples, objects })
    }

    /// URLs of the homepage and every item page. Read-only.
    pub fn published_urls(&self) -> Result<PublishedUrls> {
        let items = self
            .db
            .list_item_ids()?
            .into_iter()
            .map(|id| {
                let url = self.item_url(&id);
                (id, url)
            })
            .collect();
        Ok(PublishedUrls {
            homepage: self.homepage_url(),
            items,
        })
    }

    /// Re-render and republish every item page and the homepage from the
    /// current store contents. Returns the number of item pages published.
    pub fn update_all_pages(&self) -> Result<usize> {
        let ids = self.db.list_item_ids()?;
        let staging = self.staging()?;
        for id in &ids {
            self.publish_item_page(&staging, id)?;
        }
        self.publish_homepage(&staging)?;
        info!(pages = ids.len(), "republished all pages");
        Ok(ids.len())
    }

    pub fn regenerate_homepage(&self) -> Result<()> {
        let staging = self.staging()?;
        self.publish_homepage(&staging)
    }

    // -----------------------------------------------------------------------
    // Rendering + publishing
    // -----------------------------------------------------------------------

    fn publish_item_page(&self, staging: &Staging, item: &ItemId) -> Result<()> {
        let samples = self.db.list_samples(item)?;
        let chart = render_chart(item, &samples, &self.display);
        let html = render_item_page(&ItemPage {
            item_id: item,
            samples: &samples,
            chart: &chart,
            display: &self.display,
        });
        let key = paths::item_page_key(item);
        let staged = staging.write(&key, &html)?;
        self.publisher.publish_file(&key, &staged)
    }

    fn publish_homepage(&self, staging: &Staging) -> Result<()> {
        let item_ids = self.db.list_item_ids()?;
        let latest = self.db.latest_samples()?;
        let html = render_homepage(&Homepage {
            item_ids: &item_ids,
            latest: &latest,
            base_url: self.publisher.base_url(),
            display: &self.display,
        });
        let staged = staging.write(HOMEPAGE_KEY, &html)?;
        self.publisher.publish_file(HOMEPAGE_KEY, &staged)
    }
}
