//! Content item wrapper: resolution, metadata access, one-way import.

use std::collections::BTreeSet;

use anyhow::Result;
use tracing::debug;

use crate::merge;
use crate::models::{ItemId, ItemRecord, MetaMap};
use crate::store::ContentStore;

/// A content record addressed by id, possibly unresolved.
///
/// Loading a nonexistent id yields an unresolved item rather than an error;
/// callers check [`ContentItem::is_resolved`] before mutating. Every
/// mutation against an unresolved item is a silent no-op.
#[derive(Debug, Clone, Default)]
pub struct ContentItem {
    record: Option<ItemRecord>,
}

impl ContentItem {
    /// An item bound to nothing (`id() == ItemId::NONE`).
    pub fn unresolved() -> Self {
        Self { record: None }
    }

    /// Wrap an already-loaded record.
    pub fn from_record(record: ItemRecord) -> Self {
        Self {
            record: Some(record),
        }
    }

    /// Load an item by id. A missing record is not an error.
    pub async fn resolve(store: &dyn ContentStore, id: ItemId) -> Result<Self> {
        if id.is_none() {
            return Ok(Self::unresolved());
        }

        Ok(Self {
            record: store.load(id).await?,
        })
    }

    /// The item's id, or [`ItemId::NONE`] when unresolved.
    pub fn id(&self) -> ItemId {
        self.record.as_ref().map_or(ItemId::NONE, |r| r.id)
    }

    pub fn is_resolved(&self) -> bool {
        self.record.is_some()
    }

    pub fn record(&self) -> Option<&ItemRecord> {
        self.record.as_ref()
    }

    pub fn title(&self) -> &str {
        self.record.as_ref().map_or("", |r| r.title.as_str())
    }

    /// All metadata for this item. Empty when unresolved.
    pub async fn meta_all(&self, store: &dyn ContentStore) -> Result<MetaMap> {
        if !self.is_resolved() {
            return Ok(MetaMap::new());
        }

        store.all_meta(self.id()).await
    }

    /// The first metadata value under a key, if any.
    pub async fn meta_first(&self, store: &dyn ContentStore, key: &str) -> Result<Option<String>> {
        if !self.is_resolved() {
            return Ok(None);
        }

        store.first_meta(self.id(), key).await
    }

    /// A metadata value interpreted as an item pointer.
    ///
    /// Absent or malformed values come back as [`ItemId::NONE`].
    pub async fn meta_id(&self, store: &dyn ContentStore, key: &str) -> Result<ItemId> {
        let value = self.meta_first(store, key).await?;

        Ok(value
            .and_then(|raw| raw.parse::<ItemId>().ok())
            .filter(|id| id.is_some())
            .unwrap_or(ItemId::NONE))
    }

    /// Import content, metadata, and taxonomy terms from another item.
    ///
    /// Returns false without side effects when either side is unresolved.
    /// Otherwise this item's copyable fields are overwritten with the
    /// source's (its own id, status, slug, guid, and creation time stay put)
    /// and persisted immediately, then the metadata merge plan is applied
    /// and term assignments are copied.
    ///
    /// Each store call is individually durable; the sequence as a whole is
    /// not transactional, so a failure partway leaves earlier steps
    /// committed. The error still propagates to the caller.
    pub async fn import_from(
        &mut self,
        store: &dyn ContentStore,
        source: &ContentItem,
    ) -> Result<bool> {
        let (Some(destination), Some(src)) = (self.record.as_ref(), source.record.as_ref()) else {
            return Ok(false);
        };

        let destination_id = destination.id;
        let source_id = src.id;
        let content = src.content();

        store.update(destination_id, &content).await?;

        let source_meta = store.all_meta(source_id).await?;
        let destination_meta = store.all_meta(destination_id).await?;
        let plan = merge::metadata::plan(&source_meta, &destination_meta, &BTreeSet::new());
        merge::metadata::apply(store, destination_id, &plan).await?;

        merge::taxonomy::copy_terms(store, source_id, &content.item_type, destination_id).await?;

        // Pick up the persisted state, timestamps included.
        self.record = store.load(destination_id).await?;

        debug!(
            source = %source_id,
            destination = %destination_id,
            copied = plan.copy.len(),
            removed = plan.remove.len(),
            "imported item content"
        );

        Ok(true)
    }
}
