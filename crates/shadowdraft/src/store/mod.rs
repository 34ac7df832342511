//! Content store abstraction.
//!
//! Unified interface to the host CMS storage: item records, multi-valued
//! metadata, and taxonomy term assignments. All reads and writes from the
//! draft workflow go through these traits, which lets the backend be swapped
//! without touching any call site (Postgres in production, in-memory in
//! tests).
//!
//! Missing items are values, not errors: `load` on a nonexistent id yields
//! `None`, metadata reads yield empty results, and mutations against
//! [`ItemId::NONE`] are no-ops.

mod memory;
mod postgres;

use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use postgres::{PgStore, connect_pool};

use crate::models::{ItemContent, ItemId, ItemRecord, ItemStatus, MetaMap, NewItem};

/// Item record storage.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Load an item by id. `None` when no such item exists.
    async fn load(&self, id: ItemId) -> Result<Option<ItemRecord>>;

    /// Insert a new item and return its assigned id.
    ///
    /// The store owns slug, guid, and timestamp generation.
    async fn insert(&self, item: NewItem) -> Result<ItemId>;

    /// Overwrite an item's content fields. Status, slug, guid, and creation
    /// time are untouched. Returns false when the item does not exist.
    async fn update(&self, id: ItemId, content: &ItemContent) -> Result<bool>;

    /// Change an item's publication status. Returns false when the item does
    /// not exist.
    async fn set_status(&self, id: ItemId, status: ItemStatus) -> Result<bool>;

    /// Delete an item. Returns false when the item does not exist.
    async fn delete(&self, id: ItemId) -> Result<bool>;
}

/// Multi-valued item metadata storage.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// All metadata for an item. Empty for unknown items.
    async fn all_meta(&self, id: ItemId) -> Result<MetaMap>;

    /// The first value stored under a key, if any.
    async fn first_meta(&self, id: ItemId, key: &str) -> Result<Option<String>>;

    /// Append a value under a key.
    async fn add_meta(&self, id: ItemId, key: &str, value: &str) -> Result<()>;

    /// Remove a key and all its values.
    async fn unset_meta(&self, id: ItemId, key: &str) -> Result<()>;

    /// Replace all values under a key.
    async fn replace_meta(&self, id: ItemId, key: &str, values: &[String]) -> Result<()> {
        self.unset_meta(id, key).await?;
        for value in values {
            self.add_meta(id, key, value).await?;
        }
        Ok(())
    }
}

/// Taxonomy term assignment storage.
#[async_trait]
pub trait TermStore: Send + Sync {
    /// Slugs assigned to an item under a taxonomy. Empty for unknown items.
    async fn assigned_terms(&self, id: ItemId, taxonomy: &str) -> Result<BTreeSet<String>>;

    /// Replace an item's assignment under a taxonomy with the given slugs.
    async fn set_assigned_terms(
        &self,
        id: ItemId,
        taxonomy: &str,
        slugs: &BTreeSet<String>,
    ) -> Result<()>;

    /// Which taxonomies apply to a content type.
    async fn applicable_taxonomies(&self, item_type: &str) -> Result<Vec<String>>;
}

/// The full store surface the draft workflow operates against.
pub trait ContentStore: ItemStore + MetadataStore + TermStore {}

impl<T: ItemStore + MetadataStore + TermStore> ContentStore for T {}
