//! In-memory content store backend, used by tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

use super::{ItemStore, MetadataStore, TermStore};
use crate::models::{ItemContent, ItemId, ItemRecord, ItemStatus, MetaMap, NewItem};

#[derive(Debug)]
struct StoredItem {
    record: ItemRecord,
    meta: MetaMap,
    terms: BTreeMap<String, BTreeSet<String>>,
}

/// In-memory content store.
///
/// Backs the integration tests; mirrors the semantics of the Postgres
/// backend, including slug/guid generation on insert.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: DashMap<ItemId, StoredItem>,
    taxonomies: DashMap<String, Vec<String>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that a taxonomy applies to a content type.
    pub fn bind_taxonomy(&self, item_type: &str, taxonomy: &str) {
        let mut bound = self.taxonomies.entry(item_type.to_string()).or_default();
        if !bound.iter().any(|t| t == taxonomy) {
            bound.push(taxonomy.to_string());
        }
    }

    /// Number of stored items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn load(&self, id: ItemId) -> Result<Option<ItemRecord>> {
        Ok(self.items.get(&id).map(|item| item.record.clone()))
    }

    async fn insert(&self, item: NewItem) -> Result<ItemId> {
        let id = ItemId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let now = chrono::Utc::now().timestamp();
        let base = slugify(&item.content.title);
        let slug = if base.is_empty() {
            format!("item-{id}")
        } else {
            format!("{base}-{id}")
        };

        let record = ItemRecord {
            id,
            item_type: item.content.item_type,
            title: item.content.title,
            body: item.content.body,
            excerpt: item.content.excerpt,
            author_id: item.content.author_id,
            status: item.status,
            comment_policy: item.content.comment_policy,
            ping_policy: item.content.ping_policy,
            password: item.content.password,
            parent_id: item.content.parent_id,
            sort_order: item.content.sort_order,
            extra: item.content.extra,
            slug,
            guid: format!("urn:content-item:{id}"),
            created: now,
            changed: now,
        };

        self.items.insert(
            id,
            StoredItem {
                record,
                meta: MetaMap::new(),
                terms: BTreeMap::new(),
            },
        );

        Ok(id)
    }

    async fn update(&self, id: ItemId, content: &ItemContent) -> Result<bool> {
        let Some(mut item) = self.items.get_mut(&id) else {
            return Ok(false);
        };

        let record = &mut item.record;
        record.item_type = content.item_type.clone();
        record.title = content.title.clone();
        record.body = content.body.clone();
        record.excerpt = content.excerpt.clone();
        record.author_id = content.author_id;
        record.comment_policy = content.comment_policy;
        record.ping_policy = content.ping_policy;
        record.password = content.password.clone();
        record.parent_id = content.parent_id;
        record.sort_order = content.sort_order;
        record.extra = content.extra.clone();
        record.changed = chrono::Utc::now().timestamp();

        Ok(true)
    }

    async fn set_status(&self, id: ItemId, status: ItemStatus) -> Result<bool> {
        let Some(mut item) = self.items.get_mut(&id) else {
            return Ok(false);
        };

        item.record.status = status;
        item.record.changed = chrono::Utc::now().timestamp();

        Ok(true)
    }

    async fn delete(&self, id: ItemId) -> Result<bool> {
        Ok(self.items.remove(&id).is_some())
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn all_meta(&self, id: ItemId) -> Result<MetaMap> {
        Ok(self
            .items
            .get(&id)
            .map(|item| item.meta.clone())
            .unwrap_or_default())
    }

    async fn first_meta(&self, id: ItemId, key: &str) -> Result<Option<String>> {
        Ok(self
            .items
            .get(&id)
            .and_then(|item| item.meta.get(key).and_then(|values| values.first().cloned())))
    }

    async fn add_meta(&self, id: ItemId, key: &str, value: &str) -> Result<()> {
        if let Some(mut item) = self.items.get_mut(&id) {
            item.meta
                .entry(key.to_string())
                .or_default()
                .push(value.to_string());
        }
        Ok(())
    }

    async fn unset_meta(&self, id: ItemId, key: &str) -> Result<()> {
        if let Some(mut item) = self.items.get_mut(&id) {
            item.meta.remove(key);
        }
        Ok(())
    }
}

#[async_trait]
impl TermStore for MemoryStore {
    async fn assigned_terms(&self, id: ItemId, taxonomy: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .items
            .get(&id)
            .and_then(|item| item.terms.get(taxonomy).cloned())
            .unwrap_or_default())
    }

    async fn set_assigned_terms(
        &self,
        id: ItemId,
        taxonomy: &str,
        slugs: &BTreeSet<String>,
    ) -> Result<()> {
        if let Some(mut item) = self.items.get_mut(&id) {
            if slugs.is_empty() {
                item.terms.remove(taxonomy);
            } else {
                item.terms.insert(taxonomy.to_string(), slugs.clone());
            }
        }
        Ok(())
    }

    async fn applicable_taxonomies(&self, item_type: &str) -> Result<Vec<String>> {
        Ok(self
            .taxonomies
            .get(item_type)
            .map(|bound| bound.clone())
            .unwrap_or_default())
    }
}
