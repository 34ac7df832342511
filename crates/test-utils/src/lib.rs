//! Shadowdraft test utilities.
//!
//! Fixture builders and a permissive access policy for integration tests.

use anyhow::Result;
use async_trait::async_trait;

use shadowdraft::models::{CommentPolicy, ItemContent, ItemId, ItemRecord, ItemStatus, NewItem};
use shadowdraft::permissions::{AccessPolicy, ActorContext};
use shadowdraft::store::ContentStore;

/// Initialize tracing output for a test run. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// Content fields with test defaults.
pub fn content(item_type: &str, title: &str) -> ItemContent {
    ItemContent {
        item_type: item_type.to_string(),
        title: title.to_string(),
        ..ItemContent::default()
    }
}

/// Builder inserting an item, its metadata, and its term assignments into a
/// store.
#[derive(Debug, Clone)]
pub struct ItemFixture {
    content: ItemContent,
    status: ItemStatus,
    meta: Vec<(String, String)>,
    terms: Vec<(String, Vec<String>)>,
}

impl ItemFixture {
    /// A published item of the given type and title.
    pub fn new(item_type: &str, title: &str) -> Self {
        Self {
            content: content(item_type, title),
            status: ItemStatus::Published,
            meta: Vec::new(),
            terms: Vec::new(),
        }
    }

    pub fn body(mut self, body: &str) -> Self {
        self.content.body = body.to_string();
        self
    }

    pub fn excerpt(mut self, excerpt: &str) -> Self {
        self.content.excerpt = excerpt.to_string();
        self
    }

    pub fn author(mut self, author_id: i64) -> Self {
        self.content.author_id = author_id;
        self
    }

    pub fn comments_open(mut self) -> Self {
        self.content.comment_policy = CommentPolicy::Open;
        self
    }

    pub fn extra(mut self, extra: serde_json::Value) -> Self {
        self.content.extra = extra;
        self
    }

    pub fn status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    /// Add a metadata value (appended under the key).
    pub fn meta(mut self, key: &str, value: &str) -> Self {
        self.meta.push((key.to_string(), value.to_string()));
        self
    }

    /// Assign a term slug under a taxonomy.
    pub fn term(mut self, taxonomy: &str, slug: &str) -> Self {
        if let Some((_, slugs)) = self.terms.iter_mut().find(|(t, _)| t == taxonomy) {
            slugs.push(slug.to_string());
        } else {
            self.terms
                .push((taxonomy.to_string(), vec![slug.to_string()]));
        }
        self
    }

    /// Insert the fixture into a store and return the assigned id.
    pub async fn insert(self, store: &dyn ContentStore) -> Result<ItemId> {
        let id = store
            .insert(NewItem {
                content: self.content,
                status: self.status,
            })
            .await?;

        for (key, value) in &self.meta {
            store.add_meta(id, key, value).await?;
        }

        for (taxonomy, slugs) in &self.terms {
            let slugs = slugs.iter().cloned().collect();
            store.set_assigned_terms(id, taxonomy, &slugs).await?;
        }

        Ok(id)
    }
}

/// Access policy that grants everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl AccessPolicy for AllowAll {
    async fn can_act_on(&self, _actor: &ActorContext, _item: &ItemRecord) -> Result<bool> {
        Ok(true)
    }
}

/// A non-admin actor holding the default edit permission.
pub fn editor() -> ActorContext {
    ActorContext::with_permission(1, "edit content")
}
