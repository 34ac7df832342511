//! The published↔draft link state machine.
//!
//! A published item can have at most one draft copy. The pairing is stored
//! as two cross-referencing metadata entries: the draft carries
//! [`PUBLISHED_ID_KEY`] pointing at its published counterpart and the
//! published item carries [`DRAFT_ID_KEY`] pointing at its draft. Exactly
//! one of the two is ever present on a given item, and every operation here
//! leaves that invariant intact.

use anyhow::Result;
use tracing::{debug, info};

use crate::content::ContentItem;
use crate::merge::metadata::{DRAFT_ID_KEY, PUBLISHED_ID_KEY};
use crate::models::{ItemId, ItemStatus, NewItem};
use crate::store::ContentStore;

/// An item identifier or an already-loaded item.
///
/// Public operations normalize their input through this type, so callers can
/// hand over whatever they have.
#[derive(Debug, Clone)]
pub enum ItemRef {
    Id(ItemId),
    Resolved(ContentItem),
}

impl From<ItemId> for ItemRef {
    fn from(id: ItemId) -> Self {
        ItemRef::Id(id)
    }
}

impl From<i64> for ItemRef {
    fn from(id: i64) -> Self {
        ItemRef::Id(ItemId(id))
    }
}

impl From<ContentItem> for ItemRef {
    fn from(item: ContentItem) -> Self {
        ItemRef::Resolved(item)
    }
}

/// State of a resolved link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    /// No valid item behind the identifier.
    Unbound,
    /// A published item with no draft copy.
    PublishedOnly,
    /// A published item and its draft copy.
    PublishedWithDraft,
}

/// The relationship between one published item and at most one draft copy.
///
/// Constructed transiently from either side of the pair; nothing is cached
/// past a single resolution.
#[derive(Debug, Clone)]
pub struct DraftLink {
    published: ContentItem,
    draft: Option<ContentItem>,
}

impl DraftLink {
    /// Resolve a link from any identifier, published or draft side.
    ///
    /// An id carrying the draft pointer is the published side; an id
    /// carrying the published pointer is the draft side and is followed back
    /// to its counterpart. A dangling pointer on either side still yields
    /// `PublishedWithDraft` so that [`DraftLink::delete`] can clean it up.
    pub async fn resolve(store: &dyn ContentStore, item: impl Into<ItemRef>) -> Result<Self> {
        let unknown = match item.into() {
            ItemRef::Id(id) => ContentItem::resolve(store, id).await?,
            ItemRef::Resolved(item) => item,
        };

        if !unknown.is_resolved() {
            return Ok(Self {
                published: ContentItem::unresolved(),
                draft: None,
            });
        }

        let draft_id = unknown.meta_id(store, DRAFT_ID_KEY).await?;
        if draft_id.is_some() {
            let draft = ContentItem::resolve(store, draft_id).await?;
            return Ok(Self {
                published: unknown,
                draft: Some(draft),
            });
        }

        let published_id = unknown.meta_id(store, PUBLISHED_ID_KEY).await?;
        if published_id.is_some() {
            let published = ContentItem::resolve(store, published_id).await?;
            return Ok(Self {
                published,
                draft: Some(unknown),
            });
        }

        Ok(Self {
            published: unknown,
            draft: None,
        })
    }

    pub fn state(&self) -> DraftState {
        if self.draft.is_some() {
            DraftState::PublishedWithDraft
        } else if self.published.is_resolved() {
            DraftState::PublishedOnly
        } else {
            DraftState::Unbound
        }
    }

    pub fn published(&self) -> &ContentItem {
        &self.published
    }

    pub fn draft(&self) -> Option<&ContentItem> {
        self.draft.as_ref()
    }

    pub fn has_draft(&self) -> bool {
        self.draft.is_some()
    }

    /// Whether the given id is the draft side of this link.
    pub fn is_draft_side(&self, id: ItemId) -> bool {
        self.draft.as_ref().is_some_and(|draft| draft.id() == id)
    }

    /// Create a draft copy of the published item.
    ///
    /// No-op (`Ok(false)`) unless the link is `PublishedOnly`. The new item
    /// starts from the published item's copyable fields with status forced
    /// to draft, receives the full metadata and taxonomy import, and is then
    /// cross-referenced with the published item.
    ///
    /// Known limitation: two concurrent creates against the same published
    /// item can both observe the unlinked state and both insert; the last
    /// writer's draft pointer wins. Deployments with concurrent editors need
    /// a store-side unique constraint on the pointer metadata or a lock
    /// around resolve-then-create.
    pub async fn create(&mut self, store: &dyn ContentStore) -> Result<bool> {
        if self.state() != DraftState::PublishedOnly {
            debug!(state = ?self.state(), "create skipped");
            return Ok(false);
        }

        let Some(record) = self.published.record() else {
            return Ok(false);
        };

        let published_id = record.id;
        let draft_id = store
            .insert(NewItem {
                content: record.content(),
                status: ItemStatus::Draft,
            })
            .await?;

        let mut draft = ContentItem::resolve(store, draft_id).await?;
        draft.import_from(store, &self.published).await?;

        store
            .replace_meta(published_id, DRAFT_ID_KEY, &[draft_id.to_string()])
            .await?;
        store
            .replace_meta(draft_id, PUBLISHED_ID_KEY, &[published_id.to_string()])
            .await?;

        info!(published = %published_id, draft = %draft_id, "created draft copy");
        self.draft = Some(draft);

        Ok(true)
    }

    /// Merge the draft back into the published item, then discard it.
    ///
    /// No-op (`Ok(false)`) unless the link is `PublishedWithDraft`. The
    /// published item's copyable fields, metadata, and term assignments are
    /// overwritten with the draft's; its status, slug, and guid stay its
    /// own. The draft item and both pointers are then removed.
    pub async fn publish(&mut self, store: &dyn ContentStore) -> Result<bool> {
        if self.state() != DraftState::PublishedWithDraft {
            debug!(state = ?self.state(), "publish skipped");
            return Ok(false);
        }

        if !self.published.is_resolved() {
            debug!("publish skipped, published side missing");
            return Ok(false);
        }

        let Some(draft) = self.draft.clone() else {
            return Ok(false);
        };

        self.published.import_from(store, &draft).await?;
        self.delete(store).await?;

        info!(published = %self.published.id(), "published draft copy");

        Ok(true)
    }

    /// Discard the draft copy and break the link.
    ///
    /// No-op (`Ok(false)`) unless the link is `PublishedWithDraft`. Both
    /// pointer entries are removed and the draft item is deleted from the
    /// store; the link transitions back to `PublishedOnly`. Works even when
    /// one side of the pair no longer loads, so an out-of-band deletion
    /// never leaves an unreclaimable pointer behind.
    pub async fn delete(&mut self, store: &dyn ContentStore) -> Result<bool> {
        if self.state() != DraftState::PublishedWithDraft {
            debug!(state = ?self.state(), "delete skipped");
            return Ok(false);
        }

        let Some(draft) = self.draft.take() else {
            return Ok(false);
        };

        let published_id = self.published.id();
        let draft_id = draft.id();

        if published_id.is_some() {
            store.unset_meta(published_id, DRAFT_ID_KEY).await?;
        }
        if draft_id.is_some() {
            store.unset_meta(draft_id, PUBLISHED_ID_KEY).await?;
            store.delete(draft_id).await?;
        }

        info!(published = %published_id, draft = %draft_id, "deleted draft copy");

        Ok(true)
    }
}
