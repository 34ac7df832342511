//! Host lifecycle guard rails.
//!
//! Two hooks the host wires into its own content lifecycle: a draft copy
//! must never reach a non-draft status except through
//! [`DraftLink::publish`], and deleting either side of a linked pair must
//! not leave an orphaned pointer behind.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::content::ContentItem;
use crate::draft::{DraftLink, DraftState};
use crate::merge::metadata::PUBLISHED_ID_KEY;
use crate::models::{ItemId, ItemStatus};
use crate::store::ContentStore;

/// Notice returned when a direct publish of a draft copy was blocked.
///
/// The workflow reverts the stored status itself; the message is for the
/// host presentation layer to render.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishBlocked {
    /// The draft copy whose transition was blocked.
    pub draft: ItemId,

    /// Its published counterpart.
    pub published: ItemId,

    /// Explanation for the user.
    pub message: String,
}

/// Guard service for host lifecycle hooks.
pub struct PublishGuard {
    store: Arc<dyn ContentStore>,
}

impl PublishGuard {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Hook for status transitions.
    ///
    /// When the transitioning item is the draft side of a link and the new
    /// status is anything but draft, the stored status is reverted to draft
    /// and the returned notice tells the host what happened. `None` means
    /// the transition is allowed to stand.
    pub async fn intercept_status_change(
        &self,
        id: ItemId,
        new_status: ItemStatus,
    ) -> Result<Option<PublishBlocked>> {
        if new_status.is_draft() {
            return Ok(None);
        }

        let store = self.store.as_ref();
        let item = ContentItem::resolve(store, id).await?;
        let published = item.meta_id(store, PUBLISHED_ID_KEY).await?;
        if published.is_none() {
            return Ok(None);
        }

        store.set_status(id, ItemStatus::Draft).await?;
        warn!(
            draft = %id,
            published = %published,
            status = %new_status,
            "blocked direct publish of a draft copy"
        );

        Ok(Some(PublishBlocked {
            draft: id,
            published,
            message: format!(
                "This item is the working draft of item {published}. \
                 To make its changes live, publish the draft from the \
                 published item's draft controls."
            ),
        }))
    }

    /// Hook for item deletion or trashing.
    ///
    /// Resolves the link for the removed item and tears down the draft and
    /// both pointer entries so no orphaned link survives. Returns whether a
    /// link existed.
    pub async fn on_item_deleted(&self, id: ItemId) -> Result<bool> {
        let store = self.store.as_ref();
        let mut link = DraftLink::resolve(store, id).await?;
        if link.state() != DraftState::PublishedWithDraft {
            return Ok(false);
        }

        let removed = link.delete(store).await?;
        if removed {
            info!(item = %id, "tore down draft link for removed item");
        }

        Ok(removed)
    }
}
