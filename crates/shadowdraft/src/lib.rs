//! Shadow draft workflow for content items.
//!
//! A published content item can have at most one unpublished working copy
//! (its "draft"). The pair is linked through two cross-referencing metadata
//! entries; publishing merges the draft's fields, metadata, and taxonomy
//! terms back into the published item and discards the draft. A guard hook
//! keeps the host publication workflow from publishing the draft copy
//! directly.
//!
//! The host CMS is an external collaborator reached through the [`store`]
//! traits; nothing here renders UI or performs redirects. Dispatch returns
//! the redirect target for the host to act on.

pub mod action;
pub mod config;
pub mod content;
pub mod draft;
pub mod guard;
pub mod merge;
pub mod models;
pub mod permissions;
pub mod store;

pub use action::{Controller, Dispatch, DraftAction, InvalidAction};
pub use config::Config;
pub use content::ContentItem;
pub use draft::{DraftLink, DraftState, ItemRef};
pub use guard::{PublishBlocked, PublishGuard};
pub use models::{
    CommentPolicy, ItemContent, ItemId, ItemRecord, ItemStatus, MetaMap, NewItem,
};
pub use permissions::{AccessPolicy, ActorContext, PermissionPolicy};
pub use store::{
    ContentStore, ItemStore, MemoryStore, MetadataStore, PgStore, TermStore, connect_pool,
};
