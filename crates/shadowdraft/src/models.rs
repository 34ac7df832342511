//! Item records and value types.
//!
//! An item is one addressable content record in the host store. The record
//! splits into copyable content fields (`ItemContent`) and system-owned
//! fields (identifier, status, slug, guid, timestamps) that must never be
//! copied onto another item.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// Item metadata: multi-valued per key, ordered keys.
pub type MetaMap = BTreeMap<String, Vec<String>>;

/// Store-assigned item identifier.
///
/// Zero is the "no item" sentinel: an unresolved item carries `ItemId::NONE`
/// and every mutating operation against it is a no-op.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    /// The "no item" sentinel.
    pub const NONE: ItemId = ItemId(0);

    /// True when this id does not refer to any item.
    pub fn is_none(self) -> bool {
        self.0 <= 0
    }

    /// True when this id refers to a stored item.
    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        ItemId(value)
    }
}

impl FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ItemId(s.parse()?))
    }
}

/// Publication status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Published,
    Draft,
    Pending,
    Private,
    Trash,
}

impl ItemStatus {
    /// Canonical lowercase string form, as stored.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Published => "published",
            ItemStatus::Draft => "draft",
            ItemStatus::Pending => "pending",
            ItemStatus::Private => "private",
            ItemStatus::Trash => "trash",
        }
    }

    pub fn is_draft(self) -> bool {
        self == ItemStatus::Draft
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ItemStatus {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for ItemStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(ItemStatus::Published),
            "draft" => Ok(ItemStatus::Draft),
            "pending" => Ok(ItemStatus::Pending),
            "private" => Ok(ItemStatus::Private),
            "trash" => Ok(ItemStatus::Trash),
            other => Err(anyhow!("unknown item status: {other}")),
        }
    }
}

/// Whether comments or pings are accepted on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentPolicy {
    Open,
    Closed,
}

impl CommentPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            CommentPolicy::Open => "open",
            CommentPolicy::Closed => "closed",
        }
    }
}

impl fmt::Display for CommentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for CommentPolicy {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "open" => Ok(CommentPolicy::Open),
            "closed" => Ok(CommentPolicy::Closed),
            other => Err(anyhow!("unknown comment policy: {other}")),
        }
    }
}

/// The copyable content fields of an item.
///
/// Everything here may be merged from one item onto another. The system
/// fields a merge must never touch (id, status, slug, guid, timestamps) live
/// only on [`ItemRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemContent {
    /// Content type machine name.
    #[serde(rename = "type")]
    pub item_type: String,

    /// Item title.
    pub title: String,

    /// Main body text.
    pub body: String,

    /// Short summary.
    pub excerpt: String,

    /// Author user ID.
    pub author_id: i64,

    /// Whether comments are accepted.
    pub comment_policy: CommentPolicy,

    /// Whether pings/trackbacks are accepted.
    pub ping_policy: CommentPolicy,

    /// Optional view password.
    pub password: Option<String>,

    /// Parent item, for hierarchical types.
    pub parent_id: Option<ItemId>,

    /// Manual ordering index within lists.
    pub sort_order: i32,

    /// Additional dynamic fields (JSON object).
    pub extra: serde_json::Value,
}

impl Default for ItemContent {
    fn default() -> Self {
        Self {
            item_type: "page".to_string(),
            title: String::new(),
            body: String::new(),
            excerpt: String::new(),
            author_id: 0,
            comment_policy: CommentPolicy::Closed,
            ping_policy: CommentPolicy::Closed,
            password: None,
            parent_id: None,
            sort_order: 0,
            extra: serde_json::json!({}),
        }
    }
}

/// A full stored item row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ItemRecord {
    /// Unique identifier.
    pub id: ItemId,

    /// Content type machine name.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub item_type: String,

    /// Item title.
    pub title: String,

    /// Main body text.
    pub body: String,

    /// Short summary.
    pub excerpt: String,

    /// Author user ID.
    pub author_id: i64,

    /// Publication status.
    #[sqlx(try_from = "String")]
    pub status: ItemStatus,

    /// Whether comments are accepted.
    #[sqlx(try_from = "String")]
    pub comment_policy: CommentPolicy,

    /// Whether pings/trackbacks are accepted.
    #[sqlx(try_from = "String")]
    pub ping_policy: CommentPolicy,

    /// Optional view password.
    pub password: Option<String>,

    /// Parent item, for hierarchical types.
    pub parent_id: Option<ItemId>,

    /// Manual ordering index within lists.
    pub sort_order: i32,

    /// Additional dynamic fields (JSON object).
    pub extra: serde_json::Value,

    /// URL slug. Unique, store-owned.
    pub slug: String,

    /// Globally unique identifier. Store-owned.
    pub guid: String,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

impl ItemRecord {
    /// The copyable content fields, safe to merge onto another item.
    ///
    /// The identifier, status, slug, guid, and timestamps are deliberately
    /// not part of the result: those fields are unique or store-owned.
    pub fn content(&self) -> ItemContent {
        ItemContent {
            item_type: self.item_type.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            excerpt: self.excerpt.clone(),
            author_id: self.author_id,
            comment_policy: self.comment_policy,
            ping_policy: self.ping_policy,
            password: self.password.clone(),
            parent_id: self.parent_id,
            sort_order: self.sort_order,
            extra: self.extra.clone(),
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == ItemStatus::Published
    }
}

/// Input for inserting a new item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub content: ItemContent,
    pub status: ItemStatus,
}
