//! Access gate for draft actions.
//!
//! The workflow consumes authorization as a single opaque predicate; what
//! grants or denies it is host policy.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::ItemRecord;

/// The acting user, as supplied by the host per request.
#[derive(Debug, Clone, Default)]
pub struct ActorContext {
    pub user_id: i64,
    pub is_admin: bool,
    pub permissions: HashSet<String>,
}

impl ActorContext {
    /// An administrator context.
    pub fn admin(user_id: i64) -> Self {
        Self {
            user_id,
            is_admin: true,
            permissions: HashSet::new(),
        }
    }

    /// A non-admin context holding a single permission.
    pub fn with_permission(user_id: i64, permission: &str) -> Self {
        Self {
            user_id,
            is_admin: false,
            permissions: HashSet::from([permission.to_string()]),
        }
    }
}

/// Whether an actor may run draft actions against an item.
#[async_trait]
pub trait AccessPolicy: Send + Sync {
    async fn can_act_on(&self, actor: &ActorContext, item: &ItemRecord) -> Result<bool>;
}

/// Grants when the actor is an administrator or holds a named permission.
#[derive(Debug, Clone)]
pub struct PermissionPolicy {
    permission: String,
}

impl PermissionPolicy {
    /// Permission checked when none is configured.
    pub const DEFAULT_PERMISSION: &'static str = "edit content";

    pub fn new(permission: impl Into<String>) -> Self {
        Self {
            permission: permission.into(),
        }
    }
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PERMISSION)
    }
}

#[async_trait]
impl AccessPolicy for PermissionPolicy {
    async fn can_act_on(&self, actor: &ActorContext, _item: &ItemRecord) -> Result<bool> {
        // Admins always pass.
        if actor.is_admin {
            return Ok(true);
        }

        Ok(actor.permissions.contains(&self.permission))
    }
}
