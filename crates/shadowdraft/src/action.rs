//! Draft actions and the external dispatch boundary.
//!
//! External triggers (admin links, host hooks) arrive as an action name plus
//! an item identifier. The controller validates the name, resolves the link,
//! gates on the access policy, runs the matching [`DraftLink`] operation,
//! and hands back a redirect target for the host presentation layer to act
//! on. It never performs the redirect itself.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::draft::{DraftLink, DraftState, ItemRef};
use crate::models::ItemId;
use crate::permissions::{AccessPolicy, ActorContext};
use crate::store::ContentStore;

/// An action that can be triggered against a draft link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftAction {
    Create,
    Publish,
    Delete,
}

impl DraftAction {
    pub const ALL: [DraftAction; 3] = [
        DraftAction::Create,
        DraftAction::Publish,
        DraftAction::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DraftAction::Create => "create",
            DraftAction::Publish => "publish",
            DraftAction::Delete => "delete",
        }
    }
}

impl fmt::Display for DraftAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown action name at the dispatch boundary.
#[derive(Debug, Error)]
#[error("unknown draft action: {0}")]
pub struct InvalidAction(String);

impl FromStr for DraftAction {
    type Err = InvalidAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(DraftAction::Create),
            "publish" => Ok(DraftAction::Publish),
            "delete" => Ok(DraftAction::Delete),
            other => Err(InvalidAction(other.to_string())),
        }
    }
}

/// Outcome of a dispatched action.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// Whether an operation actually ran.
    pub performed: bool,

    /// Where the host should send the user next, when one applies.
    pub redirect: Option<Url>,
}

impl Dispatch {
    fn rejected() -> Self {
        Self {
            performed: false,
            redirect: None,
        }
    }
}

/// Entry point for externally triggered draft actions.
pub struct Controller {
    store: Arc<dyn ContentStore>,
    policy: Arc<dyn AccessPolicy>,
    config: Config,
}

impl Controller {
    pub fn new(store: Arc<dyn ContentStore>, policy: Arc<dyn AccessPolicy>, config: Config) -> Self {
        Self {
            store,
            policy,
            config,
        }
    }

    /// Build the trigger URL for an action name.
    ///
    /// `None` when the name is not a recognized action or the id is unbound.
    pub fn action_url(&self, action: &str, id: ItemId) -> Option<Url> {
        let action: DraftAction = action.parse().ok()?;
        if id.is_none() {
            return None;
        }

        Some(self.url_for(action, id))
    }

    /// The trigger URL for a known action.
    pub fn url_for(&self, action: DraftAction, id: ItemId) -> Url {
        let mut url = self.config.admin_url.clone();
        url.query_pairs_mut()
            .append_pair(&self.config.action_param, action.as_str())
            .append_pair(&self.config.item_param, &id.to_string());

        url
    }

    /// Edit view of an item in the host admin interface.
    pub fn edit_url(&self, id: ItemId) -> Url {
        let mut url = self.config.admin_url.clone();
        let id = id.to_string();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["content", id.as_str(), "edit"]);
        }

        url
    }

    /// Dispatch an externally supplied action name.
    ///
    /// Unknown names are rejected before any store access.
    pub async fn dispatch(
        &self,
        actor: &ActorContext,
        action: &str,
        item: impl Into<ItemRef>,
    ) -> Result<Dispatch> {
        let Ok(parsed) = action.parse::<DraftAction>() else {
            debug!(action = %action, "rejected unknown draft action");
            return Ok(Dispatch::rejected());
        };

        self.dispatch_action(actor, parsed, item).await
    }

    /// Dispatch a known action.
    ///
    /// Re-running the same action is idempotent: a second `create` against a
    /// linked item or a `publish`/`delete` with no draft is a no-op with
    /// `performed: false`.
    pub async fn dispatch_action(
        &self,
        actor: &ActorContext,
        action: DraftAction,
        item: impl Into<ItemRef>,
    ) -> Result<Dispatch> {
        let mut link = DraftLink::resolve(self.store.as_ref(), item).await?;
        if link.state() == DraftState::Unbound {
            debug!(action = %action, "draft action against unknown item");
            return Ok(Dispatch::rejected());
        }

        let Some(record) = link.published().record().cloned() else {
            return Ok(Dispatch::rejected());
        };

        if !self.policy.can_act_on(actor, &record).await? {
            warn!(
                user = actor.user_id,
                item = %record.id,
                action = %action,
                "draft action denied"
            );
            return Ok(Dispatch::rejected());
        }

        if action == DraftAction::Create && !self.config.is_draftable(&record.item_type) {
            debug!(item_type = %record.item_type, "item type is not draftable");
            return Ok(Dispatch::rejected());
        }

        let store = self.store.as_ref();
        let performed = match action {
            DraftAction::Create => link.create(store).await?,
            DraftAction::Publish => link.publish(store).await?,
            DraftAction::Delete => link.delete(store).await?,
        };

        if !performed {
            return Ok(Dispatch::rejected());
        }

        let redirect = match action {
            DraftAction::Create => link.draft().map(|draft| self.edit_url(draft.id())),
            DraftAction::Publish | DraftAction::Delete => Some(self.edit_url(record.id)),
        };

        Ok(Dispatch {
            performed: true,
            redirect,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::permissions::PermissionPolicy;
    use crate::store::MemoryStore;

    fn controller() -> Controller {
        Controller::new(
            Arc::new(MemoryStore::new()),
            Arc::new(PermissionPolicy::default()),
            Config::new(Url::parse("http://localhost:3000/admin").unwrap()),
        )
    }

    #[test]
    fn action_names_round_trip() {
        for action in DraftAction::ALL {
            let parsed: DraftAction = action.as_str().parse().unwrap();
            assert_eq!(parsed, action);
        }
        assert!("archive".parse::<DraftAction>().is_err());
    }

    #[test]
    fn action_url_rejects_unknown_and_unbound() {
        let controller = controller();
        assert!(controller.action_url("archive", ItemId(4)).is_none());
        assert!(controller.action_url("create", ItemId::NONE).is_none());
    }

    #[test]
    fn action_url_carries_query_parameters() {
        let controller = controller();
        let url = controller.action_url("publish", ItemId(12)).unwrap();

        assert_eq!(url.path(), "/admin");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("shadowdraft_action".to_string(), "publish".to_string())));
        assert!(pairs.contains(&("shadowdraft_item".to_string(), "12".to_string())));
    }

    #[test]
    fn edit_url_addresses_the_item() {
        let controller = controller();
        assert_eq!(
            controller.edit_url(ItemId(7)).as_str(),
            "http://localhost:3000/admin/content/7/edit"
        );
    }
}
