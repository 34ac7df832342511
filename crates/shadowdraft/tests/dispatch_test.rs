//! Integration tests for action dispatch and the host lifecycle guards.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use url::Url;

use shadowdraft::merge::metadata::DRAFT_ID_KEY;
use shadowdraft::models::{ItemId, ItemStatus};
use shadowdraft::store::{ItemStore, MemoryStore, MetadataStore};
use shadowdraft::{
    ActorContext, Config, Controller, DraftAction, DraftLink, DraftState, PermissionPolicy,
    PublishGuard,
};
use shadowdraft_test_utils::{AllowAll, ItemFixture, editor};

fn test_config() -> Config {
    Config::new(Url::parse("http://localhost:3000/admin").unwrap())
}

async fn seeded() -> (Arc<MemoryStore>, ItemId) {
    shadowdraft_test_utils::init_tracing();

    let store = Arc::new(MemoryStore::new());
    let published = ItemFixture::new("article", "Launch Post")
        .body("first version")
        .insert(store.as_ref())
        .await
        .unwrap();

    (store, published)
}

fn controller(store: Arc<MemoryStore>) -> Controller {
    Controller::new(store, Arc::new(AllowAll), test_config())
}

#[tokio::test]
async fn unknown_action_is_rejected_without_store_access() {
    let (store, published) = seeded().await;
    let controller = controller(store.clone());

    let outcome = controller
        .dispatch(&editor(), "archive", published)
        .await
        .unwrap();

    assert!(!outcome.performed);
    assert!(outcome.redirect.is_none());
    assert_eq!(store.item_count(), 1);
    assert!(store.all_meta(published).await.unwrap().is_empty());
}

#[tokio::test]
async fn create_redirects_to_the_draft_edit_view() {
    let (store, published) = seeded().await;
    let controller = controller(store.clone());

    let outcome = controller
        .dispatch(&editor(), "create", published)
        .await
        .unwrap();
    assert!(outcome.performed);

    let link = DraftLink::resolve(store.as_ref(), published).await.unwrap();
    let draft_id = link.draft().unwrap().id();
    assert_eq!(
        outcome.redirect.unwrap().as_str(),
        format!("http://localhost:3000/admin/content/{draft_id}/edit")
    );
}

#[tokio::test]
async fn publish_and_delete_redirect_to_the_published_edit_view() {
    let (store, published) = seeded().await;
    let controller = controller(store.clone());
    let expected = format!("http://localhost:3000/admin/content/{published}/edit");

    controller
        .dispatch(&editor(), "create", published)
        .await
        .unwrap();
    let outcome = controller
        .dispatch(&editor(), "publish", published)
        .await
        .unwrap();
    assert!(outcome.performed);
    assert_eq!(outcome.redirect.unwrap().as_str(), expected);

    controller
        .dispatch(&editor(), "create", published)
        .await
        .unwrap();
    let outcome = controller
        .dispatch_action(&editor(), DraftAction::Delete, published)
        .await
        .unwrap();
    assert!(outcome.performed);
    assert_eq!(outcome.redirect.unwrap().as_str(), expected);
}

#[tokio::test]
async fn repeated_actions_are_noops() {
    let (store, published) = seeded().await;
    let controller = controller(store.clone());

    assert!(
        controller
            .dispatch(&editor(), "create", published)
            .await
            .unwrap()
            .performed
    );
    let second = controller
        .dispatch(&editor(), "create", published)
        .await
        .unwrap();
    assert!(!second.performed);
    assert!(second.redirect.is_none());
    assert_eq!(store.item_count(), 2);

    assert!(
        controller
            .dispatch(&editor(), "delete", published)
            .await
            .unwrap()
            .performed
    );
    assert!(
        !controller
            .dispatch(&editor(), "delete", published)
            .await
            .unwrap()
            .performed
    );
}

#[tokio::test]
async fn dispatch_against_unknown_item_is_rejected() {
    let (store, _) = seeded().await;
    let controller = controller(store.clone());

    let outcome = controller
        .dispatch(&editor(), "create", ItemId(999))
        .await
        .unwrap();
    assert!(!outcome.performed);
    assert_eq!(store.item_count(), 1);
}

#[tokio::test]
async fn access_policy_gates_dispatch() {
    let (store, published) = seeded().await;
    let controller = Controller::new(
        store.clone(),
        Arc::new(PermissionPolicy::default()),
        test_config(),
    );

    let viewer = ActorContext::with_permission(9, "view content");
    let outcome = controller
        .dispatch(&viewer, "create", published)
        .await
        .unwrap();
    assert!(!outcome.performed);
    assert_eq!(store.item_count(), 1);

    // The default edit permission passes.
    let outcome = controller
        .dispatch(&editor(), "create", published)
        .await
        .unwrap();
    assert!(outcome.performed);
}

#[tokio::test]
async fn draftable_type_filter_blocks_create() {
    let (store, published) = seeded().await;
    let mut config = test_config();
    config.draftable_types = Some(vec!["page".to_string()]);
    let controller = Controller::new(store.clone(), Arc::new(AllowAll), config);

    let outcome = controller
        .dispatch(&editor(), "create", published)
        .await
        .unwrap();
    assert!(!outcome.performed);
    assert_eq!(store.item_count(), 1);
}

#[tokio::test]
async fn guard_reverts_direct_publish_of_a_draft() {
    let (store, published) = seeded().await;
    let controller = controller(store.clone());
    controller
        .dispatch(&editor(), "create", published)
        .await
        .unwrap();
    let link = DraftLink::resolve(store.as_ref(), published).await.unwrap();
    let draft_id = link.draft().unwrap().id();

    // The host tries to flip the draft copy live.
    store
        .set_status(draft_id, ItemStatus::Published)
        .await
        .unwrap();
    let guard = PublishGuard::new(store.clone());
    let blocked = guard
        .intercept_status_change(draft_id, ItemStatus::Published)
        .await
        .unwrap()
        .expect("transition must be blocked");

    assert_eq!(blocked.draft, draft_id);
    assert_eq!(blocked.published, published);
    assert!(!blocked.message.is_empty());

    let record = store.load(draft_id).await.unwrap().unwrap();
    assert_eq!(record.status, ItemStatus::Draft, "status must be reverted");

    // A draft-to-draft transition and ordinary items pass through.
    assert!(
        guard
            .intercept_status_change(draft_id, ItemStatus::Draft)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        guard
            .intercept_status_change(published, ItemStatus::Published)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        guard
            .intercept_status_change(ItemId(404), ItemStatus::Published)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn deletion_hook_tears_down_the_link() {
    let (store, published) = seeded().await;
    let controller = controller(store.clone());
    controller
        .dispatch(&editor(), "create", published)
        .await
        .unwrap();
    let link = DraftLink::resolve(store.as_ref(), published).await.unwrap();
    let draft_id = link.draft().unwrap().id();

    let guard = PublishGuard::new(store.clone());
    assert!(guard.on_item_deleted(published).await.unwrap());

    assert!(store.load(draft_id).await.unwrap().is_none());
    assert!(
        store
            .first_meta(published, DRAFT_ID_KEY)
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(
        DraftLink::resolve(store.as_ref(), published)
            .await
            .unwrap()
            .state(),
        DraftState::PublishedOnly
    );

    // Nothing left to tear down.
    assert!(!guard.on_item_deleted(published).await.unwrap());
}

#[tokio::test]
async fn deletion_hook_cleans_up_a_dangling_published_side() {
    let (store, published) = seeded().await;
    let controller = controller(store.clone());
    controller
        .dispatch(&editor(), "create", published)
        .await
        .unwrap();
    let link = DraftLink::resolve(store.as_ref(), published).await.unwrap();
    let draft_id = link.draft().unwrap().id();

    // The published row was removed without the hook ever firing for it.
    store.delete(published).await.unwrap();

    let guard = PublishGuard::new(store.clone());
    assert!(guard.on_item_deleted(draft_id).await.unwrap());
    assert!(store.load(draft_id).await.unwrap().is_none());
}
