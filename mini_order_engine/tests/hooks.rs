use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
    Mutex,
};

use log::*;
use mini_order_engine::{
    events::{EventHandlers, EventHooks, Notification},
    order_objects::NewOrderRequest,
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path, tear_down},
        seed::{seed_menu_item, seed_user},
    },
    OrderFlowApi,
    SqliteDatabase,
    StoreApi,
};

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl HookCalled {
    pub fn called(&self, notifications: Vec<Notification>) {
        let _ = self.called.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut n) = self.notifications.lock() {
            n.extend(notifications);
        }
    }

    pub fn count(&self) -> i32 {
        self.called.load(Ordering::SeqCst)
    }

    pub fn messages_for(&self, user_id: i64) -> Vec<String> {
        let n = self.notifications.lock().unwrap();
        n.iter().filter(|n| n.user_id == user_id).map(|n| n.message.clone()).collect()
    }
}

async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

#[tokio::test]
async fn order_hooks_notify_owner_and_buyer() {
    let db = setup().await;
    let created = HookCalled::default();
    let changed = HookCalled::default();
    let mut hooks = EventHooks::default();
    let c = created.clone();
    hooks.on_order_created(move |ev| {
        info!("🪝️ {ev:?}");
        c.called(ev.notifications());
        Box::pin(async {})
    });
    let c = changed.clone();
    hooks.on_order_status_changed(move |ev| {
        c.called(ev.notifications());
        Box::pin(async {})
    });
    let mut handlers = EventHandlers::new(10, hooks);
    let api = OrderFlowApi::new(db.clone(), handlers.producers());

    let (alice, _) = seed_user(&db, "Alice", 10_000).await;
    let (bob, bobs_store) = seed_user(&db, "Bob", 0).await;
    let tea = seed_menu_item(&db, bobs_store.id, "Tea", 450).await;
    let first = api.create_order(alice.id, NewOrderRequest::new(bobs_store.id).with_item(tea.id, 2)).await.unwrap();
    api.create_order(alice.id, NewOrderRequest::new(bobs_store.id).with_item(tea.id, 1)).await.unwrap();
    api.update_order_status(bob.id, first.order.id, "completed").await.unwrap();
    // A failed update publishes nothing
    assert!(api.update_order_status(bob.id, first.order.id, "pending").await.is_err());
    drop(api);

    handlers.on_order_created.take().unwrap().start_handler().await;
    handlers.on_order_status_changed.take().unwrap().start_handler().await;
    assert_eq!(created.count(), 2);
    assert_eq!(changed.count(), 1);
    let to_bob = created.messages_for(bob.id);
    assert_eq!(to_bob[0], format!("New order {} from Alice for 9.00 CNY", first.order.id));
    assert_eq!(changed.messages_for(alice.id), vec![format!(
        "Your order {} status has been updated to completed",
        first.order.id
    )]);
    tear_down(db).await;
}

#[tokio::test]
async fn membership_hooks_notify_both_parties() {
    let db = setup().await;
    let updated = HookCalled::default();
    let mut hooks = EventHooks::default();
    let c = updated.clone();
    hooks.on_membership_updated(move |ev| {
        c.called(ev.notifications());
        Box::pin(async {})
    });
    let mut handlers = EventHandlers::new(10, hooks);
    let api = StoreApi::new(db.clone(), handlers.producers());
    let (alice, _) = seed_user(&db, "Alice", 0).await;
    let (bob, bobs_store) = seed_user(&db, "Bob", 0).await;

    // Asking to join does not notify anyone
    api.request_join(alice.id, bobs_store.id).await.unwrap();
    api.update_membership(bob.id, bobs_store.id, alice.id, true).await.unwrap();
    drop(api);
    handlers.on_membership_updated.take().unwrap().start_handler().await;

    assert_eq!(updated.count(), 1);
    assert_eq!(updated.messages_for(alice.id), vec![format!(
        "Your request to join store {} was accepted",
        bobs_store.id
    )]);
    assert_eq!(updated.messages_for(bob.id), vec![format!("User {} has joined your store", alice.id)]);
    tear_down(db).await;
}
