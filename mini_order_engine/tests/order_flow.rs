use log::*;
use mini_order_engine::{
    db_types::{Cents, OrderStatusType, TransactionType},
    events::EventProducers,
    order_objects::NewOrderRequest,
    query_objects::{OrderQueryFilter, Pagination},
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path, tear_down},
        seed::{seed_menu_item, seed_user},
    },
    traits::{AccountManagement, OrderManagement},
    EngineError,
    OrderFlowApi,
    SqliteDatabase,
};

async fn setup() -> OrderFlowApi<SqliteDatabase> {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    OrderFlowApi::new(db, EventProducers::default())
}

fn first_page() -> Pagination {
    Pagination::new(None, None).unwrap()
}

#[tokio::test]
async fn placing_an_order_moves_money_from_buyer_to_owner() {
    let api = setup().await;
    let db = api.db().clone();
    let (alice, _) = seed_user(&db, "Alice", 10_000).await;
    let (bob, bobs_store) = seed_user(&db, "Bob", 0).await;
    let noodles = seed_menu_item(&db, bobs_store.id, "Noodles", 3_000).await;

    let request = NewOrderRequest::new(bobs_store.id).with_item(noodles.id, 2);
    let order = api.create_order(alice.id, request).await.expect("Order should succeed");
    assert_eq!(order.order.total_price, Cents::from(6_000));
    assert_eq!(order.order.status, OrderStatusType::Pending);
    assert_eq!(order.buyer_name, "Alice");
    assert_eq!(order.store_owner_id, bob.id);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].unit_price, Cents::from(3_000));
    assert_eq!(order.items[0].quantity, 2);

    assert_eq!(db.fetch_balance(alice.id).await.unwrap(), Some(Cents::from(4_000)));
    assert_eq!(db.fetch_balance(bob.id).await.unwrap(), Some(Cents::from(6_000)));

    let alice_ledger = db.fetch_balance_transactions(alice.id, first_page()).await.unwrap();
    let debits = alice_ledger.items.iter().filter(|t| t.transaction_type == TransactionType::Debit).collect::<Vec<_>>();
    assert_eq!(debits.len(), 1);
    assert_eq!(debits[0].amount, Cents::from(6_000));
    assert_eq!(debits[0].order_id, Some(order.order.id));
    let bob_ledger = db.fetch_balance_transactions(bob.id, first_page()).await.unwrap();
    assert_eq!(bob_ledger.total, 1);
    assert_eq!(bob_ledger.items[0].transaction_type, TransactionType::Credit);
    assert_eq!(bob_ledger.items[0].amount, Cents::from(6_000));

    let fetched = api.order_for_user(alice.id, order.order.id).await.unwrap();
    assert_eq!(fetched, order);
    tear_down(db).await;
}

#[tokio::test]
async fn insufficient_balance_leaves_everything_untouched() {
    let api = setup().await;
    let db = api.db().clone();
    let (alice, _) = seed_user(&db, "Alice", 1_000).await;
    let (bob, bobs_store) = seed_user(&db, "Bob", 0).await;
    let noodles = seed_menu_item(&db, bobs_store.id, "Noodles", 3_000).await;

    let err = api.create_order(alice.id, NewOrderRequest::new(bobs_store.id).with_item(noodles.id, 1)).await.unwrap_err();
    assert_eq!(err, EngineError::InsufficientBalance { required: Cents::from(3_000), available: Cents::from(1_000) });
    assert_eq!(db.fetch_balance(alice.id).await.unwrap(), Some(Cents::from(1_000)));
    assert_eq!(db.fetch_balance(bob.id).await.unwrap(), Some(Cents::from(0)));
    let orders = api.orders_for_buyer(alice.id, OrderQueryFilter::default(), first_page()).await.unwrap();
    assert_eq!(orders.total, 0);
    tear_down(db).await;
}

#[tokio::test]
async fn invalid_orders_are_rejected() {
    let api = setup().await;
    let db = api.db().clone();
    let (alice, alices_store) = seed_user(&db, "Alice", 10_000).await;
    let (_, bobs_store) = seed_user(&db, "Bob", 0).await;
    let noodles = seed_menu_item(&db, bobs_store.id, "Noodles", 3_000).await;
    let cake = seed_menu_item(&db, alices_store.id, "Cake", 500).await;

    let err = api.create_order(alice.id, NewOrderRequest::new(bobs_store.id)).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)), "{err}");

    let err = api.create_order(alice.id, NewOrderRequest::new(bobs_store.id).with_item(noodles.id, 0)).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)), "{err}");

    let request = NewOrderRequest::new(bobs_store.id).with_item(noodles.id, 1).with_item(9_999, 1);
    let err = api.create_order(alice.id, request).await.unwrap_err();
    assert_eq!(err, EngineError::NotFound("Menu item #9999".into()));

    let request = NewOrderRequest::new(bobs_store.id).with_item(cake.id, 1);
    let err = api.create_order(alice.id, request).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)), "{err}");

    assert_eq!(db.fetch_balance(alice.id).await.unwrap(), Some(Cents::from(10_000)));
    tear_down(db).await;
}

#[tokio::test]
async fn orders_for_an_unknown_store_are_not_found() {
    let api = setup().await;
    let db = api.db().clone();
    let (alice, _) = seed_user(&db, "Alice", 10_000).await;
    let (bob, bobs_store) = seed_user(&db, "Bob", 0).await;
    let noodles = seed_menu_item(&db, bobs_store.id, "Noodles", 3_000).await;

    let err = api.create_order(alice.id, NewOrderRequest::new(9_999).with_item(noodles.id, 1)).await.unwrap_err();
    assert_eq!(err, EngineError::NotFound("Store #9999".into()));
    assert_eq!(db.fetch_balance(alice.id).await.unwrap(), Some(Cents::from(10_000)));
    assert_eq!(db.fetch_balance(bob.id).await.unwrap(), Some(Cents::from(0)));
    let ledger = db.fetch_balance_transactions(alice.id, first_page()).await.unwrap();
    assert!(ledger.items.iter().all(|t| t.order_id.is_none()));
    let orders = api.orders_for_buyer(alice.id, OrderQueryFilter::default(), first_page()).await.unwrap();
    assert_eq!(orders.total, 0);
    tear_down(db).await;
}

/// Uses a single pool opened the way the server opens it, so every read shares connections with the preceding writes.
#[tokio::test]
async fn writes_are_visible_to_the_next_read_on_a_shared_pool() {
    let _ = env_logger::try_init();
    let url = random_db_path();
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    db.migrate().await.expect("Error running DB migrations");
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());
    for run in 0..30 {
        let (buyer, _) = seed_user(&db, &format!("Buyer {run}"), 10_000).await;
        let (owner, store) = seed_user(&db, &format!("Owner {run}"), 0).await;
        let tea = seed_menu_item(&db, store.id, "Tea", 450).await;
        let prices = db.fetch_menu_prices(&[tea.id]).await.unwrap();
        assert_eq!(prices.len(), 1, "Run {run}: menu item #{} missing from the price lookup", tea.id);

        let order = api.create_order(buyer.id, NewOrderRequest::new(store.id).with_item(tea.id, 1)).await.unwrap();
        api.update_order_status(owner.id, order.order.id, "completed").await.unwrap();
        for _ in 0..5 {
            let fetched = db.fetch_order(order.order.id).await.unwrap().expect("Order should exist");
            assert_eq!(fetched.order.status, OrderStatusType::Completed, "Run {run}: stale status read");
        }
        assert_eq!(db.fetch_balance(owner.id).await.unwrap(), Some(Cents::from(450)));
    }
    debug!("🚀️ 30 order round trips read back their own writes");
    tear_down(db).await;
}

#[tokio::test]
async fn order_status_lifecycle() {
    let api = setup().await;
    let db = api.db().clone();
    let (alice, _) = seed_user(&db, "Alice", 10_000).await;
    let (bob, bobs_store) = seed_user(&db, "Bob", 0).await;
    let (carol, _) = seed_user(&db, "Carol", 0).await;
    let tea = seed_menu_item(&db, bobs_store.id, "Tea", 450).await;
    let new_order = || NewOrderRequest::new(bobs_store.id).with_item(tea.id, 1);

    let first = api.create_order(alice.id, new_order()).await.unwrap().order;
    // Strangers may not touch the order, and the buyer may not complete it
    let err = api.update_order_status(carol.id, first.id, "completed").await.unwrap_err();
    assert!(matches!(err, EngineError::Authorization(_)));
    let err = api.update_order_status(alice.id, first.id, "completed").await.unwrap_err();
    assert!(matches!(err, EngineError::Authorization(_)));

    let err = api.update_order_status(bob.id, first.id, "shipped").await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    let err = api.update_order_status(bob.id, first.id, "pending").await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let updated = api.update_order_status(bob.id, first.id, "processing").await.unwrap();
    assert_eq!(updated.status, OrderStatusType::Processing);
    // The buyer can only cancel while the order is pending
    let err = api.update_order_status(alice.id, first.id, "cancelled").await.unwrap_err();
    assert!(matches!(err, EngineError::Authorization(_)));
    let updated = api.update_order_status(bob.id, first.id, "Completed").await.unwrap();
    assert_eq!(updated.status, OrderStatusType::Completed);
    let err = api.update_order_status(bob.id, first.id, "cancelled").await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let second = api.create_order(alice.id, new_order()).await.unwrap().order;
    let updated = api.update_order_status(alice.id, second.id, "cancelled").await.unwrap();
    assert_eq!(updated.status, OrderStatusType::Cancelled);

    let err = api.update_order_status(bob.id, 12_345, "completed").await.unwrap_err();
    assert_eq!(err, EngineError::NotFound("Order #12345".into()));
    tear_down(db).await;
}

#[tokio::test]
async fn only_the_buyer_and_the_owner_can_see_an_order() {
    let api = setup().await;
    let db = api.db().clone();
    let (alice, _) = seed_user(&db, "Alice", 10_000).await;
    let (bob, bobs_store) = seed_user(&db, "Bob", 0).await;
    let (carol, _) = seed_user(&db, "Carol", 0).await;
    let tea = seed_menu_item(&db, bobs_store.id, "Tea", 450).await;
    let order = api.create_order(alice.id, NewOrderRequest::new(bobs_store.id).with_item(tea.id, 3)).await.unwrap();

    assert!(api.order_for_user(alice.id, order.order.id).await.is_ok());
    assert!(api.order_for_user(bob.id, order.order.id).await.is_ok());
    let err = api.order_for_user(carol.id, order.order.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Authorization(_)));
    tear_down(db).await;
}

#[tokio::test]
async fn order_listings_are_paginated_and_filtered() {
    let api = setup().await;
    let db = api.db().clone();
    let (alice, _) = seed_user(&db, "Alice", 100_000).await;
    let (bob, bobs_store) = seed_user(&db, "Bob", 0).await;
    let tea = seed_menu_item(&db, bobs_store.id, "Tea", 100).await;
    let mut ids = Vec::new();
    for i in 1..=12 {
        let order = api.create_order(alice.id, NewOrderRequest::new(bobs_store.id).with_item(tea.id, i)).await.unwrap();
        ids.push(order.order.id);
    }
    api.update_order_status(bob.id, ids[0], "completed").await.unwrap();

    let page = Pagination::new(Some(2), Some(5)).unwrap();
    let orders = api.orders_for_buyer(alice.id, OrderQueryFilter::default(), page).await.unwrap();
    assert_eq!(orders.total, 12);
    assert_eq!(orders.total_pages, 3);
    assert_eq!(orders.items.len(), 5);
    // Newest first
    assert_eq!(orders.items[0].order.id, ids[6]);
    assert!(orders.items.iter().all(|o| o.items.len() == 1));

    let page = Pagination::new(Some(3), Some(5)).unwrap();
    let orders = api.orders_for_store_owner(bob.id, OrderQueryFilter::default(), page).await.unwrap();
    assert_eq!(orders.items.len(), 2);

    let filter = OrderQueryFilter::default().with_status(OrderStatusType::Completed);
    let completed = api.orders_for_store_owner(bob.id, filter, first_page()).await.unwrap();
    assert_eq!(completed.total, 1);
    assert_eq!(completed.items[0].order.id, ids[0]);

    let filter = OrderQueryFilter::default().with_query_params(None, Some("2000-01-01"), Some("2000-01-31")).unwrap();
    let none = api.orders_for_buyer(alice.id, filter, first_page()).await.unwrap();
    assert_eq!(none.total, 0);
    assert!(none.items.is_empty());

    let not_bobs = api.orders_for_store_owner(alice.id, OrderQueryFilter::default(), first_page()).await.unwrap();
    assert_eq!(not_bobs.total, 0);
    info!("🚀️ Pagination checks complete");
    tear_down(db).await;
}
