use futures_util::future::join_all;
use log::*;
use mini_order_engine::{
    db_types::{Cents, TransactionType},
    events::EventProducers,
    order_objects::NewOrderRequest,
    query_objects::Pagination,
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path, tear_down},
        seed::{seed_menu_item, seed_user},
    },
    traits::{AccountManagement, OrderManagement},
    EngineError,
    OrderFlowApi,
    SqliteDatabase,
};

const NUM_ORDERS: usize = 10;

/// Many simultaneous orders against one balance. Exactly as many succeed as the balance can pay for.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_orders_never_overspend() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let (alice, _) = seed_user(&db, "Alice", 10_000).await;
    let (bob, bobs_store) = seed_user(&db, "Bob", 0).await;
    let noodles = seed_menu_item(&db, bobs_store.id, "Noodles", 3_000).await;

    info!("🚀️ Placing {NUM_ORDERS} orders at once");
    let tasks = (0..NUM_ORDERS).map(|_| {
        let api = OrderFlowApi::new(db.clone(), EventProducers::default());
        let request = NewOrderRequest::new(bobs_store.id).with_item(noodles.id, 1);
        tokio::spawn(async move { api.create_order(alice.id, request).await })
    });
    let results = join_all(tasks).await.into_iter().map(|r| r.expect("Task panicked")).collect::<Vec<_>>();
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(err, EngineError::InsufficientBalance { .. }), "Unexpected error: {err}");
    }
    assert_eq!(succeeded, 3);
    assert_eq!(db.fetch_balance(alice.id).await.unwrap(), Some(Cents::from(1_000)));
    assert_eq!(db.fetch_balance(bob.id).await.unwrap(), Some(Cents::from(9_000)));

    let page = Pagination::new(None, Some(100)).unwrap();
    let ledger = db.fetch_balance_transactions(alice.id, page).await.unwrap();
    let debits = ledger.items.iter().filter(|t| t.transaction_type == TransactionType::Debit).count();
    assert_eq!(debits, 3);
    tear_down(db).await;
}
