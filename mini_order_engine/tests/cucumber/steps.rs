use cucumber::{then, when};
use mini_order_engine::{
    db_types::{Cents, MembershipStatus, OrderStatusType, TransactionType},
    order_objects::NewOrderRequest,
    query_objects::Pagination,
    traits::{AccountManagement, OrderManagement, StoreManagement},
    EngineError,
};

use crate::cucumber::OrderWorld;

#[when(expr = "{word} orders {int} {word} from {word}'s store")]
async fn place_order(world: &mut OrderWorld, buyer: String, quantity: i64, item: String, owner: String) {
    let buyer_id = world.user(&buyer).id;
    let request = NewOrderRequest::new(world.store_of(&owner).id).with_item(world.item(&item).id, quantity);
    let result = world.system().orders.create_order(buyer_id, request).await;
    if let Some(order) = world.record(result) {
        world.last_order = Some(order);
    }
}

#[when(expr = "{word} orders nothing from {word}'s store")]
async fn place_empty_order(world: &mut OrderWorld, buyer: String, owner: String) {
    let buyer_id = world.user(&buyer).id;
    let request = NewOrderRequest::new(world.store_of(&owner).id);
    let result = world.system().orders.create_order(buyer_id, request).await;
    world.record(result);
}

#[when(expr = "{word} sets the last order to {word}")]
async fn set_order_status(world: &mut OrderWorld, actor: String, status: String) {
    let actor_id = world.user(&actor).id;
    let order_id = world.last_order.as_ref().expect("No order has been placed").order.id;
    let result = world.system().orders.update_order_status(actor_id, order_id, &status).await;
    world.record(result);
}

#[when(expr = "{word} asks to join {word}'s store")]
async fn ask_to_join(world: &mut OrderWorld, user: String, owner: String) {
    let user_id = world.user(&user).id;
    let store_id = world.store_of(&owner).id;
    let result = world.system().stores.request_join(user_id, store_id).await;
    world.record(result);
}

#[when(expr = "{word} accepts {word}")]
async fn accept_member(world: &mut OrderWorld, owner: String, user: String) {
    let owner_id = world.user(&owner).id;
    let store_id = world.store_of(&owner).id;
    let user_id = world.user(&user).id;
    let result = world.system().stores.update_membership(owner_id, store_id, user_id, true).await;
    world.record(result);
}

#[then(expr = "{word} has a balance of {int} cents")]
async fn check_balance(world: &mut OrderWorld, name: String, expected: i64) {
    let balance = world.db().fetch_balance(world.user(&name).id).await.expect("Error fetching balance");
    assert_eq!(balance, Some(Cents::from(expected)), "Balance of {name} is incorrect");
}

#[then(expr = "the last order totals {int} cents")]
async fn check_order_total(world: &mut OrderWorld, expected: i64) {
    let order = world.last_order.as_ref().expect("No order has been placed");
    assert_eq!(order.order.total_price, Cents::from(expected));
}

#[then(expr = "the last order is {word}")]
async fn check_order_status(world: &mut OrderWorld, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not a valid order status");
    let id = world.last_order.as_ref().expect("No order has been placed").order.id;
    let order = world.db().fetch_order(id).await.expect("Error fetching order").expect("Order does not exist");
    assert_eq!(order.order.status, expected);
}

#[then(expr = "{word} has {int} {word} ledger entries")]
async fn check_ledger(world: &mut OrderWorld, name: String, count: usize, kind: String) {
    let kind = match kind.as_str() {
        "credit" => TransactionType::Credit,
        "debit" => TransactionType::Debit,
        other => panic!("Unknown ledger entry type {other}"),
    };
    let page = Pagination::new(None, Some(100)).unwrap();
    let ledger = world.db().fetch_balance_transactions(world.user(&name).id, page).await.expect("Error fetching ledger");
    let actual = ledger.items.iter().filter(|t| t.transaction_type == kind).count();
    assert_eq!(actual, count, "Wrong number of {kind:?} entries for {name}");
}

#[then(expr = "{word} is a member of {word}'s store")]
async fn check_member(world: &mut OrderWorld, user: String, owner: String) {
    let user_id = world.user(&user).id;
    let store_id = world.store_of(&owner).id;
    let membership = world.db().fetch_membership(user_id, store_id).await.expect("Error fetching membership");
    assert_eq!(membership.map(|m| m.status), Some(MembershipStatus::Accepted));
}

#[then(expr = "the request fails with a {word} error")]
async fn check_error(world: &mut OrderWorld, kind: String) {
    let err = world.last_error.as_ref().expect("The last request succeeded");
    let matches = match kind.as_str() {
        "validation" => matches!(err, EngineError::Validation(_)),
        "not-found" => matches!(err, EngineError::NotFound(_)),
        "authorization" => matches!(err, EngineError::Authorization(_)),
        "insufficient-balance" => matches!(err, EngineError::InsufficientBalance { .. }),
        "conflict" => matches!(err, EngineError::Conflict(_)),
        other => panic!("Unknown error kind {other}"),
    };
    assert!(matches, "Expected a {kind} error, got {err}");
}

#[then("the request succeeds")]
async fn check_success(world: &mut OrderWorld) {
    if let Some(err) = &world.last_error {
        panic!("The last request failed: {err}");
    }
}
