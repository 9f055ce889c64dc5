use cucumber::given;
use mini_order_engine::test_utils::seed::{seed_menu_item, seed_user};

use crate::cucumber::{world::OrderSystem, OrderWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut OrderWorld) {
    let system = OrderSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a user {word} with a balance of {int} cents")]
async fn user_with_balance(world: &mut OrderWorld, name: String, balance: i64) {
    let seeded = seed_user(world.db(), &name, balance).await;
    world.users.insert(name, seeded);
}

#[given(expr = "{word}'s store sells {word} for {int} cents")]
async fn store_sells(world: &mut OrderWorld, owner: String, item: String, price: i64) {
    let store_id = world.store_of(&owner).id;
    let menu_item = seed_menu_item(world.db(), store_id, &item, price).await;
    world.menu.insert(item, menu_item);
}
