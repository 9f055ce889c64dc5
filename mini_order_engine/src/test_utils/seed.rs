//! Shortcuts for putting users, stores and menus into a test database without going through verification codes.

use crate::{
    db_types::{Cents, MenuItem, NewMenuItem, NewUser, Store, User, UserUpdate},
    traits::{AccountManagement, AdminManagement, MenuManagement, StoreManagement},
    SqliteDatabase,
};

/// A precomputed hash is used, since hashing a password for every seeded user would make tests slow.
pub const SEED_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2VlZHNhbHRzZWVkc2FsdA$seeded";

/// Creates a user with a store of their own and the given opening balance. The balance is written through the ledger.
pub async fn seed_user(db: &SqliteDatabase, name: &str, balance: i64) -> (User, Store) {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    let user = NewUser::new(name, email.as_str(), SEED_PASSWORD_HASH).with_store(format!("{name}'s store"));
    let user = db.create_user(user).await.expect("Error creating user");
    let user = if balance == 0 {
        user
    } else {
        let update = UserUpdate { balance: Some(Cents::from(balance)), ..Default::default() };
        db.update_user(user.id, update).await.expect("Error setting balance").expect("User vanished")
    };
    let store = db.fetch_store_for_owner(user.id).await.expect("Error fetching store").expect("User has no store");
    (user, store)
}

pub async fn seed_menu_item(db: &SqliteDatabase, store_id: i64, name: &str, price: i64) -> MenuItem {
    db.insert_menu_item(NewMenuItem::new(store_id, name, Cents::from(price))).await.expect("Error creating menu item")
}
