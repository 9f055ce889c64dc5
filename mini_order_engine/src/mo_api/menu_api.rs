use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::{MenuManagement, StoreManagement},
    db_types::{Cents, MenuItem, MenuItemUpdate, NewMenuItem, Store},
    mo_api::errors::EngineError,
};

/// Menu maintenance for store owners, plus the public menu listing.
pub struct MenuApi<B> {
    db: B,
}

impl<B> Debug for MenuApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MenuApi")
    }
}

fn check_price(price: Cents) -> Result<(), EngineError> {
    if price.is_negative() {
        return Err(EngineError::validation(format!("price cannot be negative, got {price}")));
    }
    Ok(())
}

impl<B> MenuApi<B>
where B: MenuManagement + StoreManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    async fn owned_store(&self, actor_id: i64, store_id: i64) -> Result<Store, EngineError> {
        let store =
            self.db.fetch_store(store_id).await?.ok_or_else(|| EngineError::not_found(format!("Store #{store_id}")))?;
        if store.owner_id != actor_id {
            return Err(EngineError::unauthorized(format!("Store #{store_id} belongs to someone else")));
        }
        Ok(store)
    }

    async fn owned_item(&self, actor_id: i64, item_id: i64) -> Result<MenuItem, EngineError> {
        let item = self
            .db
            .fetch_menu_item(item_id)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("Menu item #{item_id}")))?;
        self.owned_store(actor_id, item.store_id).await?;
        Ok(item)
    }

    pub async fn create_item(&self, actor_id: i64, item: NewMenuItem) -> Result<MenuItem, EngineError> {
        if item.name.trim().is_empty() {
            return Err(EngineError::validation("menu item name must not be empty"));
        }
        check_price(item.price)?;
        self.owned_store(actor_id, item.store_id).await?;
        let item = self.db.insert_menu_item(item).await?;
        info!("🔄️🍜️ Menu item #{} ({}) added to store #{}", item.id, item.name, item.store_id);
        Ok(item)
    }

    pub async fn update_item(
        &self,
        actor_id: i64,
        item_id: i64,
        update: MenuItemUpdate,
    ) -> Result<MenuItem, EngineError> {
        if let Some(price) = update.price {
            check_price(price)?;
        }
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(EngineError::validation("menu item name must not be empty"));
        }
        self.owned_item(actor_id, item_id).await?;
        self.db
            .update_menu_item(item_id, update)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("Menu item #{item_id}")))
    }

    pub async fn delete_item(&self, actor_id: i64, item_id: i64) -> Result<(), EngineError> {
        let item = self.owned_item(actor_id, item_id).await?;
        if !self.db.delete_menu_item(item_id).await? {
            return Err(EngineError::not_found(format!("Menu item #{item_id}")));
        }
        info!("🔄️🍜️ Menu item #{item_id} removed from store #{}", item.store_id);
        Ok(())
    }

    pub async fn menu_for_store(&self, store_id: i64) -> Result<Vec<MenuItem>, EngineError> {
        if self.db.fetch_store(store_id).await?.is_none() {
            return Err(EngineError::not_found(format!("Store #{store_id}")));
        }
        self.db.fetch_menu_for_store(store_id).await
    }
}
