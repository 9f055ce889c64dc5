use crate::{
    db_types::{MenuItem, MenuItemUpdate, NewMenuItem},
    mo_api::errors::EngineError,
};

#[allow(async_fn_in_trait)]
pub trait MenuManagement {
    async fn insert_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, EngineError>;

    async fn fetch_menu_item(&self, item_id: i64) -> Result<Option<MenuItem>, EngineError>;

    async fn update_menu_item(&self, item_id: i64, update: MenuItemUpdate) -> Result<Option<MenuItem>, EngineError>;

    /// Returns false if the item did not exist.
    async fn delete_menu_item(&self, item_id: i64) -> Result<bool, EngineError>;

    async fn fetch_menu_for_store(&self, store_id: i64) -> Result<Vec<MenuItem>, EngineError>;
}
