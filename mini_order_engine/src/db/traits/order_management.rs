use crate::{
    db_types::{Cents, MenuItemPrice, NewOrder, Order, OrderDetail, OrderStatusType},
    mo_api::{
        errors::EngineError,
        query_objects::{OrderQueryFilter, Page, Pagination},
    },
};

/// The `OrderManagement` trait defines the behaviour for creating and querying orders in the database backend.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches the prices of all the given menu items in a single lookup. Unknown ids are simply absent from the
    /// result.
    async fn fetch_menu_prices(&self, menu_item_ids: &[i64]) -> Result<Vec<MenuItemPrice>, EngineError>;

    /// The current balance of the user, or `None` if the user does not exist.
    async fn fetch_balance(&self, user_id: i64) -> Result<Option<Cents>, EngineError>;

    /// Writes a priced order in one atomic transaction:
    /// * the order (status `pending`) and its items are inserted,
    /// * the buyer is debited the total, provided their balance still covers it, and a DEBIT ledger row is written,
    /// * the store owner is credited the total and a CREDIT ledger row is written.
    ///
    /// If any step fails, nothing is persisted.
    async fn process_new_order(&self, order: NewOrder) -> Result<OrderDetail, EngineError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<OrderDetail>, EngineError>;

    async fn search_orders(
        &self,
        filter: OrderQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<OrderDetail>, EngineError>;

    /// Sets the order status without any transition checks. Returns `None` if the order does not exist.
    async fn update_order_status(&self, order_id: i64, status: OrderStatusType)
        -> Result<Option<Order>, EngineError>;

    async fn store_exists(&self, store_id: i64) -> Result<bool, EngineError>;

    /// The id of the store owned by the given user, if they have one.
    async fn fetch_store_id_for_owner(&self, owner_id: i64) -> Result<Option<i64>, EngineError>;
}
