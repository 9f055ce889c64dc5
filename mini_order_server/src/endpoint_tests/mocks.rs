use mini_order_engine::{
    db_types::{
        Cents,
        Membership,
        MembershipDetail,
        MembershipStatus,
        MenuItem,
        MenuItemPrice,
        MenuItemUpdate,
        NewMenuItem,
        NewOrder,
        NewStore,
        Order,
        OrderDetail,
        OrderStatusType,
        Store,
        StoreSearchResult,
        StoreUpdate,
        StoreWithMenu,
        TopMenuItem,
    },
    query_objects::{OrderQueryFilter, Page, Pagination},
    traits::{MenuManagement, OrderManagement, StoreManagement},
    EngineError,
};
use mockall::mock;

mock! {
    pub StoreBackend {}
    impl StoreManagement for StoreBackend {
        async fn create_store(&self, store: NewStore) -> Result<Store, EngineError>;
        async fn fetch_store(&self, store_id: i64) -> Result<Option<Store>, EngineError>;
        async fn fetch_store_for_owner(&self, owner_id: i64) -> Result<Option<Store>, EngineError>;
        async fn update_store(&self, store_id: i64, update: StoreUpdate) -> Result<Option<Store>, EngineError>;
        async fn search_stores(&self, name: &str, viewer_id: i64) -> Result<Vec<StoreSearchResult>, EngineError>;
        async fn paginate_stores<'a>(&self, name: Option<&'a str>, pagination: Pagination) -> Result<Page<Store>, EngineError>;
        async fn fetch_selected_stores(&self, user_id: i64) -> Result<Vec<StoreWithMenu>, EngineError>;
        async fn fetch_top_menu_items(&self, user_id: i64, limit: i64) -> Result<Vec<TopMenuItem>, EngineError>;
        async fn fetch_membership(&self, user_id: i64, store_id: i64) -> Result<Option<Membership>, EngineError>;
        async fn insert_membership(&self, user_id: i64, store_id: i64) -> Result<Membership, EngineError>;
        async fn resolve_membership(&self, user_id: i64, store_id: i64, status: MembershipStatus) -> Result<Option<Membership>, EngineError>;
        async fn fetch_memberships_for_store(&self, store_id: i64) -> Result<Vec<MembershipDetail>, EngineError>;
    }
    impl MenuManagement for StoreBackend {
        async fn insert_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, EngineError>;
        async fn fetch_menu_item(&self, item_id: i64) -> Result<Option<MenuItem>, EngineError>;
        async fn update_menu_item(&self, item_id: i64, update: MenuItemUpdate) -> Result<Option<MenuItem>, EngineError>;
        async fn delete_menu_item(&self, item_id: i64) -> Result<bool, EngineError>;
        async fn fetch_menu_for_store(&self, store_id: i64) -> Result<Vec<MenuItem>, EngineError>;
    }
}

mock! {
    pub OrderBackend {}
    impl OrderManagement for OrderBackend {
        async fn fetch_menu_prices(&self, menu_item_ids: &[i64]) -> Result<Vec<MenuItemPrice>, EngineError>;
        async fn fetch_balance(&self, user_id: i64) -> Result<Option<Cents>, EngineError>;
        async fn process_new_order(&self, order: NewOrder) -> Result<OrderDetail, EngineError>;
        async fn fetch_order(&self, order_id: i64) -> Result<Option<OrderDetail>, EngineError>;
        async fn search_orders(&self, filter: OrderQueryFilter, pagination: Pagination) -> Result<Page<OrderDetail>, EngineError>;
        async fn update_order_status(&self, order_id: i64, status: OrderStatusType) -> Result<Option<Order>, EngineError>;
        async fn store_exists(&self, store_id: i64) -> Result<bool, EngineError>;
        async fn fetch_store_id_for_owner(&self, owner_id: i64) -> Result<Option<i64>, EngineError>;
    }
}
