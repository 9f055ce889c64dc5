use crate::{
    db_types::{
        Admin,
        AdminCredentials,
        NewAdmin,
        NewStore,
        Order,
        OrderDetail,
        OrderUpdate,
        Store,
        StoreSummary,
        StoreUpdate,
        User,
        UserUpdate,
    },
    mo_api::{
        errors::EngineError,
        query_objects::{Page, Pagination},
    },
};

/// Back-office operations. None of these check permissions; that is the caller's job.
#[allow(async_fn_in_trait)]
pub trait AdminManagement {
    async fn create_admin(&self, admin: NewAdmin) -> Result<Admin, EngineError>;

    async fn fetch_admin_credentials(&self, email: &str) -> Result<Option<AdminCredentials>, EngineError>;

    async fn count_admins(&self) -> Result<i64, EngineError>;

    async fn search_users(&self, keyword: Option<&str>, pagination: Pagination) -> Result<Page<User>, EngineError>;

    async fn search_store_summaries(
        &self,
        keyword: Option<&str>,
        pagination: Pagination,
    ) -> Result<Page<StoreSummary>, EngineError>;

    /// Orders whose buyer's name contains `keyword`.
    async fn search_all_orders(
        &self,
        keyword: Option<&str>,
        pagination: Pagination,
    ) -> Result<Page<OrderDetail>, EngineError>;

    /// Applies an administrative edit. A changed balance is recorded in the ledger as an adjustment, in the same
    /// transaction as the update.
    async fn update_user(&self, user_id: i64, update: UserUpdate) -> Result<Option<User>, EngineError>;

    async fn delete_user(&self, user_id: i64) -> Result<bool, EngineError>;

    async fn admin_create_store(&self, store: NewStore) -> Result<Store, EngineError>;

    async fn admin_update_store(&self, store_id: i64, update: StoreUpdate) -> Result<Option<Store>, EngineError>;

    async fn delete_store(&self, store_id: i64) -> Result<bool, EngineError>;

    async fn admin_update_order(&self, order_id: i64, update: OrderUpdate) -> Result<Option<Order>, EngineError>;

    async fn delete_order(&self, order_id: i64) -> Result<bool, EngineError>;
}
