use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::{
    admins,
    db_url,
    ledger,
    logs,
    memberships,
    menu_items,
    new_pool,
    orders,
    stores,
    users,
    verification,
    SqliteDatabaseError,
};
use crate::{
    db::traits::{
        AccountManagement,
        AdminManagement,
        AuditLogManagement,
        MenuManagement,
        OrderManagement,
        StoreManagement,
        VerificationCodeManagement,
        MAX_DAILY_CODE_SENDS,
    },
    db_types::{
        Admin,
        AdminCredentials,
        BalanceTransaction,
        Cents,
        LogOptions,
        Membership,
        MembershipDetail,
        MembershipStatus,
        MenuItem,
        MenuItemPrice,
        MenuItemUpdate,
        NewAdmin,
        NewMenuItem,
        NewOperationLog,
        NewOrder,
        NewStore,
        NewUser,
        OperationLog,
        OperationLogEntry,
        Order,
        OrderDetail,
        OrderStatusType,
        OrderUpdate,
        ProfileUpdate,
        Store,
        StoreSearchResult,
        StoreSummary,
        StoreUpdate,
        StoreWithMenu,
        TopMenuItem,
        TransactionType,
        User,
        UserCredentials,
        UserUpdate,
    },
    mo_api::{
        errors::EngineError,
        query_objects::{LogQueryFilter, OrderQueryFilter, Page, Pagination},
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `MO_DATABASE_URL`, or the default location.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        trace!("🗃️ Connection pool created for {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), SqliteDatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_menu_prices(&self, menu_item_ids: &[i64]) -> Result<Vec<MenuItemPrice>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(menu_items::prices_for_items(menu_item_ids, &mut conn).await?)
    }

    async fn fetch_balance(&self, user_id: i64) -> Result<Option<Cents>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_balance(user_id, &mut conn).await?)
    }

    async fn process_new_order(&self, order: NewOrder) -> Result<OrderDetail, EngineError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let total = order.total_price;
        let buyer_id = order.buyer_id;
        // The debit comes first so that this transaction holds the write lock before it reads anything else.
        if !users::debit_if_sufficient(buyer_id, total, now, &mut tx).await? {
            let available = users::fetch_balance(buyer_id, &mut tx)
                .await?
                .ok_or(SqliteDatabaseError::AccountNotFound(buyer_id))?;
            debug!("🗃️ User #{buyer_id} cannot cover an order of {total} with {available}");
            let err = SqliteDatabaseError::InsufficientBalance { user_id: buyer_id, required: total, available };
            return Err(err.into());
        }
        let store = stores::store_by_id(order.store_id, &mut tx)
            .await?
            .ok_or(SqliteDatabaseError::StoreNotFound(order.store_id))?;
        let new_order = orders::insert_order(&order, now, &mut tx).await?;
        for line in &order.lines {
            orders::insert_order_item(new_order.id, line, &mut tx).await?;
        }
        if total.value() > 0 {
            let description = format!("Payment for order #{}", new_order.id);
            ledger::insert_transaction(
                buyer_id,
                Some(new_order.id),
                total,
                TransactionType::Debit,
                &description,
                now,
                &mut tx,
            )
            .await?;
            users::credit(store.owner_id, total, now, &mut tx).await?;
            let description = format!("Income from order #{}", new_order.id);
            ledger::insert_transaction(
                store.owner_id,
                Some(new_order.id),
                total,
                TransactionType::Credit,
                &description,
                now,
                &mut tx,
            )
            .await?;
        }
        let detail = orders::order_detail(new_order.id, &mut tx)
            .await?
            .ok_or_else(|| SqliteDatabaseError::QueryError(format!("Order #{} vanished", new_order.id)))?;
        tx.commit().await?;
        debug!(
            "🗃️ Order #{} saved. {total} moved from user #{buyer_id} to user #{} (store #{})",
            new_order.id, store.owner_id, store.id
        );
        Ok(detail)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<OrderDetail>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::order_detail(order_id, &mut conn).await?)
    }

    async fn search_orders(
        &self,
        filter: OrderQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<OrderDetail>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::search_orders(&filter, pagination, &mut conn).await?)
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatusType,
    ) -> Result<Option<Order>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::update_status(order_id, status, Utc::now(), &mut conn).await?)
    }

    async fn store_exists(&self, store_id: i64) -> Result<bool, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let store = stores::store_by_id(store_id, &mut conn).await?;
        Ok(store.is_some())
    }

    async fn fetch_store_id_for_owner(&self, owner_id: i64) -> Result<Option<i64>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let store = stores::store_by_owner(owner_id, &mut conn).await?;
        Ok(store.map(|s| s.id))
    }
}

impl AccountManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, EngineError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let new_user = users::insert_user(&user, now, &mut tx).await?;
        if let Some(store_name) = user.store_name {
            let store = NewStore { owner_id: new_user.id, name: store_name, description: None };
            let store = stores::insert_store(&store, now, &mut tx).await?;
            debug!("🗃️ Store #{} created for new user #{}", store.id, new_user.id);
        }
        tx.commit().await?;
        debug!("🗃️ User #{} ({}) created", new_user.id, new_user.email);
        Ok(new_user)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::user_by_id(user_id, &mut conn).await?)
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::user_by_email(email, &mut conn).await?)
    }

    async fn fetch_credentials(&self, email: &str) -> Result<Option<UserCredentials>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::credentials_by_email(email, &mut conn).await?)
    }

    async fn update_profile(&self, user_id: i64, update: ProfileUpdate) -> Result<Option<User>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::update_profile(user_id, &update, Utc::now(), &mut conn).await?)
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::update_password(email, password_hash, Utc::now(), &mut conn).await?)
    }

    async fn fetch_balance_transactions(
        &self,
        user_id: i64,
        pagination: Pagination,
    ) -> Result<Page<BalanceTransaction>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(ledger::fetch_transactions(user_id, pagination, &mut conn).await?)
    }
}

impl StoreManagement for SqliteDatabase {
    async fn create_store(&self, store: NewStore) -> Result<Store, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(stores::insert_store(&store, Utc::now(), &mut conn).await?)
    }

    async fn fetch_store(&self, store_id: i64) -> Result<Option<Store>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(stores::store_by_id(store_id, &mut conn).await?)
    }

    async fn fetch_store_for_owner(&self, owner_id: i64) -> Result<Option<Store>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(stores::store_by_owner(owner_id, &mut conn).await?)
    }

    async fn update_store(&self, store_id: i64, update: StoreUpdate) -> Result<Option<Store>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(stores::update_store(store_id, &update, Utc::now(), &mut conn).await?)
    }

    async fn search_stores(&self, name: &str, viewer_id: i64) -> Result<Vec<StoreSearchResult>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(stores::search_by_name(name, viewer_id, &mut conn).await?)
    }

    async fn paginate_stores(&self, name: Option<&str>, pagination: Pagination) -> Result<Page<Store>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(stores::paginate(name, pagination, &mut conn).await?)
    }

    async fn fetch_selected_stores(&self, user_id: i64) -> Result<Vec<StoreWithMenu>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let summaries = stores::accepted_stores(user_id, &mut conn).await?;
        let mut result = Vec::with_capacity(summaries.len());
        for StoreSummary { store, owner_name, .. } in summaries {
            let menu_items = menu_items::menu_for_store(store.id, &mut conn).await?;
            result.push(StoreWithMenu { store, owner_name, menu_items });
        }
        Ok(result)
    }

    async fn fetch_top_menu_items(&self, user_id: i64, limit: i64) -> Result<Vec<TopMenuItem>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(stores::top_menu_items(user_id, limit, &mut conn).await?)
    }

    async fn fetch_membership(&self, user_id: i64, store_id: i64) -> Result<Option<Membership>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(memberships::membership(user_id, store_id, &mut conn).await?)
    }

    async fn insert_membership(&self, user_id: i64, store_id: i64) -> Result<Membership, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(memberships::insert_membership(user_id, store_id, Utc::now(), &mut conn).await?)
    }

    async fn resolve_membership(
        &self,
        user_id: i64,
        store_id: i64,
        status: MembershipStatus,
    ) -> Result<Option<Membership>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(memberships::resolve_membership(user_id, store_id, status, Utc::now(), &mut conn).await?)
    }

    async fn fetch_memberships_for_store(&self, store_id: i64) -> Result<Vec<MembershipDetail>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(memberships::memberships_for_store(store_id, &mut conn).await?)
    }
}

impl MenuManagement for SqliteDatabase {
    async fn insert_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(menu_items::insert_menu_item(&item, Utc::now(), &mut conn).await?)
    }

    async fn fetch_menu_item(&self, item_id: i64) -> Result<Option<MenuItem>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(menu_items::menu_item_by_id(item_id, &mut conn).await?)
    }

    async fn update_menu_item(&self, item_id: i64, update: MenuItemUpdate) -> Result<Option<MenuItem>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(menu_items::update_menu_item(item_id, &update, Utc::now(), &mut conn).await?)
    }

    async fn delete_menu_item(&self, item_id: i64) -> Result<bool, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(menu_items::delete_menu_item(item_id, &mut conn).await?)
    }

    async fn fetch_menu_for_store(&self, store_id: i64) -> Result<Vec<MenuItem>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(menu_items::menu_for_store(store_id, &mut conn).await?)
    }
}

impl AdminManagement for SqliteDatabase {
    async fn create_admin(&self, admin: NewAdmin) -> Result<Admin, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(admins::insert_admin(&admin, Utc::now(), &mut conn).await?)
    }

    async fn fetch_admin_credentials(&self, email: &str) -> Result<Option<AdminCredentials>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(admins::credentials_by_email(email, &mut conn).await?)
    }

    async fn count_admins(&self) -> Result<i64, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(admins::count_admins(&mut conn).await?)
    }

    async fn search_users(&self, keyword: Option<&str>, pagination: Pagination) -> Result<Page<User>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(admins::search_users(keyword, pagination, &mut conn).await?)
    }

    async fn search_store_summaries(
        &self,
        keyword: Option<&str>,
        pagination: Pagination,
    ) -> Result<Page<StoreSummary>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(stores::search_summaries(keyword, pagination, &mut conn).await?)
    }

    async fn search_all_orders(
        &self,
        keyword: Option<&str>,
        pagination: Pagination,
    ) -> Result<Page<OrderDetail>, EngineError> {
        let filter = OrderQueryFilter::default().with_buyer_name(keyword.unwrap_or_default());
        let mut conn = self.pool.acquire().await?;
        Ok(orders::search_orders(&filter, pagination, &mut conn).await?)
    }

    async fn update_user(&self, user_id: i64, update: UserUpdate) -> Result<Option<User>, EngineError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let Some(user) = users::update_user_details(user_id, &update, now, &mut tx).await? else {
            return Ok(None);
        };
        let user = match update.balance {
            Some(new_balance) if new_balance != user.balance => {
                adjust_balance(&user, new_balance, now, &mut tx).await?;
                users::user_by_id(user_id, &mut tx).await?.ok_or(SqliteDatabaseError::AccountNotFound(user_id))?
            },
            _ => user,
        };
        tx.commit().await?;
        Ok(Some(user))
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::delete_user(user_id, &mut conn).await?)
    }

    async fn admin_create_store(&self, store: NewStore) -> Result<Store, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(stores::insert_store(&store, Utc::now(), &mut conn).await?)
    }

    async fn admin_update_store(&self, store_id: i64, update: StoreUpdate) -> Result<Option<Store>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(stores::update_store(store_id, &update, Utc::now(), &mut conn).await?)
    }

    async fn delete_store(&self, store_id: i64) -> Result<bool, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(stores::delete_store(store_id, &mut conn).await?)
    }

    async fn admin_update_order(&self, order_id: i64, update: OrderUpdate) -> Result<Option<Order>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        match update.status {
            Some(status) => Ok(orders::update_status(order_id, status, Utc::now(), &mut conn).await?),
            None => {
                let detail = orders::order_detail(order_id, &mut conn).await?;
                Ok(detail.map(|d| d.order))
            },
        }
    }

    async fn delete_order(&self, order_id: i64) -> Result<bool, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::delete_order(order_id, &mut conn).await?)
    }
}

/// Moves the user's balance to `new_balance`, writing the difference to the ledger so that the balance stays equal to
/// the sum of the user's ledger entries.
async fn adjust_balance(
    user: &User,
    new_balance: Cents,
    now: DateTime<Utc>,
    conn: &mut sqlx::SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let delta = new_balance - user.balance;
    let description = "Balance adjusted by administrator";
    if delta.is_negative() {
        let amount = -delta;
        if !users::debit_if_sufficient(user.id, amount, now, &mut *conn).await? {
            return Err(SqliteDatabaseError::NegativeBalance(user.id));
        }
        ledger::insert_transaction(user.id, None, amount, TransactionType::Debit, description, now, conn).await?;
    } else {
        users::credit(user.id, delta, now, &mut *conn).await?;
        ledger::insert_transaction(user.id, None, delta, TransactionType::Credit, description, now, conn).await?;
    }
    info!("🗃️ Balance of user #{} adjusted from {} to {new_balance}", user.id, user.balance);
    Ok(())
}

impl AuditLogManagement for SqliteDatabase {
    async fn insert_log(&self, log: NewOperationLog) -> Result<OperationLog, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(logs::insert_log(&log, Utc::now(), &mut conn).await?)
    }

    async fn search_logs(
        &self,
        filter: LogQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<OperationLogEntry>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(logs::search_logs(&filter, pagination, &mut conn).await?)
    }

    async fn fetch_log_options(&self) -> Result<LogOptions, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(logs::log_options(&mut conn).await?)
    }
}

impl VerificationCodeManagement for SqliteDatabase {
    async fn store_verification_code(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let mut tx = self.pool.begin().await?;
        let sent_today = match verification::fetch_verification(email, &mut tx).await? {
            Some(record) if record.last_sent_at.date_naive() == now.date_naive() => record.daily_send_count,
            _ => 0,
        };
        if sent_today >= MAX_DAILY_CODE_SENDS {
            return Err(EngineError::RateLimited(format!(
                "At most {MAX_DAILY_CODE_SENDS} verification codes can be sent per day"
            )));
        }
        verification::upsert_code(email, code, expires_at, sent_today + 1, now, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn consume_verification_code(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(verification::consume_code(email, code, now, &mut conn).await?)
    }
}
