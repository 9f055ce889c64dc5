use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::{AccountManagement, AdminManagement},
    db_types::{
        Admin,
        AdminRole,
        NewAdmin,
        NewStore,
        NewUser,
        Order,
        OrderDetail,
        OrderStatusType,
        OrderUpdate,
        Store,
        StoreSummary,
        StoreUpdate,
        User,
        UserUpdate,
    },
    helpers::{hash_password, normalize_email, validate_email, validate_password, verify_password},
    mo_api::{
        account_objects::{AuthenticatedAdmin, NewAdminAccount, NewUserAccount},
        errors::EngineError,
        query_objects::{Page, Pagination},
    },
};

const BAD_CREDENTIALS: &str = "Invalid email or password";

/// The back office. Route-level access control decides who may call what; the only check made here is that new
/// admins are created by a super admin.
pub struct AdminApi<B> {
    db: B,
}

impl<B> Debug for AdminApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdminApi")
    }
}

fn hash(password: &str) -> Result<String, EngineError> {
    hash_password(password).map_err(|e| EngineError::DatabaseError(e.to_string()))
}

impl<B> AdminApi<B>
where B: AdminManagement + AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedAdmin, EngineError> {
        let email = normalize_email(email);
        let creds = self
            .db
            .fetch_admin_credentials(&email)
            .await?
            .ok_or_else(|| EngineError::Authentication(BAD_CREDENTIALS.into()))?;
        let valid = verify_password(password, &creds.password_hash).unwrap_or_else(|e| {
            warn!("🔄️🛡️ Stored password hash for admin #{} could not be checked. {e}", creds.id);
            false
        });
        if !valid {
            return Err(EngineError::Authentication(BAD_CREDENTIALS.into()));
        }
        info!("🔄️🛡️ Admin #{} logged in", creds.id);
        Ok(AuthenticatedAdmin { id: creds.id, name: creds.name, email: creds.email, role: creds.role })
    }

    pub async fn register_admin(
        &self,
        actor_role: AdminRole,
        account: NewAdminAccount,
    ) -> Result<Admin, EngineError> {
        if actor_role != AdminRole::SuperAdmin {
            return Err(EngineError::unauthorized("Only a super admin can create admins"));
        }
        let email = normalize_email(&account.email);
        validate_email(&email)?;
        validate_password(&account.password)?;
        let admin = NewAdmin {
            name: account.name.trim().to_string(),
            email,
            password_hash: hash(&account.password)?,
            role: account.role,
        };
        let admin = self.db.create_admin(admin).await?;
        info!("🔄️🛡️ Created {} #{} ({})", admin.role, admin.id, admin.email);
        Ok(admin)
    }

    /// Creates the first super admin when the admin table is empty. Returns `None` if admins already exist.
    pub async fn bootstrap_super_admin(&self, email: &str, password: &str) -> Result<Option<Admin>, EngineError> {
        if self.db.count_admins().await? > 0 {
            debug!("🔄️🛡️ Admins already exist. Skipping super admin bootstrap");
            return Ok(None);
        }
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;
        let admin = NewAdmin {
            name: "Super Admin".to_string(),
            email,
            password_hash: hash(password)?,
            role: AdminRole::SuperAdmin,
        };
        let admin = self.db.create_admin(admin).await?;
        warn!("🔄️🛡️ Bootstrapped super admin {}. Change its password.", admin.email);
        Ok(Some(admin))
    }

    pub async fn users(&self, keyword: Option<&str>, pagination: Pagination) -> Result<Page<User>, EngineError> {
        self.db.search_users(keyword, pagination).await
    }

    pub async fn stores(
        &self,
        keyword: Option<&str>,
        pagination: Pagination,
    ) -> Result<Page<StoreSummary>, EngineError> {
        self.db.search_store_summaries(keyword, pagination).await
    }

    /// Orders whose buyer's name contains `keyword`.
    pub async fn orders(
        &self,
        keyword: Option<&str>,
        pagination: Pagination,
    ) -> Result<Page<OrderDetail>, EngineError> {
        self.db.search_all_orders(keyword, pagination).await
    }

    pub async fn create_user(&self, account: NewUserAccount) -> Result<User, EngineError> {
        let email = normalize_email(&account.email);
        validate_email(&email)?;
        validate_password(&account.password)?;
        let name = account.name.trim();
        if name.is_empty() {
            return Err(EngineError::validation("name must not be empty"));
        }
        let password_hash = hash(&account.password)?;
        let mut user = NewUser::new(name, email.as_str(), password_hash.as_str());
        user.store_name = account.store_name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        self.db.create_user(user).await
    }

    pub async fn update_user(&self, user_id: i64, mut update: UserUpdate) -> Result<User, EngineError> {
        if update.is_empty() {
            return Err(EngineError::validation("nothing to update"));
        }
        if let Some(email) = update.email.take() {
            let email = normalize_email(&email);
            validate_email(&email)?;
            update.email = Some(email);
        }
        if update.balance.is_some_and(|b| b.is_negative()) {
            return Err(EngineError::validation("balance cannot be negative"));
        }
        if update.points.is_some_and(|p| p < 0) {
            return Err(EngineError::validation("points cannot be negative"));
        }
        self.db.update_user(user_id, update).await?.ok_or_else(|| EngineError::not_found(format!("User #{user_id}")))
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<(), EngineError> {
        if !self.db.delete_user(user_id).await? {
            return Err(EngineError::not_found(format!("User #{user_id}")));
        }
        Ok(())
    }

    pub async fn create_store(&self, store: NewStore) -> Result<Store, EngineError> {
        if store.name.trim().is_empty() {
            return Err(EngineError::validation("store name must not be empty"));
        }
        self.db.admin_create_store(store).await
    }

    pub async fn update_store(&self, store_id: i64, update: StoreUpdate) -> Result<Store, EngineError> {
        if update.is_empty() {
            return Err(EngineError::validation("nothing to update"));
        }
        self.db
            .admin_update_store(store_id, update)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("Store #{store_id}")))
    }

    pub async fn delete_store(&self, store_id: i64) -> Result<(), EngineError> {
        if !self.db.delete_store(store_id).await? {
            return Err(EngineError::not_found(format!("Store #{store_id}")));
        }
        Ok(())
    }

    /// Sets an order's status directly. Administrative corrections are not bound by the order lifecycle.
    pub async fn update_order_status(&self, order_id: i64, status: OrderStatusType) -> Result<Order, EngineError> {
        self.db
            .admin_update_order(order_id, OrderUpdate { status: Some(status) })
            .await?
            .ok_or_else(|| EngineError::not_found(format!("Order #{order_id}")))
    }

    pub async fn delete_order(&self, order_id: i64) -> Result<(), EngineError> {
        if !self.db.delete_order(order_id).await? {
            return Err(EngineError::not_found(format!("Order #{order_id}")));
        }
        Ok(())
    }
}
