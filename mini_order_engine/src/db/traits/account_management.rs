use crate::{
    db_types::{BalanceTransaction, NewUser, ProfileUpdate, User, UserCredentials},
    mo_api::{
        errors::EngineError,
        query_objects::{Page, Pagination},
    },
};

/// User accounts, profiles and the balance ledger.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Creates a new user. If `user.store_name` is set, the user's store is created in the same transaction.
    /// A duplicate email results in [`EngineError::Conflict`].
    async fn create_user(&self, user: NewUser) -> Result<User, EngineError>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, EngineError>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, EngineError>;

    async fn fetch_credentials(&self, email: &str) -> Result<Option<UserCredentials>, EngineError>;

    async fn update_profile(&self, user_id: i64, update: ProfileUpdate) -> Result<Option<User>, EngineError>;

    /// Replaces the password hash of the user with the given email. Returns false if no such user exists.
    async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool, EngineError>;

    /// The user's ledger, newest entries first.
    async fn fetch_balance_transactions(
        &self,
        user_id: i64,
        pagination: Pagination,
    ) -> Result<Page<BalanceTransaction>, EngineError>;
}
