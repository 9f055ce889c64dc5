use crate::{
    db_types::{
        Membership,
        MembershipDetail,
        MembershipStatus,
        NewStore,
        Store,
        StoreSearchResult,
        StoreUpdate,
        StoreWithMenu,
        TopMenuItem,
    },
    mo_api::{
        errors::EngineError,
        query_objects::{Page, Pagination},
    },
};

/// Stores and the memberships that link users to them.
#[allow(async_fn_in_trait)]
pub trait StoreManagement {
    /// Creates a store. An owner can only have one store; a second one results in [`EngineError::Conflict`].
    async fn create_store(&self, store: NewStore) -> Result<Store, EngineError>;

    async fn fetch_store(&self, store_id: i64) -> Result<Option<Store>, EngineError>;

    async fn fetch_store_for_owner(&self, owner_id: i64) -> Result<Option<Store>, EngineError>;

    async fn update_store(&self, store_id: i64, update: StoreUpdate) -> Result<Option<Store>, EngineError>;

    /// Stores whose name contains `name` (case-insensitive), annotated with `viewer_id`'s membership status.
    async fn search_stores(&self, name: &str, viewer_id: i64) -> Result<Vec<StoreSearchResult>, EngineError>;

    async fn paginate_stores(&self, name: Option<&str>, pagination: Pagination) -> Result<Page<Store>, EngineError>;

    /// Stores the user has an accepted membership for, excluding their own, with their menus.
    async fn fetch_selected_stores(&self, user_id: i64) -> Result<Vec<StoreWithMenu>, EngineError>;

    /// The most ordered menu items across the stores the user has an accepted membership for.
    async fn fetch_top_menu_items(&self, user_id: i64, limit: i64) -> Result<Vec<TopMenuItem>, EngineError>;

    async fn fetch_membership(&self, user_id: i64, store_id: i64) -> Result<Option<Membership>, EngineError>;

    /// Inserts a pending membership. The (user, store) pair is unique; a duplicate results in
    /// [`EngineError::Conflict`].
    async fn insert_membership(&self, user_id: i64, store_id: i64) -> Result<Membership, EngineError>;

    /// Moves a *pending* membership to `status`. Returns `None` if there is no pending membership for the pair.
    async fn resolve_membership(
        &self,
        user_id: i64,
        store_id: i64,
        status: MembershipStatus,
    ) -> Result<Option<Membership>, EngineError>;

    async fn fetch_memberships_for_store(&self, store_id: i64) -> Result<Vec<MembershipDetail>, EngineError>;
}
