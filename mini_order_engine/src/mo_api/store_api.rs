use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::StoreManagement,
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
    events::{EventProducers, MembershipUpdatedEvent},
    mo_api::{
        errors::EngineError,
        query_objects::{Page, Pagination},
    },
};

/// How many of the most ordered menu items are shown on a user's home page.
pub const TOP_MENU_ITEMS: i64 = 5;

/// `StoreApi` covers stores and the membership workflow: users ask to join a store, and its owner accepts or
/// rejects them.
pub struct StoreApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for StoreApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StoreApi")
    }
}

impl<B> StoreApi<B>
where B: StoreManagement
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub async fn create_store(
        &self,
        owner_id: i64,
        name: &str,
        description: Option<String>,
    ) -> Result<Store, EngineError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::validation("store name must not be empty"));
        }
        let store = self.db.create_store(NewStore { owner_id, name: name.to_string(), description }).await?;
        info!("🔄️🏪️ User #{owner_id} opened store #{} ({})", store.id, store.name);
        Ok(store)
    }

    pub async fn store_by_id(&self, store_id: i64) -> Result<Store, EngineError> {
        self.db.fetch_store(store_id).await?.ok_or_else(|| EngineError::not_found(format!("Store #{store_id}")))
    }

    /// The store owned by `owner_id`.
    pub async fn my_store(&self, owner_id: i64) -> Result<Store, EngineError> {
        self.db
            .fetch_store_for_owner(owner_id)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("Store for user #{owner_id}")))
    }

    /// Edits a store. Only its owner may do this.
    pub async fn update_store(&self, actor_id: i64, store_id: i64, update: StoreUpdate) -> Result<Store, EngineError> {
        let store = self.store_by_id(store_id).await?;
        if store.owner_id != actor_id {
            return Err(EngineError::unauthorized(format!("Store #{store_id} belongs to someone else")));
        }
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(EngineError::validation("store name must not be empty"));
        }
        self.db
            .update_store(store_id, update)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("Store #{store_id}")))
    }

    /// Stores whose name contains `name`, each annotated with the viewer's membership status.
    pub async fn search_by_name(&self, name: &str, viewer_id: i64) -> Result<Vec<StoreSearchResult>, EngineError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::validation("search keyword must not be empty"));
        }
        self.db.search_stores(name, viewer_id).await
    }

    pub async fn paginate(&self, name: Option<&str>, pagination: Pagination) -> Result<Page<Store>, EngineError> {
        self.db.paginate_stores(name, pagination).await
    }

    /// The stores the user has joined, with their menus.
    pub async fn selected_stores(&self, user_id: i64) -> Result<Vec<StoreWithMenu>, EngineError> {
        self.db.fetch_selected_stores(user_id).await
    }

    pub async fn top_menu_items(&self, user_id: i64) -> Result<Vec<TopMenuItem>, EngineError> {
        self.db.fetch_top_menu_items(user_id, TOP_MENU_ITEMS).await
    }

    /// Membership requests and members of the store owned by `owner_id`.
    pub async fn memberships_for_owner(&self, owner_id: i64) -> Result<Vec<MembershipDetail>, EngineError> {
        match self.db.fetch_store_for_owner(owner_id).await? {
            Some(store) => self.db.fetch_memberships_for_store(store.id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Asks to join a store. A user can only ask once per store, whatever became of the earlier request.
    pub async fn request_join(&self, user_id: i64, store_id: i64) -> Result<Membership, EngineError> {
        let store = self.store_by_id(store_id).await?;
        if store.owner_id == user_id {
            return Err(EngineError::validation("You cannot join your own store"));
        }
        if let Some(existing) = self.db.fetch_membership(user_id, store_id).await? {
            debug!("🔄️🏪️ User #{user_id} already has a {} membership for store #{store_id}", existing.status);
            return Err(EngineError::conflict("Already requested or a member"));
        }
        let membership = self.db.insert_membership(user_id, store_id).await?;
        info!("🔄️🏪️ User #{user_id} asked to join store #{store_id}");
        Ok(membership)
    }

    /// Accepts or rejects a pending request to join `store_id`. Only the store owner may do this. Both parties are
    /// notified.
    pub async fn update_membership(
        &self,
        actor_id: i64,
        store_id: i64,
        user_id: i64,
        accept: bool,
    ) -> Result<Membership, EngineError> {
        let store = self.store_by_id(store_id).await?;
        if store.owner_id != actor_id {
            return Err(EngineError::unauthorized("Only the store owner can manage its memberships"));
        }
        let status = if accept { MembershipStatus::Accepted } else { MembershipStatus::Rejected };
        let membership = self
            .db
            .resolve_membership(user_id, store_id, status)
            .await?
            .ok_or_else(|| EngineError::not_found("Membership request"))?;
        info!("🔄️🏪️ Store #{store_id} set the membership of user #{user_id} to {status}");
        self.producers.publish_membership_updated(MembershipUpdatedEvent::new(membership.clone(), store.owner_id));
        Ok(membership)
    }
}
