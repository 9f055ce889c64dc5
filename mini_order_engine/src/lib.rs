//! Mini Order Engine
//!
//! The engine behind a small multi-tenant food ordering service. Every user owns a store with a menu, can ask to join
//! other users' stores, and can order from them, paying from a prepaid balance that is credited to the store owner.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should never need to access
//!    the database directly. Instead, use the public API provided by the engine. The exception is the data types used
//!    in the database. These are defined in the `db_types` module and are public.
//! 2. The engine's public API ([`mod@mo_api`]). This provides the ordering, account, store, menu, back-office and audit
//!    functionality. A backend needs to implement the traits in [`traits`] to power it.
//!
//! The engine also emits events when something a user should hear about happens, such as a new order for their store
//! or a change in the status of one of their orders. You can hook into these events and react to them, which is how the
//! server pushes notifications to connected clients.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod mo_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits;
pub use mo_api::{
    account_objects,
    accounts_api::AccountApi,
    admin_api::AdminApi,
    audit_api::{AuditApi, RequestOrigin},
    errors::EngineError,
    menu_api::MenuApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    query_objects,
    store_api::StoreApi,
};
