//! # Mini order engine public API
//!
//! The `mo_api` module exposes the programmatic API of the ordering engine. It is split by concern, so that a client
//! only needs a backend that implements the traits the part it uses depends on.
//!
//! * [`order_flow_api`] places orders, moving money from the buyer to the store owner, and drives the order lifecycle.
//! * [`accounts_api`] handles registration by verification code, logins, password resets, profiles and the ledger.
//! * [`store_api`] handles stores and the requests users make to join them.
//! * [`menu_api`] lets store owners maintain their menus.
//! * [`admin_api`] is the back office.
//! * [`audit_api`] writes and searches the operation log.
//!
//! The other submodules hold the request, query and error types shared by the APIs.
//!
//! # API usage
//!
//! Every API is created by handing it a backend. APIs that notify users also take the [`EventProducers`] that
//! deliver those notifications.
//!
//! ```rust,ignore
//! use mini_order_engine::{events::EventProducers, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/mini_order.db", 25).await?;
//! // SqliteDatabase implements OrderManagement
//! let api = OrderFlowApi::new(db, EventProducers::default());
//! let order = api.create_order(buyer_id, NewOrderRequest::new(store_id).with_item(menu_item_id, 2)).await?;
//! ```
//!
//! [`EventProducers`]: crate::events::EventProducers

pub mod account_objects;
pub mod accounts_api;
pub mod admin_api;
pub mod audit_api;
pub mod errors;
pub mod menu_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod query_objects;
pub mod store_api;
