//! # Backend contracts
//!
//! The traits in this module define what a storage backend must provide to power the engine APIs. Each API only
//! depends on the traits it needs, so tests can mock a single concern.
//!
//! * [`OrderManagement`] prices, creates (atomically, including the balance transfer) and queries orders.
//! * [`AccountManagement`] covers user accounts, profiles and the balance ledger.
//! * [`StoreManagement`] covers stores, memberships and store-level statistics.
//! * [`MenuManagement`] covers menu items.
//! * [`AdminManagement`] covers admin accounts and the back-office listings and edits.
//! * [`AuditLogManagement`] writes and searches the operation log.
//! * [`VerificationCodeManagement`] persists email verification codes and their send limits.
//!
//! Every method reports failures as an [`EngineError`](crate::EngineError).
mod account_management;
mod admin_management;
mod audit_log_management;
mod menu_management;
mod order_management;
mod store_management;
mod verification_code_management;

pub use account_management::AccountManagement;
pub use admin_management::AdminManagement;
pub use audit_log_management::AuditLogManagement;
pub use menu_management::MenuManagement;
pub use order_management::OrderManagement;
pub use store_management::StoreManagement;
pub use verification_code_management::{VerificationCodeManagement, MAX_DAILY_CODE_SENDS};
