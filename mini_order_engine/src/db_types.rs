use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
pub use mo_common::Cents;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been placed and paid for, but the store has not started on it yet.
    Pending,
    /// The store is preparing the order.
    Processing,
    /// The order has been handed over to the buyer.
    Completed,
    /// The order was cancelled by the buyer or the store.
    Cancelled,
}

impl OrderStatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusType::Pending => "pending",
            OrderStatusType::Processing => "processing",
            OrderStatusType::Completed => "completed",
            OrderStatusType::Cancelled => "cancelled",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, OrderStatusType::Completed | OrderStatusType::Cancelled)
    }

    /// Whether an order in this status may move to `next`. Moving to the same status is not a transition.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Pending, Completed) | (Pending, Cancelled) | (Processing, Completed) | (Processing, Cancelled)
        )
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------   MembershipStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Pending,
    Accepted,
    Rejected,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Pending => "pending",
            MembershipStatus::Accepted => "accepted",
            MembershipStatus::Rejected => "rejected",
        }
    }
}

impl Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            s => Err(ConversionError(format!("Invalid membership status: {s}"))),
        }
    }
}

//--------------------------------------   TransactionType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Credit => f.write_str("CREDIT"),
            TransactionType::Debit => f.write_str("DEBIT"),
        }
    }
}

//--------------------------------------      AdminRole        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminRole {
    Admin,
    SuperAdmin,
}

impl Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminRole::Admin => f.write_str("ADMIN"),
            AdminRole::SuperAdmin => f.write_str("SUPER_ADMIN"),
        }
    }
}

impl FromStr for AdminRole {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            s => Err(ConversionError(format!("Invalid admin role: {s}"))),
        }
    }
}

//--------------------------------------         User          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub balance: Cents,
    pub points: i64,
    pub address: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The subset of a user record needed to check a login. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// When set, a store with this name is created for the user in the same transaction.
    pub store_name: Option<String>,
}

impl NewUser {
    pub fn new<S: Into<String>>(name: S, email: S, password_hash: S) -> Self {
        Self { name: name.into(), email: email.into(), password_hash: password_hash.into(), store_name: None }
    }

    pub fn with_store<S: Into<String>>(mut self, store_name: S) -> Self {
        self.store_name = Some(store_name.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none() && self.avatar_url.is_none()
    }
}

/// Administrative edit of a user record. A new balance is applied as a ledger adjustment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub points: Option<i64>,
    pub balance: Option<Cents>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() &&
            self.email.is_none() &&
            self.address.is_none() &&
            self.points.is_none() &&
            self.balance.is_none()
    }
}

//--------------------------------------        Store          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStore {
    pub owner_id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl StoreUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// A store as seen by a particular user, including that user's membership status (if any).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSearchResult {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub store: Store,
    pub owner_name: String,
    pub user_status: Option<MembershipStatus>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub store: Store,
    pub owner_name: String,
    pub owner_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreWithMenu {
    #[serde(flatten)]
    pub store: Store,
    pub owner_name: String,
    pub menu_items: Vec<MenuItem>,
}

//--------------------------------------       MenuItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Cents,
    pub emoji: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuItem {
    pub store_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Cents,
    pub emoji: Option<String>,
    pub image_url: Option<String>,
}

impl NewMenuItem {
    pub fn new<S: Into<String>>(store_id: i64, name: S, price: Cents) -> Self {
        Self {
            store_id,
            name: name.into(),
            category: None,
            description: None,
            price,
            emoji: None,
            image_url: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<Cents>,
    pub emoji: Option<String>,
    pub image_url: Option<String>,
}

impl MenuItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() &&
            self.category.is_none() &&
            self.description.is_none() &&
            self.price.is_none() &&
            self.emoji.is_none() &&
            self.image_url.is_none()
    }
}

/// The price lookup row used when pricing a new order.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct MenuItemPrice {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    pub price: Cents,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopMenuItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: MenuItem,
    pub store_name: String,
    pub order_count: i64,
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub buyer_id: i64,
    pub store_id: i64,
    pub total_price: Cents,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    /// `None` once the menu item has been deleted. The name and price snapshots remain.
    pub menu_item_id: Option<i64>,
    pub item_name: String,
    pub unit_price: Cents,
    pub quantity: i64,
}

impl OrderItem {
    pub fn line_total(&self) -> Cents {
        self.unit_price * self.quantity
    }
}

/// An order row joined with the names needed to display it.
#[derive(Debug, Clone, FromRow)]
pub struct OrderSummary {
    #[sqlx(flatten)]
    pub order: Order,
    pub buyer_name: String,
    pub store_name: String,
    pub store_owner_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub buyer_name: String,
    pub store_name: String,
    pub store_owner_id: i64,
    pub items: Vec<OrderItem>,
}

impl OrderDetail {
    pub fn from_summary(summary: OrderSummary, items: Vec<OrderItem>) -> Self {
        let OrderSummary { order, buyer_name, store_name, store_owner_id } = summary;
        Self { order, buyer_name, store_name, store_owner_id, items }
    }
}

/// A single line of an order request, before prices are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub menu_item_id: i64,
    pub quantity: i64,
}

impl OrderLineRequest {
    pub fn new(menu_item_id: i64, quantity: i64) -> Self {
        Self { menu_item_id, quantity }
    }
}

/// An order line after its price has been resolved from the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrderLine {
    pub menu_item_id: i64,
    pub item_name: String,
    pub unit_price: Cents,
    pub quantity: i64,
}

/// A fully priced order, ready to be written to the database in a single transaction.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_id: i64,
    pub store_id: i64,
    pub lines: Vec<PricedOrderLine>,
    pub total_price: Cents,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub status: Option<OrderStatusType>,
}

//--------------------------------------      Membership       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: i64,
    pub user_id: i64,
    pub store_id: i64,
    pub status: MembershipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub membership: Membership,
    pub user_name: String,
    pub user_email: String,
}

//--------------------------------------   BalanceTransaction  ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceTransaction {
    pub id: i64,
    pub user_id: i64,
    pub order_id: Option<i64>,
    pub amount: Cents,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Admin          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AdminCredentials {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: AdminRole,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: AdminRole,
}

//--------------------------------------     OperationLog      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogAction {
    Register,
    Login,
    Create,
    Update,
    Delete,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Register => "REGISTER",
            LogAction::Login => "LOGIN",
            LogAction::Create => "CREATE",
            LogAction::Update => "UPDATE",
            LogAction::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogModule {
    User,
    UserProfile,
    Store,
    Order,
    Admin,
}

impl LogModule {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogModule::User => "USER",
            LogModule::UserProfile => "USER_PROFILE",
            LogModule::Store => "STORE",
            LogModule::Order => "ORDER",
            LogModule::Admin => "ADMIN",
        }
    }
}

/// Who performed a logged operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    User(i64),
    Admin(i64),
    Anonymous,
}

#[derive(Debug, Clone)]
pub struct NewOperationLog {
    pub actor: Actor,
    pub action: LogAction,
    pub module: LogModule,
    pub description: String,
    pub ip: String,
    pub area: Option<String>,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationLog {
    pub id: i64,
    pub user_id: Option<i64>,
    pub admin_id: Option<i64>,
    pub action: String,
    pub module: String,
    pub description: String,
    pub ip: String,
    pub area: Option<String>,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationLogEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub log: OperationLog,
    pub user_email: Option<String>,
    pub admin_email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogOptions {
    pub modules: Vec<String>,
    pub actions: Vec<String>,
}

//--------------------------------------   EmailVerification   ---------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct EmailVerification {
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
    pub daily_send_count: i64,
    pub last_sent_at: DateTime<Utc>,
}
