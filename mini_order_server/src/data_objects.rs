use std::fmt::Debug;

use actix_web::{http::header::ContentType, HttpResponse};
use mini_order_engine::{
    account_objects::AuthenticatedAdmin,
    db_types::{Store, User},
};
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};

/// The envelope every API response is wrapped in. `code` is zero on success, and the HTTP status otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
    pub trace_id: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { code: 0, message: "success".to_string(), data: Some(data), trace_id: new_trace_id() }
    }

    pub fn failure<S: Into<String>>(code: u16, message: S) -> Self {
        Self { code, message: message.into(), data: None, trace_id: new_trace_id() }
    }
}

/// A 200 OK response carrying `data` in the success envelope.
pub fn ok_response<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().insert_header(ContentType::json()).json(ApiResponse::success(data))
}

pub fn new_trace_id() -> String {
    format!("{:016x}", thread_rng().gen::<u64>())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest").field("email", &self.email).field("password", &"******").finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminLoginResponse {
    pub token: String,
    pub admin: AuthenticatedAdmin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub store: Option<Store>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStoreRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipDecision {
    pub store_id: i64,
    pub user_id: i64,
    pub accept: bool,
}

/// `page`, `pageSize` and the order filters accepted by the order listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// The ledger listing uses `limit` for the page size. `pageSize` is accepted as well.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSearchParams {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorePageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub name: Option<String>,
}

/// Query parameters of the back-office listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordPageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSearchParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub email: Option<String>,
    pub module: Option<String>,
    pub action: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub order_by: Option<String>,
    pub order: Option<String>,
}
