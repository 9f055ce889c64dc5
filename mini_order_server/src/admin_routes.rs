//! Back-office routes.
//!
//! Everything under `/api/admin` except the login needs an admin token. Listings and the operation log are open to
//! every admin; anything that changes data needs the `super_admin` role. Mutations are written to the operation log
//! with the admin as the actor.
use actix_web::{web, HttpRequest, HttpResponse};
use log::*;
use mini_order_engine::{
    account_objects::{NewAdminAccount, NewUserAccount},
    db_types::{Actor, LogAction, LogModule, NewStore, OrderUpdate, StoreUpdate, UserUpdate},
    query_objects::{LogQueryFilter, Pagination},
    traits::{AccountManagement, AdminManagement, AuditLogManagement},
    AdminApi,
    AuditApi,
    EngineError,
};

use crate::{
    auth::{admin_roles, JwtClaims, Role, TokenIssuer},
    config::ProxyConfig,
    data_objects::{ok_response, AdminLoginResponse, KeywordPageParams, LoginRequest, LogSearchParams},
    errors::{AuthError, ServerError},
    helpers::request_origin,
    route,
};

fn keyword_and_page(params: &KeywordPageParams) -> Result<(Option<&str>, Pagination), ServerError> {
    let pagination = Pagination::new(params.page, params.page_size)?;
    let keyword = params.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty());
    Ok((keyword, pagination))
}

route!(admin_login => Post "/admin/login" impl AdminManagement, AccountManagement, AuditLogManagement);
pub async fn admin_login<A>(
    req: HttpRequest,
    body: web::Json<LoginRequest>,
    api: web::Data<AdminApi<A>>,
    audit: web::Data<AuditApi<A>>,
    signer: web::Data<TokenIssuer>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError>
where
    A: AdminManagement + AccountManagement + AuditLogManagement,
{
    debug!("💻️ POST admin login for {}", body.email);
    let admin = api.login(&body.email, &body.password).await?;
    let token = signer.issue_token(admin.id, admin_roles(admin.role))?;
    let origin = request_origin(&req, &proxy);
    let description = format!("Admin {} logged in", admin.email);
    audit.record(Actor::Admin(admin.id), LogAction::Login, LogModule::Admin, description, &origin).await;
    Ok(ok_response(AdminLoginResponse { token, admin }))
}

route!(register_admin => Post "/admin/register" impl AdminManagement, AccountManagement, AuditLogManagement where requires [Role::SuperAdmin]);
pub async fn register_admin<A>(
    req: HttpRequest,
    claims: JwtClaims,
    body: web::Json<NewAdminAccount>,
    api: web::Data<AdminApi<A>>,
    audit: web::Data<AuditApi<A>>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError>
where
    A: AdminManagement + AccountManagement + AuditLogManagement,
{
    debug!("💻️ POST register admin {} by admin #{}", body.email, claims.sub);
    let role = claims
        .admin_role()
        .ok_or_else(|| AuthError::InsufficientPermissions("An admin token is required".to_string()))?;
    let admin = api.register_admin(role, body.into_inner()).await?;
    let origin = request_origin(&req, &proxy);
    let description = format!("Created {} {}", admin.role, admin.email);
    audit.record(Actor::Admin(claims.sub), LogAction::Create, LogModule::Admin, description, &origin).await;
    Ok(ok_response(admin))
}

//----------------------------------------------   Users  ----------------------------------------------------
route!(admin_users => Get "/admin/users" impl AdminManagement, AccountManagement where requires [Role::Admin]);
pub async fn admin_users<A>(
    params: web::Query<KeywordPageParams>,
    api: web::Data<AdminApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: AdminManagement + AccountManagement,
{
    let (keyword, pagination) = keyword_and_page(&params)?;
    debug!("💻️ GET admin users page {} ({keyword:?})", pagination.page());
    let page = api.users(keyword, pagination).await?;
    Ok(ok_response(page))
}

route!(admin_create_user => Post "/admin/users" impl AdminManagement, AccountManagement, AuditLogManagement where requires [Role::SuperAdmin]);
pub async fn admin_create_user<A>(
    req: HttpRequest,
    claims: JwtClaims,
    body: web::Json<NewUserAccount>,
    api: web::Data<AdminApi<A>>,
    audit: web::Data<AuditApi<A>>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError>
where
    A: AdminManagement + AccountManagement + AuditLogManagement,
{
    debug!("💻️ POST admin create user {}", body.email);
    let user = api.create_user(body.into_inner()).await?;
    let origin = request_origin(&req, &proxy);
    let description = format!("Created user #{} ({})", user.id, user.email);
    audit.record(Actor::Admin(claims.sub), LogAction::Create, LogModule::User, description, &origin).await;
    Ok(ok_response(user))
}

route!(admin_update_user => Put "/admin/users/{id:\\d+}" impl AdminManagement, AccountManagement, AuditLogManagement where requires [Role::SuperAdmin]);
pub async fn admin_update_user<A>(
    req: HttpRequest,
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<UserUpdate>,
    api: web::Data<AdminApi<A>>,
    audit: web::Data<AuditApi<A>>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError>
where
    A: AdminManagement + AccountManagement + AuditLogManagement,
{
    let user_id = path.into_inner();
    debug!("💻️ PUT admin update user #{user_id}");
    let user = api.update_user(user_id, body.into_inner()).await?;
    let origin = request_origin(&req, &proxy);
    let description = format!("Updated user #{user_id} ({})", user.email);
    audit.record(Actor::Admin(claims.sub), LogAction::Update, LogModule::User, description, &origin).await;
    Ok(ok_response(user))
}

route!(admin_delete_user => Delete "/admin/users/{id:\\d+}" impl AdminManagement, AccountManagement, AuditLogManagement where requires [Role::SuperAdmin]);
pub async fn admin_delete_user<A>(
    req: HttpRequest,
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AdminApi<A>>,
    audit: web::Data<AuditApi<A>>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError>
where
    A: AdminManagement + AccountManagement + AuditLogManagement,
{
    let user_id = path.into_inner();
    debug!("💻️ DELETE admin user #{user_id}");
    api.delete_user(user_id).await?;
    let origin = request_origin(&req, &proxy);
    let description = format!("Deleted user #{user_id}");
    audit.record(Actor::Admin(claims.sub), LogAction::Delete, LogModule::User, description, &origin).await;
    Ok(ok_response(format!("User {user_id} deleted")))
}

//----------------------------------------------   Stores  ----------------------------------------------------
route!(admin_stores => Get "/admin/stores" impl AdminManagement, AccountManagement where requires [Role::Admin]);
pub async fn admin_stores<A>(
    params: web::Query<KeywordPageParams>,
    api: web::Data<AdminApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: AdminManagement + AccountManagement,
{
    let (keyword, pagination) = keyword_and_page(&params)?;
    debug!("💻️ GET admin stores page {} ({keyword:?})", pagination.page());
    let page = api.stores(keyword, pagination).await?;
    Ok(ok_response(page))
}

route!(admin_create_store => Post "/admin/stores" impl AdminManagement, AccountManagement, AuditLogManagement where requires [Role::SuperAdmin]);
pub async fn admin_create_store<A>(
    req: HttpRequest,
    claims: JwtClaims,
    body: web::Json<NewStore>,
    api: web::Data<AdminApi<A>>,
    audit: web::Data<AuditApi<A>>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError>
where
    A: AdminManagement + AccountManagement + AuditLogManagement,
{
    debug!("💻️ POST admin create store {} for user #{}", body.name, body.owner_id);
    let store = api.create_store(body.into_inner()).await?;
    let origin = request_origin(&req, &proxy);
    let description = format!("Created store #{} ({}) for user #{}", store.id, store.name, store.owner_id);
    audit.record(Actor::Admin(claims.sub), LogAction::Create, LogModule::Store, description, &origin).await;
    Ok(ok_response(store))
}

route!(admin_update_store => Put "/admin/stores/{id:\\d+}" impl AdminManagement, AccountManagement, AuditLogManagement where requires [Role::SuperAdmin]);
pub async fn admin_update_store<A>(
    req: HttpRequest,
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<StoreUpdate>,
    api: web::Data<AdminApi<A>>,
    audit: web::Data<AuditApi<A>>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError>
where
    A: AdminManagement + AccountManagement + AuditLogManagement,
{
    let store_id = path.into_inner();
    debug!("💻️ PUT admin update store #{store_id}");
    let store = api.update_store(store_id, body.into_inner()).await?;
    let origin = request_origin(&req, &proxy);
    let description = format!("Updated store #{store_id} ({})", store.name);
    audit.record(Actor::Admin(claims.sub), LogAction::Update, LogModule::Store, description, &origin).await;
    Ok(ok_response(store))
}

route!(admin_delete_store => Delete "/admin/stores/{id:\\d+}" impl AdminManagement, AccountManagement, AuditLogManagement where requires [Role::SuperAdmin]);
pub async fn admin_delete_store<A>(
    req: HttpRequest,
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AdminApi<A>>,
    audit: web::Data<AuditApi<A>>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError>
where
    A: AdminManagement + AccountManagement + AuditLogManagement,
{
    let store_id = path.into_inner();
    debug!("💻️ DELETE admin store #{store_id}");
    api.delete_store(store_id).await?;
    let origin = request_origin(&req, &proxy);
    let description = format!("Deleted store #{store_id}");
    audit.record(Actor::Admin(claims.sub), LogAction::Delete, LogModule::Store, description, &origin).await;
    Ok(ok_response(format!("Store {store_id} deleted")))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(admin_orders => Get "/admin/orders" impl AdminManagement, AccountManagement where requires [Role::Admin]);
pub async fn admin_orders<A>(
    params: web::Query<KeywordPageParams>,
    api: web::Data<AdminApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: AdminManagement + AccountManagement,
{
    let (keyword, pagination) = keyword_and_page(&params)?;
    debug!("💻️ GET admin orders page {} ({keyword:?})", pagination.page());
    let page = api.orders(keyword, pagination).await?;
    Ok(ok_response(page))
}

route!(admin_update_order => Put "/admin/orders/{id:\\d+}" impl AdminManagement, AccountManagement, AuditLogManagement where requires [Role::SuperAdmin]);
pub async fn admin_update_order<A>(
    req: HttpRequest,
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<OrderUpdate>,
    api: web::Data<AdminApi<A>>,
    audit: web::Data<AuditApi<A>>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError>
where
    A: AdminManagement + AccountManagement + AuditLogManagement,
{
    let order_id = path.into_inner();
    debug!("💻️ PUT admin update order #{order_id}");
    let status = body.into_inner().status.ok_or_else(|| EngineError::validation("Order status is required"))?;
    let order = api.update_order_status(order_id, status).await?;
    let origin = request_origin(&req, &proxy);
    let description = format!("Set order #{order_id} status to {}", order.status);
    audit.record(Actor::Admin(claims.sub), LogAction::Update, LogModule::Order, description, &origin).await;
    Ok(ok_response(order))
}

route!(admin_delete_order => Delete "/admin/orders/{id:\\d+}" impl AdminManagement, AccountManagement, AuditLogManagement where requires [Role::SuperAdmin]);
pub async fn admin_delete_order<A>(
    req: HttpRequest,
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AdminApi<A>>,
    audit: web::Data<AuditApi<A>>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError>
where
    A: AdminManagement + AccountManagement + AuditLogManagement,
{
    let order_id = path.into_inner();
    debug!("💻️ DELETE admin order #{order_id}");
    api.delete_order(order_id).await?;
    let origin = request_origin(&req, &proxy);
    let description = format!("Deleted order #{order_id}");
    audit.record(Actor::Admin(claims.sub), LogAction::Delete, LogModule::Order, description, &origin).await;
    Ok(ok_response(format!("Order {order_id} deleted")))
}

//----------------------------------------------   Logs  ----------------------------------------------------
route!(search_logs => Get "/admin/logs" impl AuditLogManagement where requires [Role::Admin]);
pub async fn search_logs<A: AuditLogManagement>(
    params: web::Query<LogSearchParams>,
    api: web::Data<AuditApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let p = params.into_inner();
    debug!("💻️ GET operation logs {p:?}");
    let pagination = Pagination::new(p.page, p.page_size)?;
    let filter = LogQueryFilter::from_query_params(
        p.email.as_deref(),
        p.module.as_deref(),
        p.action.as_deref(),
        p.start_date.as_deref(),
        p.end_date.as_deref(),
        p.order_by.as_deref(),
        p.order.as_deref(),
    )?;
    let page = api.search(filter, pagination).await?;
    Ok(ok_response(page))
}

route!(log_options => Get "/admin/logs/options" impl AuditLogManagement where requires [Role::Admin]);
pub async fn log_options<A: AuditLogManagement>(api: web::Data<AuditApi<A>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET operation log options");
    let options = api.options().await?;
    Ok(ok_response(options))
}
