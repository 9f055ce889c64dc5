//! User-facing request handlers.
//!
//! Back-office routes live in [`crate::admin_routes`] and the notification socket in [`crate::notifications`].
//! Handlers only unpack the request, call the engine and wrap the result in the response envelope. Anything more than
//! that belongs in the engine.
//!
//! Every handler is async and every engine call is awaited, so a slow database call never stalls the worker thread.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use mini_order_engine::{
    account_objects::{PasswordReset, Registration},
    db_types::{Actor, LogAction, LogModule, MenuItemUpdate, NewMenuItem, ProfileUpdate, StoreUpdate},
    order_objects::NewOrderRequest,
    query_objects::{OrderQueryFilter, Pagination},
    traits::{
        AccountManagement,
        AuditLogManagement,
        MenuManagement,
        OrderManagement,
        StoreManagement,
        VerificationCodeManagement,
    },
    AccountApi,
    AuditApi,
    EngineError,
    MenuApi,
    OrderFlowApi,
    StoreApi,
};

use crate::{
    auth::{JwtClaims, Role, TokenIssuer},
    config::ProxyConfig,
    data_objects::{
        ok_response,
        EmailRequest,
        LedgerParams,
        LoginRequest,
        LoginResponse,
        MembershipDecision,
        NewStoreRequest,
        OrderListParams,
        ProfileResponse,
        StatusUpdateRequest,
        StorePageParams,
        StoreSearchParams,
    },
    errors::ServerError,
    helpers::request_origin,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
//
// * `route!(name => Method "path" requires [roles])` registers a non-generic handler behind the ACL middleware.
// * `route!(name => Method "path" impl Bounds where requires [roles])` registers `name::<A>` behind the ACL middleware,
//   where `A` is the backend type and must implement every bound.
// * `route!(name => Method "path" impl Bounds)` registers a public generic handler.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Accounts  ----------------------------------------------------
route!(send_register_code => Post "/users/send-register-code" impl AccountManagement, VerificationCodeManagement);
pub async fn send_register_code<A>(
    body: web::Json<EmailRequest>,
    api: web::Data<AccountApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: AccountManagement + VerificationCodeManagement,
{
    debug!("💻️ POST register code for {}", body.email);
    api.send_register_code(&body.email).await?;
    Ok(ok_response("Verification code sent"))
}

route!(register => Post "/users/register" impl AccountManagement, VerificationCodeManagement, AuditLogManagement);
pub async fn register<A>(
    req: HttpRequest,
    body: web::Json<Registration>,
    api: web::Data<AccountApi<A>>,
    audit: web::Data<AuditApi<A>>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError>
where
    A: AccountManagement + VerificationCodeManagement + AuditLogManagement,
{
    debug!("💻️ POST register for {}", body.email);
    let user = api.register(body.into_inner()).await?;
    let origin = request_origin(&req, &proxy);
    let description = format!("User {} registered", user.email);
    audit.record(Actor::User(user.id), LogAction::Register, LogModule::User, description, &origin).await;
    Ok(ok_response(user))
}

route!(login => Post "/users/login" impl AccountManagement, VerificationCodeManagement, AuditLogManagement);
pub async fn login<A>(
    req: HttpRequest,
    body: web::Json<LoginRequest>,
    api: web::Data<AccountApi<A>>,
    audit: web::Data<AuditApi<A>>,
    signer: web::Data<TokenIssuer>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError>
where
    A: AccountManagement + VerificationCodeManagement + AuditLogManagement,
{
    debug!("💻️ POST login for {}", body.email);
    let user = api.login(&body.email, &body.password).await?.user;
    let token = signer.issue_token(user.id, vec![Role::User])?;
    trace!("💻️ Issued access token for user #{}", user.id);
    let origin = request_origin(&req, &proxy);
    let description = format!("User {} logged in", user.email);
    audit.record(Actor::User(user.id), LogAction::Login, LogModule::User, description, &origin).await;
    Ok(ok_response(LoginResponse { token, user }))
}

route!(send_password_reset_email => Post "/users/send-password-reset-email" impl AccountManagement, VerificationCodeManagement);
pub async fn send_password_reset_email<A>(
    body: web::Json<EmailRequest>,
    api: web::Data<AccountApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: AccountManagement + VerificationCodeManagement,
{
    debug!("💻️ POST password reset code for {}", body.email);
    api.send_password_reset_code(&body.email).await?;
    Ok(ok_response("Verification code sent"))
}

route!(reset_password => Post "/users/reset-password" impl AccountManagement, VerificationCodeManagement);
pub async fn reset_password<A>(
    body: web::Json<PasswordReset>,
    api: web::Data<AccountApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: AccountManagement + VerificationCodeManagement,
{
    debug!("💻️ POST reset password for {}", body.email);
    api.reset_password(body.into_inner()).await?;
    Ok(ok_response("Password has been reset"))
}

route!(user_info => Post "/users/info" impl AccountManagement, VerificationCodeManagement, StoreManagement where requires [Role::User]);
pub async fn user_info<A>(
    claims: JwtClaims,
    accounts: web::Data<AccountApi<A>>,
    stores: web::Data<StoreApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: AccountManagement + VerificationCodeManagement + StoreManagement,
{
    debug!("💻️ POST user info for #{}", claims.sub);
    let user = accounts.profile(claims.sub).await?;
    let store = match stores.my_store(claims.sub).await {
        Ok(store) => Some(store),
        Err(EngineError::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };
    Ok(ok_response(ProfileResponse { user, store }))
}

route!(update_profile => Put "/users/{id:\\d+}" impl AccountManagement, VerificationCodeManagement, AuditLogManagement where requires [Role::User]);
pub async fn update_profile<A>(
    req: HttpRequest,
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<ProfileUpdate>,
    api: web::Data<AccountApi<A>>,
    audit: web::Data<AuditApi<A>>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError>
where
    A: AccountManagement + VerificationCodeManagement + AuditLogManagement,
{
    let user_id = path.into_inner();
    debug!("💻️ PUT profile #{user_id} by #{}", claims.sub);
    let user = api.update_profile(claims.sub, user_id, body.into_inner()).await?;
    let origin = request_origin(&req, &proxy);
    let description = format!("User {} updated their profile", user.email);
    audit.record(Actor::User(user.id), LogAction::Update, LogModule::UserProfile, description, &origin).await;
    Ok(ok_response(user))
}

route!(balance_transactions => Get "/users/balance-transactions" impl AccountManagement, VerificationCodeManagement where requires [Role::User]);
pub async fn balance_transactions<A>(
    claims: JwtClaims,
    params: web::Query<LedgerParams>,
    api: web::Data<AccountApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: AccountManagement + VerificationCodeManagement,
{
    debug!("💻️ GET balance transactions for #{}", claims.sub);
    let params = params.into_inner();
    let pagination = Pagination::new(params.page, params.limit.or(params.page_size))?;
    let page = api.balance_transactions(claims.sub, pagination).await?;
    Ok(ok_response(page))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders/create" impl OrderManagement where requires [Role::User]);
pub async fn create_order<A: OrderManagement>(
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST create order for #{} at store #{}", claims.sub, body.store_id);
    let order = api.create_order(claims.sub, body.into_inner()).await?;
    Ok(ok_response(order))
}

fn order_filter_and_page(params: OrderListParams) -> Result<(OrderQueryFilter, Pagination), ServerError> {
    let pagination = Pagination::new(params.page, params.page_size)?;
    let filter = OrderQueryFilter::default().with_query_params(
        params.status.as_deref(),
        params.start_date.as_deref(),
        params.end_date.as_deref(),
    )?;
    Ok((filter, pagination))
}

route!(my_orders => Get "/orders" impl OrderManagement where requires [Role::User]);
pub async fn my_orders<A: OrderManagement>(
    claims: JwtClaims,
    params: web::Query<OrderListParams>,
    api: web::Data<OrderFlowApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for #{}", claims.sub);
    let (filter, pagination) = order_filter_and_page(params.into_inner())?;
    let page = api.orders_for_buyer(claims.sub, filter, pagination).await?;
    Ok(ok_response(page))
}

route!(store_orders => Get "/orders/store-orders" impl OrderManagement where requires [Role::User]);
pub async fn store_orders<A: OrderManagement>(
    claims: JwtClaims,
    params: web::Query<OrderListParams>,
    api: web::Data<OrderFlowApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET store orders for #{}", claims.sub);
    let (filter, pagination) = order_filter_and_page(params.into_inner())?;
    let page = api.orders_for_store_owner(claims.sub, filter, pagination).await?;
    Ok(ok_response(page))
}

route!(update_order_status => Put "/orders/{id:\\d+}/status" impl OrderManagement where requires [Role::User]);
pub async fn update_order_status<A: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ PUT order #{order_id} status {} by #{}", body.status, claims.sub);
    let order = api.update_order_status(claims.sub, order_id, &body.status).await?;
    Ok(ok_response(order))
}

route!(order_by_id => Get "/orders/{id:\\d+}" impl OrderManagement where requires [Role::User]);
pub async fn order_by_id<A: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order #{order_id} for #{}", claims.sub);
    let order = api.order_for_user(claims.sub, order_id).await?;
    Ok(ok_response(order))
}

//----------------------------------------------   Stores  ----------------------------------------------------
route!(create_store => Post "/stores/create" impl StoreManagement where requires [Role::User]);
pub async fn create_store<A: StoreManagement>(
    claims: JwtClaims,
    body: web::Json<NewStoreRequest>,
    api: web::Data<StoreApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST create store {} for #{}", body.name, claims.sub);
    let NewStoreRequest { name, description } = body.into_inner();
    let store = api.create_store(claims.sub, &name, description).await?;
    Ok(ok_response(store))
}

route!(update_my_store => Post "/stores/update" impl StoreManagement where requires [Role::User]);
pub async fn update_my_store<A: StoreManagement>(
    claims: JwtClaims,
    body: web::Json<StoreUpdate>,
    api: web::Data<StoreApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST update store of #{}", claims.sub);
    let store = api.my_store(claims.sub).await?;
    let store = api.update_store(claims.sub, store.id, body.into_inner()).await?;
    Ok(ok_response(store))
}

route!(search_stores => Get "/stores/search" impl StoreManagement where requires [Role::User]);
pub async fn search_stores<A: StoreManagement>(
    claims: JwtClaims,
    params: web::Query<StoreSearchParams>,
    api: web::Data<StoreApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let name = params.into_inner().name.unwrap_or_default();
    debug!("💻️ GET store search '{name}' for #{}", claims.sub);
    let stores = api.search_by_name(&name, claims.sub).await?;
    Ok(ok_response(stores))
}

route!(paginate_stores => Get "/stores/paginate" impl StoreManagement where requires [Role::User]);
pub async fn paginate_stores<A: StoreManagement>(
    params: web::Query<StorePageParams>,
    api: web::Data<StoreApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let params = params.into_inner();
    debug!("💻️ GET store page {:?}", params.page);
    let pagination = Pagination::new(params.page, params.page_size)?;
    let page = api.paginate(params.name.as_deref(), pagination).await?;
    Ok(ok_response(page))
}

route!(selected_stores => Get "/stores/user-selected" impl StoreManagement where requires [Role::User]);
pub async fn selected_stores<A: StoreManagement>(
    claims: JwtClaims,
    api: web::Data<StoreApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET selected stores for #{}", claims.sub);
    let stores = api.selected_stores(claims.sub).await?;
    Ok(ok_response(stores))
}

route!(store_memberships => Get "/stores/user-memberships" impl StoreManagement where requires [Role::User]);
pub async fn store_memberships<A: StoreManagement>(
    claims: JwtClaims,
    api: web::Data<StoreApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET memberships of the store owned by #{}", claims.sub);
    let memberships = api.memberships_for_owner(claims.sub).await?;
    Ok(ok_response(memberships))
}

route!(top_menu_items => Get "/stores/top-menu-items" impl StoreManagement where requires [Role::User]);
pub async fn top_menu_items<A: StoreManagement>(
    claims: JwtClaims,
    api: web::Data<StoreApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET top menu items for #{}", claims.sub);
    let items = api.top_menu_items(claims.sub).await?;
    Ok(ok_response(items))
}

route!(join_store => Post "/stores/{id:\\d+}/join" impl StoreManagement where requires [Role::User]);
pub async fn join_store<A: StoreManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<StoreApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let store_id = path.into_inner();
    debug!("💻️ POST join store #{store_id} by #{}", claims.sub);
    let membership = api.request_join(claims.sub, store_id).await?;
    Ok(ok_response(membership))
}

route!(update_membership => Post "/stores/update-membership" impl StoreManagement where requires [Role::User]);
pub async fn update_membership<A: StoreManagement>(
    claims: JwtClaims,
    body: web::Json<MembershipDecision>,
    api: web::Data<StoreApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let MembershipDecision { store_id, user_id, accept } = body.into_inner();
    debug!("💻️ POST membership of #{user_id} in store #{store_id}: accept={accept}");
    let membership = api.update_membership(claims.sub, store_id, user_id, accept).await?;
    Ok(ok_response(membership))
}

//----------------------------------------------   Menu  ----------------------------------------------------
route!(menu_for_store => Get "/menu/store/{store_id:\\d+}" impl MenuManagement, StoreManagement);
pub async fn menu_for_store<A>(path: web::Path<i64>, api: web::Data<MenuApi<A>>) -> Result<HttpResponse, ServerError>
where A: MenuManagement + StoreManagement {
    let store_id = path.into_inner();
    debug!("💻️ GET menu of store #{store_id}");
    let items = api.menu_for_store(store_id).await?;
    Ok(ok_response(items))
}

route!(create_menu_item => Post "/menu" impl MenuManagement, StoreManagement where requires [Role::User]);
pub async fn create_menu_item<A>(
    claims: JwtClaims,
    body: web::Json<NewMenuItem>,
    api: web::Data<MenuApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: MenuManagement + StoreManagement,
{
    debug!("💻️ POST menu item {} for store #{}", body.name, body.store_id);
    let item = api.create_item(claims.sub, body.into_inner()).await?;
    Ok(ok_response(item))
}

route!(update_menu_item => Put "/menu/{id:\\d+}" impl MenuManagement, StoreManagement where requires [Role::User]);
pub async fn update_menu_item<A>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<MenuItemUpdate>,
    api: web::Data<MenuApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: MenuManagement + StoreManagement,
{
    let item_id = path.into_inner();
    debug!("💻️ PUT menu item #{item_id} by #{}", claims.sub);
    let item = api.update_item(claims.sub, item_id, body.into_inner()).await?;
    Ok(ok_response(item))
}

route!(delete_menu_item => Delete "/menu/{id:\\d+}" impl MenuManagement, StoreManagement where requires [Role::User]);
pub async fn delete_menu_item<A>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<MenuApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: MenuManagement + StoreManagement,
{
    let item_id = path.into_inner();
    debug!("💻️ DELETE menu item #{item_id} by #{}", claims.sub);
    api.delete_item(claims.sub, item_id).await?;
    Ok(ok_response(format!("Menu item {item_id} deleted")))
}
