use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use mini_order_engine::{
    events::{EventHandlers, EventProducers},
    AccountApi,
    AdminApi,
    AuditApi,
    MenuApi,
    OrderFlowApi,
    SqliteDatabase,
    StoreApi,
};

use crate::{
    admin_routes::{
        AdminCreateStoreRoute,
        AdminCreateUserRoute,
        AdminDeleteOrderRoute,
        AdminDeleteStoreRoute,
        AdminDeleteUserRoute,
        AdminLoginRoute,
        AdminOrdersRoute,
        AdminStoresRoute,
        AdminUpdateOrderRoute,
        AdminUpdateStoreRoute,
        AdminUpdateUserRoute,
        AdminUsersRoute,
        LogOptionsRoute,
        RegisterAdminRoute,
        SearchLogsRoute,
    },
    auth::TokenIssuer,
    config::{ProxyConfig, ServerConfig},
    errors::ServerError,
    notifications::{notification_hooks, NotificationHub, NotificationSocketRoute},
    routes::{
        health,
        BalanceTransactionsRoute,
        CreateMenuItemRoute,
        CreateOrderRoute,
        CreateStoreRoute,
        DeleteMenuItemRoute,
        JoinStoreRoute,
        LoginRoute,
        MenuForStoreRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        PaginateStoresRoute,
        RegisterRoute,
        ResetPasswordRoute,
        SearchStoresRoute,
        SelectedStoresRoute,
        SendPasswordResetEmailRoute,
        SendRegisterCodeRoute,
        StoreMembershipsRoute,
        StoreOrdersRoute,
        TopMenuItemsRoute,
        UpdateMembershipRoute,
        UpdateMenuItemRoute,
        UpdateMyStoreRoute,
        UpdateOrderStatusRoute,
        UpdateProfileRoute,
        UserInfoRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections).await?;
    db.migrate().await?;
    info!("🗃️ Database at {} is ready", db.url());
    if let Some(super_admin) = &config.super_admin {
        AdminApi::new(db.clone()).bootstrap_super_admin(&super_admin.email, super_admin.password.reveal()).await?;
    }
    let hub = Arc::new(NotificationHub::new());
    let handlers = EventHandlers::new(config.event_buffer_size, notification_hooks(Arc::clone(&hub)));
    let producers = handlers.producers();
    handlers.start_handlers();
    info!("📬️ Event handlers started");
    let srv = create_server_instance(config, db, producers, hub)?;
    Ok(srv.await?)
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
    hub: Arc<NotificationHub>,
) -> Result<Server, ServerError> {
    let proxy = ProxyConfig::from_config(&config);
    let auth = config.auth.clone();
    let srv = HttpServer::new(move || {
        let accounts_api = AccountApi::new(db.clone(), producers.clone());
        let stores_api = StoreApi::new(db.clone(), producers.clone());
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let menu_api = MenuApi::new(db.clone());
        let admin_api = AdminApi::new(db.clone());
        let audit_api = AuditApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mo::access_log"))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                ServerError::InvalidRequestBody(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                ServerError::InvalidQuery(err.to_string()).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                ServerError::InvalidRequestPath(err.to_string()).into()
            }))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(stores_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(menu_api))
            .app_data(web::Data::new(admin_api))
            .app_data(web::Data::new(audit_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(proxy))
            .app_data(web::Data::from(Arc::clone(&hub)));
        let user_scope = web::scope("/api")
            // Public
            .service(SendRegisterCodeRoute::<SqliteDatabase>::new())
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(SendPasswordResetEmailRoute::<SqliteDatabase>::new())
            .service(ResetPasswordRoute::<SqliteDatabase>::new())
            .service(MenuForStoreRoute::<SqliteDatabase>::new())
            .service(AdminLoginRoute::<SqliteDatabase>::new())
            // Users
            .service(UserInfoRoute::<SqliteDatabase>::new())
            .service(UpdateProfileRoute::<SqliteDatabase>::new())
            .service(BalanceTransactionsRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(StoreOrdersRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(CreateStoreRoute::<SqliteDatabase>::new())
            .service(UpdateMyStoreRoute::<SqliteDatabase>::new())
            .service(SearchStoresRoute::<SqliteDatabase>::new())
            .service(PaginateStoresRoute::<SqliteDatabase>::new())
            .service(SelectedStoresRoute::<SqliteDatabase>::new())
            .service(StoreMembershipsRoute::<SqliteDatabase>::new())
            .service(TopMenuItemsRoute::<SqliteDatabase>::new())
            .service(JoinStoreRoute::<SqliteDatabase>::new())
            .service(UpdateMembershipRoute::<SqliteDatabase>::new())
            .service(CreateMenuItemRoute::<SqliteDatabase>::new())
            .service(UpdateMenuItemRoute::<SqliteDatabase>::new())
            .service(DeleteMenuItemRoute::<SqliteDatabase>::new())
            .service(NotificationSocketRoute::new())
            // Back office
            .service(RegisterAdminRoute::<SqliteDatabase>::new())
            .service(AdminUsersRoute::<SqliteDatabase>::new())
            .service(AdminCreateUserRoute::<SqliteDatabase>::new())
            .service(AdminUpdateUserRoute::<SqliteDatabase>::new())
            .service(AdminDeleteUserRoute::<SqliteDatabase>::new())
            .service(AdminStoresRoute::<SqliteDatabase>::new())
            .service(AdminCreateStoreRoute::<SqliteDatabase>::new())
            .service(AdminUpdateStoreRoute::<SqliteDatabase>::new())
            .service(AdminDeleteStoreRoute::<SqliteDatabase>::new())
            .service(AdminOrdersRoute::<SqliteDatabase>::new())
            .service(AdminUpdateOrderRoute::<SqliteDatabase>::new())
            .service(AdminDeleteOrderRoute::<SqliteDatabase>::new())
            .service(SearchLogsRoute::<SqliteDatabase>::new())
            .service(LogOptionsRoute::<SqliteDatabase>::new());
        app.service(health).service(user_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
