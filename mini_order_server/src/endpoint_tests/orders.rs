use actix_web::{http::StatusCode, web};
use mini_order_engine::OrderFlowApi;

use super::{
    helpers::{get_request, issue_token, no_events, order_detail, parse_envelope},
    mocks::MockOrderBackend,
};
use crate::{auth::Role, routes::OrderByIdRoute};

fn configure_orders(backend: MockOrderBackend) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.service(OrderByIdRoute::<MockOrderBackend>::new())
            .app_data(web::Data::new(OrderFlowApi::new(backend, no_events())));
    }
}

#[actix_web::test]
async fn buyer_can_fetch_their_order() {
    let _ = env_logger::try_init();
    let mut backend = MockOrderBackend::new();
    backend.expect_fetch_order().times(1).returning(|id| Ok(Some(order_detail(id, 7, 2))));
    let token = issue_token(7, vec![Role::User]);
    let (status, body) = get_request("/orders/11", Some(&token), configure_orders(backend)).await;
    assert_eq!(status, StatusCode::OK);
    let json = parse_envelope(&body);
    assert_eq!(json["code"], 0);
    assert_eq!(json["data"]["id"], 11);
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["items"][0]["itemName"], "Margherita");
}

#[actix_web::test]
async fn store_owner_can_fetch_an_order_for_their_store() {
    let _ = env_logger::try_init();
    let mut backend = MockOrderBackend::new();
    backend.expect_fetch_order().times(1).returning(|id| Ok(Some(order_detail(id, 7, 2))));
    let token = issue_token(2, vec![Role::User]);
    let (status, _) = get_request("/orders/11", Some(&token), configure_orders(backend)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn other_users_cannot_see_the_order() {
    let _ = env_logger::try_init();
    let mut backend = MockOrderBackend::new();
    backend.expect_fetch_order().times(1).returning(|id| Ok(Some(order_detail(id, 7, 2))));
    let token = issue_token(8, vec![Role::User]);
    let (status, body) = get_request("/orders/11", Some(&token), configure_orders(backend)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let json = parse_envelope(&body);
    assert_eq!(json["code"], 403);
}

#[actix_web::test]
async fn unknown_order_is_not_found() {
    let _ = env_logger::try_init();
    let mut backend = MockOrderBackend::new();
    backend.expect_fetch_order().times(1).returning(|_| Ok(None));
    let token = issue_token(7, vec![Role::User]);
    let (status, body) = get_request("/orders/404", Some(&token), configure_orders(backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json = parse_envelope(&body);
    assert_eq!(json["code"], 404);
}

#[actix_web::test]
async fn database_failures_are_not_leaked() {
    let _ = env_logger::try_init();
    let mut backend = MockOrderBackend::new();
    backend
        .expect_fetch_order()
        .times(1)
        .returning(|_| Err(mini_order_engine::EngineError::DatabaseError("disk I/O error at /var/db".into())));
    let token = issue_token(7, vec![Role::User]);
    let (status, body) = get_request("/orders/3", Some(&token), configure_orders(backend)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json = parse_envelope(&body);
    assert_eq!(json["message"], "Internal server error");
    assert!(!body.contains("/var/db"));
}
