use actix_web::{http::StatusCode, test::TestRequest, web};
use mini_order_engine::StoreApi;

use super::{
    helpers::{get_request, issue_token, no_events, parse_envelope, send_request},
    mocks::MockStoreBackend,
};
use crate::{auth::Role, routes::SearchStoresRoute};

fn configure_search(backend: MockStoreBackend) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.service(SearchStoresRoute::<MockStoreBackend>::new())
            .app_data(web::Data::new(StoreApi::new(backend, no_events())));
    }
}

#[actix_web::test]
async fn missing_token_is_unauthorized() {
    let _ = env_logger::try_init();
    let mut backend = MockStoreBackend::new();
    backend.expect_search_stores().never();
    let (status, body) = get_request("/stores/search?name=pizza", None, configure_search(backend)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let json = parse_envelope(&body);
    assert_eq!(json["code"], 401);
}

#[actix_web::test]
async fn garbage_token_is_unauthorized() {
    let _ = env_logger::try_init();
    let backend = MockStoreBackend::new();
    let (status, _) = get_request("/stores/search?name=pizza", Some("not.a.jwt"), configure_search(backend)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn admin_token_cannot_use_user_routes() {
    let _ = env_logger::try_init();
    let mut backend = MockStoreBackend::new();
    backend.expect_search_stores().never();
    let token = issue_token(1, vec![Role::Admin, Role::SuperAdmin]);
    let (status, body) = get_request("/stores/search?name=pizza", Some(&token), configure_search(backend)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let json = parse_envelope(&body);
    assert_eq!(json["code"], 403);
    assert_eq!(json["message"], "Insufficient permissions. The user role is required");
}

#[actix_web::test]
async fn user_token_is_accepted() {
    let _ = env_logger::try_init();
    let mut backend = MockStoreBackend::new();
    backend.expect_search_stores().times(1).returning(|_, _| Ok(vec![]));
    let token = issue_token(7, vec![Role::User]);
    let (status, body) = get_request("/stores/search?name=pizza", Some(&token), configure_search(backend)).await;
    assert_eq!(status, StatusCode::OK);
    let json = parse_envelope(&body);
    assert_eq!(json["code"], 0);
    assert_eq!(json["data"], serde_json::json!([]));
}

#[actix_web::test]
async fn token_can_be_passed_in_the_query_string() {
    let _ = env_logger::try_init();
    let mut backend = MockStoreBackend::new();
    backend.expect_search_stores().times(1).returning(|_, _| Ok(vec![]));
    let token = issue_token(7, vec![Role::User]);
    let path = format!("/stores/search?name=pizza&token={token}");
    let (status, _) = send_request(TestRequest::get().uri(&path), None, configure_search(backend)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn empty_search_keyword_is_rejected() {
    let _ = env_logger::try_init();
    let mut backend = MockStoreBackend::new();
    backend.expect_search_stores().never();
    let token = issue_token(7, vec![Role::User]);
    let (status, body) = get_request("/stores/search?name=%20", Some(&token), configure_search(backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json = parse_envelope(&body);
    assert_eq!(json["code"], 400);
    assert_eq!(json["message"], "search keyword must not be empty");
}
