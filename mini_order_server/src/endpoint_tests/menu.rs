use actix_web::{http::StatusCode, web};
use mini_order_engine::MenuApi;

use super::{
    helpers::{get_request, menu_item, parse_envelope, store},
    mocks::MockStoreBackend,
};
use crate::routes::MenuForStoreRoute;

#[actix_web::test]
async fn menu_is_public_and_wrapped_in_the_envelope() {
    let _ = env_logger::try_init();
    let mut backend = MockStoreBackend::new();
    backend.expect_fetch_store().times(1).returning(|id| Ok(Some(store(id, 2, "Alice's store"))));
    backend
        .expect_fetch_menu_for_store()
        .times(1)
        .returning(|id| Ok(vec![menu_item(5, id, "Margherita", 850), menu_item(6, id, "Calzone", 1100)]));
    let (status, body) = get_request("/menu/store/3", None, move |cfg| {
        cfg.service(MenuForStoreRoute::<MockStoreBackend>::new()).app_data(web::Data::new(MenuApi::new(backend)));
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let json = parse_envelope(&body);
    assert_eq!(json["code"], 0);
    assert_eq!(json["message"], "success");
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"][0]["name"], "Margherita");
    assert_eq!(json["data"][0]["storeId"], 3);
    assert_eq!(json["traceId"].as_str().unwrap().len(), 16);
}

#[actix_web::test]
async fn menu_of_unknown_store_is_not_found() {
    let _ = env_logger::try_init();
    let mut backend = MockStoreBackend::new();
    backend.expect_fetch_store().times(1).returning(|_| Ok(None));
    backend.expect_fetch_menu_for_store().never();
    let (status, body) = get_request("/menu/store/9", None, move |cfg| {
        cfg.service(MenuForStoreRoute::<MockStoreBackend>::new()).app_data(web::Data::new(MenuApi::new(backend)));
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json = parse_envelope(&body);
    assert_eq!(json["code"], 404);
    assert_eq!(json["message"], "Store #9 not found");
    assert!(json["data"].is_null());
}

#[actix_web::test]
async fn malformed_store_id_does_not_match_the_route() {
    let _ = env_logger::try_init();
    let backend = MockStoreBackend::new();
    let (status, _) = get_request("/menu/store/abc", None, move |cfg| {
        cfg.service(MenuForStoreRoute::<MockStoreBackend>::new()).app_data(web::Data::new(MenuApi::new(backend)));
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
