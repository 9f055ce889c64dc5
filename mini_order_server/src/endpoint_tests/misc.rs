use actix_web::{http::StatusCode, test, App};

use crate::routes::health;

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init();
    let app = test::init_service(App::new().service(health)).await;
    let req = test::TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = test::read_body(res).await;
    assert_eq!(body, "👍️\n");
}
