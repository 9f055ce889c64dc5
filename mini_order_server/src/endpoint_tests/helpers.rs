use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{Duration, TimeZone, Utc};
use log::debug;
use mini_order_engine::{
    db_types::{Cents, MenuItem, Order, OrderDetail, OrderItem, OrderStatusType, Store},
    events::EventProducers,
};

use crate::{
    auth::{Role, TokenIssuer},
    config::AuthConfig,
};

// A fixed secret for issuing test tokens. DO NOT re-use it anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new("endpoint-test-secret-do-not-use-in-production", Duration::hours(1))
}

pub fn issue_token(sub: i64, roles: Vec<Role>) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(sub, roles).expect("Failed to sign token")
}

pub fn no_events() -> EventProducers {
    EventProducers::default()
}

/// Sends a request to an app built by `configure` and returns the status code and body.
///
/// Errors raised by middleware are rendered exactly as the server would render them, so the status and envelope can
/// be checked either way.
pub async fn send_request<F>(req: TestRequest, token: Option<&str>, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let mut req = req;
    if let Some(token) = token {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    let app = App::new().app_data(web::Data::new(TokenIssuer::new(&get_auth_config()))).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned());
            (status, body.unwrap_or_default())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned());
            (status, body.unwrap_or_default())
        },
    }
}

pub async fn get_request<F>(path: &str, token: Option<&str>, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::get().uri(path), token, configure).await
}

pub fn parse_envelope(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {body}"))
}

fn timestamp() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn store(id: i64, owner_id: i64, name: &str) -> Store {
    Store {
        id,
        owner_id,
        name: name.to_string(),
        description: None,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub fn menu_item(id: i64, store_id: i64, name: &str, price: i64) -> MenuItem {
    MenuItem {
        id,
        store_id,
        name: name.to_string(),
        category: Some("Mains".to_string()),
        description: None,
        price: Cents::from(price),
        emoji: Some("🍕".to_string()),
        image_url: None,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub fn order_detail(id: i64, buyer_id: i64, store_owner_id: i64) -> OrderDetail {
    let items = vec![OrderItem {
        id: 1,
        order_id: id,
        menu_item_id: Some(5),
        item_name: "Margherita".to_string(),
        unit_price: Cents::from(850),
        quantity: 2,
    }];
    OrderDetail {
        order: Order {
            id,
            buyer_id,
            store_id: 3,
            total_price: Cents::from(1700),
            status: OrderStatusType::Pending,
            created_at: timestamp(),
            updated_at: timestamp(),
        },
        buyer_name: "Bob".to_string(),
        store_name: "Alice's store".to_string(),
        store_owner_id,
        items,
    }
}
