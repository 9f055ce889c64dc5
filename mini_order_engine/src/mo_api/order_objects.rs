use serde::{Deserialize, Serialize};

use crate::db_types::OrderLineRequest;

/// A buyer's request to order from a store. Prices are never taken from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    pub store_id: i64,
    pub items: Vec<OrderLineRequest>,
}

impl NewOrderRequest {
    pub fn new(store_id: i64) -> Self {
        Self { store_id, items: Vec::new() }
    }

    pub fn with_item(mut self, menu_item_id: i64, quantity: i64) -> Self {
        self.items.push(OrderLineRequest::new(menu_item_id, quantity));
        self
    }
}
