use std::{collections::HashMap, fmt::Debug};

use log::*;

use crate::{
    db::traits::OrderManagement,
    db_types::{Cents, MenuItemPrice, NewOrder, Order, OrderDetail, OrderLineRequest, OrderStatusType, PricedOrderLine},
    events::{EventProducers, OrderCreatedEvent, OrderStatusChangedEvent},
    mo_api::{
        errors::EngineError,
        order_objects::NewOrderRequest,
        query_objects::{OrderQueryFilter, Page, Pagination},
    },
};

/// `OrderFlowApi` handles placing orders, paying for them from the buyer's balance, and moving them through their
/// status lifecycle.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Places an order for `buyer_id`.
    ///
    /// The store must exist. The items are priced from the menu in a single lookup, the total is checked against the
    /// buyer's balance, and then the order, its items, the balance transfer from buyer to store owner and both ledger
    /// entries are written in one transaction. Nothing is written if any step fails.
    pub async fn create_order(&self, buyer_id: i64, request: NewOrderRequest) -> Result<OrderDetail, EngineError> {
        if request.items.is_empty() {
            return Err(EngineError::validation("order must contain at least one item"));
        }
        if let Some(line) = request.items.iter().find(|l| l.quantity <= 0) {
            return Err(EngineError::validation(format!(
                "quantity for menu item #{} must be positive, got {}",
                line.menu_item_id, line.quantity
            )));
        }
        if !self.db.store_exists(request.store_id).await? {
            return Err(EngineError::not_found(format!("Store #{}", request.store_id)));
        }
        let ids = request.items.iter().map(|l| l.menu_item_id).collect::<Vec<_>>();
        let prices = self.db.fetch_menu_prices(&ids).await?;
        let (lines, total_price) = price_order_lines(request.store_id, &request.items, &prices)?;
        let available = self
            .db
            .fetch_balance(buyer_id)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("User #{buyer_id}")))?;
        if available < total_price {
            debug!("🔄️📦️ User #{buyer_id} has {available}, which does not cover {total_price}");
            return Err(EngineError::InsufficientBalance { required: total_price, available });
        }
        let order = NewOrder { buyer_id, store_id: request.store_id, lines, total_price };
        let detail = self.db.process_new_order(order).await?;
        info!(
            "🔄️📦️ Order #{} placed by user #{buyer_id} at store #{} for {total_price}",
            detail.order.id, detail.order.store_id
        );
        self.producers.publish_order_created(OrderCreatedEvent::new(detail.clone()));
        Ok(detail)
    }

    /// Moves an order to `new_status`.
    ///
    /// The store owner may make any allowed transition. The buyer may only cancel an order that is still pending.
    /// The buyer is notified of the change; a failed notification does not affect the update.
    pub async fn update_order_status(
        &self,
        actor_id: i64,
        order_id: i64,
        new_status: &str,
    ) -> Result<Order, EngineError> {
        let new_status = new_status.parse::<OrderStatusType>().map_err(|e| EngineError::validation(e.to_string()))?;
        let order = self.fetch_order(order_id).await?;
        let old_status = order.order.status;
        let is_owner = order.store_owner_id == actor_id;
        let is_buyer = order.order.buyer_id == actor_id;
        let buyer_cancels = is_buyer && old_status == OrderStatusType::Pending && new_status == OrderStatusType::Cancelled;
        let allowed = is_owner || buyer_cancels;
        if !allowed {
            return Err(EngineError::unauthorized(format!(
                "User #{actor_id} may not set order #{order_id} to {new_status}"
            )));
        }
        if old_status == new_status {
            return Err(EngineError::validation(format!("Order #{order_id} is already {new_status}")));
        }
        if !old_status.can_transition_to(new_status) {
            return Err(EngineError::validation(format!(
                "Order #{order_id} cannot move from {old_status} to {new_status}"
            )));
        }
        let updated = self
            .db
            .update_order_status(order_id, new_status)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("Order #{order_id}")))?;
        info!("🔄️📦️ Order #{order_id} moved from {old_status} to {new_status} by user #{actor_id}");
        self.producers.publish_order_status_changed(OrderStatusChangedEvent::new(updated.clone(), old_status));
        Ok(updated)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<OrderDetail, EngineError> {
        self.db.fetch_order(order_id).await?.ok_or_else(|| EngineError::not_found(format!("Order #{order_id}")))
    }

    /// Fetches an order. Only the buyer and the owner of the store it was placed at may see it.
    pub async fn order_for_user(&self, user_id: i64, order_id: i64) -> Result<OrderDetail, EngineError> {
        let order = self.fetch_order(order_id).await?;
        if order.order.buyer_id != user_id && order.store_owner_id != user_id {
            return Err(EngineError::unauthorized(format!("Order #{order_id} belongs to someone else")));
        }
        Ok(order)
    }

    pub async fn orders_for_buyer(
        &self,
        buyer_id: i64,
        filter: OrderQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<OrderDetail>, EngineError> {
        self.db.search_orders(filter.with_buyer_id(buyer_id), pagination).await
    }

    /// Orders placed at the store owned by `owner_id`. A user without a store has no store orders.
    pub async fn orders_for_store_owner(
        &self,
        owner_id: i64,
        filter: OrderQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<OrderDetail>, EngineError> {
        match self.db.fetch_store_id_for_owner(owner_id).await? {
            Some(store_id) => self.db.search_orders(filter.with_store_id(store_id), pagination).await,
            None => {
                trace!("🔄️📦️ User #{owner_id} has no store, so there are no store orders");
                Ok(Page::empty(pagination))
            },
        }
    }
}

/// Resolves the price of every order line against the menu and computes the order total.
///
/// Every item must exist and belong to `store_id`. Arithmetic is checked, so an absurd quantity is rejected rather than
/// wrapping around.
pub fn price_order_lines(
    store_id: i64,
    lines: &[OrderLineRequest],
    prices: &[MenuItemPrice],
) -> Result<(Vec<PricedOrderLine>, Cents), EngineError> {
    let price_map = prices.iter().map(|p| (p.id, p)).collect::<HashMap<_, _>>();
    let mut total = Cents::default();
    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let item = price_map
            .get(&line.menu_item_id)
            .ok_or_else(|| EngineError::not_found(format!("Menu item #{}", line.menu_item_id)))?;
        if item.store_id != store_id {
            return Err(EngineError::validation(format!(
                "Menu item #{} is not sold by store #{store_id}",
                item.id
            )));
        }
        let line_total = item
            .price
            .checked_mul(line.quantity)
            .ok_or_else(|| EngineError::validation(format!("The total for menu item #{} is too large", item.id)))?;
        total = total.checked_add(line_total).ok_or_else(|| EngineError::validation("The order total is too large"))?;
        priced.push(PricedOrderLine {
            menu_item_id: item.id,
            item_name: item.name.clone(),
            unit_price: item.price,
            quantity: line.quantity,
        });
    }
    Ok((priced, total))
}

#[cfg(test)]
mod test {
    use super::*;

    fn prices() -> Vec<MenuItemPrice> {
        vec![
            MenuItemPrice { id: 1, store_id: 10, name: "Noodles".into(), price: Cents::from(3000) },
            MenuItemPrice { id: 2, store_id: 10, name: "Tea".into(), price: Cents::from(450) },
            MenuItemPrice { id: 3, store_id: 11, name: "Cake".into(), price: Cents::from(1200) },
        ]
    }

    #[test]
    fn total_is_the_sum_of_price_times_quantity() {
        let lines = vec![OrderLineRequest::new(1, 2), OrderLineRequest::new(2, 3)];
        let (priced, total) = price_order_lines(10, &lines, &prices()).unwrap();
        assert_eq!(total, Cents::from(7350));
        assert_eq!(priced.len(), 2);
        assert_eq!(priced[0].item_name, "Noodles");
        assert_eq!(priced[1].unit_price, Cents::from(450));
    }

    #[test]
    fn unknown_items_are_not_found() {
        let lines = vec![OrderLineRequest::new(1, 1), OrderLineRequest::new(99, 1)];
        let err = price_order_lines(10, &lines, &prices()).unwrap_err();
        assert_eq!(err, EngineError::NotFound("Menu item #99".into()));
    }

    #[test]
    fn items_from_another_store_are_rejected() {
        let lines = vec![OrderLineRequest::new(3, 1)];
        let err = price_order_lines(10, &lines, &prices()).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn overflow_is_rejected() {
        let lines = vec![OrderLineRequest::new(1, i64::MAX / 2)];
        let err = price_order_lines(10, &lines, &prices()).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
