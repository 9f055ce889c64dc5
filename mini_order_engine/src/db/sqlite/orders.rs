use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::SqliteDatabaseError;
use crate::{
    db_types::{NewOrder, Order, OrderDetail, OrderItem, OrderStatusType, OrderSummary, PricedOrderLine},
    mo_api::query_objects::{OrderQueryFilter, Page, Pagination},
};

const ORDER_COLUMNS: &str = "id, buyer_id, store_id, total_price, status, created_at, updated_at";

const SUMMARY_SELECT: &str = "SELECT o.id AS id, o.buyer_id AS buyer_id, o.store_id AS store_id, o.total_price AS \
                              total_price, o.status AS status, o.created_at AS created_at, o.updated_at AS \
                              updated_at, b.name AS buyer_name, s.name AS store_name, s.owner_id AS store_owner_id \
                              FROM orders o JOIN users b ON b.id = o.buyer_id JOIN stores s ON s.id = o.store_id";

const ORDER_FROM: &str = " FROM orders o JOIN users b ON b.id = o.buyer_id JOIN stores s ON s.id = o.store_id";

pub async fn insert_order(
    order: &NewOrder,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Order, SqliteDatabaseError> {
    let sql = format!(
        "INSERT INTO orders (buyer_id, store_id, total_price, status, created_at, updated_at) VALUES ($1, $2, $3, \
         $4, $5, $5) RETURNING {ORDER_COLUMNS}"
    );
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(order.buyer_id)
        .bind(order.store_id)
        .bind(order.total_price)
        .bind(OrderStatusType::Pending)
        .bind(now)
        .fetch_all(conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;
    trace!("🗃️ Inserted order #{}", order.id);
    Ok(order)
}

pub async fn insert_order_item(
    order_id: i64,
    line: &PricedOrderLine,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, SqliteDatabaseError> {
    let item = sqlx::query_as::<_, OrderItem>(
        "INSERT INTO order_items (order_id, menu_item_id, item_name, unit_price, quantity) VALUES ($1, $2, $3, $4, \
         $5) RETURNING id, order_id, menu_item_id, item_name, unit_price, quantity",
    )
    .bind(order_id)
    .bind(line.menu_item_id)
    .bind(&line.item_name)
    .bind(line.unit_price)
    .bind(line.quantity)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(item)
}

pub async fn order_summary(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<OrderSummary>, SqliteDatabaseError> {
    let sql = format!("{SUMMARY_SELECT} WHERE o.id = $1");
    let summary = sqlx::query_as::<_, OrderSummary>(&sql).bind(order_id).fetch_all(conn).await?.into_iter().next();
    Ok(summary)
}

pub async fn items_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, SqliteDatabaseError> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, menu_item_id, item_name, unit_price, quantity FROM order_items WHERE order_id = $1 \
         ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Fetches the items of all the given orders in one query, grouped by order id.
pub async fn items_for_orders(
    order_ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<HashMap<i64, Vec<OrderItem>>, SqliteDatabaseError> {
    let mut result = HashMap::<i64, Vec<OrderItem>>::new();
    if order_ids.is_empty() {
        return Ok(result);
    }
    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT id, order_id, menu_item_id, item_name, unit_price, quantity FROM order_items WHERE order_id IN (",
    );
    let mut ids = builder.separated(", ");
    for id in order_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ORDER BY id");
    let items = builder.build_query_as::<OrderItem>().fetch_all(conn).await?;
    for item in items {
        result.entry(item.order_id).or_default().push(item);
    }
    Ok(result)
}

pub async fn order_detail(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<OrderDetail>, SqliteDatabaseError> {
    let Some(summary) = order_summary(order_id, &mut *conn).await? else {
        return Ok(None);
    };
    let items = items_for_order(order_id, conn).await?;
    Ok(Some(OrderDetail::from_summary(summary, items)))
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &OrderQueryFilter) {
    if filter.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer_id) = filter.buyer_id {
        where_clause.push("o.buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id);
    }
    if let Some(store_id) = filter.store_id {
        where_clause.push("o.store_id = ");
        where_clause.push_bind_unseparated(store_id);
    }
    if let Some(status) = filter.status {
        where_clause.push("o.status = ");
        where_clause.push_bind_unseparated(status);
    }
    if let Some(since) = filter.since {
        where_clause.push("o.created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = filter.until {
        where_clause.push("o.created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    if let Some(name) = &filter.buyer_name {
        where_clause.push("instr(lower(b.name), lower(");
        where_clause.push_bind_unseparated(name.clone());
        where_clause.push_unseparated(")) > 0");
    }
}

/// Fetches one page of orders matching the filter, newest first, with their items.
pub async fn search_orders(
    filter: &OrderQueryFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Page<OrderDetail>, SqliteDatabaseError> {
    let mut count = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*){ORDER_FROM}"));
    push_filters(&mut count, filter);
    let total = count.build_query_scalar::<i64>()
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;

    let mut query = QueryBuilder::<Sqlite>::new(SUMMARY_SELECT);
    push_filters(&mut query, filter);
    query.push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ");
    query.push_bind(pagination.limit());
    query.push(" OFFSET ");
    query.push_bind(pagination.offset());
    let summaries = query.build_query_as::<OrderSummary>().fetch_all(&mut *conn).await?;
    trace!("🗃️ Order search matched {total} orders, returning {}", summaries.len());

    let ids = summaries.iter().map(|s| s.order.id).collect::<Vec<_>>();
    let mut items = items_for_orders(&ids, conn).await?;
    let orders = summaries
        .into_iter()
        .map(|s| {
            let order_items = items.remove(&s.order.id).unwrap_or_default();
            OrderDetail::from_summary(s, order_items)
        })
        .collect();
    Ok(Page::new(orders, total, pagination))
}

pub async fn update_status(
    order_id: i64,
    status: OrderStatusType,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 RETURNING {ORDER_COLUMNS}");
    let order = sqlx::query_as::<_, Order>(&sql).bind(status).bind(now).bind(order_id)
        .fetch_all(conn)
        .await?
        .into_iter()
        .next();
    Ok(order)
}

pub async fn delete_order(order_id: i64, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(order_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
