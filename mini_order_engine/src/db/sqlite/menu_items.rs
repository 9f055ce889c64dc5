use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::SqliteDatabaseError;
use crate::db_types::{MenuItem, MenuItemPrice, MenuItemUpdate, NewMenuItem};

const MENU_COLUMNS: &str =
    "id, store_id, name, category, description, price, emoji, image_url, created_at, updated_at";

pub async fn insert_menu_item(
    item: &NewMenuItem,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<MenuItem, SqliteDatabaseError> {
    let sql = format!(
        "INSERT INTO menu_items (store_id, name, category, description, price, emoji, image_url, created_at, \
         updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING {MENU_COLUMNS}"
    );
    let item = sqlx::query_as::<_, MenuItem>(&sql)
        .bind(item.store_id)
        .bind(&item.name)
        .bind(&item.category)
        .bind(&item.description)
        .bind(item.price)
        .bind(&item.emoji)
        .bind(&item.image_url)
        .bind(now)
        .fetch_all(conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;
    Ok(item)
}

pub async fn menu_item_by_id(item_id: i64, conn: &mut SqliteConnection) -> Result<Option<MenuItem>, SqliteDatabaseError> {
    let sql = format!("SELECT {MENU_COLUMNS} FROM menu_items WHERE id = $1");
    let item = sqlx::query_as::<_, MenuItem>(&sql).bind(item_id).fetch_all(conn).await?.into_iter().next();
    Ok(item)
}

pub async fn update_menu_item(
    item_id: i64,
    update: &MenuItemUpdate,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<MenuItem>, SqliteDatabaseError> {
    let sql = format!(
        "UPDATE menu_items SET name = COALESCE($1, name), category = COALESCE($2, category), description = \
         COALESCE($3, description), price = COALESCE($4, price), emoji = COALESCE($5, emoji), image_url = \
         COALESCE($6, image_url), updated_at = $7 WHERE id = $8 RETURNING {MENU_COLUMNS}"
    );
    let item = sqlx::query_as::<_, MenuItem>(&sql)
        .bind(&update.name)
        .bind(&update.category)
        .bind(&update.description)
        .bind(update.price)
        .bind(&update.emoji)
        .bind(&update.image_url)
        .bind(now)
        .bind(item_id)
        .fetch_all(conn)
        .await?
        .into_iter()
        .next();
    Ok(item)
}

pub async fn delete_menu_item(item_id: i64, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("DELETE FROM menu_items WHERE id = $1").bind(item_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn menu_for_store(store_id: i64, conn: &mut SqliteConnection) -> Result<Vec<MenuItem>, SqliteDatabaseError> {
    let sql = format!("SELECT {MENU_COLUMNS} FROM menu_items WHERE store_id = $1 ORDER BY category, id");
    let items = sqlx::query_as::<_, MenuItem>(&sql).bind(store_id).fetch_all(conn).await?;
    Ok(items)
}

/// Fetches the price of every listed menu item with a single `IN (...)` query.
pub async fn prices_for_items(
    item_ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<Vec<MenuItemPrice>, SqliteDatabaseError> {
    if item_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT id, store_id, name, price FROM menu_items WHERE id IN (");
    let mut ids = builder.separated(", ");
    for id in item_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(")");
    let prices = builder.build_query_as::<MenuItemPrice>().fetch_all(conn).await?;
    Ok(prices)
}
