use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::SqliteDatabaseError;
use crate::{
    db_types::{NewStore, Store, StoreSearchResult, StoreSummary, StoreUpdate, TopMenuItem},
    mo_api::query_objects::{Page, Pagination},
};

const STORE_COLUMNS: &str = "s.id AS id, s.owner_id AS owner_id, s.name AS name, s.description AS description, \
                             s.created_at AS created_at, s.updated_at AS updated_at";

pub async fn insert_store(
    store: &NewStore,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Store, SqliteDatabaseError> {
    let store = sqlx::query_as::<_, Store>(
        "INSERT INTO stores (owner_id, name, description, created_at, updated_at) VALUES ($1, $2, $3, $4, $4) \
         RETURNING id, owner_id, name, description, created_at, updated_at",
    )
    .bind(store.owner_id)
    .bind(&store.name)
    .bind(&store.description)
    .bind(now)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(store)
}

pub async fn store_by_id(store_id: i64, conn: &mut SqliteConnection) -> Result<Option<Store>, SqliteDatabaseError> {
    let sql = format!("SELECT {STORE_COLUMNS} FROM stores s WHERE s.id = $1");
    let store = sqlx::query_as::<_, Store>(&sql).bind(store_id).fetch_all(conn).await?.into_iter().next();
    Ok(store)
}

pub async fn store_by_owner(owner_id: i64, conn: &mut SqliteConnection) -> Result<Option<Store>, SqliteDatabaseError> {
    let sql = format!("SELECT {STORE_COLUMNS} FROM stores s WHERE s.owner_id = $1");
    let store = sqlx::query_as::<_, Store>(&sql).bind(owner_id).fetch_all(conn).await?.into_iter().next();
    Ok(store)
}

pub async fn update_store(
    store_id: i64,
    update: &StoreUpdate,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Store>, SqliteDatabaseError> {
    let store = sqlx::query_as::<_, Store>(
        "UPDATE stores SET name = COALESCE($1, name), description = COALESCE($2, description), updated_at = $3 \
         WHERE id = $4 RETURNING id, owner_id, name, description, created_at, updated_at",
    )
    .bind(&update.name)
    .bind(&update.description)
    .bind(now)
    .bind(store_id)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(store)
}

pub async fn delete_store(store_id: i64, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("DELETE FROM stores WHERE id = $1").bind(store_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn search_by_name(
    name: &str,
    viewer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<StoreSearchResult>, SqliteDatabaseError> {
    let sql = format!(
        "SELECT {STORE_COLUMNS}, u.name AS owner_name, m.status AS user_status FROM stores s JOIN users u ON u.id = \
         s.owner_id LEFT JOIN memberships m ON m.store_id = s.id AND m.user_id = $1 WHERE instr(lower(s.name), \
         lower($2)) > 0 ORDER BY s.name, s.id"
    );
    let stores = sqlx::query_as::<_, StoreSearchResult>(&sql).bind(viewer_id).bind(name).fetch_all(conn).await?;
    Ok(stores)
}

fn push_name_filter(builder: &mut QueryBuilder<'_, Sqlite>, column: &str, keyword: Option<&str>) {
    if let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) {
        builder.push(format!(" WHERE instr(lower({column}), lower("));
        builder.push_bind(keyword.to_string());
        builder.push(")) > 0");
    }
}

pub async fn paginate(
    name: Option<&str>,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Page<Store>, SqliteDatabaseError> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM stores s");
    push_name_filter(&mut count, "s.name", name);
    let total = count.build_query_scalar::<i64>()
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;

    let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {STORE_COLUMNS} FROM stores s"));
    push_name_filter(&mut query, "s.name", name);
    query.push(" ORDER BY s.created_at DESC, s.id DESC LIMIT ");
    query.push_bind(pagination.limit());
    query.push(" OFFSET ");
    query.push_bind(pagination.offset());
    let items = query.build_query_as::<Store>().fetch_all(conn).await?;
    Ok(Page::new(items, total, pagination))
}

pub async fn search_summaries(
    keyword: Option<&str>,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Page<StoreSummary>, SqliteDatabaseError> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM stores s");
    push_name_filter(&mut count, "s.name", keyword);
    let total = count.build_query_scalar::<i64>()
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;

    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {STORE_COLUMNS}, u.name AS owner_name, u.email AS owner_email FROM stores s JOIN users u ON u.id = \
         s.owner_id"
    ));
    push_name_filter(&mut query, "s.name", keyword);
    query.push(" ORDER BY s.created_at DESC, s.id DESC LIMIT ");
    query.push_bind(pagination.limit());
    query.push(" OFFSET ");
    query.push_bind(pagination.offset());
    let items = query.build_query_as::<StoreSummary>().fetch_all(conn).await?;
    Ok(Page::new(items, total, pagination))
}

/// Stores the user has been accepted into, excluding their own, together with the owner's name.
pub async fn accepted_stores(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<StoreSummary>, SqliteDatabaseError> {
    let sql = format!(
        "SELECT {STORE_COLUMNS}, u.name AS owner_name, u.email AS owner_email FROM stores s JOIN users u ON u.id = \
         s.owner_id JOIN memberships m ON m.store_id = s.id WHERE m.user_id = $1 AND m.status = 'accepted' AND \
         s.owner_id <> $1 ORDER BY s.name, s.id"
    );
    let stores = sqlx::query_as::<_, StoreSummary>(&sql).bind(user_id).fetch_all(conn).await?;
    Ok(stores)
}

pub async fn top_menu_items(
    user_id: i64,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<TopMenuItem>, SqliteDatabaseError> {
    let items = sqlx::query_as::<_, TopMenuItem>(
        "SELECT mi.id AS id, mi.store_id AS store_id, mi.name AS name, mi.category AS category, mi.description AS \
         description, mi.price AS price, mi.emoji AS emoji, mi.image_url AS image_url, mi.created_at AS created_at, \
         mi.updated_at AS updated_at, s.name AS store_name, COUNT(oi.id) AS order_count \
         FROM menu_items mi \
         JOIN stores s ON s.id = mi.store_id \
         JOIN memberships m ON m.store_id = s.id AND m.user_id = $1 AND m.status = 'accepted' \
         LEFT JOIN order_items oi ON oi.menu_item_id = mi.id \
         GROUP BY mi.id \
         ORDER BY order_count DESC, mi.id ASC \
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(items)
}
