use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::SqliteDatabaseError;
use crate::{
    db_types::{Actor, LogOptions, NewOperationLog, OperationLog, OperationLogEntry},
    mo_api::query_objects::{LogQueryFilter, Page, Pagination},
};

const LOG_FROM: &str =
    " FROM operation_logs l LEFT JOIN users u ON u.id = l.user_id LEFT JOIN admins a ON a.id = l.admin_id";

pub async fn insert_log(
    log: &NewOperationLog,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<OperationLog, SqliteDatabaseError> {
    let (user_id, admin_id) = match log.actor {
        Actor::User(id) => (Some(id), None),
        Actor::Admin(id) => (None, Some(id)),
        Actor::Anonymous => (None, None),
    };
    let entry = sqlx::query_as::<_, OperationLog>(
        "INSERT INTO operation_logs (user_id, admin_id, action, module, description, ip, area, user_agent, \
         created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id, user_id, admin_id, action, module, \
         description, ip, area, user_agent, created_at",
    )
    .bind(user_id)
    .bind(admin_id)
    .bind(log.action.as_str())
    .bind(log.module.as_str())
    .bind(&log.description)
    .bind(&log.ip)
    .bind(&log.area)
    .bind(&log.user_agent)
    .bind(now)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(entry)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &LogQueryFilter) {
    let has_filter = filter.email.is_some() ||
        filter.module.is_some() ||
        filter.action.is_some() ||
        filter.since.is_some() ||
        filter.until.is_some();
    if !has_filter {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(email) = &filter.email {
        where_clause.push("(instr(lower(u.email), lower(");
        where_clause.push_bind_unseparated(email.clone());
        where_clause.push_unseparated(")) > 0 OR instr(lower(a.email), lower(");
        where_clause.push_bind_unseparated(email.clone());
        where_clause.push_unseparated(")) > 0)");
    }
    if let Some(module) = &filter.module {
        where_clause.push("l.module = ");
        where_clause.push_bind_unseparated(module.clone());
    }
    if let Some(action) = &filter.action {
        where_clause.push("l.action = ");
        where_clause.push_bind_unseparated(action.clone());
    }
    if let Some(since) = filter.since {
        where_clause.push("l.created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = filter.until {
        where_clause.push("l.created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
}

pub async fn search_logs(
    filter: &LogQueryFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Page<OperationLogEntry>, SqliteDatabaseError> {
    let mut count = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*){LOG_FROM}"));
    push_filters(&mut count, filter);
    let total = count.build_query_scalar::<i64>()
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;

    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT l.id AS id, l.user_id AS user_id, l.admin_id AS admin_id, l.action AS action, l.module AS module, \
         l.description AS description, l.ip AS ip, l.area AS area, l.user_agent AS user_agent, l.created_at AS \
         created_at, u.email AS user_email, a.email AS admin_email{LOG_FROM}"
    ));
    push_filters(&mut query, filter);
    let direction = if filter.ascending { "ASC" } else { "DESC" };
    query.push(format!(" ORDER BY {} {direction}, l.id {direction} LIMIT ", filter.order_by.column()));
    query.push_bind(pagination.limit());
    query.push(" OFFSET ");
    query.push_bind(pagination.offset());
    let entries = query.build_query_as::<OperationLogEntry>().fetch_all(conn).await?;
    Ok(Page::new(entries, total, pagination))
}

pub async fn log_options(conn: &mut SqliteConnection) -> Result<LogOptions, SqliteDatabaseError> {
    let modules = sqlx::query_scalar::<_, String>("SELECT DISTINCT module FROM operation_logs ORDER BY module")
        .fetch_all(&mut *conn)
        .await?;
    let actions = sqlx::query_scalar::<_, String>("SELECT DISTINCT action FROM operation_logs ORDER BY action")
        .fetch_all(conn)
        .await?;
    Ok(LogOptions { modules, actions })
}
