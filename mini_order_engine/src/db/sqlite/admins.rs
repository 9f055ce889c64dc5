use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::{users::USER_COLUMNS, SqliteDatabaseError};
use crate::{
    db_types::{Admin, AdminCredentials, NewAdmin, User},
    mo_api::query_objects::{Page, Pagination},
};

pub async fn insert_admin(
    admin: &NewAdmin,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Admin, SqliteDatabaseError> {
    let admin = sqlx::query_as::<_, Admin>(
        "INSERT INTO admins (name, email, password_hash, role, created_at) VALUES ($1, $2, $3, $4, $5) RETURNING id, \
         name, email, role, created_at",
    )
    .bind(&admin.name)
    .bind(&admin.email)
    .bind(&admin.password_hash)
    .bind(admin.role)
    .bind(now)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(admin)
}

pub async fn credentials_by_email(
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<AdminCredentials>, SqliteDatabaseError> {
    let creds = sqlx::query_as::<_, AdminCredentials>(
        "SELECT id, name, email, role, password_hash FROM admins WHERE email = $1",
    )
    .bind(email)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(creds)
}

pub async fn count_admins(conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admins")
        .fetch_all(conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;
    Ok(count)
}

fn push_keyword(builder: &mut QueryBuilder<'_, Sqlite>, keyword: Option<&str>) {
    if let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) {
        builder.push(" WHERE instr(lower(name), lower(");
        builder.push_bind(keyword.to_string());
        builder.push(")) > 0");
    }
}

pub async fn search_users(
    keyword: Option<&str>,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Page<User>, SqliteDatabaseError> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users");
    push_keyword(&mut count, keyword);
    let total = count.build_query_scalar::<i64>()
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;

    let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {USER_COLUMNS} FROM users"));
    push_keyword(&mut query, keyword);
    query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    query.push_bind(pagination.limit());
    query.push(" OFFSET ");
    query.push_bind(pagination.offset());
    let users = query.build_query_as::<User>().fetch_all(conn).await?;
    Ok(Page::new(users, total, pagination))
}
