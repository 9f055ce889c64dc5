use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use super::SqliteDatabaseError;
use crate::db_types::{Membership, MembershipDetail, MembershipStatus};

const MEMBERSHIP_COLUMNS: &str = "id, user_id, store_id, status, created_at, updated_at";

pub async fn insert_membership(
    user_id: i64,
    store_id: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Membership, SqliteDatabaseError> {
    let sql = format!(
        "INSERT INTO memberships (user_id, store_id, status, created_at, updated_at) VALUES ($1, $2, $3, $4, $4) \
         RETURNING {MEMBERSHIP_COLUMNS}"
    );
    let membership = sqlx::query_as::<_, Membership>(&sql)
        .bind(user_id)
        .bind(store_id)
        .bind(MembershipStatus::Pending)
        .bind(now)
        .fetch_all(conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;
    Ok(membership)
}

pub async fn membership(
    user_id: i64,
    store_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Membership>, SqliteDatabaseError> {
    let sql = format!("SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE user_id = $1 AND store_id = $2");
    let membership =
        sqlx::query_as::<_, Membership>(&sql).bind(user_id).bind(store_id).fetch_all(conn).await?.into_iter().next();
    Ok(membership)
}

/// Moves a pending membership to its final status. Memberships that are not pending are left untouched.
pub async fn resolve_membership(
    user_id: i64,
    store_id: i64,
    status: MembershipStatus,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Membership>, SqliteDatabaseError> {
    let sql = format!(
        "UPDATE memberships SET status = $1, updated_at = $2 WHERE user_id = $3 AND store_id = $4 AND status = \
         'pending' RETURNING {MEMBERSHIP_COLUMNS}"
    );
    let membership = sqlx::query_as::<_, Membership>(&sql)
        .bind(status)
        .bind(now)
        .bind(user_id)
        .bind(store_id)
        .fetch_all(conn)
        .await?
        .into_iter()
        .next();
    Ok(membership)
}

pub async fn memberships_for_store(
    store_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<MembershipDetail>, SqliteDatabaseError> {
    let memberships = sqlx::query_as::<_, MembershipDetail>(
        "SELECT m.id AS id, m.user_id AS user_id, m.store_id AS store_id, m.status AS status, m.created_at AS \
         created_at, m.updated_at AS updated_at, u.name AS user_name, u.email AS user_email FROM memberships m JOIN \
         users u ON u.id = m.user_id WHERE m.store_id = $1 ORDER BY m.created_at DESC, m.id DESC",
    )
    .bind(store_id)
    .fetch_all(conn)
    .await?;
    Ok(memberships)
}
