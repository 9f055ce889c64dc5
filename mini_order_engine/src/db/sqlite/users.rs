use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use super::SqliteDatabaseError;
use crate::db_types::{Cents, NewUser, ProfileUpdate, User, UserCredentials, UserUpdate};

pub(crate) const USER_COLUMNS: &str = "id, name, email, balance, points, address, avatar_url, created_at, updated_at";

pub async fn insert_user(
    user: &NewUser,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<User, SqliteDatabaseError> {
    let sql = format!(
        "INSERT INTO users (name, email, password_hash, created_at, updated_at) VALUES ($1, $2, $3, $4, $4) \
         RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(now)
        .fetch_all(conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;
    Ok(user)
}

pub async fn user_by_id(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, SqliteDatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let user = sqlx::query_as::<_, User>(&sql).bind(user_id).fetch_all(conn).await?.into_iter().next();
    Ok(user)
}

pub async fn user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, SqliteDatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let user = sqlx::query_as::<_, User>(&sql).bind(email).fetch_all(conn).await?.into_iter().next();
    Ok(user)
}

pub async fn credentials_by_email(
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserCredentials>, SqliteDatabaseError> {
    let creds = sqlx::query_as::<_, UserCredentials>("SELECT id, email, password_hash FROM users WHERE email = $1")
        .bind(email)
        .fetch_all(conn)
        .await?
        .into_iter()
        .next();
    Ok(creds)
}

pub async fn update_profile(
    user_id: i64,
    update: &ProfileUpdate,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, SqliteDatabaseError> {
    let sql = format!(
        "UPDATE users SET name = COALESCE($1, name), address = COALESCE($2, address), \
         avatar_url = COALESCE($3, avatar_url), updated_at = $4 WHERE id = $5 RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(&update.name)
        .bind(&update.address)
        .bind(&update.avatar_url)
        .bind(now)
        .bind(user_id)
        .fetch_all(conn)
        .await?
        .into_iter()
        .next();
    Ok(user)
}

/// Updates everything in `update` except the balance, which must go through the ledger.
pub async fn update_user_details(
    user_id: i64,
    update: &UserUpdate,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, SqliteDatabaseError> {
    let sql = format!(
        "UPDATE users SET name = COALESCE($1, name), email = COALESCE($2, email), address = COALESCE($3, address), \
         points = COALESCE($4, points), updated_at = $5 WHERE id = $6 RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(&update.name)
        .bind(&update.email)
        .bind(&update.address)
        .bind(update.points)
        .bind(now)
        .bind(user_id)
        .fetch_all(conn)
        .await?
        .into_iter()
        .next();
    Ok(user)
}

pub async fn update_password(
    email: &str,
    password_hash: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE email = $3")
        .bind(password_hash)
        .bind(now)
        .bind(email)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_balance(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<Cents>, SqliteDatabaseError> {
    let balance = sqlx::query_scalar::<_, Cents>("SELECT balance FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_all(conn)
        .await?
        .into_iter()
        .next();
    Ok(balance)
}

/// Subtracts `amount` from the user's balance, but only if the balance covers it. Returns whether the debit happened.
///
/// The check and the write are a single statement, so two transactions cannot both spend the same funds.
pub async fn debit_if_sufficient(
    user_id: i64,
    amount: Cents,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result =
        sqlx::query("UPDATE users SET balance = balance - $1, updated_at = $2 WHERE id = $3 AND balance >= $1")
            .bind(amount)
            .bind(now)
            .bind(user_id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn credit(
    user_id: i64,
    amount: Cents,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query("UPDATE users SET balance = balance + $1, updated_at = $2 WHERE id = $3")
        .bind(amount)
        .bind(now)
        .bind(user_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::AccountNotFound(user_id));
    }
    Ok(())
}

pub async fn delete_user(user_id: i64, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(user_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
