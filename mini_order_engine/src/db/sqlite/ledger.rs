use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqliteConnection;

use super::SqliteDatabaseError;
use crate::{
    db_types::{BalanceTransaction, Cents, TransactionType},
    mo_api::query_objects::{Page, Pagination},
};

const LEDGER_COLUMNS: &str = "id, user_id, order_id, amount, transaction_type, description, created_at";

/// Appends a row to the user's ledger. `amount` is always positive; the direction is given by `transaction_type`.
pub async fn insert_transaction(
    user_id: i64,
    order_id: Option<i64>,
    amount: Cents,
    transaction_type: TransactionType,
    description: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<BalanceTransaction, SqliteDatabaseError> {
    if amount.value() <= 0 {
        return Err(SqliteDatabaseError::QueryError(format!("Ledger amounts must be positive, got {amount}")));
    }
    let sql = format!(
        "INSERT INTO balance_transactions (user_id, order_id, amount, transaction_type, description, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {LEDGER_COLUMNS}"
    );
    let tx = sqlx::query_as::<_, BalanceTransaction>(&sql)
        .bind(user_id)
        .bind(order_id)
        .bind(amount)
        .bind(transaction_type)
        .bind(description)
        .bind(now)
        .fetch_all(conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;
    trace!("🗃️ Ledger entry #{} for user #{user_id}: {transaction_type} {amount}", tx.id);
    Ok(tx)
}

pub async fn fetch_transactions(
    user_id: i64,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Page<BalanceTransaction>, SqliteDatabaseError> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM balance_transactions WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;
    let sql = format!(
        "SELECT {LEDGER_COLUMNS} FROM balance_transactions WHERE user_id = $1 ORDER BY created_at DESC, id DESC \
         LIMIT $2 OFFSET $3"
    );
    let items = sqlx::query_as::<_, BalanceTransaction>(&sql)
        .bind(user_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(conn)
        .await?;
    Ok(Page::new(items, total, pagination))
}
