use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use super::SqliteDatabaseError;
use crate::db_types::EmailVerification;

pub async fn fetch_verification(
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<EmailVerification>, SqliteDatabaseError> {
    let record = sqlx::query_as::<_, EmailVerification>(
        "SELECT email, code, expires_at, verified, daily_send_count, last_sent_at FROM email_verifications WHERE \
         email = $1",
    )
    .bind(email)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(record)
}

/// Inserts or replaces the code for `email`, setting the number of codes sent today to `daily_send_count`.
pub async fn upsert_code(
    email: &str,
    code: &str,
    expires_at: DateTime<Utc>,
    daily_send_count: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    sqlx::query(
        "INSERT INTO email_verifications (email, code, expires_at, verified, daily_send_count, last_sent_at) VALUES \
         ($1, $2, $3, 0, $4, $5) ON CONFLICT (email) DO UPDATE SET code = excluded.code, expires_at = \
         excluded.expires_at, verified = 0, daily_send_count = excluded.daily_send_count, last_sent_at = \
         excluded.last_sent_at",
    )
    .bind(email)
    .bind(code)
    .bind(expires_at)
    .bind(daily_send_count)
    .bind(now)
    .execute(conn)
    .await?;
    debug!("🗃️ Verification code stored for {email} ({daily_send_count} sent today)");
    Ok(())
}

/// Marks the code as used, provided it is the current code, unused and not yet expired.
pub async fn consume_code(
    email: &str,
    code: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE email_verifications SET verified = 1 WHERE email = $1 AND code = $2 AND verified = 0 AND expires_at \
         > $3",
    )
    .bind(email)
    .bind(code)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
