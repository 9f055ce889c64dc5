use chrono::{DateTime, Utc};

use crate::mo_api::errors::EngineError;

/// The number of verification codes that may be sent to one email address per (UTC) day.
pub const MAX_DAILY_CODE_SENDS: i64 = 5;

#[allow(async_fn_in_trait)]
pub trait VerificationCodeManagement {
    /// Stores `code` as the current code for `email`, replacing any previous one.
    ///
    /// Fails with [`EngineError::RateLimited`] once [`MAX_DAILY_CODE_SENDS`] codes have been issued to the address
    /// on the UTC day of `now`.
    async fn store_verification_code(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError>;

    /// Marks the code as used if it matches the current, unexpired and unused code for `email`. Returns whether the
    /// code was accepted.
    async fn consume_verification_code(&self, email: &str, code: &str, now: DateTime<Utc>)
        -> Result<bool, EngineError>;
}
