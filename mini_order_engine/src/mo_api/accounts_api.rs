//! User accounts: registration by emailed code, login, password resets, profiles and the balance ledger.

use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;

use crate::{
    db::traits::{AccountManagement, VerificationCodeManagement},
    db_types::{BalanceTransaction, NewUser, ProfileUpdate, User},
    events::{EventProducers, VerificationCodeIssuedEvent, VerificationPurpose},
    helpers::{
        hash_password,
        new_verification_code,
        normalize_email,
        validate_email,
        validate_password,
        verify_password,
        CODE_LIFETIME_MINUTES,
    },
    mo_api::{
        account_objects::{AuthenticatedUser, PasswordReset, Registration},
        errors::EngineError,
        query_objects::{Page, Pagination},
    },
};

const BAD_CREDENTIALS: &str = "Invalid email or password";

pub struct AccountApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi")
    }
}

impl<B> AccountApi<B>
where B: AccountManagement + VerificationCodeManagement
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Issues a registration code for an address that is not yet registered.
    pub async fn send_register_code(&self, email: &str) -> Result<(), EngineError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        if self.db.fetch_user_by_email(&email).await?.is_some() {
            return Err(EngineError::conflict(format!("{email} is already registered")));
        }
        self.issue_code(email, VerificationPurpose::Registration).await
    }

    /// Issues a password reset code. The address must belong to a user.
    pub async fn send_password_reset_code(&self, email: &str) -> Result<(), EngineError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        if self.db.fetch_user_by_email(&email).await?.is_none() {
            return Err(EngineError::not_found(format!("User {email}")));
        }
        self.issue_code(email, VerificationPurpose::PasswordReset).await
    }

    async fn issue_code(&self, email: String, purpose: VerificationPurpose) -> Result<(), EngineError> {
        let code = new_verification_code();
        let now = Utc::now();
        let expires_at = now + Duration::minutes(CODE_LIFETIME_MINUTES);
        self.db.store_verification_code(&email, &code, expires_at, now).await?;
        debug!("🔄️✉️ Issued a {purpose} code for {email}");
        self.producers.publish_verification_code(VerificationCodeIssuedEvent { email, code, purpose });
        Ok(())
    }

    /// Registers a new user. Every user gets a store of their own, named after them.
    pub async fn register(&self, registration: Registration) -> Result<User, EngineError> {
        let email = normalize_email(&registration.email);
        validate_email(&email)?;
        validate_password(&registration.password)?;
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(EngineError::validation("name must not be empty"));
        }
        if !self.db.consume_verification_code(&email, registration.code.trim(), Utc::now()).await? {
            return Err(EngineError::validation("The verification code is invalid or has expired"));
        }
        let hash = hash_password(&registration.password).map_err(|e| EngineError::DatabaseError(e.to_string()))?;
        let new_user = NewUser::new(name, email.as_str(), hash.as_str()).with_store(format!("{name}'s store"));
        let user = self.db.create_user(new_user).await?;
        info!("🔄️👤️ Registered user #{} ({})", user.id, user.email);
        Ok(user)
    }

    /// Checks a user's email and password. Unknown addresses and wrong passwords produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser, EngineError> {
        let email = normalize_email(email);
        let Some(creds) = self.db.fetch_credentials(&email).await? else {
            debug!("🔄️👤️ Login attempt for unknown address {email}");
            return Err(EngineError::Authentication(BAD_CREDENTIALS.into()));
        };
        let valid = verify_password(password, &creds.password_hash).map_err(|e| {
            warn!("🔄️👤️ Stored password hash for user #{} could not be checked. {e}", creds.id);
            EngineError::Authentication(BAD_CREDENTIALS.into())
        })?;
        if !valid {
            return Err(EngineError::Authentication(BAD_CREDENTIALS.into()));
        }
        let user = self
            .db
            .fetch_user(creds.id)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("User #{}", creds.id)))?;
        info!("🔄️👤️ User #{} logged in", user.id);
        Ok(AuthenticatedUser { user })
    }

    pub async fn reset_password(&self, reset: PasswordReset) -> Result<(), EngineError> {
        let email = normalize_email(&reset.email);
        validate_password(&reset.new_password)?;
        if !self.db.consume_verification_code(&email, reset.code.trim(), Utc::now()).await? {
            return Err(EngineError::validation("The verification code is invalid or has expired"));
        }
        let hash = hash_password(&reset.new_password).map_err(|e| EngineError::DatabaseError(e.to_string()))?;
        if !self.db.update_password(&email, &hash).await? {
            return Err(EngineError::not_found(format!("User {email}")));
        }
        info!("🔄️👤️ Password reset for {email}");
        Ok(())
    }

    pub async fn profile(&self, user_id: i64) -> Result<User, EngineError> {
        self.db.fetch_user(user_id).await?.ok_or_else(|| EngineError::not_found(format!("User #{user_id}")))
    }

    /// Updates a profile. Users may only edit their own.
    pub async fn update_profile(&self, actor_id: i64, user_id: i64, update: ProfileUpdate) -> Result<User, EngineError> {
        if actor_id != user_id {
            return Err(EngineError::unauthorized("You can only edit your own profile"));
        }
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(EngineError::validation("name must not be empty"));
        }
        self.db
            .update_profile(user_id, update)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("User #{user_id}")))
    }

    pub async fn balance_transactions(
        &self,
        user_id: i64,
        pagination: Pagination,
    ) -> Result<Page<BalanceTransaction>, EngineError> {
        self.db.fetch_balance_transactions(user_id, pagination).await
    }
}
