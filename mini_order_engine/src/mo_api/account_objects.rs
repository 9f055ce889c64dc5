use serde::{Deserialize, Serialize};

use crate::db_types::{AdminRole, User};

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub code: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"******")
            .field("code", &"******")
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

impl std::fmt::Debug for PasswordReset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordReset").field("email", &self.email).field("new_password", &"******").finish()
    }
}

/// The outcome of a successful user login. The caller turns this into an access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedAdmin {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: AdminRole,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdminAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_admin_role")]
    pub role: AdminRole,
}

fn default_admin_role() -> AdminRole {
    AdminRole::Admin
}

impl std::fmt::Debug for NewAdminAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAdminAccount")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish()
    }
}

/// A user account created from the back office. No verification code is needed, and no store is created unless a
/// store name is given.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub store_name: Option<String>,
}

impl std::fmt::Debug for NewUserAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUserAccount")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("store_name", &self.store_name)
            .finish()
    }
}
