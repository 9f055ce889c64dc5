//! Access tokens.
//!
//! Users and admins log in with an email and password and receive an HS256-signed JWT. The token carries the account
//! id and the roles the holder has been granted; the [`AclMiddlewareFactory`](crate::middleware::AclMiddlewareFactory)
//! verifies it on every protected route and makes the claims available to handlers through the [`JwtClaims`]
//! extractor.
use std::fmt::Display;

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use mini_order_engine::db_types::AdminRole;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Admin => f.write_str("admin"),
            Role::SuperAdmin => f.write_str("super_admin"),
        }
    }
}

/// The roles granted to an administrator. A super admin is also an admin.
pub fn admin_roles(role: AdminRole) -> Vec<Role> {
    match role {
        AdminRole::Admin => vec![Role::Admin],
        AdminRole::SuperAdmin => vec![Role::Admin, Role::SuperAdmin],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id for user tokens, or the admin id for admin tokens.
    pub sub: i64,
    pub roles: Vec<Role>,
    pub iat: i64,
    pub exp: i64,
}

impl JwtClaims {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// The admin role these claims represent, if any.
    pub fn admin_role(&self) -> Option<AdminRole> {
        if self.has_role(Role::SuperAdmin) {
            Some(AdminRole::SuperAdmin)
        } else if self.has_role(Role::Admin) {
            Some(AdminRole::Admin)
        } else {
            None
        }
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned().ok_or_else(|| {
            warn!("💻️ A handler asked for JWT claims on a route without the ACL middleware");
            ServerError::AuthenticationError(AuthError::MissingToken)
        });
        ready(claims)
    }
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime: config.token_lifetime,
        }
    }

    pub fn issue_token(&self, sub: i64, roles: Vec<Role>) -> Result<String, ServerError> {
        let now = Utc::now();
        let claims = JwtClaims { sub, roles, iat: now.timestamp(), exp: (now + self.lifetime).timestamp() };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))
    }

    /// Checks the token's signature and expiry and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!("💻️ Rejected access token. {e}");
            AuthError::InvalidToken(e.to_string())
        })?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn issuer(secret: &str, hours: i64) -> TokenIssuer {
        TokenIssuer::new(&AuthConfig::new(secret, Duration::hours(hours)))
    }

    #[test]
    fn tokens_round_trip() {
        let issuer = issuer("test-secret", 1);
        let token = issuer.issue_token(42, vec![Role::User]).unwrap();
        let claims = issuer.validate_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert!(claims.has_role(Role::User));
        assert!(!claims.has_role(Role::Admin));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let token = issuer("secret-one", 1).issue_token(1, vec![Role::User]).unwrap();
        let err = issuer("secret-two", 1).validate_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token = issuer("test-secret", -2).issue_token(1, vec![Role::User]).unwrap();
        assert!(issuer("test-secret", 1).validate_token(&token).is_err());
    }

    #[test]
    fn super_admins_are_admins() {
        let roles = admin_roles(AdminRole::SuperAdmin);
        assert_eq!(roles, vec![Role::Admin, Role::SuperAdmin]);
        let claims = JwtClaims { sub: 1, roles, iat: 0, exp: 0 };
        assert_eq!(claims.admin_role(), Some(AdminRole::SuperAdmin));
        let claims = JwtClaims { sub: 1, roles: vec![Role::User], iat: 0, exp: 0 };
        assert_eq!(claims.admin_role(), None);
    }
}
