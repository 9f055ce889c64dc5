//! Access control list middleware for the mini order server.
//! This middleware can be placed on any route or service.
//!
//! It reads the access token from the `Authorization: Bearer` header (or, for clients that cannot set headers such as
//! browser WebSockets, from a `token` query parameter), validates it, and checks the claims against the roles the
//! route requires. If the token is valid and carries every required role, the claims are stored in the request
//! extensions and the request continues. Otherwise the request is answered with 401 or 403 in the usual envelope.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;
use serde::Deserialize;

use crate::{
    auth::{Role, TokenIssuer},
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_roles: self.required_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Extracts the access token from the request, preferring the `Authorization` header over the query string.
pub fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    from_header.or_else(|| {
        web::Query::<TokenQuery>::from_query(req.query_string())
            .ok()
            .and_then(|q| q.into_inner().token)
            .filter(|t| !t.is_empty())
    })
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let issuer = req.app_data::<web::Data<TokenIssuer>>().cloned().ok_or_else(|| {
                error!("💻️ No token issuer has been registered with the app. All protected routes will fail.");
                ServerError::ConfigurationError("Token issuer is not configured".into())
            })?;
            let token = bearer_token(&req).ok_or(ServerError::AuthenticationError(AuthError::MissingToken))?;
            let claims = issuer.validate_token(&token).map_err(ServerError::AuthenticationError)?;
            if let Some(missing) = required_roles.iter().find(|role| !claims.has_role(**role)) {
                debug!("💻️ Account #{} lacks the {missing} role for {}", claims.sub, req.path());
                let err = AuthError::InsufficientPermissions(format!("The {missing} role is required"));
                return Err(ServerError::AuthenticationError(err).into());
            }
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
