use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use mini_order_engine::{EngineError, SqliteDatabaseError};
use thiserror::Error;

use crate::data_objects::ApiResponse;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("{0}")]
    Engine(#[from] EngineError),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("Could not read query parameters: {0}")]
    InvalidQuery(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("{0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not issue access token. {0}")]
    CouldNotSerializeAccessToken(String),
}

impl From<SqliteDatabaseError> for ServerError {
    fn from(e: SqliteDatabaseError) -> Self {
        Self::InitializeError(format!("Database error. {e}"))
    }
}

impl ServerError {
    /// The message sent to the client. Internal failures are described in the log, not in the response.
    pub fn client_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => INTERNAL_ERROR_MESSAGE.to_string(),
            _ => match self {
                Self::Engine(e) => engine_error_message(e),
                other => other.to_string(),
            },
        }
    }
}

fn engine_error_message(e: &EngineError) -> String {
    match e {
        EngineError::Validation(msg) |
        EngineError::Authorization(msg) |
        EngineError::Authentication(msg) |
        EngineError::Conflict(msg) |
        EngineError::RateLimited(msg) |
        EngineError::Unavailable(msg) => msg.clone(),
        other => other.to_string(),
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Engine(e) => match e {
                EngineError::Validation(_) => StatusCode::BAD_REQUEST,
                EngineError::Authentication(_) => StatusCode::UNAUTHORIZED,
                EngineError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
                EngineError::Authorization(_) => StatusCode::FORBIDDEN,
                EngineError::NotFound(_) => StatusCode::NOT_FOUND,
                EngineError::Conflict(_) => StatusCode::CONFLICT,
                EngineError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                EngineError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                EngineError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            },
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotSerializeAccessToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("💻️ Request failed with an internal error. {self}");
        }
        let body = ApiResponse::<()>::failure(status.as_u16(), self.client_message());
        HttpResponse::build(status).insert_header(ContentType::json()).json(body)
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided. Please log in first.")]
    MissingToken,
    #[error("The access token is invalid or has expired. {0}")]
    InvalidToken(String),
    #[error("Insufficient permissions. {0}")]
    InsufficientPermissions(String),
}

#[cfg(test)]
mod test {
    use actix_web::body::MessageBody;
    use mini_order_engine::db_types::Cents;

    use super::*;

    #[test]
    fn engine_errors_map_to_statuses() {
        let cases = [
            (EngineError::validation("bad"), 400),
            (EngineError::Authentication("nope".into()), 401),
            (EngineError::InsufficientBalance { required: Cents::from(10), available: Cents::from(5) }, 402),
            (EngineError::unauthorized("no"), 403),
            (EngineError::not_found("Order #1"), 404),
            (EngineError::conflict("twice"), 409),
            (EngineError::RateLimited("slow down".into()), 429),
            (EngineError::Unavailable("later".into()), 503),
            (EngineError::DatabaseError("disk on fire".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).status_code().as_u16(), status);
        }
    }

    #[test]
    fn internal_errors_are_not_leaked() {
        let err = ServerError::from(EngineError::DatabaseError("table users is locked".into()));
        let body = err.error_response().into_body().try_into_bytes().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], 500);
        assert_eq!(json["message"], "Internal server error");
        assert!(json["data"].is_null());
        assert!(json["traceId"].as_str().is_some_and(|s| !s.is_empty()));
    }

    #[test]
    fn client_errors_keep_their_message() {
        let err = ServerError::from(EngineError::conflict("Already requested or a member"));
        assert_eq!(err.client_message(), "Already requested or a member");
        let err = ServerError::from(EngineError::not_found("Store #4"));
        assert_eq!(err.client_message(), "Store #4 not found");
        let err = ServerError::from(AuthError::MissingToken);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
