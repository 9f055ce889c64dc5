//! # Mini order server
//!
//! The HTTP front end for the mini order platform. It is responsible for:
//! * Authenticating users and administrators, and issuing access tokens.
//! * Translating JSON requests into calls on the engine APIs, and wrapping the results in the standard response
//!   envelope.
//! * Writing the operation log for the requests that change accounts or back-office data.
//! * Pushing notifications to connected clients over a WebSocket.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/users/*`, `/api/orders/*`, `/api/stores/*`, `/api/menu/*`: the user-facing API. See [routes].
//! * `/api/admin/*`: the back office. See [admin_routes].
//! * `/api/ws`: the notification socket. See [notifications].

pub mod admin_routes;
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod notifications;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
